//! # Localization Module
//!
//! User-facing texts are Fluent messages stored in `locales/<lang>/main.ftl`.
//! English is the fallback for unsupported languages and for keys missing in
//! a translation.

use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::warn;
use unic_langid::LanguageIdentifier;

const DEFAULT_LANGUAGE: &str = "en";

const RESOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/main.ftl")),
    ("fr", include_str!("../locales/fr/main.ftl")),
];

/// Localization manager for the coffee bot
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a manager with every bundled language loaded
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();
        for (language, source) in RESOURCES {
            let locale: LanguageIdentifier = language.parse()?;
            bundles.insert(language.to_string(), Self::create_bundle(locale, source)?);
        }
        Ok(Self { bundles })
    }

    fn create_bundle(locale: LanguageIdentifier, source: &str) -> Result<FluentBundle<FluentResource>> {
        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid Fluent resource for {locale}: {errors:?}"))?;

        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Keep placeables free of bidi isolation marks; texts go straight to chat
        bundle.set_use_isolating(false);
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Conflicting Fluent messages for {locale}: {errors:?}"))?;
        Ok(bundle)
    }

    /// Whether a bundle exists for this language (primary subtag only)
    pub fn is_supported(&self, language_code: &str) -> bool {
        self.bundles.contains_key(primary_subtag(language_code))
    }

    /// Get a message in the requested language, falling back to English
    pub fn get_message_in_language(
        &self,
        key: &str,
        language_code: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let requested = primary_subtag(language_code);
        let candidates = [requested, DEFAULT_LANGUAGE];

        for language in candidates {
            let Some(bundle) = self.bundles.get(language) else {
                continue;
            };
            let Some(pattern) = bundle.get_message(key).and_then(|msg| msg.value()) else {
                continue;
            };

            let fluent_args = args.map(|args| {
                let mut fluent_args = FluentArgs::new();
                for (name, value) in args {
                    fluent_args.set(*name, FluentValue::from(*value));
                }
                fluent_args
            });

            let mut errors = vec![];
            let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
            if !errors.is_empty() {
                warn!(key, language, ?errors, "Fluent formatting errors");
            }
            return value.into_owned();
        }

        format!("Missing translation: {key}")
    }

    /// Get an English message
    pub fn get_message(&self, key: &str, args: Option<&HashMap<&str, &str>>) -> String {
        self.get_message_in_language(key, DEFAULT_LANGUAGE, args)
    }
}

fn primary_subtag(language_code: &str) -> &str {
    language_code
        .split(['-', '_'])
        .next()
        .unwrap_or(language_code)
}

static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager, surfacing resource errors early
pub fn init_localization() -> Result<()> {
    if LOCALIZATION_MANAGER.get().is_none() {
        let manager = LocalizationManager::new()?;
        let _ = LOCALIZATION_MANAGER.set(manager);
    }
    Ok(())
}

/// Get the global localization manager
pub fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER.get_or_init(|| {
        LocalizationManager::new().unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to empty localization");
            LocalizationManager {
                bundles: HashMap::new(),
            }
        })
    })
}

/// Convenience function to get a localized message
pub fn t(key: &str) -> String {
    get_localization_manager().get_message(key, None)
}

/// Convenience function to get a localized message with arguments
pub fn t_args(key: &str, args: &[(&str, &str)]) -> String {
    let args: HashMap<&str, &str> = args.iter().cloned().collect();
    get_localization_manager().get_message(key, Some(&args))
}

/// Localized message in the user's language (English when unknown)
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    get_localization_manager().get_message_in_language(
        key,
        language_code.unwrap_or(DEFAULT_LANGUAGE),
        None,
    )
}

/// Localized message with arguments in the user's language
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let args: HashMap<&str, &str> = args.iter().cloned().collect();
    get_localization_manager().get_message_in_language(
        key,
        language_code.unwrap_or(DEFAULT_LANGUAGE),
        Some(&args),
    )
}
