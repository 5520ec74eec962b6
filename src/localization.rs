//! Fluent-based localization for bot messages.
//!
//! Bundles are loaded once from `./locales/{locale}/main.ftl`. Russian
//! is the primary audience; English is the fallback for everything
//! else.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, LazyLock};

use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use unic_langid::LanguageIdentifier;

const SUPPORTED_LOCALES: &[&str] = &["en", "ru"];
const FALLBACK_LOCALE: &str = "en";

/// Localization manager holding one bundle per supported locale.
pub struct LocalizationManager {
    bundles: HashMap<String, Arc<FluentBundle<FluentResource>>>,
}

impl LocalizationManager {
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for locale in SUPPORTED_LOCALES {
            let langid: LanguageIdentifier = locale.parse()?;
            let bundle = Self::create_bundle(&langid)?;
            bundles.insert((*locale).to_string(), Arc::new(bundle));
        }

        Ok(Self { bundles })
    }

    fn create_bundle(locale: &LanguageIdentifier) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);

        let resource_path = format!("./locales/{locale}/main.ftl");
        if let Ok(content) = fs::read_to_string(&resource_path) {
            if let Ok(resource) = FluentResource::try_new(content) {
                let _ = bundle.add_resource(resource);
            }
        }

        Ok(bundle)
    }

    /// Resolve a message in the requested language, falling back to
    /// English for unsupported locales.
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(FALLBACK_LOCALE))
            .expect("fallback bundle always present");

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {key}"),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {key}"),
        };

        let mut value = String::new();
        if let Some(args) = args {
            let fluent_args = FluentArgs::from_iter(
                args.iter().map(|(k, v)| (*k, FluentValue::from(*v))),
            );
            let _ = bundle.write_pattern(&mut value, pattern, Some(&fluent_args), &mut vec![]);
        } else {
            let _ = bundle.write_pattern(&mut value, pattern, None, &mut vec![]);
        }

        value
    }
}

static LOCALIZATION_MANAGER: LazyLock<LocalizationManager> = LazyLock::new(|| {
    LocalizationManager::new().expect("Failed to initialize localization")
});

fn normalize(language_code: Option<&str>) -> &str {
    match language_code {
        Some(code) if SUPPORTED_LOCALES.contains(&code) => code,
        _ => FALLBACK_LOCALE,
    }
}

/// Get a localized message for the user's Telegram language code.
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    LOCALIZATION_MANAGER.get_message_in_language(key, normalize(language_code), None)
}

/// Get a localized message with arguments.
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    LOCALIZATION_MANAGER.get_message_in_language(key, normalize(language_code), Some(&args_map))
}
