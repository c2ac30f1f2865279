//! Supported language set.
//!
//! A [`LanguageCode`] can only be obtained from a [`Languages`] set, so every
//! code flowing through the gate is a member of the configured set.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::LocaleConfig;

/// A language code known to be supported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for LanguageCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LanguageCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LanguageError {
    #[error("no supported languages configured")]
    Empty,

    #[error("default language {0:?} is not supported")]
    UnknownDefault(String),
}

/// The ordered set of supported languages with its designated default.
#[derive(Debug, Clone)]
pub struct Languages {
    supported: Vec<LanguageCode>,
    default: LanguageCode,
}

impl Languages {
    pub fn new<S: AsRef<str>>(supported: &[S], default: &str) -> Result<Self, LanguageError> {
        if supported.is_empty() {
            return Err(LanguageError::Empty);
        }
        let supported: Vec<LanguageCode> = supported
            .iter()
            .map(|code| LanguageCode(code.as_ref().to_string()))
            .collect();
        let default = supported
            .iter()
            .find(|code| code.as_str() == default)
            .cloned()
            .ok_or_else(|| LanguageError::UnknownDefault(default.to_string()))?;

        Ok(Self { supported, default })
    }

    pub fn from_config(config: &LocaleConfig) -> Result<Self, LanguageError> {
        Self::new(&config.supported, &config.default)
    }

    /// Look up a raw code. Matching is exact; anything else is unsupported.
    pub fn get(&self, raw: &str) -> Option<LanguageCode> {
        self.supported.iter().find(|code| code.as_str() == raw).cloned()
    }

    pub fn default_language(&self) -> &LanguageCode {
        &self.default
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageCode> {
        self.supported.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_exact() {
        let languages = Languages::new(&["ar", "en", "fr"], "ar").unwrap();
        assert_eq!(languages.get("en").unwrap(), "en");
        assert!(languages.get("EN").is_none());
        assert!(languages.get("de").is_none());
        assert!(languages.get("").is_none());
        assert_eq!(languages.default_language(), &"ar");
    }

    #[test]
    fn test_order_is_kept() {
        let languages = Languages::new(&["fr", "ar"], "ar").unwrap();
        let codes: Vec<&str> = languages.iter().map(LanguageCode::as_str).collect();
        assert_eq!(codes, vec!["fr", "ar"]);
    }

    #[test]
    fn test_rejects_bad_sets() {
        let empty: [&str; 0] = [];
        assert_eq!(Languages::new(&empty, "ar").unwrap_err(), LanguageError::Empty);
        assert_eq!(
            Languages::new(&["en"], "ar").unwrap_err(),
            LanguageError::UnknownDefault("ar".into())
        );
    }
}
