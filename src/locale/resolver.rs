//! Effective language resolution.
//!
//! Precedence, first match wins:
//! 1. language segment of the path
//! 2. stored language cookie
//! 3. primary subtag of the first `Accept-Language` tag
//! 4. default language
//!
//! A candidate outside the supported set never matches; resolution moves on
//! to the next source. The browser runs the same function without a header.

use serde::Serialize;

use crate::locale::language::{LanguageCode, Languages};
use crate::routing::classifier::ClassifiedPath;

/// Where the effective language came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageSource {
    PathPrefix,
    Cookie,
    AcceptLanguage,
    Default,
}

/// Result of resolving a request's language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub language: LanguageCode,
    pub source: LanguageSource,
    /// True when `language` differs from the stored cookie value (or no
    /// cookie was stored).
    pub changed: bool,
}

pub fn resolve(
    languages: &Languages,
    classified: &ClassifiedPath,
    stored: Option<&str>,
    accept_language: Option<&str>,
) -> Resolution {
    let (language, source) = if let Some(language) = &classified.language {
        (language.clone(), LanguageSource::PathPrefix)
    } else if let Some(language) = stored.and_then(|raw| languages.get(raw)) {
        (language, LanguageSource::Cookie)
    } else if let Some(language) = accept_language
        .and_then(primary_subtag)
        .and_then(|tag| languages.get(&tag))
    {
        (language, LanguageSource::AcceptLanguage)
    } else {
        (languages.default_language().clone(), LanguageSource::Default)
    };

    let changed = stored != Some(language.as_str());
    Resolution {
        language,
        source,
        changed,
    }
}

/// Primary subtag of the first tag in an `Accept-Language` value, lowercased.
///
/// Only the first tag is considered, whatever its quality value. Wildcards and
/// empty values yield `None`.
pub fn primary_subtag(header: &str) -> Option<String> {
    let first = header.split(',').next()?;
    let tag = first.split(';').next()?.trim();
    let primary = tag.split(['-', '_']).next()?.trim();

    if primary.is_empty() || primary == "*" || !primary.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    Some(primary.to_ascii_lowercase())
}
