//! Path classification.
//!
//! # Responsibilities
//! - Detect excluded assets (framework internals, static trees) before anything else
//! - Split an optional language segment off the front of the path
//! - Produce the language-stripped resource path used by every later step
//!
//! # Design Decisions
//! - The excluded check runs first so `/_next/...` is never read as a language
//! - Language segments match exactly; `/AR/x` or `/de/x` have no prefix
//! - Prefix matching is segment-aware: `/api` covers `/api/v1`, not `/apiary`

use serde::Serialize;

use crate::locale::{LanguageCode, Languages};

/// A request path with its language segment separated out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedPath {
    pub has_language_prefix: bool,
    pub language: Option<LanguageCode>,
    /// Path without the language segment. Always starts with `/`.
    pub resource_path: String,
}

/// Outcome of classifying a raw path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Bypasses the gate entirely.
    Excluded,
    Routable(ClassifiedPath),
}

/// Splits paths using the supported language set and the excluded-asset list.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    languages: Languages,
    excluded: Vec<String>,
}

impl PathClassifier {
    pub fn new(languages: Languages, excluded: Vec<String>) -> Self {
        Self {
            languages,
            excluded,
        }
    }

    pub fn languages(&self) -> &Languages {
        &self.languages
    }

    pub fn classify(&self, path: &str) -> Classification {
        let path = normalize(path);
        if self.is_excluded(&path) {
            return Classification::Excluded;
        }
        Classification::Routable(split_language_prefix(&self.languages, &path))
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded
            .iter()
            .any(|prefix| path_has_prefix(path, prefix))
    }
}

/// Separate a leading supported language segment from `path`.
///
/// Shared by the server classifier and the client locale context.
pub fn split_language_prefix(languages: &Languages, path: &str) -> ClassifiedPath {
    let path = normalize(path);
    let rest = &path[1..];
    let (first, remainder) = match rest.split_once('/') {
        Some((first, remainder)) => (first, Some(remainder)),
        None => (rest, None),
    };

    match languages.get(first) {
        Some(language) => {
            let resource_path = match remainder {
                Some(remainder) if !remainder.is_empty() => format!("/{remainder}"),
                _ => "/".to_string(),
            };
            ClassifiedPath {
                has_language_prefix: true,
                language: Some(language),
                resource_path,
            }
        }
        None => ClassifiedPath {
            has_language_prefix: false,
            language: None,
            resource_path: path.into_owned(),
        },
    }
}

/// Put `language` in front of a language-stripped path.
///
/// The root maps to `/{language}` without a trailing slash.
pub fn localize_path(language: &LanguageCode, resource_path: &str) -> String {
    if resource_path == "/" || resource_path.is_empty() {
        format!("/{language}")
    } else if resource_path.starts_with('/') {
        format!("/{language}{resource_path}")
    } else {
        format!("/{language}/{resource_path}")
    }
}

/// Segment-aware prefix test.
///
/// A prefix ending in `/` is a plain string prefix; otherwise it matches
/// itself and anything below it.
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    if prefix.ends_with('/') {
        return path.starts_with(prefix);
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn normalize(path: &str) -> std::borrow::Cow<'_, str> {
    if path.starts_with('/') {
        std::borrow::Cow::Borrowed(path)
    } else {
        std::borrow::Cow::Owned(format!("/{path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> PathClassifier {
        PathClassifier::new(
            Languages::new(&["ar", "en", "fr"], "ar").unwrap(),
            vec!["/_next".into(), "/api".into(), "/favicon.ico".into()],
        )
    }

    fn routable(path: &str) -> ClassifiedPath {
        match classifier().classify(path) {
            Classification::Routable(classified) => classified,
            Classification::Excluded => panic!("{path} unexpectedly excluded"),
        }
    }

    #[test]
    fn test_language_prefix_is_stripped() {
        let classified = routable("/en/clinic/patients");
        assert!(classified.has_language_prefix);
        assert_eq!(classified.language.unwrap(), "en");
        assert_eq!(classified.resource_path, "/clinic/patients");
    }

    #[test]
    fn test_bare_language_maps_to_root() {
        assert_eq!(routable("/ar").resource_path, "/");
        assert_eq!(routable("/ar/").resource_path, "/");
    }

    #[test]
    fn test_no_prefix_keeps_path() {
        for path in ["/", "/clinic", "/de/clinic", "/AR/clinic", "/arabic", "/english/x"] {
            let classified = routable(path);
            assert!(!classified.has_language_prefix, "{path}");
            assert!(classified.language.is_none());
            assert_eq!(classified.resource_path, path);
        }
    }

    #[test]
    fn test_excluded_assets_short_circuit() {
        let classifier = classifier();
        assert_eq!(classifier.classify("/_next/static/chunk.js"), Classification::Excluded);
        assert_eq!(classifier.classify("/api"), Classification::Excluded);
        assert_eq!(classifier.classify("/favicon.ico"), Classification::Excluded);
        assert_ne!(classifier.classify("/apiary"), Classification::Excluded);
        // Only the raw path counts; a language-qualified asset path is routable.
        assert_ne!(classifier.classify("/en/_next/x"), Classification::Excluded);
    }

    #[test]
    fn test_relative_input_is_anchored() {
        assert_eq!(routable("clinic").resource_path, "/clinic");
        assert_eq!(routable("").resource_path, "/");
    }

    #[test]
    fn test_localize_path() {
        let languages = Languages::new(&["ar", "en"], "ar").unwrap();
        let en = languages.get("en").unwrap();
        assert_eq!(localize_path(&en, "/"), "/en");
        assert_eq!(localize_path(&en, "/clinic/staff"), "/en/clinic/staff");
    }

    #[test]
    fn test_path_has_prefix() {
        assert!(path_has_prefix("/auth", "/auth"));
        assert!(path_has_prefix("/auth/login", "/auth"));
        assert!(!path_has_prefix("/authors", "/auth"));
        assert!(path_has_prefix("/static/x", "/static/"));
        assert!(!path_has_prefix("/static", "/static/"));
    }
}
