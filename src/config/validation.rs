//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (default language is supported, login page is public)
//! - Validate path shapes (every path and prefix is absolute)
//! - Detect excluded prefixes that would shadow language-qualified URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::routing::classifier::path_has_prefix;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("locale.supported must list at least one language")]
    NoLanguages,

    #[error("language code {0:?} must be 2-3 lowercase ASCII letters")]
    InvalidLanguageCode(String),

    #[error("language code {0:?} is listed more than once")]
    DuplicateLanguage(String),

    #[error("default language {0:?} is not in locale.supported")]
    DefaultNotSupported(String),

    #[error("{field} entry {path:?} must start with '/'")]
    RelativePath { field: &'static str, path: String },

    #[error("login path {0:?} is not public; unauthenticated users could never reach it")]
    LoginNotPublic(String),

    #[error("login path {login:?} is not under the auth prefix {prefix:?}")]
    LoginOutsideAuthPages { login: String, prefix: String },

    #[error("{0} must not be empty")]
    EmptyName(&'static str),

    #[error("language cookie and session cookie share the name {0:?}")]
    CookieNameClash(String),

    #[error("excluded prefix {prefix:?} shadows language prefix /{language}")]
    ExcludedShadowsLanguage { prefix: String, language: String },

    #[error("excluded prefix \"/\" would exclude every request")]
    ExcludedRoot,

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_locale(config, &mut errors);
    validate_access(config, &mut errors);
    validate_excluded(config, &mut errors);

    if config.cache.capacity == 0 {
        errors.push(ValidationError::NonPositive("cache.capacity"));
    }
    if config.locale.cookie_max_age_days <= 0 {
        errors.push(ValidationError::NonPositive("locale.cookie_max_age_days"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_code(code: &str) -> bool {
    (2..=3).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_lowercase())
}

fn validate_locale(config: &GateConfig, errors: &mut Vec<ValidationError>) {
    let locale = &config.locale;
    if locale.supported.is_empty() {
        errors.push(ValidationError::NoLanguages);
    }

    let mut seen = HashSet::new();
    for code in &locale.supported {
        if !is_valid_code(code) {
            errors.push(ValidationError::InvalidLanguageCode(code.clone()));
        }
        if !seen.insert(code.as_str()) {
            errors.push(ValidationError::DuplicateLanguage(code.clone()));
        }
    }

    if !locale.supported.is_empty() && !locale.supported.contains(&locale.default) {
        errors.push(ValidationError::DefaultNotSupported(locale.default.clone()));
    }

    if locale.cookie_name.is_empty() {
        errors.push(ValidationError::EmptyName("locale.cookie_name"));
    }
}

fn validate_access(config: &GateConfig, errors: &mut Vec<ValidationError>) {
    let access = &config.access;

    for path in &access.public_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field: "access.public_paths",
                path: path.clone(),
            });
        }
    }
    for (field, path) in [
        ("access.auth_prefix", &access.auth_prefix),
        ("access.login_path", &access.login_path),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field,
                path: path.clone(),
            });
        }
    }

    let login_public = access.public_paths.iter().any(|prefix| {
        if prefix == "/" {
            access.login_path == "/"
        } else {
            path_has_prefix(&access.login_path, prefix)
        }
    });
    if !login_public {
        errors.push(ValidationError::LoginNotPublic(access.login_path.clone()));
    }
    if !path_has_prefix(&access.login_path, &access.auth_prefix) {
        errors.push(ValidationError::LoginOutsideAuthPages {
            login: access.login_path.clone(),
            prefix: access.auth_prefix.clone(),
        });
    }

    if access.session_cookie.is_empty() {
        errors.push(ValidationError::EmptyName("access.session_cookie"));
    }
    if access.callback_param.is_empty() {
        errors.push(ValidationError::EmptyName("access.callback_param"));
    }
    if !access.session_cookie.is_empty() && access.session_cookie == config.locale.cookie_name {
        errors.push(ValidationError::CookieNameClash(access.session_cookie.clone()));
    }
}

fn validate_excluded(config: &GateConfig, errors: &mut Vec<ValidationError>) {
    for prefix in &config.excluded.prefixes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field: "excluded.prefixes",
                path: prefix.clone(),
            });
            continue;
        }
        if prefix == "/" {
            errors.push(ValidationError::ExcludedRoot);
            continue;
        }
        for language in &config.locale.supported {
            let language_root = format!("/{language}");
            let language_dir = format!("/{language}/");
            if path_has_prefix(&language_root, prefix) || path_has_prefix(&language_dir, prefix) {
                errors.push(ValidationError::ExcludedShadowsLanguage {
                    prefix: prefix.clone(),
                    language: language.clone(),
                });
            }
        }
    }
}
