//! Access classification.
//!
//! # Responsibilities
//! - Categorize a language-stripped resource path as Public or Protected
//! - Decide whether a request must go to the login page or leave the auth pages
//!
//! # Design Decisions
//! - Fail closed: anything not on the public allowlist is Protected
//! - The public allowlist wins over every other consideration
//! - Ambiguous paths (dot segments, encoded separators) are an error, and
//!   an error categorizes as Protected
//! - Only the presence of the session cookie matters here

use serde::Serialize;
use thiserror::Error;

use crate::config::AccessConfig;
use crate::observability::metrics;
use crate::routing::classifier::path_has_prefix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCategory {
    Public,
    Protected,
}

/// Reasons a resource path cannot be categorized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("resource path {0:?} is not absolute")]
    Relative(String),

    #[error("resource path {0:?} contains a dot segment")]
    DotSegment(String),

    #[error("resource path {0:?} contains an encoded separator")]
    EncodedSeparator(String),
}

/// What the access rules require for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    Allow,
    /// Protected resource without a session.
    RequireLogin,
    /// Authenticated session on an auth page.
    LeaveAuthPages,
}

/// Public allowlist and auth-page settings.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    public_paths: Vec<String>,
    auth_prefix: String,
    login_path: String,
    callback_param: String,
    auth_page_guard: bool,
}

impl AccessPolicy {
    pub fn from_config(config: &AccessConfig) -> Self {
        Self {
            public_paths: config.public_paths.clone(),
            auth_prefix: config.auth_prefix.clone(),
            login_path: config.login_path.clone(),
            callback_param: config.callback_param.clone(),
            // Staging builds let signed-in users reopen the auth pages.
            auth_page_guard: !cfg!(feature = "auth-page-reentry"),
        }
    }

    pub fn with_auth_page_guard(mut self, enabled: bool) -> Self {
        self.auth_page_guard = enabled;
        self
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn callback_param(&self) -> &str {
        &self.callback_param
    }

    /// Categorize, reporting paths that cannot be matched safely.
    pub fn try_categorize(&self, resource_path: &str) -> Result<RouteCategory, AccessError> {
        check_unambiguous(resource_path)?;

        let public = self.public_paths.iter().any(|prefix| {
            if prefix == "/" {
                resource_path == "/"
            } else {
                path_has_prefix(resource_path, prefix)
            }
        });

        Ok(if public {
            RouteCategory::Public
        } else {
            RouteCategory::Protected
        })
    }

    /// Categorize, falling back to Protected on any error.
    pub fn categorize(&self, resource_path: &str) -> RouteCategory {
        match self.try_categorize(resource_path) {
            Ok(category) => category,
            Err(e) => {
                tracing::warn!(error = %e, "Access classification failed, treating as protected");
                metrics::record_fail_closed();
                RouteCategory::Protected
            }
        }
    }

    pub fn is_auth_page(&self, resource_path: &str) -> bool {
        path_has_prefix(resource_path, &self.auth_prefix)
    }

    pub fn evaluate(
        &self,
        resource_path: &str,
        category: RouteCategory,
        has_session: bool,
        is_logout_redirect: bool,
    ) -> AccessOutcome {
        match category {
            RouteCategory::Protected if !has_session => AccessOutcome::RequireLogin,
            RouteCategory::Public
                if self.auth_page_guard
                    && has_session
                    && !is_logout_redirect
                    && self.is_auth_page(resource_path) =>
            {
                AccessOutcome::LeaveAuthPages
            }
            _ => AccessOutcome::Allow,
        }
    }
}

fn check_unambiguous(resource_path: &str) -> Result<(), AccessError> {
    if !resource_path.starts_with('/') {
        return Err(AccessError::Relative(resource_path.to_string()));
    }
    if resource_path
        .split('/')
        .any(|segment| segment == "." || segment == "..")
    {
        return Err(AccessError::DotSegment(resource_path.to_string()));
    }
    let lower = resource_path.to_ascii_lowercase();
    if resource_path.contains('\\') || ["%2f", "%2e", "%5c"].iter().any(|enc| lower.contains(enc)) {
        return Err(AccessError::EncodedSeparator(resource_path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AccessPolicy {
        AccessPolicy::from_config(&AccessConfig::default()).with_auth_page_guard(true)
    }

    #[test]
    fn test_root_is_exact_match() {
        let policy = policy();
        assert_eq!(policy.categorize("/"), RouteCategory::Public);
        assert_eq!(policy.categorize("/settings"), RouteCategory::Protected);
    }

    #[test]
    fn test_prefix_match_for_others() {
        let policy = policy();
        assert_eq!(policy.categorize("/auth/login"), RouteCategory::Public);
        assert_eq!(policy.categorize("/about"), RouteCategory::Public);
        assert_eq!(policy.categorize("/authors"), RouteCategory::Protected);
    }

    #[test]
    fn test_unlisted_paths_fail_closed() {
        let policy = policy();
        for path in ["/clinic/patients", "/admin", "/doctor/appointments", "/x"] {
            assert_eq!(policy.categorize(path), RouteCategory::Protected, "{path}");
        }
    }

    #[test]
    fn test_public_allowlist_wins() {
        let mut config = AccessConfig::default();
        config.public_paths.push("/clinic/register".into());
        let policy = AccessPolicy::from_config(&config);
        assert_eq!(policy.categorize("/clinic/register"), RouteCategory::Public);
        assert_eq!(policy.categorize("/clinic/register/step-2"), RouteCategory::Public);
        assert_eq!(policy.categorize("/clinic/staff"), RouteCategory::Protected);
    }

    #[test]
    fn test_ambiguous_paths_are_protected() {
        let policy = policy();
        for path in [
            "/auth/../clinic/staff",
            "/auth/./x",
            "/auth%2f..%2fclinic",
            "/about%2E%2E",
            "/auth\\..\\clinic",
        ] {
            assert!(policy.try_categorize(path).is_err(), "{path}");
            assert_eq!(policy.categorize(path), RouteCategory::Protected, "{path}");
        }
        assert_eq!(
            policy.try_categorize("auth"),
            Err(AccessError::Relative("auth".into()))
        );
    }

    #[test]
    fn test_protected_without_session_requires_login() {
        let policy = policy();
        assert_eq!(
            policy.evaluate("/clinic/staff", RouteCategory::Protected, false, false),
            AccessOutcome::RequireLogin
        );
        assert_eq!(
            policy.evaluate("/clinic/staff", RouteCategory::Protected, true, false),
            AccessOutcome::Allow
        );
    }

    #[test]
    fn test_session_leaves_auth_pages() {
        let policy = policy();
        assert_eq!(
            policy.evaluate("/auth/login", RouteCategory::Public, true, false),
            AccessOutcome::LeaveAuthPages
        );
        assert_eq!(
            policy.evaluate("/auth/login", RouteCategory::Public, false, false),
            AccessOutcome::Allow
        );
        assert_eq!(
            policy.evaluate("/about", RouteCategory::Public, true, false),
            AccessOutcome::Allow
        );
    }

    #[test]
    fn test_logout_hint_skips_auth_page_redirect() {
        let policy = policy();
        assert_eq!(
            policy.evaluate("/auth/login", RouteCategory::Public, true, true),
            AccessOutcome::Allow
        );
    }

    #[test]
    fn test_auth_page_guard_can_be_disabled() {
        let policy = policy().with_auth_page_guard(false);
        assert_eq!(
            policy.evaluate("/auth/login", RouteCategory::Public, true, false),
            AccessOutcome::Allow
        );
        // The login requirement is never switchable.
        assert_eq!(
            policy.evaluate("/clinic", RouteCategory::Protected, false, false),
            AccessOutcome::RequireLogin
        );
    }
}
