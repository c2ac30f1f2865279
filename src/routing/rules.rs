//! Ordered routing rules.
//!
//! Each rule is a predicate over the facts derived for one request plus the
//! decision it produces. The engine runs them in order and the first rule
//! that fires decides. Access redirects come before the language rules, so a
//! protected resource is never rewritten without a session, and a redirect
//! always beats a rewrite.

use std::fmt;

use url::form_urlencoded;

use crate::locale::LanguageCode;
use crate::routing::access::{AccessOutcome, AccessPolicy};
use crate::routing::classifier::{localize_path, ClassifiedPath};
use crate::routing::decision::RoutingDecision;
use crate::routing::engine::GateRequest;

/// Everything a rule may look at.
#[derive(Debug)]
pub struct RuleContext<'a> {
    pub request: &'a GateRequest<'a>,
    pub classified: &'a ClassifiedPath,
    pub language: &'a LanguageCode,
    pub access: AccessOutcome,
    pub policy: &'a AccessPolicy,
}

pub trait Rule: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Returns a decision if this rule fires.
    fn apply(&self, ctx: &RuleContext<'_>) -> Option<RoutingDecision>;
}

/// Protected resource without a session: go to the login page and come back.
#[derive(Debug, Default)]
pub struct LoginRequired;

impl Rule for LoginRequired {
    fn name(&self) -> &'static str {
        "login_required"
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Option<RoutingDecision> {
        if ctx.access != AccessOutcome::RequireLogin {
            return None;
        }

        let mut callback = localize_path(ctx.language, &ctx.classified.resource_path);
        if let Some(query) = ctx.request.query.filter(|q| !q.is_empty()) {
            callback.push('?');
            callback.push_str(query);
        }

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(ctx.policy.callback_param(), &callback)
            .finish();

        Some(RoutingDecision::Redirect {
            target: localize_path(ctx.language, ctx.policy.login_path()),
            query: Some(query),
        })
    }
}

/// Signed-in session on an auth page: back to the application root.
#[derive(Debug, Default)]
pub struct LeaveAuthPages;

impl Rule for LeaveAuthPages {
    fn name(&self) -> &'static str {
        "leave_auth_pages"
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Option<RoutingDecision> {
        (ctx.access == AccessOutcome::LeaveAuthPages).then(|| RoutingDecision::Redirect {
            target: localize_path(ctx.language, "/"),
            query: None,
        })
    }
}

/// Language-qualified path: serve the stripped resource internally.
#[derive(Debug, Default)]
pub struct LanguagePrefixRewrite;

impl Rule for LanguagePrefixRewrite {
    fn name(&self) -> &'static str {
        "language_prefix_rewrite"
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Option<RoutingDecision> {
        ctx.classified
            .has_language_prefix
            .then(|| RoutingDecision::InternalRewrite {
                target: ctx.classified.resource_path.clone(),
            })
    }
}

/// Unqualified path other than the root: make the language visible.
#[derive(Debug, Default)]
pub struct AddLanguagePrefix;

impl Rule for AddLanguagePrefix {
    fn name(&self) -> &'static str {
        "add_language_prefix"
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Option<RoutingDecision> {
        if ctx.classified.has_language_prefix || ctx.classified.resource_path == "/" {
            return None;
        }

        Some(RoutingDecision::Redirect {
            target: localize_path(ctx.language, &ctx.classified.resource_path),
            query: ctx.request.query.map(str::to_string),
        })
    }
}

/// The bare root stays unprefixed.
#[derive(Debug, Default)]
pub struct CanonicalRoot;

impl Rule for CanonicalRoot {
    fn name(&self) -> &'static str {
        "canonical_root"
    }

    fn apply(&self, ctx: &RuleContext<'_>) -> Option<RoutingDecision> {
        (!ctx.classified.has_language_prefix && ctx.classified.resource_path == "/")
            .then_some(RoutingDecision::PassThrough)
    }
}

/// The rule list in evaluation order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(LoginRequired),
        Box::new(LeaveAuthPages),
        Box::new(LanguagePrefixRewrite),
        Box::new(AddLanguagePrefix),
        Box::new(CanonicalRoot),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccessConfig;
    use crate::locale::Languages;
    use crate::routing::classifier::split_language_prefix;

    struct Fixture {
        languages: Languages,
        policy: AccessPolicy,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                languages: Languages::new(&["ar", "en", "fr"], "ar").unwrap(),
                policy: AccessPolicy::from_config(&AccessConfig::default()),
            }
        }

        fn run(
            &self,
            rule: &dyn Rule,
            request: &GateRequest<'_>,
            access: AccessOutcome,
        ) -> Option<RoutingDecision> {
            let classified = split_language_prefix(&self.languages, request.path);
            let language = classified
                .language
                .clone()
                .unwrap_or_else(|| self.languages.default_language().clone());
            let ctx = RuleContext {
                request,
                classified: &classified,
                language: &language,
                access,
                policy: &self.policy,
            };
            rule.apply(&ctx)
        }
    }

    #[test]
    fn test_login_required_carries_callback() {
        let fx = Fixture::new();
        let request = GateRequest::new("/clinic/staff").with_query("page=2");
        let decision = fx
            .run(&LoginRequired, &request, AccessOutcome::RequireLogin)
            .unwrap();
        assert_eq!(
            decision,
            RoutingDecision::Redirect {
                target: "/ar/auth/login".into(),
                query: Some("callbackUrl=%2Far%2Fclinic%2Fstaff%3Fpage%3D2".into()),
            }
        );
        assert!(fx
            .run(&LoginRequired, &request, AccessOutcome::Allow)
            .is_none());
    }

    #[test]
    fn test_login_required_keeps_request_language() {
        let fx = Fixture::new();
        let request = GateRequest::new("/fr/clinic/staff");
        let decision = fx
            .run(&LoginRequired, &request, AccessOutcome::RequireLogin)
            .unwrap();
        assert_eq!(
            decision.location().unwrap(),
            "/fr/auth/login?callbackUrl=%2Ffr%2Fclinic%2Fstaff"
        );
    }

    #[test]
    fn test_leave_auth_pages_goes_to_localized_root() {
        let fx = Fixture::new();
        let request = GateRequest::new("/en/auth/login");
        let decision = fx
            .run(&LeaveAuthPages, &request, AccessOutcome::LeaveAuthPages)
            .unwrap();
        assert_eq!(decision.location().as_deref(), Some("/en"));
        assert!(fx.run(&LeaveAuthPages, &request, AccessOutcome::Allow).is_none());
    }

    #[test]
    fn test_language_prefix_rewrite() {
        let fx = Fixture::new();
        let decision = fx.run(
            &LanguagePrefixRewrite,
            &GateRequest::new("/ar/clinic/patients"),
            AccessOutcome::Allow,
        );
        assert_eq!(
            decision,
            Some(RoutingDecision::InternalRewrite {
                target: "/clinic/patients".into()
            })
        );
        assert!(fx
            .run(&LanguagePrefixRewrite, &GateRequest::new("/clinic"), AccessOutcome::Allow)
            .is_none());
    }

    #[test]
    fn test_add_language_prefix_keeps_query() {
        let fx = Fixture::new();
        let request = GateRequest::new("/settings").with_query("tab=profile&x=a%20b");
        let decision = fx
            .run(&AddLanguagePrefix, &request, AccessOutcome::Allow)
            .unwrap();
        assert_eq!(
            decision,
            RoutingDecision::Redirect {
                target: "/ar/settings".into(),
                query: Some("tab=profile&x=a%20b".into()),
            }
        );
    }

    #[test]
    fn test_add_language_prefix_query_is_byte_identical() {
        let fx = Fixture::new();
        for (query, location) in [
            ("flag", "/ar/settings?flag"),
            ("t=%FF", "/ar/settings?t=%FF"),
            ("a=b;c=d", "/ar/settings?a=b;c=d"),
            ("q=a+b&q=c", "/ar/settings?q=a+b&q=c"),
        ] {
            let request = GateRequest::new("/settings").with_query(query);
            let decision = fx
                .run(&AddLanguagePrefix, &request, AccessOutcome::Allow)
                .unwrap();
            assert_eq!(decision.location().as_deref(), Some(location), "{query}");
        }
    }

    #[test]
    fn test_root_is_not_prefixed() {
        let fx = Fixture::new();
        let root = GateRequest::new("/");
        assert!(fx.run(&AddLanguagePrefix, &root, AccessOutcome::Allow).is_none());
        assert_eq!(
            fx.run(&CanonicalRoot, &root, AccessOutcome::Allow),
            Some(RoutingDecision::PassThrough)
        );
        assert!(fx
            .run(&CanonicalRoot, &GateRequest::new("/ar"), AccessOutcome::Allow)
            .is_none());
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<&str> = default_rules().iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                "login_required",
                "leave_auth_pages",
                "language_prefix_rewrite",
                "add_language_prefix",
                "canonical_root",
            ]
        );
    }
}
