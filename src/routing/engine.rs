//! Routing decision engine.
//!
//! # Responsibilities
//! - Short-circuit excluded assets before any other work
//! - Resolve the effective language and the access outcome
//! - Run the ordered rules and return exactly one decision
//!
//! # Design Decisions
//! - Pure function of one request: no state survives between calls
//! - Path facts (classification + category) depend only on the path and the
//!   config, so callers may memoize them and hand them back in
//! - Feeding a redirect target back in yields a rewrite or pass-through

use crate::config::GateConfig;
use crate::locale::{resolve, LanguageError, Languages, Resolution};
use crate::routing::access::{AccessPolicy, RouteCategory};
use crate::routing::classifier::{Classification, ClassifiedPath, PathClassifier};
use crate::routing::decision::RoutingDecision;
use crate::routing::rules::{default_rules, Rule, RuleContext};

/// The request data the engine looks at.
#[derive(Debug, Clone, Default)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub language_cookie: Option<&'a str>,
    pub accept_language: Option<&'a str>,
    pub has_session: bool,
    pub is_logout_redirect: bool,
}

impl<'a> GateRequest<'a> {
    pub fn new(path: &'a str) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: &'a str) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_language_cookie(mut self, language: &'a str) -> Self {
        self.language_cookie = Some(language);
        self
    }

    pub fn with_accept_language(mut self, header: &'a str) -> Self {
        self.accept_language = Some(header);
        self
    }

    pub fn with_session(mut self, has_session: bool) -> Self {
        self.has_session = has_session;
        self
    }

    pub fn with_logout_redirect(mut self, is_logout_redirect: bool) -> Self {
        self.is_logout_redirect = is_logout_redirect;
        self
    }
}

/// Everything about a path that does not depend on cookies or headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFacts {
    Excluded,
    Routable {
        classified: ClassifiedPath,
        category: RouteCategory,
    },
}

/// Result of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: RoutingDecision,
    /// `None` for excluded assets, which never touch the language cookie.
    pub resolution: Option<Resolution>,
    /// Name of the rule that decided.
    pub rule: &'static str,
}

#[derive(Debug)]
pub struct DecisionEngine {
    classifier: PathClassifier,
    policy: AccessPolicy,
    rules: Vec<Box<dyn Rule>>,
}

impl DecisionEngine {
    pub fn new(classifier: PathClassifier, policy: AccessPolicy) -> Self {
        Self {
            classifier,
            policy,
            rules: default_rules(),
        }
    }

    pub fn from_config(config: &GateConfig) -> Result<Self, LanguageError> {
        let languages = Languages::from_config(&config.locale)?;
        let classifier = PathClassifier::new(languages, config.excluded.prefixes.clone());
        Ok(Self::new(classifier, AccessPolicy::from_config(&config.access)))
    }

    pub fn languages(&self) -> &Languages {
        self.classifier.languages()
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn path_facts(&self, path: &str) -> PathFacts {
        match self.classifier.classify(path) {
            Classification::Excluded => PathFacts::Excluded,
            Classification::Routable(classified) => {
                let category = self.policy.categorize(&classified.resource_path);
                PathFacts::Routable {
                    classified,
                    category,
                }
            }
        }
    }

    pub fn evaluate(&self, request: &GateRequest<'_>) -> Evaluation {
        let facts = self.path_facts(request.path);
        self.decide(request, &facts)
    }

    /// Evaluate with precomputed facts for `request.path`.
    pub fn decide(&self, request: &GateRequest<'_>, facts: &PathFacts) -> Evaluation {
        let (classified, category) = match facts {
            PathFacts::Excluded => {
                return Evaluation {
                    decision: RoutingDecision::PassThrough,
                    resolution: None,
                    rule: "excluded_asset",
                }
            }
            PathFacts::Routable {
                classified,
                category,
            } => (classified, *category),
        };

        let resolution = resolve(
            self.languages(),
            classified,
            request.language_cookie,
            request.accept_language,
        );
        let access = self.policy.evaluate(
            &classified.resource_path,
            category,
            request.has_session,
            request.is_logout_redirect,
        );

        let ctx = RuleContext {
            request,
            classified,
            language: &resolution.language,
            access,
            policy: &self.policy,
        };

        let (decision, rule) = self
            .rules
            .iter()
            .find_map(|rule| rule.apply(&ctx).map(|decision| (decision, rule.name())))
            .unwrap_or((RoutingDecision::PassThrough, "fallthrough"));

        Evaluation {
            decision,
            resolution: Some(resolution),
            rule,
        }
    }
}
