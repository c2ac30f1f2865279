//! The single routing outcome produced per request.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutingDecision {
    /// Continue to the next handler unchanged.
    PassThrough,

    /// Continue to the next handler with `target` as the path. Invisible to the client.
    InternalRewrite { target: String },

    /// Terminate with a 3xx to `target` plus `query`.
    Redirect {
        target: String,
        /// Already-encoded query string, emitted verbatim.
        query: Option<String>,
    },
}

impl RoutingDecision {
    pub fn kind(&self) -> &'static str {
        match self {
            RoutingDecision::PassThrough => "pass_through",
            RoutingDecision::InternalRewrite { .. } => "rewrite",
            RoutingDecision::Redirect { .. } => "redirect",
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, RoutingDecision::Redirect { .. })
    }

    /// Value for the `Location` header of a redirect.
    pub fn location(&self) -> Option<String> {
        match self {
            RoutingDecision::Redirect {
                target,
                query: Some(query),
            } if !query.is_empty() => Some(format!("{target}?{query}")),
            RoutingDecision::Redirect { target, .. } => Some(target.clone()),
            _ => None,
        }
    }
}
