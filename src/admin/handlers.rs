use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::config::{AccessConfig, ExcludedConfig, LocaleConfig};
use crate::http::cookies::synchronize;
use crate::http::middleware::gate::is_logout_hint;
use crate::http::server::AppState;
use crate::locale::{LanguageCode, LanguageSource};
use crate::routing::{GateRequest, RoutingDecision};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub rules: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct ActiveConfig {
    pub locale: LocaleConfig,
    pub access: AccessConfig,
    pub excluded: ExcludedConfig,
}

/// Dry-run input for `POST /admin/resolve`.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub path: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub language_cookie: Option<String>,
    #[serde(default)]
    pub session: bool,
    #[serde(default)]
    pub accept_language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub decision: RoutingDecision,
    /// Whether the browser would see a new URL.
    pub redirect: bool,
    /// `Location` header value for redirects.
    pub location: Option<String>,
    pub rule: &'static str,
    pub language: Option<LanguageCode>,
    pub source: Option<LanguageSource>,
    /// `Set-Cookie` value the gate would emit.
    pub set_cookie: Option<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let runtime = state.runtime.load();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        rules: runtime.engine.rule_names(),
    })
}

pub async fn get_config(State(state): State<AppState>) -> Json<ActiveConfig> {
    let runtime = state.runtime.load();
    Json(ActiveConfig {
        locale: runtime.config.locale.clone(),
        access: runtime.config.access.clone(),
        excluded: runtime.config.excluded.clone(),
    })
}

pub async fn get_cache(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.runtime.load().facts.stats())
}

/// Evaluate a request without serving it. Does not touch the facts cache.
pub async fn post_resolve(
    State(state): State<AppState>,
    Json(body): Json<ResolveRequest>,
) -> Json<ResolveResponse> {
    let runtime = state.runtime.load_full();
    let is_logout_redirect = body
        .query
        .as_deref()
        .is_some_and(|q| is_logout_hint(q, &runtime.logout_param));

    let request = GateRequest {
        path: &body.path,
        query: body.query.as_deref(),
        language_cookie: body.language_cookie.as_deref(),
        accept_language: body.accept_language.as_deref(),
        has_session: body.session,
        is_logout_redirect,
    };
    let evaluation = runtime.engine.evaluate(&request);
    let set_cookie = synchronize(&runtime.cookies, &evaluation).map(|c| c.to_string());

    Json(ResolveResponse {
        redirect: evaluation.decision.is_redirect(),
        location: evaluation.decision.location(),
        rule: evaluation.rule,
        language: evaluation.resolution.as_ref().map(|r| r.language.clone()),
        source: evaluation.resolution.as_ref().map(|r| r.source),
        set_cookie,
        decision: evaluation.decision,
    })
}
