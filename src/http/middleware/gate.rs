//! Gate middleware.
//! Applies the routing decision to every request before it reaches the upstream.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use url::form_urlencoded;

use crate::http::cookies::{append_set_cookie, synchronize, RequestCookies};
use crate::http::server::AppState;
use crate::locale::LanguageCode;
use crate::observability::metrics;
use crate::routing::{Evaluation, GateRequest, RoutingDecision};

/// Header telling the upstream which language the gate resolved.
pub const X_GATE_LANGUAGE: &str = "x-gate-language";

/// Context attached to requests the gate lets through.
#[derive(Clone, Debug)]
pub struct GateContext {
    pub language: LanguageCode,
    /// Path as the client sent it, before any rewrite.
    pub original_path: String,
}

pub async fn gate_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let runtime = state.runtime.load_full();

    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let cookies = RequestCookies::from_headers(&runtime.cookies, request.headers());
    let accept_language = request
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let is_logout_redirect = query
        .as_deref()
        .is_some_and(|q| is_logout_hint(q, &runtime.logout_param));

    let gate_request = GateRequest {
        path: &path,
        query: query.as_deref(),
        language_cookie: cookies.language.as_deref(),
        accept_language: accept_language.as_deref(),
        has_session: cookies.has_session,
        is_logout_redirect,
    };

    let facts = runtime.path_facts(&path);
    let evaluation = runtime.engine.decide(&gate_request, &facts);
    let cookie = synchronize(&runtime.cookies, &evaluation);

    metrics::record_decision(evaluation.decision.kind(), evaluation.rule, started);
    tracing::debug!(
        path = %path,
        language = evaluation.resolution.as_ref().map(|r| r.language.as_str()),
        decision = evaluation.decision.kind(),
        rule = evaluation.rule,
        cookie_write = cookie.is_some(),
        "Gate decision"
    );

    let mut response = match &evaluation.decision {
        RoutingDecision::Redirect { .. } => match evaluation.decision.location() {
            Some(location) => Redirect::temporary(&location).into_response(),
            None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        },
        RoutingDecision::InternalRewrite { target } => {
            match rewrite_uri(target, query.as_deref()) {
                Ok(uri) => *request.uri_mut() = uri,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Rewrite target is not a valid URI");
                    return (StatusCode::BAD_REQUEST, "Invalid request path").into_response();
                }
            }
            attach_context(&mut request, &evaluation, &path);
            next.run(request).await
        }
        RoutingDecision::PassThrough => {
            attach_context(&mut request, &evaluation, &path);
            next.run(request).await
        }
    };

    if let Some(cookie) = cookie {
        metrics::record_cookie_write(cookie.value());
        append_set_cookie(response.headers_mut(), &cookie);
    }
    response
}

pub(crate) fn is_logout_hint(query: &str, param: &str) -> bool {
    form_urlencoded::parse(query.as_bytes())
        .any(|(key, value)| key == param && (value == "true" || value == "1"))
}

fn rewrite_uri(target: &str, query: Option<&str>) -> Result<Uri, axum::http::Error> {
    let path_and_query = match query {
        Some(query) if !query.is_empty() => format!("{target}?{query}"),
        _ => target.to_string(),
    };
    Uri::builder().path_and_query(path_and_query).build()
}

fn attach_context(request: &mut Request<Body>, evaluation: &Evaluation, original_path: &str) {
    let Some(resolution) = &evaluation.resolution else {
        return;
    };
    if let Ok(value) = HeaderValue::from_str(resolution.language.as_str()) {
        request.headers_mut().insert(X_GATE_LANGUAGE, value);
    }
    request.extensions_mut().insert(GateContext {
        language: resolution.language.clone(),
        original_path: original_path.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logout_hint() {
        assert!(is_logout_hint("logout=true", "logout"));
        assert!(is_logout_hint("a=1&logout=1", "logout"));
        assert!(!is_logout_hint("logout=false", "logout"));
        assert!(!is_logout_hint("logged_out=true", "logout"));
        assert!(!is_logout_hint("", "logout"));
    }

    #[test]
    fn test_rewrite_uri_keeps_query() {
        assert_eq!(
            rewrite_uri("/clinic/patients", Some("page=2")).unwrap(),
            "/clinic/patients?page=2"
        );
        assert_eq!(rewrite_uri("/", None).unwrap(), "/");
        assert_eq!(rewrite_uri("/x", Some("")).unwrap(), "/x");
    }
}
