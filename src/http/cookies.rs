//! Language cookie synchronization.
//!
//! # Responsibilities
//! - Read the language and session cookies from a request
//! - Compute the minimal cookie mutation for a decision
//! - Attach it to whichever response carries the decision
//!
//! # Design Decisions
//! - No write when the stored value already matches: not even a re-set
//! - Excluded assets never write cookies

use axum::http::{header, HeaderMap, HeaderValue};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::GateConfig;
use crate::routing::Evaluation;

/// Attributes of the language cookie.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub language_cookie: String,
    pub session_cookie: String,
    pub max_age: time::Duration,
}

impl CookieSettings {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            language_cookie: config.locale.cookie_name.clone(),
            session_cookie: config.access.session_cookie.clone(),
            max_age: time::Duration::days(config.locale.cookie_max_age_days),
        }
    }
}

/// The two cookies the gate cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies {
    pub language: Option<String>,
    pub has_session: bool,
}

impl RequestCookies {
    pub fn from_headers(settings: &CookieSettings, headers: &HeaderMap) -> Self {
        let jar = CookieJar::from_headers(headers);
        Self {
            language: jar
                .get(&settings.language_cookie)
                .map(|cookie| cookie.value().to_string()),
            has_session: jar
                .get(&settings.session_cookie)
                .is_some_and(|cookie| !cookie.value().is_empty()),
        }
    }
}

/// The Set-Cookie needed to persist the resolved language, if any.
pub fn synchronize(settings: &CookieSettings, evaluation: &Evaluation) -> Option<Cookie<'static>> {
    let resolution = evaluation.resolution.as_ref()?;
    if !resolution.changed {
        return None;
    }

    Some(
        Cookie::build((
            settings.language_cookie.clone(),
            resolution.language.as_str().to_string(),
        ))
        .path("/")
        .max_age(settings.max_age)
        .same_site(SameSite::Lax)
        .build(),
    )
}

/// Append a Set-Cookie header.
pub fn append_set_cookie(headers: &mut HeaderMap, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(error = %e, "Language cookie is not a valid header value"),
    }
}
