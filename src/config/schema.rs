//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the clinic gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The clinic application the gate forwards to.
    pub upstream: UpstreamConfig,

    /// Supported languages and the language cookie.
    pub locale: LocaleConfig,

    /// Public paths, auth pages and the session cookie.
    pub access: AccessConfig,

    /// Paths that bypass the gate entirely.
    pub excluded: ExcludedConfig,

    /// Classification memo settings.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Timeout for a single upstream exchange in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Language configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Supported language codes, in display order.
    pub supported: Vec<String>,

    /// Language used when nothing else matches. Must be in `supported`.
    pub default: String,

    /// Name of the persisted language preference cookie.
    pub cookie_name: String,

    /// Lifetime of the language cookie in days.
    pub cookie_max_age_days: i64,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            supported: vec!["ar".to_string(), "en".to_string(), "fr".to_string()],
            default: "ar".to_string(),
            cookie_name: "language".to_string(),
            cookie_max_age_days: 30,
        }
    }
}

/// Access rules configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Paths reachable without a session. `/` matches exactly, every
    /// other entry matches itself and everything below it.
    pub public_paths: Vec<String>,

    /// Prefix of the authentication pages (login, register, reset).
    pub auth_prefix: String,

    /// Login page, language-stripped.
    pub login_path: String,

    /// Query parameter carrying the post-login destination.
    pub callback_param: String,

    /// Cookie whose presence marks an authenticated session.
    pub session_cookie: String,

    /// Query parameter set by the client when navigating away after logout.
    pub logout_param: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            public_paths: vec![
                "/".to_string(),
                "/auth".to_string(),
                "/about".to_string(),
                "/contact".to_string(),
                "/privacy".to_string(),
                "/terms".to_string(),
            ],
            auth_prefix: "/auth".to_string(),
            login_path: "/auth/login".to_string(),
            callback_param: "callbackUrl".to_string(),
            session_cookie: "session_token".to_string(),
            logout_param: "logout".to_string(),
        }
    }
}

/// Paths that never reach the gate rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExcludedConfig {
    /// Framework internals and static trees.
    pub prefixes: Vec<String>,
}

impl Default for ExcludedConfig {
    fn default() -> Self {
        Self {
            prefixes: vec![
                "/_next".to_string(),
                "/api".to_string(),
                "/static".to_string(),
                "/images".to_string(),
                "/favicon.ico".to_string(),
                "/robots.txt".to_string(),
                "/sitemap.xml".to_string(),
            ],
        }
    }
}

/// Classification memo configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of memoized paths.
    pub capacity: usize,

    /// Entry lifetime in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 4096,
            ttl_secs: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
