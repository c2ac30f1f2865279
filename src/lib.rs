//! Clinic gate library: locale-aware routing and access control for the
//! clinic web application.

pub mod admin;
pub mod cache;
pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod locale;
pub mod observability;
pub mod routing;

pub use config::schema::GateConfig;
pub use http::GateServer;
pub use lifecycle::Shutdown;
