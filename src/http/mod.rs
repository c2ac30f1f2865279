//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, timeout)
//!     → middleware/gate.rs (routing decision: pass, rewrite or redirect)
//!     → cookies.rs (language cookie sync on the outgoing response)
//!     → server.rs forward_handler (upstream clinic application)
//!     → Send to client
//! ```

pub mod cookies;
pub mod middleware;
pub mod server;

pub use middleware::{GateContext, X_GATE_LANGUAGE};
pub use server::{AppState, GateError, GateRuntime, GateServer};
