//! Request middleware.

pub mod gate;

pub use gate::{gate_middleware, GateContext, X_GATE_LANGUAGE};
