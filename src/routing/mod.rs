//! Routing and access-gate subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (path, query, cookies, Accept-Language)
//!     → classifier.rs (excluded asset? language segment? resource path)
//!     → access.rs (Public/Protected, login or auth-page outcome)
//!     → locale::resolver (effective language)
//!     → rules.rs (ordered rule objects, first match wins)
//!     → engine.rs returns exactly one RoutingDecision
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (segment-aware prefix matching only)
//! - Deterministic: same input always yields the same decision
//! - A redirect always wins over a rewrite

pub mod access;
pub mod classifier;
pub mod decision;
pub mod engine;
pub mod rules;

pub use access::{AccessError, AccessOutcome, AccessPolicy, RouteCategory};
pub use classifier::{localize_path, split_language_prefix, ClassifiedPath, PathClassifier};
pub use decision::RoutingDecision;
pub use engine::{DecisionEngine, Evaluation, GateRequest, PathFacts};
