//! Language subsystem.
//!
//! # Data Flow
//! ```text
//! ClassifiedPath + language cookie + Accept-Language
//!     → resolver.rs (fixed precedence, fail-soft)
//!     → Resolution { language, source, changed }
//! ```
//!
//! # Design Decisions
//! - Unsupported codes are never propagated; they simply do not match
//! - The resolver is shared by the server gate and the client context

pub mod language;
pub mod resolver;

pub use language::{LanguageCode, LanguageError, Languages};
pub use resolver::{resolve, LanguageSource, Resolution};
