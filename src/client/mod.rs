//! Browser-side locale context.
//!
//! # Data Flow
//! ```text
//! Page load / history move
//!     → context.rs mount() (URL prefix > cookie > default)
//!     → InSync | Adopted (no navigation) | Corrected (one history replace)
//!
//! User picks a language
//!     → context.rs set_language() (guarded)
//!     → cookie write + one history replace
//! ```

pub mod browser;
pub mod context;

pub use browser::{Browser, Location, MemoryBrowser, Navigation};
pub use context::{LocaleContext, Reconciliation, SwitchOutcome};
