//! Bounded in-memory stores.
//!
//! # Design Decisions
//! - Every store has an explicit capacity and TTL; nothing grows unbounded
//! - Stores are owned by whoever needs them and passed in, never global

pub mod bounded;

pub use bounded::{BoundedCache, CacheStats};
