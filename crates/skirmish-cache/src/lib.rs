//! Skirmish Conditional Cache - validator/payload store for conditional reads
//!
//! This crate implements the leaf component of the sync core:
//! - Composite keys with order-independent query parameters
//! - Bounded store with true least-recently-used eviction
//! - Time-limited entries (expired entries are logically absent)
//! - Exact and prefix invalidation for the coarse write-path policy

pub mod key;
pub mod cache;

pub use key::*;
pub use cache::*;
