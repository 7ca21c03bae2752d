//! Skirmish Client - conditional read/write path
//!
//! This crate is the cache's primary consumer:
//! - `ResourceClient` seam over the remote mutation/query surface
//! - Conditional reads: validator preconditions, not-modified short-circuit,
//!   and the evicted-payload single retry
//! - Coarse write-path invalidation (exact path plus collection prefix)

pub mod api;
pub mod gateway;

pub use api::*;
pub use gateway::*;
