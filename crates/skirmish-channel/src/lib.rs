//! Skirmish Channel - Real-time update broadcaster
//!
//! This crate manages the persistent push channels:
//! - Transport seam (opaque collaborator opening named channels)
//! - Subscription registry with idempotent unsubscribe handles
//! - Push demultiplexing by entity-type key with per-callback isolation
//! - Campaign-scoped and user-scoped channel lifecycle

pub mod transport;
pub mod registry;
pub mod dispatch;
pub mod channel;

pub use transport::*;
pub use registry::*;
pub use dispatch::*;
pub use channel::*;
