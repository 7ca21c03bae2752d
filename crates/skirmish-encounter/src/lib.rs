//! Skirmish Encounter - the action reconciler
//!
//! This crate implements the combat-session controller:
//! - Tagged mutating actions applied optimistically from the synchronous
//!   response
//! - Echo suppression against the broadcast of the local action
//! - Unconditional adoption of foreign broadcast snapshots
//! - Reference-data (weapons, schticks) recomputation and batch refresh

pub mod api;
pub mod controller;

pub use api::*;
pub use controller::*;
