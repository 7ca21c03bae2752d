//! Skirmish Core - Fundamental types for the campaign sync engine
//!
//! This crate defines the types shared by every other skirmish crate:
//! - Identifiers (UserId, CampaignId, FightId, ActionId, ...)
//! - The encounter model (Fight, ShotSlot, Character, reference entities)
//! - Push-message shapes delivered over the real-time channel
//! - Error taxonomy and result alias

pub mod id;
pub mod model;
pub mod push;
pub mod error;

pub use id::*;
pub use model::*;
pub use push::*;
pub use error::*;
