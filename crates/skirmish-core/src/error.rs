//! Error types for the skirmish engine

use thiserror::Error;

/// Errors surfaced by the sync core.
///
/// Everything here is recoverable from the caller's point of view; nothing
/// in this core leaves the encounter snapshot partially updated.
#[derive(Error, Debug)]
pub enum SkirmishError {
    // Transport errors
    #[error("transport error: {0}")]
    Transport(String),

    #[error("channel closed")]
    ChannelClosed,

    // Remote API errors
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("malformed payload: {0}")]
    Decode(String),

    // Encounter errors
    #[error("no active fight")]
    NoFight,

    #[error("reference fetch failed: {0}")]
    ReferenceFetch(String),
}

impl SkirmishError {
    /// Whether the error should be shown as a non-blocking warning rather
    /// than an operation failure.
    pub fn is_warning(&self) -> bool {
        matches!(self, SkirmishError::ReferenceFetch(_))
    }
}

/// Result type for skirmish operations
pub type SkirmishResult<T> = Result<T, SkirmishError>;
