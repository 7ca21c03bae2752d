//! Remote resource surface - the external collaborator contract
//!
//! Reads may carry a conditional precondition (the cached validator) and
//! return a fresh payload plus a new validator, or report "unchanged".
//! Mutations return the authoritative result payload.

use serde_json::Value;
use skirmish_core::SkirmishResult;

/// Mutating verbs against a resource path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Create,
    Update,
    Delete,
}

/// Whether a conditional read produced new data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchStatus {
    /// Fresh payload returned
    Fresh,
    /// Resource unchanged since the supplied precondition
    NotModified,
}

/// Result of one read against the remote surface
#[derive(Clone, Debug)]
pub struct FetchOutcome {
    pub status: FetchStatus,
    /// Present on fresh responses
    pub payload: Option<Value>,
    /// Validator token for the returned representation, when the server
    /// provides one
    pub validator: Option<String>,
}

impl FetchOutcome {
    pub fn fresh(payload: Value, validator: Option<String>) -> Self {
        FetchOutcome {
            status: FetchStatus::Fresh,
            payload: Some(payload),
            validator,
        }
    }

    pub fn not_modified() -> Self {
        FetchOutcome {
            status: FetchStatus::NotModified,
            payload: None,
            validator: None,
        }
    }
}

/// The remote mutation/query surface. Implementations own authentication
/// and the wire; this core only sees payloads and validator tokens.
#[allow(async_fn_in_trait)]
pub trait ResourceClient {
    /// Read a resource, optionally under a conditional precondition.
    async fn get(
        &self,
        path: &str,
        params: &[(&str, &str)],
        precondition: Option<&str>,
    ) -> SkirmishResult<FetchOutcome>;

    /// Issue a mutating call and return the authoritative result payload.
    async fn mutate(&self, method: Method, path: &str, body: &Value) -> SkirmishResult<Value>;
}
