//! Push-message shapes delivered over the real-time channel
//!
//! An inbound push is a flat map from entity-type key to either a full
//! entity payload or a string sentinel meaning "this collection changed,
//! refetch it". The union is explicit here; the channel layer routes by key
//! and passes payloads through uninterpreted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known entity-type keys in the push vocabulary
pub const ENTITY_FIGHT: &str = "fight";
pub const ENTITY_CHARACTER: &str = "character";
pub const ENTITY_VEHICLE: &str = "vehicle";
pub const ENTITY_WEAPON: &str = "weapon";
pub const ENTITY_SCHTICK: &str = "schtick";
pub const ENTITY_CAMPAIGN: &str = "campaign";
pub const ENTITY_INVITE: &str = "invite";
pub const ENTITY_USER: &str = "user";
pub const ENTITY_NOTIFICATION: &str = "notification";

/// Sentinel value a server sends instead of an entity payload
pub const RELOAD_SIGNAL: &str = "reload";

/// One value in a push message: either the reload sentinel or a full
/// entity payload. Deserialization is structural: a JSON string is a
/// reload signal, anything else is an entity payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PushPayload {
    /// Collection-changed sentinel, carried verbatim
    Reload(String),
    /// Full entity payload, uninterpreted at this layer
    Entity(serde_json::Value),
}

impl PushPayload {
    pub fn reload() -> Self {
        PushPayload::Reload(RELOAD_SIGNAL.to_string())
    }

    pub fn is_reload(&self) -> bool {
        matches!(self, PushPayload::Reload(_))
    }

    /// The entity payload, if this is not a reload signal.
    pub fn entity(&self) -> Option<&serde_json::Value> {
        match self {
            PushPayload::Entity(value) => Some(value),
            PushPayload::Reload(_) => None,
        }
    }

    /// Whether the payload is entity-shaped (a JSON object). Used for the
    /// structural notification check on the user channel.
    pub fn is_entity_shaped(&self) -> bool {
        matches!(self, PushPayload::Entity(serde_json::Value::Object(_)))
    }
}

/// A single inbound push: entity-type key to payload. One message may carry
/// several keys at once; map order keeps routing deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PushMessage(pub BTreeMap<String, PushPayload>);

impl PushMessage {
    pub fn new() -> Self {
        PushMessage::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, payload: PushPayload) -> &mut Self {
        self.0.insert(key.into(), payload);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PushPayload> {
        self.0.get(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &PushPayload)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
