//! Home Assistant REST capability for the AirSend reception bridge.
//!
//! The translation engine consumes the hub as an opaque capability: it can
//! push entity states, search entities, and fire custom events. That
//! capability is the [`HubApi`] trait; [`HassClient`] is the real REST
//! implementation against the Home Assistant core API.

mod client;
mod error;

pub use client::HassClient;
pub use error::HubError;

use serde_json::Value;

/// A single entity state push.
///
/// `entity_id` may be unset for auto-registration pushes: the hub client
/// then derives a fresh entity identifier from the raw channel descriptor
/// so a previously unseen channel gets an entity of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    pub entity_id: Option<String>,
    /// The state keyword (a normalized command, or a reading kind).
    pub state: String,
    /// The value mirrored into the entity attributes.
    pub attribute_state: Value,
    /// Event time, seconds since the epoch.
    pub timestamp: i64,
    /// Raw channel descriptor, present only on auto-registration pushes.
    pub channel: Option<Value>,
    /// Extra attributes merged into the entity attributes.
    pub attributes: Option<Value>,
}

/// The hub capability consumed by the translation engine.
pub trait HubApi: Send + Sync {
    /// Whether the client holds a usable hub credential.
    fn is_authorized(&self) -> bool;

    /// Push an entity state to the hub.
    fn set_state(&self, update: &StateUpdate) -> Result<(), HubError>;

    /// Resolve an entity by its identifying device token.
    fn search_entity(&self, uid: &str) -> Result<Option<String>, HubError>;

    /// All entities registered for a (channel, reading-kind) pair.
    fn search_entities(&self, channel: &Value, kind: &str) -> Result<Vec<String>, HubError>;

    /// Fire a custom hub event.
    fn fire_event(&self, event_type: &str, data: &Value) -> Result<(), HubError>;
}
