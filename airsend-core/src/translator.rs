//! Webhook radio-event translation.
//!
//! Inbound webhook events carry a physical remote press forwarded by an
//! AirSend device. Translation matches the event to a configured device,
//! normalizes the vendor command, and pushes the resulting state to the
//! hub, followed by a secondary notification event for automations.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, info, warn};

use airsend_config::DeviceTable;
use hub_client::{HubApi, StateUpdate};

use crate::clock::{iso8601, now_epoch};
use crate::command::map_command;
use crate::entity::entity_id;

/// Hub event fired after a successful state push.
pub const REMOTE_PRESSED_EVENT: &str = "airsend_remote_pressed";

/// An inbound webhook payload.
///
/// Fields are extracted leniently: devices in the field send numeric
/// fields both as numbers and as decimal strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadioEvent {
    pub method: Option<String>,
    pub channel: Option<i64>,
    pub source: Option<i64>,
    pub command: Option<String>,
    pub timestamp: Option<i64>,
}

impl RadioEvent {
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            method: string_field(payload, "method"),
            channel: int_field(payload, "channel"),
            source: int_field(payload, "source"),
            command: string_field(payload, "command"),
            timestamp: int_field(payload, "timestamp"),
        }
    }
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub(crate) fn int_field(payload: &Value, key: &str) -> Option<i64> {
    let value = payload.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Translates webhook radio events into hub state changes.
#[derive(Clone)]
pub struct EventTranslator {
    devices: Arc<DeviceTable>,
    hub: Arc<dyn HubApi>,
}

impl EventTranslator {
    pub fn new(devices: Arc<DeviceTable>, hub: Arc<dyn HubApi>) -> Self {
        Self { devices, hub }
    }

    /// Handle one radio event; the result reflects only the primary state
    /// push (the secondary notification is best-effort).
    pub fn handle(&self, event: &RadioEvent) -> bool {
        let (Some(method), Some(channel), Some(source), Some(command)) = (
            event.method.as_deref(),
            event.channel,
            event.source,
            event.command.as_deref(),
        ) else {
            warn!(?event, "invalid radio event format");
            return false;
        };
        if method != "radio" {
            warn!(method, "invalid radio event format");
            return false;
        }

        // First match in configuration order wins; a later device sharing
        // the same pair is shadowed.
        let Some(device) = self.devices.find_by_channel(channel, source) else {
            warn!(channel, source, "no matching device found");
            return false;
        };

        let state = map_command(command);
        let entity = entity_id(&device.name, device.device_type);
        let timestamp = event.timestamp.unwrap_or_else(now_epoch);

        let update = StateUpdate {
            entity_id: Some(entity.clone()),
            state: state.to_string(),
            attribute_state: Value::String(state.to_string()),
            timestamp,
            channel: None,
            attributes: Some(json!({
                "source": "physical_remote",
                "channel": channel,
                "command": command,
                "last_updated": iso8601(timestamp),
            })),
        };

        match self.hub.set_state(&update) {
            Ok(()) => {
                info!(entity = %entity, state, device = %device.name, "updated hub entity");
                let data = json!({
                    "entity_id": entity,
                    "state": state,
                    "command": command,
                    "device_name": device.name,
                    "source": "airsend_reception",
                });
                if let Err(e) = self.hub.fire_event(REMOTE_PRESSED_EVENT, &data) {
                    warn!(error = %e, entity = %entity, "failed to fire remote-pressed event");
                }
                true
            }
            Err(e) => {
                error!(error = %e, entity = %entity, "state push failed");
                false
            }
        }
    }
}
