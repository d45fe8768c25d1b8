//! Legacy bulk push-event translation.
//!
//! Older AirSend firmware pushes batches of events to the callback URL
//! instead of the webhook schema. Processing is best effort throughout:
//! malformed or unrecognized elements are skipped silently, because
//! tolerating unknown device-originated payloads matters more than strict
//! validation here.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use hub_client::{HubApi, StateUpdate};

use crate::clock::now_epoch;
use crate::translator::int_field;

/// Event type code carrying sensor readings.
const SENSOR_EVENT_TYPE: i64 = 3;

/// Interrupt events are kept only when their reliability score lies
/// strictly inside this open interval.
const RELIABILITY_FLOOR: i64 = 0x06;
const RELIABILITY_CEILING: i64 = 0x47;

/// Translates legacy bulk payloads into hub state changes.
#[derive(Clone)]
pub struct LegacyTranslator {
    hub: Arc<dyn HubApi>,
}

impl LegacyTranslator {
    pub fn new(hub: Arc<dyn HubApi>) -> Self {
        Self { hub }
    }

    /// Process a bulk payload.
    ///
    /// Always returns `true`: a payload without the expected `events`
    /// sequence is a silent no-op success.
    pub fn handle_bulk(&self, payload: &Value) -> bool {
        let Some(events) = payload.get("events").and_then(Value::as_array) else {
            return true;
        };

        for event in events {
            let (Some(channel), Some(type_code), Some(thingnotes)) = (
                event.get("channel"),
                event.get("type").and_then(Value::as_i64),
                event.get("thingnotes"),
            ) else {
                continue;
            };
            let timestamp = int_field(event, "timestamp").unwrap_or_else(now_epoch);

            match thingnotes.get("uid") {
                Some(uid) => self.handle_transfer(uid, type_code, thingnotes, timestamp),
                None => self.handle_interrupt(event, channel, type_code, thingnotes, timestamp),
            }
        }

        true
    }

    /// Transfer events address a known device by its identifying token.
    fn handle_transfer(&self, uid: &Value, type_code: i64, thingnotes: &Value, timestamp: i64) {
        let uid = match uid {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let entity = match self.hub.search_entity(&uid) {
            Ok(Some(entity)) => entity,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, uid = %uid, "entity search failed");
                return;
            }
        };

        if (1..=SENSOR_EVENT_TYPE).contains(&type_code) {
            for (kind, value) in decode_notes(thingnotes.get("notes")) {
                self.push_state(Some(entity.clone()), kind, value, timestamp, None);
            }
        } else {
            self.push_state(
                Some(entity),
                "error".to_string(),
                Value::String(format!("error_{type_code}")),
                timestamp,
                None,
            );
        }
    }

    /// Interrupt events carry no identifying token; readings are routed by
    /// (channel, kind), creating entities for channels seen for the first
    /// time.
    fn handle_interrupt(
        &self,
        event: &Value,
        channel: &Value,
        type_code: i64,
        thingnotes: &Value,
        timestamp: i64,
    ) {
        if type_code != SENSOR_EVENT_TYPE {
            return;
        }
        let reliability = event
            .get("reliability")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        if reliability <= RELIABILITY_FLOOR || reliability >= RELIABILITY_CEILING {
            return;
        }

        for (kind, value) in decode_notes(thingnotes.get("notes")) {
            let entities = match self.hub.search_entities(channel, &kind) {
                Ok(entities) => entities,
                Err(e) => {
                    warn!(error = %e, kind = %kind, "entity search failed");
                    continue;
                }
            };
            for entity in &entities {
                self.push_state(
                    Some(entity.clone()),
                    kind.clone(),
                    value.clone(),
                    timestamp,
                    None,
                );
            }
            if entities.is_empty() {
                info!(channel = %channel, kind = %kind, value = %value, "new channel found");
                self.push_state(None, kind, value, timestamp, Some(channel.clone()));
            }
        }
    }

    fn push_state(
        &self,
        entity_id: Option<String>,
        kind: String,
        value: Value,
        timestamp: i64,
        channel: Option<Value>,
    ) {
        let update = StateUpdate {
            entity_id,
            state: kind,
            attribute_state: value,
            timestamp,
            channel,
            attributes: None,
        };
        if let Err(e) = self.hub.set_state(&update) {
            warn!(error = %e, "state push failed");
        }
    }
}

/// Decode `thingnotes.notes` into (kind, value) reading pairs.
///
/// Notes missing a type or value are dropped.
pub fn decode_notes(notes: Option<&Value>) -> Vec<(String, Value)> {
    let Some(list) = notes.and_then(Value::as_array) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|note| {
            let code = note.get("type").and_then(Value::as_i64)?;
            let value = note.get("value")?.clone();
            Some((note_kind(code), value))
        })
        .collect()
}

/// Reading kind for a vendor note type code.
fn note_kind(code: i64) -> String {
    match code {
        0 => "unknown".to_string(),
        1 => "state".to_string(),
        2 => "level".to_string(),
        3 => "temperature".to_string(),
        4 => "humidity".to_string(),
        5 => "illuminance".to_string(),
        other => format!("type_{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingHub;
    use serde_json::json;

    fn translator() -> (LegacyTranslator, Arc<RecordingHub>) {
        let hub = Arc::new(RecordingHub::default());
        (LegacyTranslator::new(hub.clone()), hub)
    }

    fn interrupt_event(reliability: i64) -> Value {
        json!({
            "events": [{
                "channel": {"id": 55, "source": 9},
                "type": 3,
                "reliability": reliability,
                "timestamp": 1_700_000_000,
                "thingnotes": {
                    "notes": [{"type": 3, "value": 21.5}],
                },
            }]
        })
    }

    #[test]
    fn test_missing_events_is_noop_success() {
        let (translator, hub) = translator();
        assert!(translator.handle_bulk(&json!({"other": 1})));
        assert!(translator.handle_bulk(&json!(null)));
        assert!(translator.handle_bulk(&json!({"events": "nope"})));
        assert!(hub.states().is_empty());
    }

    #[test]
    fn test_transfer_event_with_readings() {
        let (translator, hub) = translator();
        hub.register_uid("abc123", "sensor.garden");
        let payload = json!({
            "events": [{
                "channel": {"id": 55},
                "type": 2,
                "timestamp": 1_700_000_000,
                "thingnotes": {
                    "uid": "abc123",
                    "notes": [
                        {"type": 3, "value": 21.5},
                        {"type": 4, "value": 60},
                    ],
                },
            }]
        });
        assert!(translator.handle_bulk(&payload));
        let states = hub.states();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].entity_id.as_deref(), Some("sensor.garden"));
        assert_eq!(states[0].state, "temperature");
        assert_eq!(states[0].attribute_state, json!(21.5));
        assert_eq!(states[1].state, "humidity");
        assert_eq!(states[1].attribute_state, json!(60));
    }

    #[test]
    fn test_transfer_event_unknown_type_pushes_error_state() {
        let (translator, hub) = translator();
        hub.register_uid("abc123", "sensor.garden");
        let payload = json!({
            "events": [{
                "channel": {"id": 55},
                "type": 9,
                "thingnotes": {"uid": "abc123", "notes": []},
            }]
        });
        assert!(translator.handle_bulk(&payload));
        let states = hub.states();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].state, "error");
        assert_eq!(states[0].attribute_state, json!("error_9"));
    }

    #[test]
    fn test_transfer_event_unknown_uid_skipped() {
        let (translator, hub) = translator();
        let payload = json!({
            "events": [{
                "channel": {"id": 55},
                "type": 1,
                "thingnotes": {"uid": "missing", "notes": [{"type": 1, "value": 1}]},
            }]
        });
        assert!(translator.handle_bulk(&payload));
        assert!(hub.states().is_empty());
    }

    #[test]
    fn test_numeric_uid_is_matched_as_string() {
        let (translator, hub) = translator();
        hub.register_uid("98765", "sensor.garden");
        let payload = json!({
            "events": [{
                "channel": {"id": 55},
                "type": 1,
                "thingnotes": {"uid": 98765, "notes": [{"type": 1, "value": 1}]},
            }]
        });
        assert!(translator.handle_bulk(&payload));
        assert_eq!(hub.states().len(), 1);
    }

    #[test]
    fn test_reliability_boundaries() {
        // 6 and 71 sit on the band edges and are both discarded.
        for reliability in [0, 6, 71, 100] {
            let (translator, hub) = translator();
            assert!(translator.handle_bulk(&interrupt_event(reliability)));
            assert!(hub.states().is_empty(), "reliability {reliability}");
        }
        // 7 through 70 inclusive are accepted.
        for reliability in [7, 40, 70] {
            let (translator, hub) = translator();
            assert!(translator.handle_bulk(&interrupt_event(reliability)));
            assert_eq!(hub.states().len(), 1, "reliability {reliability}");
        }
    }

    #[test]
    fn test_interrupt_updates_all_matching_entities() {
        let (translator, hub) = translator();
        let channel = json!({"id": 55, "source": 9});
        hub.register_channel_entity(channel.clone(), "temperature", "sensor.one");
        hub.register_channel_entity(channel.clone(), "temperature", "sensor.two");
        assert!(translator.handle_bulk(&interrupt_event(40)));
        let states = hub.states();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].entity_id.as_deref(), Some("sensor.one"));
        assert_eq!(states[1].entity_id.as_deref(), Some("sensor.two"));
        assert!(states.iter().all(|s| s.channel.is_none()));
    }

    #[test]
    fn test_interrupt_without_match_creates_entity() {
        let (translator, hub) = translator();
        assert!(translator.handle_bulk(&interrupt_event(40)));
        let states = hub.states();
        assert_eq!(states.len(), 1);
        assert!(states[0].entity_id.is_none());
        assert_eq!(states[0].channel, Some(json!({"id": 55, "source": 9})));
        assert_eq!(states[0].state, "temperature");
    }

    #[test]
    fn test_interrupt_ignores_non_sensor_types() {
        let (translator, hub) = translator();
        let payload = json!({
            "events": [{
                "channel": {"id": 55},
                "type": 2,
                "reliability": 40,
                "thingnotes": {"notes": [{"type": 3, "value": 21.5}]},
            }]
        });
        assert!(translator.handle_bulk(&payload));
        assert!(hub.states().is_empty());
    }

    #[test]
    fn test_elements_missing_required_fields_skipped() {
        let (translator, hub) = translator();
        let payload = json!({
            "events": [
                {"channel": {"id": 55}, "type": 3},
                {"type": 3, "thingnotes": {}},
                "not-an-object",
            ]
        });
        assert!(translator.handle_bulk(&payload));
        assert!(hub.states().is_empty());
    }

    #[test]
    fn test_decode_notes_drops_incomplete_entries() {
        let notes = json!([
            {"type": 3, "value": 21.5},
            {"type": 3},
            {"value": 1},
            {"type": 99, "value": 0},
        ]);
        let pairs = decode_notes(Some(&notes));
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("temperature".to_string(), json!(21.5)));
        assert_eq!(pairs[1], ("type_99".to_string(), json!(0)));
    }

    #[test]
    fn test_hub_failures_do_not_abort_batch() {
        let (translator, hub) = translator();
        hub.register_uid("abc123", "sensor.garden");
        hub.fail_set_state();
        let payload = json!({
            "events": [{
                "channel": {"id": 55},
                "type": 1,
                "thingnotes": {"uid": "abc123", "notes": [{"type": 1, "value": 1}]},
            }]
        });
        assert!(translator.handle_bulk(&payload));
    }
}
