//! REST client for the Home Assistant core API.

use std::time::Duration;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::{HubApi, HubError, StateUpdate};

/// Home Assistant REST client.
///
/// All calls carry the bearer credential and use short fixed timeouts;
/// failures surface as [`HubError`] and are never retried.
#[derive(Debug, Clone)]
pub struct HassClient {
    base_url: String,
    token: String,
    agent: ureq::Agent,
}

impl HassClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(5))
                .timeout(Duration::from_secs(5))
                .build(),
        }
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        request.set("Authorization", &format!("Bearer {}", self.token))
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<(), HubError> {
        let request = self.authorize(self.agent.post(url));
        match request.send_json(body) {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, _)) => Err(HubError::Status(code)),
            Err(e) => Err(HubError::Network(e.to_string())),
        }
    }

    /// Fetch the full entity state list.
    fn fetch_states(&self) -> Result<Vec<Value>, HubError> {
        let url = format!("{}/states", self.base_url);
        let response = self
            .authorize(self.agent.get(&url))
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => HubError::Status(code),
                other => HubError::Network(other.to_string()),
            })?;
        response
            .into_json::<Vec<Value>>()
            .map_err(|e| HubError::Parse(e.to_string()))
    }
}

impl HubApi for HassClient {
    fn is_authorized(&self) -> bool {
        !self.token.is_empty()
    }

    fn set_state(&self, update: &StateUpdate) -> Result<(), HubError> {
        let entity_id = match &update.entity_id {
            Some(id) => id.clone(),
            None => generated_entity_id(update.channel.as_ref(), &update.state),
        };

        let mut attributes = Map::new();
        attributes.insert("type".to_string(), Value::String(update.state.clone()));
        if let Some(channel) = &update.channel {
            attributes.insert("channel".to_string(), channel.clone());
        }
        if let Some(Value::Object(extra)) = &update.attributes {
            for (key, value) in extra {
                attributes.insert(key.clone(), value.clone());
            }
        }

        let body = json!({
            "state": render_state(&update.attribute_state),
            "attributes": attributes,
        });

        let url = format!("{}/states/{}", self.base_url, entity_id);
        self.post_json(&url, &body)?;
        debug!(entity = %entity_id, "pushed entity state");
        Ok(())
    }

    fn search_entity(&self, uid: &str) -> Result<Option<String>, HubError> {
        let states = self.fetch_states()?;
        Ok(states.iter().find_map(|entity| {
            let attr_uid = entity.get("attributes")?.get("uid")?;
            if value_matches(attr_uid, uid) {
                entity
                    .get("entity_id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            } else {
                None
            }
        }))
    }

    fn search_entities(&self, channel: &Value, kind: &str) -> Result<Vec<String>, HubError> {
        let states = self.fetch_states()?;
        Ok(states
            .iter()
            .filter_map(|entity| {
                let attributes = entity.get("attributes")?;
                if attributes.get("channel") == Some(channel)
                    && attributes.get("type").and_then(Value::as_str) == Some(kind)
                {
                    entity
                        .get("entity_id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                } else {
                    None
                }
            })
            .collect())
    }

    fn fire_event(&self, event_type: &str, data: &Value) -> Result<(), HubError> {
        let url = format!("{}/events/{}", self.base_url, event_type);
        self.post_json(&url, data)
    }
}

fn render_state(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_matches(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        other => other.to_string() == expected,
    }
}

/// Entity identifier for a previously unseen channel/kind pair.
fn generated_entity_id(channel: Option<&Value>, kind: &str) -> String {
    let channel_slug = match channel {
        Some(value) => slugify(&render_state(value)),
        None => "unknown".to_string(),
    };
    format!("sensor.airsend_{channel_slug}_{kind}")
}

fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut last_underscore = false;
    for c in raw.to_lowercase().chars() {
        let mapped = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '_'
        };
        if mapped == '_' {
            if last_underscore {
                continue;
            }
            last_underscore = true;
        } else {
            last_underscore = false;
        }
        slug.push(mapped);
    }
    slug.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorized_requires_token() {
        assert!(HassClient::new("http://hub/api", "token").is_authorized());
        assert!(!HassClient::new("http://hub/api", "").is_authorized());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HassClient::new("http://hub/api/", "token");
        assert_eq!(client.base_url, "http://hub/api");
    }

    #[test]
    fn test_render_state() {
        assert_eq!(render_state(&Value::String("open".into())), "open");
        assert_eq!(render_state(&json!(21.5)), "21.5");
        assert_eq!(render_state(&json!(7)), "7");
    }

    #[test]
    fn test_value_matches_numbers_and_strings() {
        assert!(value_matches(&json!("abc123"), "abc123"));
        assert!(value_matches(&json!(42), "42"));
        assert!(!value_matches(&json!(42), "43"));
    }

    #[test]
    fn test_generated_entity_id() {
        let id = generated_entity_id(Some(&json!({"id": 55, "source": 9})), "temperature");
        assert_eq!(id, "sensor.airsend_id_55_source_9_temperature");
    }

    #[test]
    fn test_generated_entity_id_without_channel() {
        assert_eq!(
            generated_entity_id(None, "level"),
            "sensor.airsend_unknown_level"
        );
    }
}
