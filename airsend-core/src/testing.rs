//! In-memory collaborator fakes shared by the engine tests.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use serde_json::{json, Value};

use hub_client::{HubApi, HubError, StateUpdate};
use rpc_client::{BridgeRpc, RpcError, RpcTarget};

/// Hub fake recording every push and answering searches from fixtures.
#[derive(Default)]
pub(crate) struct RecordingHub {
    states: Mutex<Vec<StateUpdate>>,
    events: Mutex<Vec<(String, Value)>>,
    uid_entities: Mutex<HashMap<String, String>>,
    channel_entities: Mutex<Vec<(Value, String, String)>>,
    set_state_fails: Mutex<bool>,
    fire_event_fails: Mutex<bool>,
}

impl RecordingHub {
    pub fn states(&self) -> Vec<StateUpdate> {
        self.states.lock().clone()
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().clone()
    }

    pub fn fail_set_state(&self) {
        *self.set_state_fails.lock() = true;
    }

    pub fn fail_fire_event(&self) {
        *self.fire_event_fails.lock() = true;
    }

    pub fn register_uid(&self, uid: &str, entity: &str) {
        self.uid_entities
            .lock()
            .insert(uid.to_string(), entity.to_string());
    }

    pub fn register_channel_entity(&self, channel: Value, kind: &str, entity: &str) {
        self.channel_entities
            .lock()
            .push((channel, kind.to_string(), entity.to_string()));
    }
}

impl HubApi for RecordingHub {
    fn is_authorized(&self) -> bool {
        true
    }

    fn set_state(&self, update: &StateUpdate) -> Result<(), HubError> {
        if *self.set_state_fails.lock() {
            return Err(HubError::Status(500));
        }
        self.states.lock().push(update.clone());
        Ok(())
    }

    fn search_entity(&self, uid: &str) -> Result<Option<String>, HubError> {
        Ok(self.uid_entities.lock().get(uid).cloned())
    }

    fn search_entities(&self, channel: &Value, kind: &str) -> Result<Vec<String>, HubError> {
        Ok(self
            .channel_entities
            .lock()
            .iter()
            .filter(|(c, k, _)| c == channel && k == kind)
            .map(|(_, _, entity)| entity.clone())
            .collect())
    }

    fn fire_event(&self, event_type: &str, data: &Value) -> Result<(), HubError> {
        if *self.fire_event_fails.lock() {
            return Err(HubError::Status(500));
        }
        self.events
            .lock()
            .push((event_type.to_string(), data.clone()));
        Ok(())
    }
}

/// RPC fake recording every call; selected methods can be made to fail.
#[derive(Default)]
pub(crate) struct RecordingRpc {
    calls: Mutex<Vec<(RpcTarget, String, Value)>>,
    failing_methods: Mutex<HashSet<String>>,
}

impl RecordingRpc {
    pub fn calls(&self) -> Vec<(RpcTarget, String, Value)> {
        self.calls.lock().clone()
    }

    pub fn methods_called(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, m, _)| m.clone()).collect()
    }

    pub fn fail_method(&self, method: &str) {
        self.failing_methods.lock().insert(method.to_string());
    }
}

impl BridgeRpc for RecordingRpc {
    fn call(&self, target: &RpcTarget, method: &str, params: &Value) -> Result<Value, RpcError> {
        self.calls
            .lock()
            .push((target.clone(), method.to_string(), params.clone()));
        if self.failing_methods.lock().contains(method) {
            return Err(RpcError::Status(500));
        }
        Ok(json!({"status": "ok"}))
    }
}
