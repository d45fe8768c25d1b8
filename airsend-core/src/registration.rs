//! Listening registration over the device table.
//!
//! Arming a device for event reception takes two RPCs: one to select the
//! listening channel, one to point the device callback at this process.
//! Registration is idempotent and never raises; every per-device failure
//! is accumulated into counters so one bad device cannot block the rest.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use airsend_config::DeviceTable;
use rpc_client::{BridgeRpc, RpcTarget};

use crate::clock::now_epoch;
use crate::listening::{ListeningRecord, ListeningState};

/// Aggregate outcome of one registration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistrationSummary {
    pub initialized: usize,
    pub failed: usize,
    pub total: usize,
}

/// Arms configured devices for event delivery and persists the outcome.
pub struct RegistrationManager {
    devices: Arc<DeviceTable>,
    default_credential: Option<String>,
    rpc: Arc<dyn BridgeRpc>,
    callback_url: String,
    state_path: PathBuf,
    /// Serializes registration runs so concurrent requests cannot race on
    /// the snapshot file.
    run_lock: Mutex<()>,
}

impl RegistrationManager {
    pub fn new(
        devices: Arc<DeviceTable>,
        default_credential: Option<String>,
        rpc: Arc<dyn BridgeRpc>,
        callback_url: String,
        state_path: PathBuf,
    ) -> Self {
        Self {
            devices,
            default_credential,
            rpc,
            callback_url,
            state_path,
            run_lock: Mutex::new(()),
        }
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Register every listening device, overwriting prior records.
    ///
    /// Safe to call repeatedly; re-registering a device simply replaces its
    /// snapshot entry. `total` counts all configured devices, including
    /// those not set up for listening.
    pub fn register_all(&self) -> RegistrationSummary {
        let _run = self.run_lock.lock();

        let mut state = ListeningState::load(&self.state_path);
        let mut initialized = 0;
        let mut failed = 0;

        for device in self.devices.iter() {
            let Some(channel) = device.channel.as_ref().filter(|c| c.listen) else {
                continue;
            };

            let credential = device
                .credential
                .clone()
                .or_else(|| self.default_credential.clone());
            let (Some(host), Some(credential), Some(channel_id)) =
                (device.host.as_deref(), credential, channel.id)
            else {
                warn!(device = %device.name, "missing configuration for device");
                failed += 1;
                continue;
            };

            let target = RpcTarget {
                host: host.to_string(),
                credential,
                port: device.port,
            };

            if let Err(e) = self
                .rpc
                .call(&target, "setListenChannel", &json!({"channel": channel_id}))
            {
                error!(device = %device.name, error = %e, "failed to set listening channel");
                failed += 1;
                continue;
            }

            match self
                .rpc
                .call(&target, "setCallback", &json!({"url": self.callback_url}))
            {
                Ok(_) => {
                    state.insert(
                        device.name.clone(),
                        ListeningRecord {
                            enabled: true,
                            channel: channel_id,
                            timestamp: now_epoch(),
                        },
                    );
                    initialized += 1;
                    info!(device = %device.name, channel = channel_id, "initialized listening");
                }
                Err(e) => {
                    error!(device = %device.name, error = %e, "failed to set callback");
                    failed += 1;
                }
            }
        }

        if let Err(e) = state.save(&self.state_path) {
            error!(path = %self.state_path.display(), error = %e, "failed to persist listening state");
        }

        RegistrationSummary {
            initialized,
            failed,
            total: self.devices.len(),
        }
    }
}
