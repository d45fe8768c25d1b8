//! Persisted listening-registration snapshot.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-device listening registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningRecord {
    pub enabled: bool,
    pub channel: i64,
    pub timestamp: i64,
}

/// Snapshot of all listening registrations, keyed by device name.
///
/// The snapshot is a single flat file, fully overwritten on every
/// registration run; it is not an append log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningState {
    #[serde(flatten)]
    records: BTreeMap<String, ListeningRecord>,
}

impl ListeningState {
    /// Load the snapshot from disk.
    ///
    /// A missing or unreadable file yields an empty snapshot; a corrupt
    /// file is logged and discarded rather than propagated.
    pub fn load(path: &Path) -> Self {
        let Ok(text) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&text) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding corrupt listening snapshot");
                Self::default()
            }
        }
    }

    /// Persist the snapshot, replacing any previous content.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    pub fn insert(&mut self, device: String, record: ListeningRecord) {
        self.records.insert(device, record);
    }

    pub fn get(&self, device: &str) -> Option<&ListeningRecord> {
        self.records.get(device)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
