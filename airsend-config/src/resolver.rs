//! Configuration resolution.
//!
//! Secrets are parsed first so device parsing can resolve `!secret`
//! references; the resulting device table keeps configuration order.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use tracing::warn;

use crate::device::{parse_connection, ChannelConfig, Device, DeviceTable};
use crate::document::{self, Block, Document, Node, Strictness};
use crate::error::ConfigError;
use crate::secrets::SecretStore;

/// Top-level key the device block may sit under.
const DEVICES_KEY: &str = "devices";

/// A non-fatal configuration problem.
///
/// Warnings never abort startup; affected devices stay in the table with
/// whatever data could be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Device has neither a connection string nor explicit host fields.
    MissingConnection { device: String },
    /// Two devices share a (channel, source) pair; the first one configured
    /// shadows the second for inbound event matching.
    ShadowedChannel {
        channel: i64,
        source: i64,
        first: String,
        second: String,
    },
    /// A document-level parse warning.
    Document { line: usize, message: String },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::MissingConnection { device } => {
                write!(f, "device '{device}' has no connection configuration")
            }
            ConfigWarning::ShadowedChannel {
                channel,
                source,
                first,
                second,
            } => write!(
                f,
                "devices '{first}' and '{second}' share channel {channel}/{source}; \
                 '{second}' will never receive events"
            ),
            ConfigWarning::Document { line, message } => {
                write!(f, "document line {line}: {message}")
            }
        }
    }
}

/// Fully resolved configuration: secrets, device table, and any warnings
/// collected along the way.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub secrets: SecretStore,
    pub devices: DeviceTable,
    pub warnings: Vec<ConfigWarning>,
}

/// Resolve configuration from raw document text.
pub fn resolve(
    secrets_text: &str,
    devices_text: &str,
    strictness: Strictness,
) -> Result<ResolvedConfig, ConfigError> {
    let mut warnings = Vec::new();

    let secrets_doc = document::parse(secrets_text, strictness)?;
    collect_document_warnings(&secrets_doc, &mut warnings);
    let secrets = SecretStore::from_block(&secrets_doc.root);

    let devices_doc = document::parse(devices_text, strictness)?;
    collect_document_warnings(&devices_doc, &mut warnings);

    let devices = build_devices(&devices_doc.root, &secrets, &mut warnings);
    validate_channels(&devices, &mut warnings);

    for warning in &warnings {
        warn!(%warning, "configuration warning");
    }

    Ok(ResolvedConfig {
        secrets,
        devices: DeviceTable::from_devices(devices),
        warnings,
    })
}

/// Resolve configuration from files on disk.
///
/// A missing file is treated as an empty document, matching the add-on's
/// historical tolerance for absent configuration; other I/O failures are
/// returned as errors.
pub fn load_files(
    secrets_path: &Path,
    devices_path: &Path,
    strictness: Strictness,
) -> Result<ResolvedConfig, ConfigError> {
    let secrets_text = read_optional(secrets_path)?;
    let devices_text = read_optional(devices_path)?;
    resolve(&secrets_text, &devices_text, strictness)
}

fn read_optional(path: &Path) -> Result<String, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "configuration file not found");
            Ok(String::new())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

fn collect_document_warnings(doc: &Document, warnings: &mut Vec<ConfigWarning>) {
    warnings.extend(doc.warnings.iter().map(|w| ConfigWarning::Document {
        line: w.line,
        message: w.message.clone(),
    }));
}

fn build_devices(
    root: &Block,
    secrets: &SecretStore,
    warnings: &mut Vec<ConfigWarning>,
) -> Vec<Device> {
    // Devices may sit under a top-level `devices` key or at the root.
    let device_block = root
        .get(DEVICES_KEY)
        .and_then(Node::as_block)
        .unwrap_or(root);

    device_block
        .entries()
        .map(|(name, node)| build_device(name, node, secrets, warnings))
        .collect()
}

fn build_device(
    name: &str,
    node: &Node,
    secrets: &SecretStore,
    warnings: &mut Vec<ConfigWarning>,
) -> Device {
    let mut device = Device {
        name: name.to_string(),
        ..Device::default()
    };

    if let Some(block) = node.as_block() {
        device.host = block.get("ip").and_then(Node::as_str);
        device.credential = block.get("password").and_then(Node::as_str);
        device.port = block
            .get("port")
            .and_then(Node::as_i64)
            .and_then(|p| u16::try_from(p).ok());
        device.device_type = block.get("type").and_then(Node::as_i64);
        device.channel = block.get("channel").and_then(Node::as_block).map(|c| {
            ChannelConfig {
                id: c.get("id").and_then(Node::as_i64),
                source: c.get("source").and_then(Node::as_i64),
                listen: c.get("listen").and_then(Node::as_bool).unwrap_or(false),
            }
        });

        if let Some(raw) = block.get("spurl").and_then(Node::as_str) {
            let resolved = secrets.resolve(&raw);
            if let Some(parts) = parse_connection(&resolved) {
                device.credential = Some(parts.credential);
                device.host = Some(parts.host);
                if parts.port.is_some() {
                    device.port = parts.port;
                }
            }
            device.connection = Some(resolved);
        }
    }

    if device.connection.is_none() && device.host.is_none() {
        warnings.push(ConfigWarning::MissingConnection {
            device: device.name.clone(),
        });
    }

    device
}

fn validate_channels(devices: &[Device], warnings: &mut Vec<ConfigWarning>) {
    let mut seen: HashMap<(i64, i64), &str> = HashMap::new();
    for device in devices {
        let Some(channel) = &device.channel else {
            continue;
        };
        let (Some(id), Some(source)) = (channel.id, channel.source) else {
            continue;
        };
        match seen.get(&(id, source)) {
            Some(first) => warnings.push(ConfigWarning::ShadowedChannel {
                channel: id,
                source,
                first: (*first).to_string(),
                second: device.name.clone(),
            }),
            None => {
                seen.insert((id, source), device.name.as_str());
            }
        }
    }
}
