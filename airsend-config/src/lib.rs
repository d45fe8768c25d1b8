//! Configuration resolution for the AirSend reception bridge.
//!
//! This crate turns the two add-on configuration documents (device
//! definitions and secrets) into an immutable, fully resolved view:
//!
//! - [`document`]: recursive-descent parser for the indentation-based
//!   key-value format, with an explicit [`Strictness`] policy.
//! - [`SecretStore`]: secret lookup and `!secret` reference resolution.
//! - [`Device`] / [`DeviceTable`]: ordered device definitions with parsed
//!   connection credentials.
//! - [`resolve`] / [`load_files`]: the resolver tying it all together and
//!   collecting non-fatal [`ConfigWarning`]s.
//!
//! The resolver runs once at startup; everything it produces is read-only
//! afterwards and safe for unsynchronized concurrent reads.

pub mod document;

mod device;
mod error;
mod resolver;
mod secrets;

pub use device::{parse_connection, ChannelConfig, ConnectionParts, Device, DeviceTable};
pub use document::{Block, Node, Scalar, Strictness};
pub use error::{ConfigError, DocumentError};
pub use resolver::{load_files, resolve, ConfigWarning, ResolvedConfig};
pub use secrets::{SecretStore, DEFAULT_CREDENTIAL_SECRET, SECRET_PREFIX};
