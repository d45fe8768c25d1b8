//! Translation and registration engine for the AirSend reception bridge.
//!
//! This crate holds the decision logic of the bridge:
//!
//! - [`EventTranslator`]: webhook radio events → hub state changes.
//! - [`LegacyTranslator`]: legacy bulk push events → hub state changes.
//! - [`RegistrationManager`]: arms devices for event reception over the
//!   device RPC capability and persists the [`ListeningState`] snapshot.
//! - [`command`] / [`entity`]: vendor command normalization and hub entity
//!   identifier derivation.
//!
//! Collaborators (the hub REST API and the device RPC transport) are
//! consumed through the `HubApi` and `BridgeRpc` traits so the engine can
//! be exercised without a network.

pub mod command;
pub mod entity;

mod clock;
mod legacy;
mod listening;
mod registration;
mod translator;

#[cfg(test)]
mod testing;

pub use legacy::{decode_notes, LegacyTranslator};
pub use listening::{ListeningRecord, ListeningState};
pub use registration::{RegistrationManager, RegistrationSummary};
pub use translator::{EventTranslator, RadioEvent, REMOTE_PRESSED_EVENT};
