//! HTTP reception surface and process wiring for the AirSend bridge.
//!
//! The [`server`] module exposes the warp route tree and the running
//! [`server::ReceptionServer`]; [`settings`] and [`logging`] cover process
//! configuration and log output. The actual decision logic lives in the
//! `airsend-core` crate; this crate only adapts it to HTTP.

pub mod logging;
pub mod server;
pub mod settings;

pub use server::{callback_url, handle_rejection, routes, AppState, ReceptionServer, ServeError};
pub use settings::Settings;
