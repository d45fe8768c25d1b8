//! Error types for hub communication.

use thiserror::Error;

/// Errors that can occur talking to the home-automation hub.
#[derive(Debug, Error)]
pub enum HubError {
    /// Network or transport error.
    #[error("Network/transport error: {0}")]
    Network(String),

    /// The hub answered with a non-success HTTP status.
    #[error("Hub returned HTTP {0}")]
    Status(u16),

    /// The response body could not be parsed as JSON.
    #[error("Response parsing error: {0}")]
    Parse(String),
}
