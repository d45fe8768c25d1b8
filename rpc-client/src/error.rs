//! Error types for the RPC client.

use thiserror::Error;

/// Errors that can occur during device RPC communication.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Network or transport error.
    #[error("Network/transport error: {0}")]
    Network(String),

    /// The device answered with a non-success HTTP status.
    #[error("Device returned HTTP {0}")]
    Status(u16),

    /// The response body could not be parsed as JSON.
    #[error("Response parsing error: {0}")]
    Parse(String),
}
