//! Private RPC client for AirSend bridge device communication.
//!
//! This crate provides a minimal client for the authenticated HTTP-style
//! RPC interface AirSend devices expose. Devices are addressed with the
//! vendor's `sp://` scheme, embedding the access credential as user-info
//! and the device host as the authority.

mod error;

pub use error::RpcError;

use std::net::Ipv6Addr;
use std::time::Duration;

use serde_json::Value;

/// Fixed RPC port AirSend devices listen on unless configured otherwise.
pub const DEFAULT_RPC_PORT: u16 = 33863;

/// Address and credential of a single device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcTarget {
    pub host: String,
    pub credential: String,
    /// Port override; [`DEFAULT_RPC_PORT`] when absent.
    pub port: Option<u16>,
}

impl RpcTarget {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_RPC_PORT)
    }
}

/// The outbound RPC capability.
///
/// The registration manager talks to devices through this trait so it can
/// be exercised against fakes; [`RpcClient`] is the real implementation.
pub trait BridgeRpc: Send + Sync {
    /// Issue a single RPC and return the parsed JSON response.
    ///
    /// Calls never retry: any transport error, non-success status, or
    /// unparseable body is returned as a failure.
    fn call(&self, target: &RpcTarget, method: &str, params: &Value) -> Result<Value, RpcError>;
}

/// A minimal RPC client for AirSend devices.
#[derive(Debug, Clone)]
pub struct RpcClient {
    agent: ureq::Agent,
}

impl RpcClient {
    /// Create a new RPC client with the fixed device timeouts
    /// (5 s connect, 10 s total).
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(5))
                .timeout(Duration::from_secs(10))
                .build(),
        }
    }

    /// Build the endpoint address for a method call.
    ///
    /// IPv6 literal hosts are bracketed per standard URL formatting.
    pub fn endpoint_url(target: &RpcTarget, method: &str) -> String {
        format!(
            "sp://{}@{}:{}/api/{}",
            target.credential,
            format_host(&target.host),
            target.port(),
            method
        )
    }
}

impl BridgeRpc for RpcClient {
    fn call(&self, target: &RpcTarget, method: &str, params: &Value) -> Result<Value, RpcError> {
        let url = Self::endpoint_url(target, method);

        let response = if is_parameterless(params) {
            self.agent.get(&url).call()
        } else {
            self.agent
                .post(&url)
                .set("Content-Type", "application/json")
                .send_json(params)
        };

        match response {
            Ok(resp) => resp
                .into_json::<Value>()
                .map_err(|e| RpcError::Parse(e.to_string())),
            Err(ureq::Error::Status(code, _)) => Err(RpcError::Status(code)),
            Err(e) => Err(RpcError::Network(e.to_string())),
        }
    }
}

impl Default for RpcClient {
    fn default() -> Self {
        Self::new()
    }
}

fn format_host(host: &str) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

/// A call with no parameters is issued as a plain request without a body.
fn is_parameterless(params: &Value) -> bool {
    match params {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target(host: &str, port: Option<u16>) -> RpcTarget {
        RpcTarget {
            host: host.to_string(),
            credential: "hunter2".to_string(),
            port,
        }
    }

    #[test]
    fn test_endpoint_url_default_port() {
        let url = RpcClient::endpoint_url(&target("192.168.1.20", None), "setListenChannel");
        assert_eq!(url, "sp://hunter2@192.168.1.20:33863/api/setListenChannel");
    }

    #[test]
    fn test_endpoint_url_port_override() {
        let url = RpcClient::endpoint_url(&target("192.168.1.20", Some(4000)), "setCallback");
        assert_eq!(url, "sp://hunter2@192.168.1.20:4000/api/setCallback");
    }

    #[test]
    fn test_endpoint_url_brackets_ipv6() {
        let url = RpcClient::endpoint_url(&target("fe80::1", None), "setCallback");
        assert_eq!(url, "sp://hunter2@[fe80::1]:33863/api/setCallback");
    }

    #[test]
    fn test_endpoint_url_hostname_unbracketed() {
        let url = RpcClient::endpoint_url(&target("bridge.local", None), "getStatus");
        assert_eq!(url, "sp://hunter2@bridge.local:33863/api/getStatus");
    }

    #[test]
    fn test_is_parameterless() {
        assert!(is_parameterless(&Value::Null));
        assert!(is_parameterless(&json!({})));
        assert!(!is_parameterless(&json!({"channel": 100})));
        assert!(!is_parameterless(&json!([1, 2])));
    }

    #[test]
    fn test_client_creation() {
        let _client = RpcClient::new();
        let _default = RpcClient::default();
    }
}
