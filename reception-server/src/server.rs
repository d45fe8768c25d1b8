//! HTTP surface of the reception bridge.
//!
//! Route map (any HTTP method):
//!
//! - `/initialize`: run listening registration, report counts
//! - `/webhook`: translate one radio event
//! - `/status`: device/listening overview
//! - `/logs`: tail of the log file as plain text
//! - anything else: legacy bulk-event processing
//!
//! Handlers never leak internal error detail: unrecovered rejections are
//! converted into a generic 500 body by [`handle_rejection`].

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use airsend_config::DeviceTable;
use airsend_core::{EventTranslator, LegacyTranslator, ListeningState, RadioEvent, RegistrationManager};
use hub_client::HubApi;

use crate::logging;

const DEFAULT_LOG_LINES: usize = 100;
const MAX_LOG_LINES: usize = 1000;

/// Shared request-handling state.
///
/// Everything here is immutable or internally synchronized; requests run
/// independently against it.
pub struct AppState {
    pub devices: Arc<DeviceTable>,
    pub hub: Arc<dyn HubApi>,
    pub translator: EventTranslator,
    pub legacy: LegacyTranslator,
    pub registration: Arc<RegistrationManager>,
    pub state_file: PathBuf,
    pub log_file: PathBuf,
    pub callback_url: String,
}

/// Build the complete route tree.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let initialize = warp::path("initialize")
        .and(warp::path::end())
        .and(with_state(state.clone()))
        .and_then(handle_initialize);

    let webhook = warp::path("webhook")
        .and(warp::path::end())
        .and(with_state(state.clone()))
        .and(warp::body::bytes())
        .and_then(handle_webhook);

    let status = warp::path("status")
        .and(warp::path::end())
        .and(with_state(state.clone()))
        .and_then(handle_status);

    let logs = warp::path("logs")
        .and(warp::path::end())
        .and(with_state(state.clone()))
        .and(warp::query::<HashMap<String, String>>())
        .and_then(handle_logs);

    // Every unrecognized path carries legacy bulk events.
    let legacy = warp::any()
        .and(with_state(state))
        .and(warp::body::bytes())
        .and_then(handle_legacy);

    initialize.or(webhook).or(status).or(logs).or(legacy)
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn handle_initialize(state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    let registration = state.registration.clone();
    let summary = match tokio::task::spawn_blocking(move || registration.register_all()).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "registration task failed");
            return Ok(warp::reply::with_status(
                warp::reply::json(&json!({"error": "Internal server error"})),
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({
            "success": summary.failed == 0,
            "result": summary,
            "timestamp": now_epoch(),
        })),
        StatusCode::OK,
    ))
}

async fn handle_webhook(state: Arc<AppState>, body: Bytes) -> Result<impl Reply, Rejection> {
    let Ok(payload) = serde_json::from_slice::<Value>(&body) else {
        warn!("webhook body is not valid JSON");
        return Ok(warp::reply::with_status(
            warp::reply::json(&json!({"error": "Invalid JSON"})),
            StatusCode::BAD_REQUEST,
        ));
    };

    let translator = state.translator.clone();
    let event = RadioEvent::from_payload(&payload);
    let success = tokio::task::spawn_blocking(move || translator.handle(&event))
        .await
        .unwrap_or(false);

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({"success": success, "timestamp": now_epoch()})),
        StatusCode::OK,
    ))
}

async fn handle_status(state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    let listening = ListeningState::load(&state.state_file);
    Ok(warp::reply::json(&json!({
        "devices": state.devices.len(),
        "listening": listening,
        "callback_url": state.callback_url,
        "api_authorized": state.hub.is_authorized(),
        "timestamp": now_epoch(),
    })))
}

async fn handle_logs(
    state: Arc<AppState>,
    query: HashMap<String, String>,
) -> Result<impl Reply, Rejection> {
    let lines = lines_param(&query);
    Ok(logging::tail_lines(&state.log_file, lines))
}

async fn handle_legacy(state: Arc<AppState>, body: Bytes) -> Result<impl Reply, Rejection> {
    let payload = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    let legacy = state.legacy.clone();
    let _ = tokio::task::spawn_blocking(move || legacy.handle_bulk(&payload)).await;
    Ok(warp::reply::json(&json!({"success": true})))
}

fn lines_param(query: &HashMap<String, String>) -> usize {
    query
        .get("lines")
        .map(|raw| raw.parse().unwrap_or(0))
        .unwrap_or(DEFAULT_LOG_LINES)
        .clamp(1, MAX_LOG_LINES)
}

fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

/// Convert rejections into generic JSON responses.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else {
        error!(?err, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({"error": message})),
        code,
    ))
}

/// Error starting the HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to bind port: {0}")]
    Bind(String),
}

/// The running HTTP server with graceful shutdown.
pub struct ReceptionServer {
    port: u16,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl ReceptionServer {
    /// Bind the configured port and start serving.
    pub async fn start(state: Arc<AppState>, port: u16) -> Result<Self, ServeError> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let filter = routes(state).recover(handle_rejection);
        let (addr, server) = warp::serve(filter)
            .try_bind_with_graceful_shutdown(
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
                async move {
                    shutdown_rx.recv().await;
                },
            )
            .map_err(|e| ServeError::Bind(e.to_string()))?;

        info!(%addr, "reception server listening");
        let handle = tokio::spawn(server);

        Ok(Self {
            port: addr.port(),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop accepting requests and wait for in-flight ones to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

/// Callback URL devices should deliver events to.
///
/// Uses the local IP address a default route would pick; IPv6 literals are
/// bracketed.
pub fn callback_url(port: u16) -> String {
    let host = match detect_local_ip() {
        Some(IpAddr::V6(v6)) => format!("[{v6}]"),
        Some(IpAddr::V4(v4)) => v4.to_string(),
        None => Ipv4Addr::LOCALHOST.to_string(),
    };
    format!("http://{host}:{port}/webhook")
}

/// Detect the local IP address used for outbound traffic.
///
/// Connects a UDP socket to a public address to learn the local routing
/// address; no data is actually sent.
fn detect_local_ip() -> Option<IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    Some(socket.local_addr().ok()?.ip())
}
