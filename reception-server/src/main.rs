use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info};

use airsend_config::Strictness;
use airsend_core::{EventTranslator, LegacyTranslator, RegistrationManager};
use hub_client::{HassClient, HubApi};
use rpc_client::{BridgeRpc, RpcClient};

use reception_server::logging::{self, LoggingMode};
use reception_server::server::{self, AppState, ReceptionServer};
use reception_server::settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env();

    // A broken log file degrades to stderr-only logging; it must not keep
    // the bridge from serving.
    if let Err(e) = logging::init_logging_from_env(Some(settings.log_file.as_path())) {
        eprintln!("airsend-bridge: logging setup degraded: {e}");
        let _ = logging::init_logging(LoggingMode::Development, None);
    }

    let hub = HassClient::new(
        &settings.hub_base_url,
        settings.hub_token.clone().unwrap_or_default(),
    );
    if !hub.is_authorized() {
        error!("no hub API token configured; refusing to serve");
        bail!("missing hub API token (set SUPERVISOR_TOKEN or HASS_API_TOKEN)");
    }

    let config = airsend_config::load_files(
        &settings.secrets_file,
        &settings.devices_file,
        Strictness::Lenient,
    )
    .context("failed to load configuration")?;
    info!(
        devices = config.devices.len(),
        warnings = config.warnings.len(),
        "configuration loaded"
    );

    let devices = Arc::new(config.devices);
    let hub: Arc<dyn HubApi> = Arc::new(hub);
    let rpc: Arc<dyn BridgeRpc> = Arc::new(RpcClient::new());
    let callback_url = server::callback_url(settings.port);

    let registration = Arc::new(RegistrationManager::new(
        devices.clone(),
        config.secrets.default_credential(),
        rpc,
        callback_url.clone(),
        settings.state_file.clone(),
    ));

    let state = Arc::new(AppState {
        translator: EventTranslator::new(devices.clone(), hub.clone()),
        legacy: LegacyTranslator::new(hub.clone()),
        registration,
        devices,
        hub,
        state_file: settings.state_file.clone(),
        log_file: settings.log_file.clone(),
        callback_url: callback_url.clone(),
    });

    let server = ReceptionServer::start(state, settings.port).await?;
    info!(port = server.port(), callback = %callback_url, "reception bridge ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    server.shutdown().await;
    Ok(())
}
