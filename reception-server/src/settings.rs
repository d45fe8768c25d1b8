//! Process configuration from the environment.
//!
//! Defaults match the add-on's historical file layout so an unconfigured
//! deployment behaves exactly like the original container.

use std::env;
use std::path::PathBuf;

/// Default port the bridge serves on and devices call back to.
pub const DEFAULT_PORT: u16 = 33863;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the hub core API.
    pub hub_base_url: String,
    /// Hub bearer credential; `None` means the process must refuse to serve.
    pub hub_token: Option<String>,
    pub devices_file: PathBuf,
    pub secrets_file: PathBuf,
    pub state_file: PathBuf,
    pub log_file: PathBuf,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            hub_base_url: env::var("HASS_API_URL")
                .unwrap_or_else(|_| "http://supervisor/core/api".to_string()),
            hub_token: read_token(),
            devices_file: path_from_env("AIRSEND_CONFIG_FILE", "/config/airsend.yaml"),
            secrets_file: path_from_env("AIRSEND_SECRETS_FILE", "/config/secrets.yaml"),
            state_file: path_from_env("AIRSEND_STATE_FILE", "/tmp/airsend_listening.json"),
            log_file: path_from_env("AIRSEND_LOG_FILE", "/share/airsend_reception.log"),
            port: env::var("AIRSEND_PORT")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }
}

fn path_from_env(var: &str, default: &str) -> PathBuf {
    env::var(var).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

/// Hub token from the supervisor environment, an explicit override, or the
/// legacy token file next to the binary.
fn read_token() -> Option<String> {
    env::var("SUPERVISOR_TOKEN")
        .ok()
        .filter(|t| !t.is_empty())
        .or_else(|| env::var("HASS_API_TOKEN").ok().filter(|t| !t.is_empty()))
        .or_else(|| {
            std::fs::read_to_string("hass_api.token")
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment variables are process-global, so defaults and overrides
    // are exercised in a single sequential test.
    #[test]
    fn test_from_env() {
        for var in [
            "HASS_API_URL",
            "AIRSEND_CONFIG_FILE",
            "AIRSEND_SECRETS_FILE",
            "AIRSEND_STATE_FILE",
            "AIRSEND_LOG_FILE",
            "AIRSEND_PORT",
        ] {
            env::remove_var(var);
        }

        let settings = Settings::from_env();
        assert_eq!(settings.hub_base_url, "http://supervisor/core/api");
        assert_eq!(settings.devices_file, PathBuf::from("/config/airsend.yaml"));
        assert_eq!(settings.secrets_file, PathBuf::from("/config/secrets.yaml"));
        assert_eq!(settings.state_file, PathBuf::from("/tmp/airsend_listening.json"));
        assert_eq!(settings.log_file, PathBuf::from("/share/airsend_reception.log"));
        assert_eq!(settings.port, DEFAULT_PORT);

        env::set_var("AIRSEND_PORT", "8099");
        env::set_var("HASS_API_URL", "http://hub.local:8123/api");
        let settings = Settings::from_env();
        assert_eq!(settings.port, 8099);
        assert_eq!(settings.hub_base_url, "http://hub.local:8123/api");

        env::set_var("AIRSEND_PORT", "not-a-port");
        assert_eq!(Settings::from_env().port, DEFAULT_PORT);

        env::remove_var("AIRSEND_PORT");
        env::remove_var("HASS_API_URL");
    }
}
