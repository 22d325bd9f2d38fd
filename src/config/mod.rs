mod defaults;
mod io;
mod types;
mod validation;

pub use defaults::*;
pub use io::*;
pub use types::*;
pub use validation::*;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Top-level FormFit configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub fitter: FitterConfig,

    /// State directory for persistent data (requirement cache, preferences).
    #[serde(skip)]
    pub state_dir: PathBuf,
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(find_config_file)
            .unwrap_or_else(|| PathBuf::from("formfit.json"));

        let mut config = if config_path.exists() {
            info!("Loading config from {}", config_path.display());
            let value = read_config_file_snapshot(&config_path)?;
            serde_json::from_value(value)?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Resolve state directory
        config.state_dir = resolve_state_dir();

        Ok(config)
    }

    /// Write default configuration to a file.
    pub fn write_default(path: &str) -> Result<()> {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("FORMFIT_GATEWAY_PORT") {
            if let Ok(port) = port.parse() {
                self.gateway.port = port;
            }
        }

        if let Ok(bind) = std::env::var("FORMFIT_GATEWAY_BIND") {
            if let Ok(mode) = bind.parse() {
                self.gateway.bind = mode;
            }
        }

        if let Ok(token) = std::env::var("FORMFIT_GATEWAY_TOKEN") {
            self.gateway.auth.token = Some(token);
        }

        if let Ok(encoding) = std::env::var("FORMFIT_DEFAULT_ENCODING") {
            if let Ok(encoding) = encoding.parse() {
                self.fitter.default_encoding = encoding;
            }
        }
    }
}

/// Find the configuration file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("formfit.json"),
        PathBuf::from("formfit.yaml"),
        PathBuf::from("formfit.yml"),
        PathBuf::from("formfit.toml"),
    ];

    for path in &candidates {
        if path.exists() {
            return Some(path.clone());
        }
    }

    // Check home directory
    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".formfit").join("config.json");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

/// Resolve the state directory for persistent data.
fn resolve_state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FORMFIT_STATE_DIR") {
        return PathBuf::from(dir);
    }

    dirs::home_dir()
        .map(|h| h.join(".formfit"))
        .unwrap_or_else(|| PathBuf::from(".formfit"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitter::OutputEncoding;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.gateway.port, default_gateway_port());
        assert_eq!(config.gateway.bind, GatewayBindMode::Loopback);
        assert_eq!(config.fitter.default_encoding, OutputEncoding::Jpeg);
        assert_eq!(config.fitter.max_input_bytes, default_max_input_bytes());
    }

    #[test]
    fn deserializes_partial_camel_case_document() {
        let config: Config = serde_json::from_str(
            r#"{"gateway": {"port": 9000}, "fitter": {"defaultEncoding": "png"}}"#,
        )
        .unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.fitter.default_encoding, OutputEncoding::Png);
        assert_eq!(config.fitter.max_input_bytes, default_max_input_bytes());
    }

    #[test]
    fn round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }
}
