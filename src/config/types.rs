use serde::{Deserialize, Serialize};

use super::defaults::{default_gateway_port, default_max_input_bytes};
use crate::fitter::OutputEncoding;

// ============================================================================
// Gateway Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayBindMode {
    #[default]
    Loopback,
    Lan,
    Custom,
}

impl std::str::FromStr for GatewayBindMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loopback" => Ok(Self::Loopback),
            "lan" => Ok(Self::Lan),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("invalid bind mode: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAuthConfig {
    /// Bearer token required for non-loopback requests when set.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    #[serde(default)]
    pub bind: GatewayBindMode,
    pub custom_bind_host: Option<String>,
    #[serde(default)]
    pub auth: GatewayAuthConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: GatewayBindMode::default(),
            custom_bind_host: None,
            auth: GatewayAuthConfig::default(),
        }
    }
}

// ============================================================================
// Fitter Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitterConfig {
    /// Encoding used when a request does not name one.
    #[serde(default)]
    pub default_encoding: OutputEncoding,
    /// Upload guardrail for the gateway, in bytes.
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: usize,
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            default_encoding: OutputEncoding::default(),
            max_input_bytes: default_max_input_bytes(),
        }
    }
}
