use super::{Config, GatewayBindMode};
use anyhow::Result;
use tracing::warn;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.gateway.port == 0 {
        errors.push(ConfigValidationError {
            path: "gateway.port".to_string(),
            message: "Port must be greater than 0".to_string(),
        });
    }

    if config.gateway.bind == GatewayBindMode::Custom && config.gateway.custom_bind_host.is_none()
    {
        errors.push(ConfigValidationError {
            path: "gateway.customBindHost".to_string(),
            message: "Custom bind mode requires a bind host".to_string(),
        });
    }

    if let Some(token) = &config.gateway.auth.token {
        if token.is_empty() {
            errors.push(ConfigValidationError {
                path: "gateway.auth.token".to_string(),
                message: "Token must not be empty".to_string(),
            });
        }
    }

    if config.gateway.bind != GatewayBindMode::Loopback && config.gateway.auth.token.is_none() {
        warn!("Gateway is bound beyond loopback but no auth token is configured");
    }

    if config.fitter.max_input_bytes == 0 {
        errors.push(ConfigValidationError {
            path: "fitter.maxInputBytes".to_string(),
            message: "Upload limit must be greater than 0".to_string(),
        });
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_empty());
    }

    #[test]
    fn zero_port_rejected() {
        let mut config = Config::default();
        config.gateway.port = 0;
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "gateway.port");
    }

    #[test]
    fn custom_bind_requires_host() {
        let mut config = Config::default();
        config.gateway.bind = GatewayBindMode::Custom;
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.path == "gateway.customBindHost"));
    }

    #[test]
    fn empty_token_rejected() {
        let mut config = Config::default();
        config.gateway.auth.token = Some(String::new());
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.path == "gateway.auth.token"));
    }

    #[test]
    fn zero_upload_limit_rejected() {
        let mut config = Config::default();
        config.fitter.max_input_bytes = 0;
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.path == "fitter.maxInputBytes"));
    }
}
