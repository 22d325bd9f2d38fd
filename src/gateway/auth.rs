use subtle::ConstantTimeEq;
use tracing::debug;

use crate::config::GatewayAuthConfig;

/// The resolved authentication mode after merging config and environment.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGatewayAuth {
    pub token: Option<String>,
}

/// Resolve gateway auth from config and environment (env token wins).
pub fn resolve_gateway_auth(
    auth_config: Option<&GatewayAuthConfig>,
    env_token: Option<&str>,
) -> ResolvedGatewayAuth {
    let config_token = auth_config.and_then(|c| c.token.clone());
    ResolvedGatewayAuth {
        token: env_token.map(String::from).or(config_token),
    }
}

/// Authorize a single HTTP request.
///
/// With no token configured, loopback requests are allowed and everything
/// else is rejected. With a token configured, the bearer token must match
/// regardless of origin.
pub fn authorize_request(
    auth: &ResolvedGatewayAuth,
    bearer: Option<&str>,
    is_local: bool,
) -> bool {
    match &auth.token {
        None => {
            if is_local {
                return true;
            }
            debug!("Rejecting non-local request: no token configured");
            false
        }
        Some(expected) => bearer
            .map(|provided| safe_equal(expected, provided))
            .unwrap_or(false),
    }
}

/// Timing-safe string comparison.
fn safe_equal(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Extract a bearer token from an Authorization header value.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let header = header.trim();
    if header.len() > 7 && header[..7].eq_ignore_ascii_case("bearer ") {
        Some(header[7..].trim())
    } else {
        None
    }
}

/// Check if a request originates from localhost.
pub fn is_local_request(addr: &std::net::SocketAddr) -> bool {
    addr.ip().is_loopback()
}
