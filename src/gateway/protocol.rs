use axum::http::StatusCode;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::detector::DetectedRequirement;
use crate::fitter::FitError;

// ============================================================================
// Wire Types
// ============================================================================
//
// The extension scripts speak camelCase JSON; these DTOs mirror the message
// shapes they already use ("updateRequirements", "getRequirements", and the
// resize request/response pair).

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayInfo {
    pub version: String,
    pub uptime_seconds: u64,
    pub cached_requirements: usize,
    pub default_encoding: String,
}

/// Detection request; with `tabId` set the result is also cached per tab
/// (the "updateRequirements" flow).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    pub text: String,
    #[serde(default)]
    pub tab_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub detected: Option<DetectedRequirement>,
}

/// JSON flavor of the resize request; the image travels base64-encoded or
/// as a `data:` URL, which is what the page context can produce.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitRequestBody {
    pub image: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, rename = "maxSizeKB")]
    pub max_size_kb: Option<u32>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitResponseBody {
    /// Base64-encoded output buffer.
    pub image: String,
    pub filename: String,
    pub size_bytes: usize,
    pub quality: f32,
    pub iterations: u32,
}

/// Effective floating-button state for one site.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePrefResponse {
    pub site: String,
    pub floating_enabled: bool,
}

/// Per-site override update; `enabled: null` clears the override.
#[derive(Debug, Deserialize)]
pub struct SitePrefBody {
    pub enabled: Option<bool>,
}

/// JSON error body with a stable machine-readable kind.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub error: String,
}

impl ErrorBody {
    pub fn new(kind: &'static str, error: impl Into<String>) -> Self {
        Self {
            kind,
            error: error.into(),
        }
    }
}

// ============================================================================
// Payload Helpers
// ============================================================================

/// Decode a base64 or `data:*;base64,` image payload.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>, String> {
    let trimmed = payload.trim();
    let encoded = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .ok_or_else(|| "data URL is not base64-encoded".to_string())?,
        None => trimmed,
    };
    base64::engine::general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| format!("invalid base64 image payload: {e}"))
}

/// Encode an output buffer for the JSON response.
pub fn encode_image_payload(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Map a fit failure onto an HTTP status and a stable error kind.
pub fn fit_error_parts(err: &FitError) -> (StatusCode, &'static str) {
    match err {
        FitError::Decode(_) => (StatusCode::UNPROCESSABLE_ENTITY, "decodeFailure"),
        FitError::Encode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "encodeFailure"),
        FitError::BudgetUnsatisfiable { .. } => {
            (StatusCode::PAYLOAD_TOO_LARGE, "budgetUnsatisfiable")
        }
        FitError::LosslessBudgetExceeded { .. } => {
            (StatusCode::PAYLOAD_TOO_LARGE, "losslessBudgetExceeded")
        }
        FitError::Verification(_) => (StatusCode::INTERNAL_SERVER_ERROR, "verificationFailure"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_base64() {
        let encoded = encode_image_payload(b"hello");
        assert_eq!(decode_image_payload(&encoded).unwrap(), b"hello");
    }

    #[test]
    fn decodes_data_url() {
        let encoded = format!("data:image/png;base64,{}", encode_image_payload(b"hello"));
        assert_eq!(decode_image_payload(&encoded).unwrap(), b"hello");
    }

    #[test]
    fn rejects_non_base64_data_url() {
        let err = decode_image_payload("data:image/png,rawbytes").unwrap_err();
        assert!(err.contains("not base64"));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode_image_payload("!!! not base64 !!!").is_err());
    }

    #[test]
    fn budget_errors_map_to_413() {
        let err = FitError::BudgetUnsatisfiable {
            budget_kb: 50,
            achieved_bytes: 120_000,
            quality: 0.01,
        };
        let (status, kind) = fit_error_parts(&err);
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(kind, "budgetUnsatisfiable");
    }

    #[test]
    fn fit_request_accepts_extension_keys() {
        let body: FitRequestBody = serde_json::from_str(
            r#"{"image": "aGk=", "width": 160, "height": 212, "maxSizeKB": 50}"#,
        )
        .unwrap();
        assert_eq!(body.max_size_kb, Some(50));
        assert_eq!(body.width, 160);
    }
}
