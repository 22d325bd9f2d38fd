use serde::Serialize;
use tracing::debug;

use crate::detector::DetectedRequirement;

use super::error::FitError;

/// What the post-fit verification pass observed about an encoded buffer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
    pub format: String,
}

/// Re-decode `bytes` and check it against a detected requirement.
///
/// Dimensions are compared exactly (both must be present in the requirement
/// for the check to run); the size check uses the kilobyte budget. Fields
/// absent from the requirement are not checked.
pub fn verify(
    bytes: &[u8],
    requirement: &DetectedRequirement,
) -> Result<VerificationReport, FitError> {
    let guessed = image::guess_format(bytes).map_err(FitError::Decode)?;
    let decoded = image::load_from_memory(bytes).map_err(FitError::Decode)?;

    let report = VerificationReport {
        width: decoded.width(),
        height: decoded.height(),
        size_bytes: bytes.len(),
        format: format!("{guessed:?}").to_ascii_lowercase(),
    };

    if let (Some(want_w), Some(want_h)) = (requirement.width, requirement.height) {
        if report.width != want_w || report.height != want_h {
            return Err(FitError::Verification(format!(
                "dimension mismatch: got {}x{}, expected {}x{}",
                report.width, report.height, want_w, want_h
            )));
        }
    }

    if let Some(max_kb) = requirement.max_size_kb {
        if report.size_bytes > max_kb as usize * 1024 {
            return Err(FitError::Verification(format!(
                "file too large: {:.1}KB exceeds maximum {}KB",
                report.size_bytes as f64 / 1024.0,
                max_kb
            )));
        }
    }

    debug!(
        "Verification passed: {}x{}, {:.1} KB, {}",
        report.width,
        report.height,
        report.size_bytes as f64 / 1024.0,
        report.format
    );
    Ok(report)
}
