mod encoding;
mod error;
mod verify;

pub use encoding::{output_filename, OutputEncoding};
pub use error::FitError;
pub use verify::{verify, VerificationReport};

use image::imageops::FilterType;
use tracing::{debug, warn};

/// Quality of the first encode attempt, on the encoder's 0–1 scale.
pub const START_QUALITY: f32 = 0.90;

/// Fixed amount quality drops between compression attempts.
pub const QUALITY_STEP: f32 = 0.02;

/// Minimum quality the compression loop will attempt before giving up.
pub const QUALITY_FLOOR: f32 = 0.01;

/// Upper bound on re-encode attempts, to bound worst-case latency.
pub const MAX_COMPRESSION_ITERATIONS: u32 = 50;

/// Inputs for a single fit operation.
#[derive(Debug, Clone)]
pub struct FitRequest {
    /// Source image bytes, in any decodable raster format.
    pub image: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Optional byte budget in kilobytes.
    pub max_size_kb: Option<u32>,
    pub encoding: OutputEncoding,
}

/// A successful fit: the encoded buffer plus diagnostic metadata.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub bytes: Vec<u8>,
    /// Quality the final buffer was encoded at (0–1 scale).
    pub quality: f32,
    /// Number of re-encode attempts after the initial pass.
    pub iterations: u32,
}

impl FitResult {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Resample the source image to exactly the requested dimensions and encode
/// it within the byte budget, if one was given.
///
/// The resample stretches to fit: aspect ratio is not preserved and no
/// letterboxing is applied. Callers that care must crop beforehand.
///
/// With a budget and a quality-adjustable encoding, quality decays linearly
/// from [`START_QUALITY`] in [`QUALITY_STEP`] decrements until the output
/// fits, the [`QUALITY_FLOOR`] is reached, or [`MAX_COMPRESSION_ITERATIONS`]
/// attempts have run. Linear decay over bisection is deliberate: each encode
/// is cheap relative to the cap, and the quality→size curve is
/// encoder-dependent, so a fixed-step walk converges predictably without
/// assuming a curve shape.
pub fn fit(request: &FitRequest) -> Result<FitResult, FitError> {
    let decoded = image::load_from_memory(&request.image).map_err(FitError::Decode)?;
    let raster = decoded.resize_exact(request.width, request.height, FilterType::Lanczos3);

    let mut quality = START_QUALITY;
    let mut bytes = encoding::encode_at_quality(&raster, request.encoding, quality)?;
    debug!(
        "Initial encode at quality {:.2}: {:.2} KB",
        quality,
        bytes.len() as f64 / 1024.0
    );

    let Some(budget_kb) = request.max_size_kb else {
        return Ok(FitResult {
            bytes,
            quality,
            iterations: 0,
        });
    };
    let max_bytes = budget_kb as usize * 1024;

    if !request.encoding.is_quality_adjustable() {
        if bytes.len() > max_bytes {
            return Err(FitError::LosslessBudgetExceeded {
                encoding: request.encoding,
                size_bytes: bytes.len(),
                budget_kb,
            });
        }
        return Ok(FitResult {
            bytes,
            quality,
            iterations: 0,
        });
    }

    let mut iterations = 0;
    while bytes.len() > max_bytes
        && quality > QUALITY_FLOOR
        && iterations < MAX_COMPRESSION_ITERATIONS
    {
        quality = (quality - QUALITY_STEP).max(QUALITY_FLOOR);
        bytes = encoding::encode_at_quality(&raster, request.encoding, quality)?;
        iterations += 1;
        debug!(
            "Compression step {}: quality={:.2}, size={:.2} KB",
            iterations,
            quality,
            bytes.len() as f64 / 1024.0
        );
    }

    if bytes.len() > max_bytes {
        warn!(
            "Budget unsatisfiable after {} steps: {} bytes over the {} KB budget",
            iterations,
            bytes.len(),
            budget_kb
        );
        return Err(FitError::BudgetUnsatisfiable {
            budget_kb,
            achieved_bytes: bytes.len(),
            quality,
        });
    }

    Ok(FitResult {
        bytes,
        quality,
        iterations,
    })
}
