use thiserror::Error;

use super::encoding::OutputEncoding;

/// Typed failures produced by the fit pipeline.
///
/// A detection miss is not represented here; the detector reports it as
/// `None`. Everything below is fatal for the call it occurred in; nothing
/// is retried automatically, and a new `fit` call is a new attempt.
#[derive(Debug, Error)]
pub enum FitError {
    /// Source bytes could not be interpreted as an image.
    #[error("failed to decode source image: {0}")]
    Decode(image::ImageError),

    /// Raster-to-bytes encoding produced no output.
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),

    /// The quality floor or iteration cap was reached with the output still
    /// over the requested byte budget.
    #[error(
        "cannot compress to {budget_kb}KB (achieved {achieved_bytes} bytes at quality {quality:.2})"
    )]
    BudgetUnsatisfiable {
        budget_kb: u32,
        achieved_bytes: usize,
        quality: f32,
    },

    /// A fixed lossless encoding exceeded the budget; it cannot be
    /// iteratively shrunk, so no retry is attempted.
    #[error("{encoding} output is {size_bytes} bytes, over the {budget_kb}KB limit and not quality-adjustable")]
    LosslessBudgetExceeded {
        encoding: OutputEncoding,
        size_bytes: usize,
        budget_kb: u32,
    },

    /// The encoded output failed the post-fit verification pass.
    #[error("resized image failed verification: {0}")]
    Verification(String),
}
