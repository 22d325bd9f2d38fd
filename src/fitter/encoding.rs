use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use super::error::FitError;

/// Output encodings the fitter can produce.
///
/// JPEG is the lossy member with an adjustable quality parameter; PNG is
/// the fixed lossless member and cannot be iteratively shrunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputEncoding {
    #[default]
    Jpeg,
    Png,
}

impl OutputEncoding {
    /// Whether the encoder accepts a quality parameter the compression loop
    /// can walk down.
    pub fn is_quality_adjustable(self) -> bool {
        matches!(self, OutputEncoding::Jpeg)
    }

    /// Canonical file extension for the encoding.
    pub fn extension(self) -> &'static str {
        match self {
            OutputEncoding::Jpeg => "jpg",
            OutputEncoding::Png => "png",
        }
    }

    pub fn mime_type(self) -> mime::Mime {
        match self {
            OutputEncoding::Jpeg => mime::IMAGE_JPEG,
            OutputEncoding::Png => mime::IMAGE_PNG,
        }
    }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputEncoding::Jpeg => write!(f, "jpeg"),
            OutputEncoding::Png => write!(f, "png"),
        }
    }
}

impl FromStr for OutputEncoding {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "image/jpeg" => Ok(Self::Jpeg),
            "png" | "image/png" => Ok(Self::Png),
            other => Err(format!("unsupported encoding: {other}")),
        }
    }
}

/// Derive the output filename from the source name, swapping the extension
/// for the encoding's canonical one while preserving the stem.
pub fn output_filename(source_name: &str, encoding: OutputEncoding) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("formfit-upload");
    format!("{stem}.{}", encoding.extension())
}

/// Encode a raster at the given quality on the 0–1 scale.
///
/// Only JPEG honors the quality; PNG is written as-is.
pub(crate) fn encode_at_quality(
    raster: &DynamicImage,
    encoding: OutputEncoding,
    quality: f32,
) -> Result<Vec<u8>, FitError> {
    let mut buf = Cursor::new(Vec::new());
    match encoding {
        OutputEncoding::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality));
            raster
                .to_rgb8()
                .write_with_encoder(encoder)
                .map_err(FitError::Encode)?;
        }
        OutputEncoding::Png => {
            raster
                .write_to(&mut buf, ImageFormat::Png)
                .map_err(FitError::Encode)?;
        }
    }
    Ok(buf.into_inner())
}

/// Map the 0–1 quality scale onto the JPEG encoder's 1–100 scale.
fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping() {
        assert_eq!(OutputEncoding::Jpeg.extension(), "jpg");
        assert_eq!(OutputEncoding::Png.extension(), "png");
    }

    #[test]
    fn mime_mapping() {
        assert_eq!(OutputEncoding::Jpeg.mime_type(), mime::IMAGE_JPEG);
        assert_eq!(OutputEncoding::Png.mime_type(), mime::IMAGE_PNG);
    }

    #[test]
    fn parses_names_and_mime_types() {
        assert_eq!("jpeg".parse::<OutputEncoding>(), Ok(OutputEncoding::Jpeg));
        assert_eq!("JPG".parse::<OutputEncoding>(), Ok(OutputEncoding::Jpeg));
        assert_eq!(
            "image/png".parse::<OutputEncoding>(),
            Ok(OutputEncoding::Png)
        );
        assert!("webp".parse::<OutputEncoding>().is_err());
    }

    #[test]
    fn output_filename_swaps_extension() {
        assert_eq!(
            output_filename("photo.png", OutputEncoding::Jpeg),
            "photo.jpg"
        );
        assert_eq!(
            output_filename("scan.profile.png", OutputEncoding::Jpeg),
            "scan.profile.jpg"
        );
        assert_eq!(output_filename("", OutputEncoding::Jpeg), "formfit-upload.jpg");
    }

    #[test]
    fn jpeg_quality_scale() {
        assert_eq!(jpeg_quality(0.90), 90);
        assert_eq!(jpeg_quality(0.01), 1);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(1.0), 100);
    }

    #[test]
    fn jpeg_output_has_magic_number() {
        let img = DynamicImage::new_rgb8(10, 10);
        let data = encode_at_quality(&img, OutputEncoding::Jpeg, 0.8).unwrap();
        assert_eq!(&data[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn png_output_has_magic_number() {
        let img = DynamicImage::new_rgb8(10, 10);
        let data = encode_at_quality(&img, OutputEncoding::Png, 0.8).unwrap();
        assert_eq!(&data[0..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    }
}
