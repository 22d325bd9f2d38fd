mod cascade;
mod rules;

use serde::{Deserialize, Serialize};

/// Upper bound accepted for a detected pixel dimension. Anything above is
/// treated as an accidental match (phone number, price, order id) and
/// discarded.
pub const MAX_DIMENSION_PX: u32 = 10_000;

/// Upper bound accepted for a detected size limit, in kilobytes (10 MB).
pub const MAX_SIZE_KB: u32 = 10_240;

/// Image-upload constraints detected from page text.
///
/// At least one field is always present: a text with no usable match is
/// reported by [`detect`] as `None`, never as an empty struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Maximum output size in kilobytes. Serialized as `maxSizeKB`, the key
    /// the extension scripts already use.
    #[serde(
        default,
        rename = "maxSizeKB",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_size_kb: Option<u32>,
}

/// Collapse whitespace runs to single spaces and trim.
///
/// The extension concatenates text from several DOM regions before sending
/// it over; callers apply this at the boundary so the patterns only have to
/// deal with single-space separators.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Detect upload requirements in free-form page text.
///
/// Dimensions are resolved through a three-tier pattern cascade (specific,
/// explicit, generic); the size limit is scanned independently of the tiers.
/// Returns `None` only when neither dimensions nor a size limit were
/// found; partial results (size-only, dimensions-only) are valid.
///
/// Purely referentially transparent; no side effects beyond trace logging.
pub fn detect(text: &str) -> Option<DetectedRequirement> {
    if text.is_empty() {
        return None;
    }

    let dimensions = cascade::run_dimension_cascade(text);
    let max_size_kb = cascade::run_size_scan(text);

    if dimensions.is_none() && max_size_kb.is_none() {
        return None;
    }

    let (width, height) = match dimensions {
        Some((w, h)) => (Some(w), Some(h)),
        None => (None, None),
    };

    Some(DetectedRequirement {
        width,
        height,
        max_size_kb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_and_height_with_range_takes_range_max() {
        let detected =
            detect("width should be 160 pixels and height should be 200 to 212 pixels").unwrap();
        assert_eq!(detected.width, Some(160));
        assert_eq!(detected.height, Some(212));
    }

    #[test]
    fn x_separator_dimensions() {
        let detected = detect("200 x 200 pixels").unwrap();
        assert_eq!(detected.width, Some(200));
        assert_eq!(detected.height, Some(200));
        assert_eq!(detected.max_size_kb, None);
    }

    #[test]
    fn star_separator_dimensions() {
        let detected = detect("Image must be 640*480").unwrap();
        assert_eq!(detected.width, Some(640));
        assert_eq!(detected.height, Some(480));
    }

    #[test]
    fn size_only_leaves_dimensions_absent() {
        let detected = detect("Upload a recent photograph, max 50KB").unwrap();
        assert_eq!(detected.width, None);
        assert_eq!(detected.height, None);
        assert_eq!(detected.max_size_kb, Some(50));
    }

    #[test]
    fn size_range_takes_max() {
        let detected = detect("File size should be between 20 kb and 50 kb").unwrap();
        assert_eq!(detected.max_size_kb, Some(50));
    }

    #[test]
    fn size_range_written_backwards_still_takes_max() {
        let detected = detect("between 50 kb and 20 kb").unwrap();
        assert_eq!(detected.max_size_kb, Some(50));
    }

    #[test]
    fn no_numbers_returns_none() {
        assert_eq!(detect("no numbers here"), None);
    }

    #[test]
    fn empty_text_returns_none() {
        assert_eq!(detect(""), None);
    }

    #[test]
    fn oversized_dimensions_rejected() {
        // 99999 exceeds the 10000 px sanity bound; with nothing else to
        // match, the whole detection comes back empty.
        assert_eq!(detect("99999 x 99999"), None);
    }

    #[test]
    fn oversized_size_limit_rejected() {
        assert_eq!(detect("max 99999 kb"), None);
    }

    // The lone-number/range assignment is a heuristic, not a certainty: a
    // bare number next to a range is read as width, the range as height.
    #[test]
    fn lone_number_reads_as_width_and_range_as_height() {
        let detected = detect("photo 160 pixels wide, 200 to 212 pixels tall").unwrap();
        assert_eq!(detected.width, Some(160));
        assert_eq!(detected.height, Some(212));
    }

    #[test]
    fn leading_range_reads_as_height_lone_number_as_width() {
        let detected = detect("200 to 212 pixels, and 160 pixels across").unwrap();
        assert_eq!(detected.width, Some(160));
        assert_eq!(detected.height, Some(212));
    }

    #[test]
    fn devanagari_pixel_marker_supported() {
        let detected = detect("फोटो 160 पिक्सेल और 200 to 212 पिक्सेल").unwrap();
        assert_eq!(detected.width, Some(160));
        assert_eq!(detected.height, Some(212));
    }

    #[test]
    fn explicit_height_first_assigns_by_keyword_order() {
        let detected = detect("Height: 300 px, Width: 500 px").unwrap();
        assert_eq!(detected.width, Some(500));
        assert_eq!(detected.height, Some(300));
    }

    #[test]
    fn explicit_range_attaches_to_leading_height() {
        let detected = detect("height 200 to 212 px, width 160 px").unwrap();
        assert_eq!(detected.width, Some(160));
        assert_eq!(detected.height, Some(212));
    }

    #[test]
    fn specific_tier_beats_generic_tier() {
        // Both a keyword pattern and a bare "A x B" appear; the specific
        // tier wins and the 999 x 999 watermark note is ignored.
        let text = "width should be 100 pixels and height should be 50 pixels. \
                    Watermark grid: 999 x 999";
        let detected = detect(text).unwrap();
        assert_eq!(detected.width, Some(100));
        assert_eq!(detected.height, Some(50));
    }

    #[test]
    fn dimensions_and_size_detected_together() {
        let detected = detect("200 x 300 pixels, size: 120 kb").unwrap();
        assert_eq!(detected.width, Some(200));
        assert_eq!(detected.height, Some(300));
        assert_eq!(detected.max_size_kb, Some(120));
    }

    #[test]
    fn normalize_text_collapses_whitespace() {
        assert_eq!(
            normalize_text("  width:\n\t200px   height: 100px  "),
            "width: 200px height: 100px"
        );
    }

    #[test]
    fn serializes_with_extension_wire_keys() {
        let detected = detect("200 x 200 pixels, max 50 kb").unwrap();
        let json = serde_json::to_value(detected).unwrap();
        assert_eq!(json["width"], 200);
        assert_eq!(json["height"], 200);
        assert_eq!(json["maxSizeKB"], 50);
    }
}
