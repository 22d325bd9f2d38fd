use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::cascade::{
    larger_bound, parse_capture, width_keyword_first, DimensionRule, DimensionTier, SizeRule,
};

fn rule(
    name: &'static str,
    pattern: &str,
    extract: fn(&Regex, &Captures) -> Option<(u32, u32)>,
) -> DimensionRule {
    DimensionRule {
        name,
        regex: Regex::new(pattern).unwrap(),
        extract,
    }
}

/// Dimension patterns in priority order.
///
/// Tier "specific" anchors on requirement-style phrasing ("width should be
/// ... height should be ...") or on pixel-unit markers, including the
/// Devanagari one, and understands height ranges. Tier "explicit" needs the
/// literal width/height keywords. Tier "generic" is the bare `A x B`
/// fallback and is only reached when everything above failed.
pub(crate) static DIMENSION_TIERS: Lazy<Vec<DimensionTier>> = Lazy::new(|| {
    vec![
        DimensionTier {
            name: "specific",
            rules: vec![
                rule(
                    "width_and_height_range",
                    r"(?i)width\s+(?:should\s+be\s+)?(\d+)\s*(?:pixels?\s+)?(?:and|,)\s+height\s+(?:should\s+be\s+)?(\d+)\s+to\s+(\d+)\s*pixels?",
                    extract_width_height_range,
                ),
                rule(
                    "width_and_height",
                    r"(?i)width\s+(?:should\s+be\s+)?(\d+)\s*(?:pixels?\s+)?(?:and|,)\s+height\s+(?:should\s+be\s+)?(\d+)\s*pixels?",
                    extract_width_height_range,
                ),
                rule(
                    "bare_number_then_range",
                    r"(?i)(\d+)\s+(?:pixels?|पिक्सेल)[^\d]*?(\d+)\s+(?:to|and|-)\s+(\d+)\s+(?:pixels?|पिक्सेल)",
                    extract_bare_number_then_range,
                ),
                rule(
                    "range_then_bare_number",
                    r"(?i)(\d+)\s+to\s+(\d+)\s+(?:pixels?|पिक्सेल)[^\d]*?(\d+)\s+(?:pixels?|पिक्सेल)",
                    extract_range_then_bare_number,
                ),
            ],
        },
        DimensionTier {
            name: "explicit",
            rules: vec![
                rule(
                    "width_keyword_then_height_keyword",
                    r"(?i)width[:\s]+(?:should\s+be\s+)?(\d+)\s*(?:px|pixels?)?[,\s]+(?:and\s+)?height[:\s]+(?:should\s+be\s+)?(\d+)(?:\s+to\s+(\d+))?\s*(?:px|pixels?)?",
                    extract_keyword_pair_range_second,
                ),
                rule(
                    "height_keyword_then_width_keyword",
                    r"(?i)height[:\s]+(?:should\s+be\s+)?(\d+)(?:\s+to\s+(\d+))?\s*(?:px|pixels?)?[,\s]+(?:and\s+)?width[:\s]+(?:should\s+be\s+)?(\d+)\s*(?:px|pixels?)?",
                    extract_keyword_pair_range_first,
                ),
            ],
        },
        DimensionTier {
            name: "generic",
            rules: vec![
                rule(
                    "x_separator",
                    r"(?i)(\d+)\s*[x×]\s*(\d+)\s*(?:px|pixels?|पिक्सेल)?",
                    extract_pair,
                ),
                rule(
                    "star_separator",
                    r"(?i)(\d+)\s*\*\s*(\d+)\s*(?:px|pixels?|पिक्सेल)?",
                    extract_pair,
                ),
                rule(
                    "loose_width_height",
                    r"(?i)width[:\s]*(\d+)\s*(?:px)?[,\s]*height[:\s]*(\d+)\s*(?:px)?",
                    extract_keyword_pair,
                ),
                rule(
                    "loose_height_width",
                    r"(?i)height[:\s]*(\d+)\s*(?:px)?[,\s]*width[:\s]*(\d+)\s*(?:px)?",
                    extract_keyword_pair,
                ),
            ],
        },
    ]
});

/// Size-limit patterns in priority order. The first rule yielding an
/// in-bounds value wins; two captures mean a range (larger bound wins).
pub(crate) static SIZE_RULES: Lazy<Vec<SizeRule>> = Lazy::new(|| {
    fn size_rule(name: &'static str, pattern: &str) -> SizeRule {
        SizeRule {
            name,
            regex: Regex::new(pattern).unwrap(),
        }
    }

    vec![
        size_rule(
            "between_kb_range",
            r"(?i)between\s+(\d+)\s*kb\s+(?:to|and|-)\s+(\d+)\s*kb",
        ),
        size_rule(
            "between_kb_range_bare",
            r"(?i)between\s+(\d+)\s*kb\s+(?:to|and|-)\s+(\d+)",
        ),
        size_rule("kb_range", r"(?i)(\d+)\s*kb\s+(?:to|and|-)\s+(\d+)\s*kb"),
        size_rule(
            "max_kb",
            r"(?i)(?:max(?:imum)?|less\s+than|below|under|up\s+to)[:\s]*(\d+)\s*kb",
        ),
        size_rule("kb_max", r"(?i)(\d+)\s*kb\s*(?:max(?:imum)?|or\s+less)"),
        size_rule("size_label_kb", r"(?i)(?:size|file)[:\s]*(\d+)\s*kb"),
        size_rule(
            "size_label_kb_range",
            r"(?i)size.*?(\d+)\s*kb\s+(?:to|and|-)\s+(\d+)\s*kb",
        ),
    ]
});

/// "width ... X ... height ... Y [to Z]": width is the first capture, the
/// height takes the larger bound of its range when one is present.
fn extract_width_height_range(_: &Regex, caps: &Captures) -> Option<(u32, u32)> {
    let width = parse_capture(caps, 1)?;
    let height = larger_bound(parse_capture(caps, 2)?, parse_capture(caps, 3));
    Some((width, height))
}

/// Heuristic: a bare number followed by a range is read as width then a
/// height range. Not a certainty; it just holds for the requirement texts
/// collected so far.
fn extract_bare_number_then_range(_: &Regex, caps: &Captures) -> Option<(u32, u32)> {
    let width = parse_capture(caps, 1)?;
    let height = larger_bound(parse_capture(caps, 2)?, parse_capture(caps, 3));
    Some((width, height))
}

/// Mirror heuristic: a leading range is the height, the trailing bare
/// number the width.
fn extract_range_then_bare_number(_: &Regex, caps: &Captures) -> Option<(u32, u32)> {
    let height = larger_bound(parse_capture(caps, 1)?, parse_capture(caps, 2));
    let width = parse_capture(caps, 3)?;
    Some((width, height))
}

/// Explicit keyword pattern with the optional range on the second
/// dimension. Assignment to width/height follows the keyword order in the
/// pattern source.
fn extract_keyword_pair_range_second(regex: &Regex, caps: &Captures) -> Option<(u32, u32)> {
    let first = parse_capture(caps, 1)?;
    let second = larger_bound(parse_capture(caps, 2)?, parse_capture(caps, 3));
    Some(ordered(regex, first, second))
}

/// Explicit keyword pattern with the optional range on the first dimension.
fn extract_keyword_pair_range_first(regex: &Regex, caps: &Captures) -> Option<(u32, u32)> {
    let first = larger_bound(parse_capture(caps, 1)?, parse_capture(caps, 2));
    let second = parse_capture(caps, 3)?;
    Some(ordered(regex, first, second))
}

/// Keyword pattern without range support (generic tier).
fn extract_keyword_pair(regex: &Regex, caps: &Captures) -> Option<(u32, u32)> {
    let first = parse_capture(caps, 1)?;
    let second = parse_capture(caps, 2)?;
    Some(ordered(regex, first, second))
}

/// Bare `A x B` / `A * B`: first capture is width, second height.
fn extract_pair(_: &Regex, caps: &Captures) -> Option<(u32, u32)> {
    Some((parse_capture(caps, 1)?, parse_capture(caps, 2)?))
}

fn ordered(regex: &Regex, first: u32, second: u32) -> (u32, u32) {
    if width_keyword_first(regex) {
        (first, second)
    } else {
        (second, first)
    }
}
