use regex::{Captures, Regex};
use tracing::debug;

use super::rules::{DIMENSION_TIERS, SIZE_RULES};
use super::{MAX_DIMENSION_PX, MAX_SIZE_KB};

/// A single dimension rule: a named pattern plus the extractor that turns
/// its captures into a `(width, height)` candidate.
///
/// Extractors apply the range tie-break themselves (they know which capture
/// is a range bound); the runner owns the numeric sanity bounds so the
/// policy lives in exactly one place.
pub(crate) struct DimensionRule {
    pub name: &'static str,
    pub regex: Regex,
    pub extract: fn(&Regex, &Captures) -> Option<(u32, u32)>,
}

/// A priority level in the dimension cascade. Tiers are tried in order and
/// the first rule that produces an in-bounds pair short-circuits the rest.
pub(crate) struct DimensionTier {
    pub name: &'static str,
    pub rules: Vec<DimensionRule>,
}

/// A size-limit rule. All size rules share one extraction shape: one or two
/// numeric captures, larger bound wins.
pub(crate) struct SizeRule {
    pub name: &'static str,
    pub regex: Regex,
}

/// Run the tiered dimension cascade over `text`.
///
/// A rule whose match fails the sanity bound is discarded and the cascade
/// moves on to the next rule, then the next tier.
pub(crate) fn run_dimension_cascade(text: &str) -> Option<(u32, u32)> {
    for tier in DIMENSION_TIERS.iter() {
        for rule in &tier.rules {
            let Some(caps) = rule.regex.captures(text) else {
                continue;
            };
            let Some((width, height)) = (rule.extract)(&rule.regex, &caps) else {
                continue;
            };
            if !dimension_in_bounds(width) || !dimension_in_bounds(height) {
                debug!(
                    "Rule '{}' matched {}x{} but failed the sanity bound, continuing",
                    rule.name, width, height
                );
                continue;
            }
            debug!(
                "Dimension rule '{}' (tier {}) matched: {}x{}",
                rule.name, tier.name, width, height
            );
            return Some((width, height));
        }
    }
    None
}

/// Scan for a size limit. Independent of the dimension tiers; the first
/// rule in list order that yields an in-bounds value wins.
pub(crate) fn run_size_scan(text: &str) -> Option<u32> {
    for rule in SIZE_RULES.iter() {
        let Some(caps) = rule.regex.captures(text) else {
            continue;
        };
        let Some(first) = parse_capture(&caps, 1) else {
            continue;
        };
        let size = larger_bound(first, parse_capture(&caps, 2));
        if !size_in_bounds(size) {
            debug!(
                "Size rule '{}' matched {} KB but failed the sanity bound, continuing",
                rule.name, size
            );
            continue;
        }
        debug!("Size rule '{}' matched: {} KB", rule.name, size);
        return Some(size);
    }
    None
}

pub(crate) fn parse_capture(caps: &Captures, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

/// Range tie-break: when a pattern captures a range, the larger bound wins,
/// so a resize satisfies the upper limit of the allowed range.
pub(crate) fn larger_bound(value: u32, upper: Option<u32>) -> u32 {
    upper.map_or(value, |u| value.max(u))
}

/// Width/height assignment for keyword patterns follows the order of the
/// literal words "width" and "height" in the pattern source: a static,
/// pattern-specific order, independent of the matched text.
pub(crate) fn width_keyword_first(regex: &Regex) -> bool {
    let source = regex.as_str();
    match (source.find("width"), source.find("height")) {
        (Some(w), Some(h)) => w < h,
        _ => true,
    }
}

fn dimension_in_bounds(value: u32) -> bool {
    (1..=MAX_DIMENSION_PX).contains(&value)
}

fn size_in_bounds(value: u32) -> bool {
    (1..=MAX_SIZE_KB).contains(&value)
}
