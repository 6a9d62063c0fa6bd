use serde::Serialize;

/// Verdict on an aggregate mismatch count, before any artifact is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum Classification {
    Equal,
    WithinTolerance { percentage: f64 },
    Different { percentage: f64 },
}

/// Mismatched pixels as a percentage (0-100) of `total_pixels`.
pub fn mismatch_percentage(mismatches: u64, total_pixels: u64) -> f64 {
    debug_assert!(total_pixels > 0);
    100.0 * mismatches as f64 / total_pixels as f64
}

/// Classify `mismatches` out of `total_pixels` against `tolerance_percent`.
///
/// A percentage exactly equal to the tolerance is within tolerance. The
/// percentage is carried unrounded.
pub fn classify(mismatches: u64, total_pixels: u64, tolerance_percent: f64) -> Classification {
    if mismatches == 0 {
        return Classification::Equal;
    }
    let percentage = mismatch_percentage(mismatches, total_pixels);
    if percentage <= tolerance_percent {
        Classification::WithinTolerance { percentage }
    } else {
        Classification::Different { percentage }
    }
}
