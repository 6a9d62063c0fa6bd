pub mod classify;
pub mod highlight;
pub mod pixel;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

pub use self::classify::{Classification, classify};
pub use self::highlight::{HIGHLIGHT, render};
pub use self::pixel::{count_mismatches, pixels_equal};
use crate::decode::{Dimensions, SvgRenderer, decode};
use crate::error::{CompareError, ToleranceError};

/// File name of the highlight artifact, written beside the base image.
pub const HIGHLIGHT_FILE_NAME: &str = "highlighted_differences.png";

/// Maximum share of mismatched pixels, in percent, still reported as equal.
/// Zero means only an exact match is equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Tolerance(f64);

impl Tolerance {
    pub const EXACT: Self = Self(0.0);

    pub fn new(percent: f64) -> Result<Self, ToleranceError> {
        if !percent.is_finite() || percent < 0.0 {
            return Err(ToleranceError::OutOfRange(percent));
        }
        Ok(Self(percent))
    }

    pub fn percent(self) -> f64 {
        self.0
    }
}

impl std::str::FromStr for Tolerance {
    type Err = ToleranceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim().parse()?)
    }
}

/// Result of one comparison. A dimension mismatch is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ComparisonOutcome {
    DimensionMismatch {
        base: Dimensions,
        compare: Dimensions,
    },
    Equal,
    EqualWithinTolerance {
        percentage: f64,
    },
    Different {
        percentage: f64,
        highlight_path: PathBuf,
    },
}

impl ComparisonOutcome {
    /// True for `Equal` and `EqualWithinTolerance`.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Equal | Self::EqualWithinTolerance { .. })
    }

    pub fn highlight_path(&self) -> Option<&Path> {
        match self {
            Self::Different { highlight_path, .. } => Some(highlight_path),
            _ => None,
        }
    }
}

impl fmt::Display for ComparisonOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { .. } => f.write_str("Images have different dimensions"),
            Self::Equal => f.write_str("Images are equal"),
            Self::EqualWithinTolerance { percentage } => {
                write!(f, "Images are equal with tolerance: {percentage:.2}")
            }
            Self::Different { highlight_path, .. } => write!(
                f,
                "Images are not equal. Differences highlighted in: {}",
                highlight_path.display()
            ),
        }
    }
}

#[derive(Clone, Copy, Default)]
pub struct CompareOptions<'a> {
    pub tolerance: Tolerance,
    /// Needed only when an input is an `.svg`.
    pub svg_renderer: Option<&'a dyn SvgRenderer>,
}

/// Where the highlight for `base` goes: its directory, fixed file name.
pub fn highlight_path_for(base: &Path) -> PathBuf {
    match base.parent() {
        Some(dir) => dir.join(HIGHLIGHT_FILE_NAME),
        None => PathBuf::from(HIGHLIGHT_FILE_NAME),
    }
}

/// Decode both images, compare them pixel by pixel and classify the result.
///
/// Runs synchronously. When the outcome is `Different`, the highlight image
/// is written to [`highlight_path_for`]`(base)` before returning.
pub fn compare_images(
    base: &Path,
    compare: &Path,
    options: CompareOptions<'_>,
) -> Result<ComparisonOutcome, CompareError> {
    let base_image = decode(base, options.svg_renderer)?;
    let compare_image = decode(compare, options.svg_renderer)?;

    let (base_dims, compare_dims) = (base_image.dimensions(), compare_image.dimensions());
    if base_dims != compare_dims {
        info!(base = %base_dims, compare = %compare_dims, "dimension mismatch");
        return Ok(ComparisonOutcome::DimensionMismatch {
            base: base_dims,
            compare: compare_dims,
        });
    }

    let total_pixels = base_dims.pixel_count();
    if total_pixels == 0 {
        return Ok(ComparisonOutcome::Equal);
    }

    let mismatches = count_mismatches(&base_image, &compare_image);
    let class = classify(mismatches, total_pixels, options.tolerance.percent());
    debug!(mismatches, total_pixels, ?class, "pixel scan complete");

    Ok(match class {
        Classification::Equal => ComparisonOutcome::Equal,
        Classification::WithinTolerance { percentage } => {
            ComparisonOutcome::EqualWithinTolerance { percentage }
        }
        Classification::Different { percentage } => {
            let highlight_path = highlight_path_for(base);
            render(&base_image, &compare_image, &highlight_path)?;
            info!(
                path = %highlight_path.display(),
                percentage,
                "differences highlighted"
            );
            ComparisonOutcome::Different {
                percentage,
                highlight_path,
            }
        }
    })
}
