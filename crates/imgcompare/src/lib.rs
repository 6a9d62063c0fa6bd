//! Pixel-exact comparison of two raster images.
//!
//! Both inputs are decoded to a uniform 16-bit RGBA grid, compared sample by
//! sample, and the mismatch percentage is classified against a tolerance.
//! When the images differ beyond the tolerance a PNG marking every mismatched
//! pixel in red is written next to the base image.

pub mod compare;
pub mod decode;
pub mod error;

pub use compare::{
    Classification, CompareOptions, ComparisonOutcome, HIGHLIGHT_FILE_NAME, Tolerance,
    compare_images,
};
pub use decode::{ChromeRenderer, Dimensions, Format, PixelImage, SampleDepth, SvgRenderer};
pub use error::{CompareError, ToleranceError};
