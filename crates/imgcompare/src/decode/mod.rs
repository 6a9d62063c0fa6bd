pub mod svg;

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageFormat, ImageReader, Rgba};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::CompareError;

pub use self::svg::{ChromeRenderer, SvgRenderer, converted_png_path};

/// RGBA buffer at the working depth every input is normalized to.
pub type Rgba16Image = ImageBuffer<Rgba<u16>, Vec<u16>>;

/// Encodings accepted by [`decode`], resolved once from the file extension.
///
/// Extension matching is case-sensitive: `photo.PNG` is unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Png,
    Jpeg,
    Svg,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Svg => "SVG",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Bits per channel of the encoded source, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SampleDepth {
    Eight,
    Sixteen,
}

/// Decoded image: a width x height grid of 16-bit RGBA samples.
///
/// 8-bit sources are widened (`v * 257`), so a PNG and a JPEG holding the
/// same colors compare equal channel for channel.
#[derive(Debug, Clone)]
pub struct PixelImage {
    samples: Rgba16Image,
    depth: SampleDepth,
}

impl PixelImage {
    pub fn dimensions(&self) -> Dimensions {
        let (width, height) = self.samples.dimensions();
        Dimensions { width, height }
    }

    pub fn pixel_count(&self) -> u64 {
        self.dimensions().pixel_count()
    }

    pub fn depth(&self) -> SampleDepth {
        self.depth
    }

    pub fn sample(&self, x: u32, y: u32) -> &Rgba<u16> {
        self.samples.get_pixel(x, y)
    }

    pub fn samples(&self) -> &Rgba16Image {
        &self.samples
    }
}

impl From<DynamicImage> for PixelImage {
    fn from(image: DynamicImage) -> Self {
        let color = image.color();
        let depth = if color.bytes_per_pixel() / color.channel_count() > 1 {
            SampleDepth::Sixteen
        } else {
            SampleDepth::Eight
        };
        Self {
            samples: image.to_rgba16(),
            depth,
        }
    }
}

/// Decode the image at `path` into a [`PixelImage`].
///
/// The format comes from the extension and is checked before the file is
/// opened. SVG inputs are first rasterized to PNG by `svg`; without a
/// renderer they fail with [`CompareError::Render`].
pub fn decode(path: &Path, svg: Option<&dyn SvgRenderer>) -> Result<PixelImage, CompareError> {
    let format = Format::from_path(path).ok_or_else(|| CompareError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    info!(path = %path.display(), %format, "loading image");

    let image = match format {
        Format::Png => decode_raster(path, Format::Png, ImageFormat::Png)?,
        Format::Jpeg => decode_raster(path, Format::Jpeg, ImageFormat::Jpeg)?,
        Format::Svg => {
            let renderer = svg.ok_or_else(|| CompareError::Render {
                path: path.to_path_buf(),
                reason: "no SVG renderer configured".to_string(),
            })?;
            let png_path = renderer.convert(path)?;
            decode_raster(&png_path, Format::Png, ImageFormat::Png)?
        }
    };

    debug!(
        path = %path.display(),
        dimensions = %image.dimensions(),
        depth = ?image.depth(),
        "image decoded"
    );
    Ok(image)
}

fn decode_raster(
    path: &Path,
    format: Format,
    image_format: ImageFormat,
) -> Result<PixelImage, CompareError> {
    let file = File::open(path).map_err(|e| CompareError::io("open", path, e))?;
    let image = ImageReader::with_format(BufReader::new(file), image_format)
        .decode()
        .map_err(|source| match source {
            image::ImageError::IoError(e) => CompareError::io("read", path, e),
            source => CompareError::Decode {
                format,
                path: path.to_path_buf(),
                source,
            },
        })?;
    Ok(PixelImage::from(image))
}
