use std::io::{BufWriter, Write};
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgba};
use tempfile::NamedTempFile;
use tracing::debug;

use super::pixel::pixels_equal;
use crate::decode::{PixelImage, Rgba16Image, SampleDepth};
use crate::error::CompareError;

/// Opaque full-intensity red at the working depth (255, 0, 0, 255 at 8 bits).
pub const HIGHLIGHT: Rgba<u16> = Rgba([u16::MAX, 0, 0, u16::MAX]);

/// Build the highlight map: [`HIGHLIGHT`] where samples differ, the base
/// sample everywhere else.
///
/// # Panics
///
/// If the images do not have the same dimensions.
pub fn highlight_map(base: &PixelImage, compare: &PixelImage) -> Rgba16Image {
    assert_eq!(
        base.dimensions(),
        compare.dimensions(),
        "highlight_map requires equally sized images"
    );

    let mut out = base.samples().clone();
    for (px, other) in out.pixels_mut().zip(compare.samples().pixels()) {
        if !pixels_equal(px, other) {
            *px = HIGHLIGHT;
        }
    }
    out
}

/// Render the highlight map and write it as PNG to `output`, replacing any
/// existing file.
///
/// The PNG is 8-bit unless either input had a deeper source. It is written
/// to a temporary file beside `output` and renamed into place, so a failed
/// write never leaves a partial file at `output`.
pub fn render(base: &PixelImage, compare: &PixelImage, output: &Path) -> Result<(), CompareError> {
    let map = highlight_map(base, compare);
    let image = match base.depth().max(compare.depth()) {
        SampleDepth::Eight => DynamicImage::ImageRgba8(DynamicImage::ImageRgba16(map).to_rgba8()),
        SampleDepth::Sixteen => DynamicImage::ImageRgba16(map),
    };

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp =
        NamedTempFile::new_in(dir).map_err(|e| CompareError::io("create temp file in", dir, e))?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        image
            .write_to(&mut writer, ImageFormat::Png)
            .map_err(|source| match source {
                image::ImageError::IoError(e) => CompareError::io("write", output, e),
                source => CompareError::Encode {
                    path: output.to_path_buf(),
                    source,
                },
            })?;
        writer
            .flush()
            .map_err(|e| CompareError::io("write", output, e))?;
    }

    tmp.persist(output)
        .map_err(|e| CompareError::io("write", output, e.error))?;
    debug!(path = %output.display(), "highlight image written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::pixel::count_mismatches;
    use image::{ImageBuffer, RgbaImage};

    fn image8(img: RgbaImage) -> PixelImage {
        PixelImage::from(DynamicImage::ImageRgba8(img))
    }

    fn white_with_black_at(w: u32, h: u32, points: &[(u32, u32)]) -> PixelImage {
        let mut img = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]));
        for &(x, y) in points {
            img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
        image8(img)
    }

    #[test]
    fn map_marks_only_mismatches() {
        let base = white_with_black_at(2, 2, &[]);
        let compare = white_with_black_at(2, 2, &[(1, 0)]);
        let map = highlight_map(&base, &compare);
        assert_eq!(*map.get_pixel(1, 0), HIGHLIGHT);
        assert_eq!(*map.get_pixel(0, 0), Rgba([65535, 65535, 65535, 65535]));
        assert_eq!(*map.get_pixel(0, 1), Rgba([65535, 65535, 65535, 65535]));
        assert_eq!(*map.get_pixel(1, 1), Rgba([65535, 65535, 65535, 65535]));
    }

    #[test]
    fn map_agrees_with_counter() {
        let mut a = RgbaImage::new(9, 7);
        let mut b = RgbaImage::new(9, 7);
        for (x, y, px) in a.enumerate_pixels_mut() {
            *px = Rgba([(x * 20) as u8, (y * 30) as u8, 7, 255]);
        }
        for (x, y, px) in b.enumerate_pixels_mut() {
            let g = if (x + y) % 3 == 0 { 0 } else { (y * 30) as u8 };
            *px = Rgba([(x * 20) as u8, g, 7, 255]);
        }
        let (a, b) = (image8(a), image8(b));

        let map = highlight_map(&a, &b);
        let mut highlighted = 0u64;
        for (x, y, px) in map.enumerate_pixels() {
            if pixels_equal(a.sample(x, y), b.sample(x, y)) {
                assert_eq!(px, a.sample(x, y));
            } else {
                assert_eq!(*px, HIGHLIGHT);
                highlighted += 1;
            }
        }
        assert_eq!(highlighted, count_mismatches(&a, &b));
    }

    #[test]
    fn transparent_pixels_keep_base_sample() {
        let base = image8(RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 0])));
        let mut other = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        other.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        let compare = image8(other);

        let map = highlight_map(&base, &compare);
        assert_eq!(map.get_pixel(0, 0), base.sample(0, 0));
        assert_eq!(*map.get_pixel(1, 0), HIGHLIGHT);
        assert_eq!(count_mismatches(&base, &compare), 1);
    }

    #[test]
    fn render_writes_eight_bit_png_for_eight_bit_sources() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("diff.png");
        let base = white_with_black_at(2, 2, &[]);
        let compare = white_with_black_at(2, 2, &[(0, 1)]);

        render(&base, &compare, &out).unwrap();

        let written = image::open(&out).unwrap();
        assert_eq!(written.color(), image::ColorType::Rgba8);
        let written = written.to_rgba8();
        assert_eq!(*written.get_pixel(0, 1), Rgba([255, 0, 0, 255]));
        assert_eq!(*written.get_pixel(1, 1), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn render_keeps_sixteen_bit_samples() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("diff.png");
        let deep: Rgba16Image = ImageBuffer::from_pixel(2, 1, Rgba([1001, 2002, 3003, 65535]));
        let base = PixelImage::from(DynamicImage::ImageRgba16(deep));
        let compare = white_with_black_at(2, 1, &[]);

        render(&base, &compare, &out).unwrap();

        let written = image::open(&out).unwrap();
        assert_eq!(written.color(), image::ColorType::Rgba16);
        assert_eq!(*written.to_rgba16().get_pixel(0, 0), HIGHLIGHT);
    }

    #[test]
    fn render_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("diff.png");
        std::fs::write(&out, b"stale").unwrap();

        let a = white_with_black_at(3, 3, &[]);
        let b = white_with_black_at(3, 3, &[(2, 2)]);
        render(&a, &b, &out).unwrap();

        assert_eq!(image::open(&out).unwrap().to_rgba8().dimensions(), (3, 3));
    }

    #[test]
    fn render_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let a = white_with_black_at(5, 5, &[(1, 1)]);
        let b = white_with_black_at(5, 5, &[(3, 4), (0, 0)]);

        render(&a, &b, &dir.path().join("one.png")).unwrap();
        render(&a, &b, &dir.path().join("two.png")).unwrap();

        let one = std::fs::read(dir.path().join("one.png")).unwrap();
        let two = std::fs::read(dir.path().join("two.png")).unwrap();
        assert_eq!(one, two);
    }

    #[test]
    fn render_into_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing").join("diff.png");
        let a = white_with_black_at(1, 1, &[]);
        let err = render(&a, &a, &out).unwrap_err();
        assert!(matches!(err, CompareError::Io { .. }));
        assert!(!out.exists());
    }
}
