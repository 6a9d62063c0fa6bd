use image::Rgba;

use crate::decode::PixelImage;

/// Color channels scaled by alpha (`c * a / 0xffff`), alpha unchanged.
///
/// Fully transparent samples all collapse to zero regardless of the color
/// stored behind them.
#[inline]
pub fn premultiplied(p: &Rgba<u16>) -> [u32; 4] {
    let a = u32::from(p[3]);
    [
        u32::from(p[0]) * a / 0xffff,
        u32::from(p[1]) * a / 0xffff,
        u32::from(p[2]) * a / 0xffff,
        a,
    ]
}

/// Exact equality on all four alpha-premultiplied channels. Shared by the
/// counter and the highlight renderer so the artifact always agrees with the
/// reported count.
#[inline]
pub fn pixels_equal(a: &Rgba<u16>, b: &Rgba<u16>) -> bool {
    a.0 == b.0 || premultiplied(a) == premultiplied(b)
}

/// Count coordinates whose samples differ, scanning the whole image in
/// row-major order.
///
/// # Panics
///
/// If the images do not have the same dimensions; callers check first.
pub fn count_mismatches(a: &PixelImage, b: &PixelImage) -> u64 {
    assert_eq!(
        a.dimensions(),
        b.dimensions(),
        "count_mismatches requires equally sized images"
    );

    let mut mismatches = 0u64;
    for (pa, pb) in a.samples().pixels().zip(b.samples().pixels()) {
        if !pixels_equal(pa, pb) {
            mismatches += 1;
        }
    }
    mismatches
}
