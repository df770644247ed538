// ============================================================================
// TRANSFORM OPERATIONS - bitmap scaling used when the surface is resized
// ============================================================================

use image::{RgbaImage, Rgba, imageops};
use rayon::prelude::*;

/// Interpolation method for resize operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Pixel-exact: every output pixel is a copy of one input pixel.
    #[default]
    Nearest,
    Bilinear,
}

impl Interpolation {
    pub fn label(&self) -> &'static str {
        match self {
            Interpolation::Nearest => "Nearest Neighbor",
            Interpolation::Bilinear => "Bilinear",
        }
    }

    pub fn to_filter(&self) -> imageops::FilterType {
        match self {
            Interpolation::Nearest => imageops::FilterType::Nearest,
            Interpolation::Bilinear => imageops::FilterType::Triangle,
        }
    }
}

/// Scale `src` to `new_w`×`new_h`.
///
/// Nearest sampling picks the source pixel under each destination pixel
/// centre, so scaling up by an integer factor and back down again returns
/// the original bytes.
pub fn scale_rgba(src: &RgbaImage, new_w: u32, new_h: u32, interp: Interpolation) -> RgbaImage {
    if src.width() == new_w && src.height() == new_h {
        return src.clone();
    }
    match interp {
        Interpolation::Nearest => scale_nearest(src, new_w, new_h),
        Interpolation::Bilinear => imageops::resize(src, new_w, new_h, interp.to_filter()),
    }
}

/// Source index for destination index `d` when mapping `dst_len` onto `src_len`.
#[inline]
fn nearest_index(d: u32, src_len: u32, dst_len: u32) -> u32 {
    let mapped = ((2 * d as u64 + 1) * src_len as u64) / (2 * dst_len as u64);
    (mapped as u32).min(src_len - 1)
}

fn scale_nearest(src: &RgbaImage, new_w: u32, new_h: u32) -> RgbaImage {
    let (sw, sh) = src.dimensions();
    let src_raw = src.as_raw();
    let src_stride = sw as usize * 4;

    // Column lookup is shared by every row
    let columns: Vec<usize> = (0..new_w)
        .map(|x| nearest_index(x, sw, new_w) as usize * 4)
        .collect();

    let mut out = vec![0u8; new_w as usize * new_h as usize * 4];
    out.par_chunks_mut(new_w as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let sy = nearest_index(y as u32, sh, new_h) as usize;
            let src_row = &src_raw[sy * src_stride..(sy + 1) * src_stride];
            for (dst, &sx) in row.chunks_exact_mut(4).zip(&columns) {
                dst.copy_from_slice(&src_row[sx..sx + 4]);
            }
        });

    RgbaImage::from_raw(new_w, new_h, out).unwrap_or_else(|| RgbaImage::new(new_w, new_h))
}

/// Source-over blend of one pixel onto an opaque-or-not destination.
#[inline]
pub fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as u32;
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let da = dst[3] as u32;
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let s = src[c] as u32 * sa;
        let d = dst[c] as u32 * da * (255 - sa) / 255;
        out[c] = ((s + d) / out_a).min(255) as u8;
    }
    out[3] = out_a as u8;
    Rgba(out)
}

/// Composite `src` over `dst`.  Both images must have the same dimensions;
/// extra rows or columns in either are ignored.
pub fn composite_over(dst: &mut RgbaImage, src: &RgbaImage) {
    let w = dst.width().min(src.width()) as usize;
    let dst_stride = dst.width() as usize * 4;
    let src_stride = src.width() as usize * 4;
    let src_raw = src.as_raw();
    let rows = dst.height().min(src.height()) as usize;

    dst.par_chunks_mut(dst_stride)
        .take(rows)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src_raw[y * src_stride..y * src_stride + w * 4];
            for (d, s) in row[..w * 4].chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                let blended = blend_over(
                    Rgba([d[0], d[1], d[2], d[3]]),
                    Rgba([s[0], s[1], s[2], s[3]]),
                );
                d.copy_from_slice(&blended.0);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x * 17) as u8, (y * 29) as u8, ((x + y) % 2 * 255) as u8, 255])
        })
    }

    #[test]
    fn nearest_upscale_replicates_blocks() {
        let src = checker(3, 2);
        let big = scale_rgba(&src, 9, 6, Interpolation::Nearest);
        for y in 0..6 {
            for x in 0..9 {
                assert_eq!(big.get_pixel(x, y), src.get_pixel(x / 3, y / 2));
            }
        }
    }

    #[test]
    fn nearest_grow_then_shrink_is_lossless_at_integer_ratios() {
        let src = checker(7, 5);
        for k in [2u32, 3, 4] {
            let big = scale_rgba(&src, 7 * k, 5 * k, Interpolation::Nearest);
            let back = scale_rgba(&big, 7, 5, Interpolation::Nearest);
            assert_eq!(back.as_raw(), src.as_raw(), "factor {}", k);
        }
    }

    #[test]
    fn bilinear_keeps_solid_colour() {
        let src = RgbaImage::from_pixel(4, 4, Rgba([10, 200, 30, 255]));
        let out = scale_rgba(&src, 10, 7, Interpolation::Bilinear);
        assert_eq!(out.dimensions(), (10, 7));
        assert!(out.pixels().all(|p| *p == Rgba([10, 200, 30, 255])));
    }

    #[test]
    fn blend_over_respects_alpha_extremes() {
        let white = Rgba([255, 255, 255, 255]);
        assert_eq!(blend_over(white, Rgba([1, 2, 3, 255])), Rgba([1, 2, 3, 255]));
        assert_eq!(blend_over(white, Rgba([1, 2, 3, 0])), white);
        let half = blend_over(white, Rgba([0, 0, 0, 128]));
        assert_eq!(half[3], 255);
        assert!(half[0] > 120 && half[0] < 135);
    }

    #[test]
    fn composite_over_opaque_replaces() {
        let mut dst = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let src = checker(2, 2);
        composite_over(&mut dst, &src);
        assert_eq!(dst.as_raw(), src.as_raw());
    }
}
