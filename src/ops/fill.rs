// ============================================================================
// FLOOD FILL - exact-match, 4-connected, column-span stack fill
// ============================================================================

use image::Rgba;

use crate::canvas::PixelSurface;
use crate::components::colors::same_rgb;
use crate::error::{EngineError, EngineResult};

/// Recolour the maximal 4-connected region of pixels whose RGB exactly
/// equals the seed pixel's RGB.
///
/// Works directly on a row-major RGBA buffer of `width * height * 4` bytes.
/// Alpha is ignored when matching; filled pixels are written fully opaque.
/// Returns the number of pixels written, each pixel of the region exactly
/// once.  A seed that already has the fill colour is a no-op returning 0.
///
/// The stack holds one entry per column run rather than per pixel: each
/// popped seed walks up to the top of its run, then colours downward and
/// pushes the neighbouring column only where a new matching run begins.
pub fn flood_fill(
    buf: &mut [u8],
    width: u32,
    height: u32,
    seed: (u32, u32),
    fill: Rgba<u8>,
) -> EngineResult<usize> {
    let expected = width as usize * height as usize * 4;
    if buf.len() != expected {
        return Err(EngineError::DimensionMismatch {
            expected,
            actual: buf.len(),
        });
    }
    let (sx, sy) = seed;
    if sx >= width || sy >= height {
        return Err(EngineError::OutOfBounds {
            x: sx,
            y: sy,
            width,
            height,
        });
    }

    let w = width as usize;
    let h = height as usize;

    #[inline(always)]
    fn offset(w: usize, x: usize, y: usize) -> usize {
        (y * w + x) * 4
    }

    let seed_off = offset(w, sx as usize, sy as usize);
    let target = Rgba([buf[seed_off], buf[seed_off + 1], buf[seed_off + 2], buf[seed_off + 3]]);
    if same_rgb(target, fill) {
        return Ok(0);
    }
    let fill_px = [fill[0], fill[1], fill[2], 255];

    let matches = |buf: &[u8], o: usize| {
        buf[o] == target[0] && buf[o + 1] == target[1] && buf[o + 2] == target[2]
    };

    let mut written = 0usize;
    let mut stack: Vec<(usize, usize)> = Vec::with_capacity(64);
    stack.push((sx as usize, sy as usize));

    while let Some((x, mut y)) = stack.pop() {
        // Filled since it was pushed
        if !matches(buf, offset(w, x, y)) {
            continue;
        }

        while y > 0 && matches(buf, offset(w, x, y - 1)) {
            y -= 1;
        }

        let mut reach_left = false;
        let mut reach_right = false;
        while y < h {
            let o = offset(w, x, y);
            if !matches(buf, o) {
                break;
            }
            buf[o..o + 4].copy_from_slice(&fill_px);
            written += 1;

            if x > 0 {
                if matches(buf, o - 4) {
                    if !reach_left {
                        stack.push((x - 1, y));
                        reach_left = true;
                    }
                } else {
                    reach_left = false;
                }
            }
            if x + 1 < w {
                if matches(buf, o + 4) {
                    if !reach_right {
                        stack.push((x + 1, y));
                        reach_right = true;
                    }
                } else {
                    reach_right = false;
                }
            }
            y += 1;
        }
    }

    Ok(written)
}

/// Bucket fill on a live surface.
pub fn flood_fill_surface(
    surface: &mut PixelSurface,
    x: u32,
    y: u32,
    fill: Rgba<u8>,
) -> EngineResult<usize> {
    let (width, height) = surface.dimensions();
    let written = flood_fill(surface.raw_mut(), width, height, (x, y), fill)?;
    log_debug!("Flood fill at ({}, {}) recoloured {} px", x, y, written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn solid(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
        px.repeat(w as usize * h as usize)
    }

    fn put(buf: &mut [u8], w: u32, x: u32, y: u32, px: [u8; 4]) {
        let o = ((y * w + x) * 4) as usize;
        buf[o..o + 4].copy_from_slice(&px);
    }

    fn get(buf: &[u8], w: u32, x: u32, y: u32) -> [u8; 4] {
        let o = ((y * w + x) * 4) as usize;
        [buf[o], buf[o + 1], buf[o + 2], buf[o + 3]]
    }

    #[test]
    fn same_colour_seed_leaves_buffer_untouched() {
        let mut buf = solid(5, 5, [255, 0, 0, 255]);
        put(&mut buf, 5, 2, 2, BLACK);
        let before = buf.clone();
        assert_eq!(flood_fill(&mut buf, 5, 5, (0, 0), RED).unwrap(), 0);
        assert_eq!(buf, before);
    }

    #[test]
    fn alpha_is_ignored_for_the_no_op_check() {
        let mut buf = solid(3, 3, [255, 0, 0, 10]);
        let before = buf.clone();
        assert_eq!(flood_fill(&mut buf, 3, 3, (1, 1), RED).unwrap(), 0);
        assert_eq!(buf, before);
    }

    #[test]
    fn solid_buffer_fills_every_pixel_once() {
        let (w, h) = (37, 23);
        let mut buf = solid(w, h, WHITE);
        let written = flood_fill(&mut buf, w, h, (20, 11), RED).unwrap();
        assert_eq!(written, (w * h) as usize);
        assert!(buf.chunks_exact(4).all(|p| p == RED.0));
    }

    #[test]
    fn one_pixel_wall_contains_the_fill() {
        let (w, h) = (9, 9);
        let mut buf = solid(w, h, WHITE);
        // Vertical wall at x = 4, full height
        for y in 0..h {
            put(&mut buf, w, 4, y, BLACK);
        }
        let written = flood_fill(&mut buf, w, h, (1, 1), RED).unwrap();
        assert_eq!(written, (4 * h) as usize);
        for y in 0..h {
            for x in 0..w {
                let expect = match x {
                    0..=3 => RED.0,
                    4 => BLACK,
                    _ => WHITE,
                };
                assert_eq!(get(&buf, w, x, y), expect, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn diagonal_neighbours_are_not_connected() {
        // Checkerboard: every white pixel is isolated under 4-connectivity
        let (w, h) = (4, 4);
        let mut buf = solid(w, h, WHITE);
        for y in 0..h {
            for x in 0..w {
                if (x + y) % 2 == 1 {
                    put(&mut buf, w, x, y, BLACK);
                }
            }
        }
        assert_eq!(flood_fill(&mut buf, w, h, (0, 0), RED).unwrap(), 1);
        assert_eq!(get(&buf, w, 1, 1), WHITE);
    }

    #[test]
    fn u_shaped_region_is_reached_around_the_bend() {
        //   . # .
        //   . # .
        //   . . .
        let (w, h) = (3, 3);
        let mut buf = solid(w, h, WHITE);
        put(&mut buf, w, 1, 0, BLACK);
        put(&mut buf, w, 1, 1, BLACK);
        let written = flood_fill(&mut buf, w, h, (0, 0), RED).unwrap();
        assert_eq!(written, 7);
        assert_eq!(get(&buf, w, 2, 0), RED.0);
    }

    #[test]
    fn corner_seeds_stay_in_bounds() {
        for seed in [(0, 0), (6, 0), (0, 4), (6, 4)] {
            let mut buf = solid(7, 5, WHITE);
            assert_eq!(flood_fill(&mut buf, 7, 5, seed, RED).unwrap(), 35);
        }
    }

    #[test]
    fn single_pixel_region() {
        let mut buf = solid(1, 1, WHITE);
        assert_eq!(flood_fill(&mut buf, 1, 1, (0, 0), RED).unwrap(), 1);
        assert_eq!(buf, RED.0.to_vec());
    }

    #[test]
    fn out_of_bounds_seed_is_rejected() {
        let mut buf = solid(4, 4, WHITE);
        let before = buf.clone();
        assert!(matches!(
            flood_fill(&mut buf, 4, 4, (4, 0), RED),
            Err(EngineError::OutOfBounds { x: 4, y: 0, .. })
        ));
        assert_eq!(buf, before);
    }

    #[test]
    fn wrong_buffer_length_is_rejected() {
        let mut buf = vec![0u8; 10];
        assert!(matches!(
            flood_fill(&mut buf, 2, 2, (0, 0), RED),
            Err(EngineError::DimensionMismatch { expected: 16, actual: 10 })
        ));
    }

    #[test]
    fn fills_on_a_surface() {
        let mut s = PixelSurface::new(5, 5, Rgba(WHITE)).unwrap();
        s.set_pixel(2, 2, Rgba(BLACK));
        let written = flood_fill_surface(&mut s, 0, 0, RED).unwrap();
        assert_eq!(written, 24);
        assert_eq!(s.get_pixel(2, 2), Some(Rgba(BLACK)));
        assert_eq!(s.get_pixel(4, 4), Some(RED));
    }
}
