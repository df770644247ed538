// ============================================================================
// BRUSH RASTERIZER - hard-edged round stamps along line segments
// ============================================================================

use image::Rgba;

use crate::canvas::PixelSurface;

/// Stamp a filled disc of diameter `width` centred on `(cx, cy)`.
///
/// Integer coordinates address pixel centres.  The pixel nearest the centre
/// is always painted, so a 1 px brush never vanishes between pixel centres.
/// Parts of the disc outside the surface are clipped.
pub fn stamp_disc(surface: &mut PixelSurface, cx: f32, cy: f32, width: u32, color: Rgba<u8>) {
    let (w, h) = surface.dimensions();
    let radius = width.max(1) as f32 / 2.0;
    let radius_sq = radius * radius;

    let min_x = (cx - radius).floor().max(0.0) as i64;
    let min_y = (cy - radius).floor().max(0.0) as i64;
    let max_x = ((cx + radius).ceil() as i64).min(w as i64 - 1);
    let max_y = ((cy + radius).ceil() as i64).min(h as i64 - 1);

    for py in min_y..=max_y {
        let dy = py as f32 - cy;
        for px in min_x..=max_x {
            let dx = px as f32 - cx;
            if dx * dx + dy * dy <= radius_sq {
                surface.set_pixel(px as u32, py as u32, color);
            }
        }
    }

    let (nx, ny) = (cx.round(), cy.round());
    if nx >= 0.0 && ny >= 0.0 {
        surface.set_pixel(nx as u32, ny as u32, color);
    }
}

/// Draw a line from `start` to `end` with round caps.
///
/// Discs are stamped at sub-pixel steps of at most one pixel, which also
/// gives round joins between consecutive segments of a stroke.
pub fn draw_segment(
    surface: &mut PixelSurface,
    start: (f32, f32),
    end: (f32, f32),
    width: u32,
    color: Rgba<u8>,
) {
    // Step only along the part of the segment a stamp can reach from.
    let reach = width.max(1) as f64 / 2.0 + 1.0;
    let (w, h) = surface.dimensions();
    let bounds = (-reach, -reach, w as f64 - 1.0 + reach, h as f64 - 1.0 + reach);
    let Some((start, end)) = clip_segment(start, end, bounds) else {
        return;
    };

    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let distance = (dx * dx + dy * dy).sqrt();

    if distance < 0.1 {
        stamp_disc(surface, start.0, start.1, width, color);
        return;
    }

    let steps = distance.ceil() as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        stamp_disc(surface, start.0 + dx * t, start.1 + dy * t, width, color);
    }
}

/// Liang-Barsky clip of `start..end` to `(min_x, min_y, max_x, max_y)`.
/// `None` when nothing of the segment lies inside, or a coordinate is not finite.
fn clip_segment(
    start: (f32, f32),
    end: (f32, f32),
    (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
) -> Option<((f32, f32), (f32, f32))> {
    if ![start.0, start.1, end.0, end.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (x0, y0) = (start.0 as f64, start.1 as f64);
    let (dx, dy) = (end.0 as f64 - x0, end.1 as f64 - y0);

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [(-dx, x0 - min_x), (dx, max_x - x0), (-dy, y0 - min_y), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    if t0 == 0.0 && t1 == 1.0 {
        return Some((start, end));
    }
    let at = |t: f64| ((x0 + dx * t) as f32, (y0 + dy * t) as f32);
    Some((at(t0), at(t1)))
}
