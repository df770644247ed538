// ============================================================================
// PIXEL SURFACE - the mutable RGBA buffer being edited, and its snapshots
// ============================================================================

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::error::{EngineError, EngineResult};
use crate::ops::transform::{self, Interpolation};

/// Largest surface we agree to allocate (matches 16K × 16K).
pub const MAX_SURFACE_PIXELS: u64 = 16_384 * 16_384;

fn check_size(width: u32, height: u32) -> EngineResult<()> {
    if width == 0 || height == 0 || (width as u64) * (height as u64) > MAX_SURFACE_PIXELS {
        return Err(EngineError::InvalidSize { width, height });
    }
    Ok(())
}

/// Immutable copy of a surface's pixels and dimensions at one point in time.
///
/// The pixel data sits behind an `Arc` so handing a snapshot out of history
/// is cheap; nothing ever writes through it.
#[derive(Clone, Debug)]
pub struct Snapshot {
    width: u32,
    height: u32,
    pixels: Arc<RgbaImage>,
}

impl Snapshot {
    /// Build a snapshot from a raw row-major RGBA buffer.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> EngineResult<Self> {
        check_size(width, height)?;
        let expected = width as usize * height as usize * 4;
        let actual = data.len();
        let pixels = RgbaImage::from_raw(width, height, data)
            .ok_or(EngineError::DimensionMismatch { expected, actual })?;
        if actual != expected {
            return Err(EngineError::DimensionMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.width && y < self.height).then(|| *self.pixels.get_pixel(x, y))
    }

    /// Bytes held by this snapshot.
    pub fn memory_size(&self) -> usize {
        self.pixels.as_raw().len()
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && (Arc::ptr_eq(&self.pixels, &other.pixels)
                || self.pixels.as_raw() == other.pixels.as_raw())
    }
}

impl Eq for Snapshot {}

/// Owns the live pixel buffer.
///
/// The buffer always holds exactly `width * height * 4` bytes; every resize
/// reallocates and repopulates it.
#[derive(Clone, Debug)]
pub struct PixelSurface {
    pixels: RgbaImage,
    background: Rgba<u8>,
    interpolation: Interpolation,
}

impl PixelSurface {
    /// Create a surface filled with `background`.
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> EngineResult<Self> {
        check_size(width, height)?;
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, background),
            background,
            interpolation: Interpolation::default(),
        })
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn background(&self) -> Rgba<u8> {
        self.background
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.width() && y < self.height()).then(|| *self.pixels.get_pixel(x, y))
    }

    /// Write one pixel.  Returns `false` (and writes nothing) when out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) -> bool {
        if x < self.width() && y < self.height() {
            self.pixels.put_pixel(x, y, color);
            true
        } else {
            false
        }
    }

    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Mutable row-major RGBA bytes, for engines that work on flat buffers.
    pub fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Copy the current buffer into an immutable snapshot.  O(width × height).
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.width(),
            height: self.height(),
            pixels: Arc::new(self.pixels.clone()),
        }
    }

    /// Replace buffer and dimensions wholesale from `snapshot`.
    ///
    /// Never fails: a snapshot captured at another size makes the surface
    /// adopt that size.  The surface keeps no reference to the snapshot.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        if self.dimensions() == snapshot.dimensions() {
            self.pixels.copy_from_slice(snapshot.as_raw());
        } else {
            self.pixels = snapshot.image().clone();
        }
    }

    /// Fill the whole buffer with the background colour.
    pub fn clear(&mut self) {
        let bg = self.background.0;
        self.pixels
            .par_chunks_exact_mut(4)
            .for_each(|px| px.copy_from_slice(&bg));
    }

    /// Resize to `new_w`×`new_h`, scaling existing content onto a fresh
    /// background-filled buffer.
    ///
    /// Returns `Ok(false)` without touching anything when the size already
    /// matches.  Resizing never creates history.
    pub fn resize(&mut self, new_w: u32, new_h: u32) -> EngineResult<bool> {
        if self.dimensions() == (new_w, new_h) {
            return Ok(false);
        }
        check_size(new_w, new_h)?;

        let scaled = transform::scale_rgba(&self.pixels, new_w, new_h, self.interpolation);
        let mut fresh = RgbaImage::from_pixel(new_w, new_h, self.background);
        transform::composite_over(&mut fresh, &scaled);

        log_debug!(
            "Surface resize {}×{} → {}×{} ({})",
            self.width(),
            self.height(),
            new_w,
            new_h,
            self.interpolation.label()
        );
        self.pixels = fresh;
        Ok(true)
    }

    /// Replace the content with `image` scaled to the current size and
    /// composited over the background.  Dimensions do not change.
    pub fn import_fitted(&mut self, image: &RgbaImage) {
        let (w, h) = self.dimensions();
        let scaled = transform::scale_rgba(image, w, h, self.interpolation);
        let mut fresh = RgbaImage::from_pixel(w, h, self.background);
        transform::composite_over(&mut fresh, &scaled);
        self.pixels = fresh;
    }
}
