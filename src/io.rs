// ============================================================================
// EXPORT / IMPORT - PNG bytes for the generation collaborator, image decode
// ============================================================================

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;

use crate::canvas::Snapshot;
use crate::error::{EngineError, EngineResult};
use crate::settings::PngCompression;

/// Encoded surface handed to whoever submits it for generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedImage {
    /// PNG file bytes.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ExportedImage {
    pub const MIME: &'static str = "image/png";

    /// `data:image/png;base64,...`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", Self::MIME, STANDARD.encode(&self.bytes))
    }

    pub fn write_to(&self, path: &Path) -> EngineResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&self.bytes)?;
        writer.flush()?;
        Ok(())
    }
}

/// Encode row-major RGBA8 pixels as a PNG.
fn encode_rgba_png(
    raw: &[u8],
    width: u32,
    height: u32,
    compression: PngCompression,
) -> EngineResult<Vec<u8>> {
    let expected = width as usize * height as usize * 4;
    if raw.len() != expected {
        return Err(EngineError::DimensionMismatch {
            expected,
            actual: raw.len(),
        });
    }

    let mut bytes = Vec::with_capacity(expected / 4 + 64);
    {
        let mut encoder = png::Encoder::new(&mut bytes, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(compression.to_png());
        let mut writer = encoder.write_header()?;
        writer.write_image_data(raw)?;
        writer.finish()?;
    }
    Ok(bytes)
}

/// Encode a snapshot for export.
pub fn export_snapshot(snapshot: &Snapshot, compression: PngCompression) -> EngineResult<ExportedImage> {
    let bytes = encode_rgba_png(
        snapshot.as_raw(),
        snapshot.width(),
        snapshot.height(),
        compression,
    )?;
    Ok(ExportedImage {
        bytes,
        width: snapshot.width(),
        height: snapshot.height(),
    })
}

/// Encode an image buffer for export.
pub fn export_image(image: &RgbaImage, compression: PngCompression) -> EngineResult<ExportedImage> {
    let bytes = encode_rgba_png(image.as_raw(), image.width(), image.height(), compression)?;
    Ok(ExportedImage {
        bytes,
        width: image.width(),
        height: image.height(),
    })
}

/// Decode any format the `image` crate understands (PNG, JPEG, WEBP, BMP) to RGBA8.
pub fn decode_image(bytes: &[u8]) -> EngineResult<RgbaImage> {
    let img = image::load_from_memory(bytes)?;
    Ok(img.into_rgba8())
}

/// Decode a `data:<mime>;base64,<payload>` URL, or bare base64, to RGBA8.
pub fn decode_data_url(url: &str) -> EngineResult<RgbaImage> {
    let payload = match url.split_once(',') {
        Some((header, payload)) if header.starts_with("data:") => payload,
        _ => url,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| EngineError::Decode(format!("base64: {}", e)))?;
    decode_image(&bytes)
}

pub fn load_image_file(path: &Path) -> EngineResult<RgbaImage> {
    let bytes = std::fs::read(path)?;
    decode_image(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(5, 3, |x, y| Rgba([x as u8 * 40, y as u8 * 80, 7, 255]))
    }

    #[test]
    fn png_bytes_decode_back_to_the_same_pixels() {
        let img = sample();
        let out = export_image(&img, PngCompression::Best).unwrap();
        assert_eq!((out.width, out.height), (5, 3));
        assert_eq!(&out.bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoder = png::Decoder::new(out.bytes.as_slice());
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (5, 3));
        assert_eq!(&buf[..info.buffer_size()], img.as_raw().as_slice());
    }

    #[test]
    fn data_url_round_trips_through_decoder() {
        let img = sample();
        let url = export_image(&img, PngCompression::Fast).unwrap().to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), img);
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(matches!(decode_image(b"not an image"), Err(EngineError::Decode(_))));
        assert!(matches!(
            decode_data_url("data:image/png;base64,@@@"),
            Err(EngineError::Decode(_))
        ));
    }

    #[test]
    fn snapshot_export_matches_dimensions() {
        let snap = Snapshot::from_raw(2, 2, vec![9; 16]).unwrap();
        let out = export_snapshot(&snap, PngCompression::Default).unwrap();
        assert_eq!((out.width, out.height), (2, 2));
    }
}
