use image::Rgba;

/// One swatch of the drawing palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Swatch {
    pub label: &'static str,
    pub color: Rgba<u8>,
}

const fn swatch(label: &'static str, r: u8, g: u8, b: u8) -> Swatch {
    Swatch {
        label,
        color: Rgba([r, g, b, 255]),
    }
}

/// The colours offered next to the sketch surface.
pub const DRAWING_PALETTE: [Swatch; 10] = [
    swatch("Black", 0x00, 0x00, 0x00),
    swatch("White", 0xff, 0xff, 0xff),
    swatch("Red", 0xff, 0x00, 0x00),
    swatch("Blue", 0x00, 0x00, 0xff),
    swatch("Green", 0x00, 0x80, 0x00),
    swatch("Purple", 0x80, 0x00, 0x80),
    swatch("Orange", 0xff, 0xa5, 0x00),
    swatch("Yellow", 0xff, 0xff, 0x00),
    swatch("Brown", 0x96, 0x4b, 0x00),
    swatch("Cyan", 0x00, 0xff, 0xff),
];

/// Parse `#rrggbb` or `rrggbb` (case-insensitive) into an opaque colour.
pub fn parse_hex(s: &str) -> Option<Rgba<u8>> {
    let hex = s.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))
}

/// Lower-case `#rrggbb`; alpha is dropped.
pub fn format_hex(c: Rgba<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2])
}

/// RGB equality, alpha ignored.
#[inline]
pub fn same_rgb(a: Rgba<u8>, b: Rgba<u8>) -> bool {
    a[0] == b[0] && a[1] == b[1] && a[2] == b[2]
}
