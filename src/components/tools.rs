use image::Rgba;

/// Widest brush the engine accepts, in pixels.
pub const MAX_STROKE_WIDTH: u32 = 64;

/// Stroke width presets offered next to the surface.
pub const BRUSH_SIZE_PRESETS: [u32; 5] = [1, 3, 5, 10, 20];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
    /// Paint bucket (flood fill).
    Bucket,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Brush => "Brush",
            Tool::Eraser => "Eraser",
            Tool::Bucket => "Paint Bucket",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "brush" => Some(Tool::Brush),
            "eraser" => Some(Tool::Eraser),
            "bucket" | "fill" => Some(Tool::Bucket),
            _ => None,
        }
    }

    /// Whether engagement with this tool produces a stroke.
    pub fn strokes(&self) -> bool {
        matches!(self, Tool::Brush | Tool::Eraser)
    }
}

/// The stroke colour a gesture should use.  The eraser paints background.
pub fn derive_effective_stroke_color(tool: Tool, color: Rgba<u8>, background: Rgba<u8>) -> Rgba<u8> {
    match tool {
        Tool::Eraser => background,
        Tool::Brush | Tool::Bucket => color,
    }
}

/// Active tool, colour and stroke width.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolState {
    tool: Tool,
    color: Rgba<u8>,
    stroke_width: u32,
}

impl Default for ToolState {
    fn default() -> Self {
        Self::new(Rgba([0, 0, 0, 255]), 3)
    }
}

impl ToolState {
    pub fn new(color: Rgba<u8>, stroke_width: u32) -> Self {
        Self {
            tool: Tool::Brush,
            color: Rgba([color[0], color[1], color[2], 255]),
            stroke_width: stroke_width.clamp(1, MAX_STROKE_WIDTH),
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> Rgba<u8> {
        self.color
    }

    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }

    /// Switch tools.  Returns `false` when `tool` is already active.
    pub fn set_tool(&mut self, tool: Tool) -> bool {
        if tool == self.tool {
            return false;
        }
        log_debug!("Tool {} → {}", self.tool.label(), tool.label());
        self.tool = tool;
        true
    }

    /// Pick a colour.  Picking while the eraser is active switches back to
    /// the brush.  Returns `false` when nothing changed.
    pub fn set_color(&mut self, color: Rgba<u8>) -> bool {
        let color = Rgba([color[0], color[1], color[2], 255]);
        let mut changed = false;
        if color != self.color {
            self.color = color;
            changed = true;
        }
        if self.tool == Tool::Eraser {
            self.set_tool(Tool::Brush);
            changed = true;
        }
        changed
    }

    /// Set the brush diameter, clamped to `1..=MAX_STROKE_WIDTH`.
    pub fn set_stroke_width(&mut self, width: u32) -> bool {
        let width = width.clamp(1, MAX_STROKE_WIDTH);
        if width == self.stroke_width {
            return false;
        }
        self.stroke_width = width;
        true
    }

    pub fn effective_stroke_color(&self, background: Rgba<u8>) -> Rgba<u8> {
        derive_effective_stroke_color(self.tool, self.color, background)
    }
}
