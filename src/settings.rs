// ============================================================================
// ENGINE SETTINGS - key=value config file
// ============================================================================

use std::path::{Path, PathBuf};

use image::Rgba;

use crate::components::colors::{format_hex, parse_hex};
use crate::components::tools::MAX_STROKE_WIDTH;
use crate::error::{EngineError, EngineResult};
use crate::ops::transform::Interpolation;

/// PNG compression level used for `current_image()` exports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PngCompression {
    #[default]
    Fast,
    Default,
    Best,
}

impl PngCompression {
    pub fn to_png(self) -> png::Compression {
        match self {
            PngCompression::Fast => png::Compression::Fast,
            PngCompression::Default => png::Compression::Default,
            PngCompression::Best => png::Compression::Best,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            PngCompression::Fast => "fast",
            PngCompression::Default => "default",
            PngCompression::Best => "best",
        }
    }
}

/// Tunables for one editing session.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineSettings {
    /// Colour a blank, cleared or erased surface shows.
    pub background: Rgba<u8>,
    /// Maximum number of snapshots kept in history.
    pub history_cap: usize,
    /// Engagement-begin events this soon after a tool-control click are ignored.
    pub tool_suppression_ms: u64,
    pub default_color: Rgba<u8>,
    pub default_stroke_width: u32,
    pub resize_interpolation: Interpolation,
    pub png_compression: PngCompression,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            background: Rgba([255, 255, 255, 255]),
            history_cap: 20,
            tool_suppression_ms: 100,
            default_color: Rgba([0, 0, 0, 255]),
            default_stroke_width: 3,
            resize_interpolation: Interpolation::Nearest,
            png_compression: PngCompression::Fast,
        }
    }
}

impl EngineSettings {
    /// Default location of the settings file.
    /// On Linux:   ~/.config/sketchfe/sketchfe_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\SketchFE\sketchfe_settings.cfg
    /// On macOS:   ~/Library/Application Support/SketchFE/sketchfe_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(
                PathBuf::from(appdata)
                    .join("SketchFE")
                    .join("sketchfe_settings.cfg"),
            );
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("SketchFE")
                    .join("sketchfe_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("sketchfe").join("sketchfe_settings.cfg"))
        }
    }

    /// Load from `path`.  A missing file yields the defaults; a malformed
    /// file is an error.
    pub fn load_or_default(path: &Path) -> EngineResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                log_info!("Loaded settings from {}", path.display());
                Self::parse(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> EngineResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())?;
        Ok(())
    }

    /// Parse `key=value` lines on top of the defaults.
    pub fn parse(text: &str) -> EngineResult<Self> {
        let mut settings = Self::default();
        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(EngineError::Config(format!(
                    "line {}: expected key=value, got {:?}",
                    line_no + 1,
                    line
                )));
            };
            let (key, value) = (key.trim(), value.trim());
            let bad = |what: &str| {
                EngineError::Config(format!("line {}: invalid {} {:?}", line_no + 1, what, value))
            };

            match key {
                "background" => settings.background = parse_hex(value).ok_or_else(|| bad("colour"))?,
                "default_color" => {
                    settings.default_color = parse_hex(value).ok_or_else(|| bad("colour"))?
                }
                "history_cap" => {
                    let cap: usize = value.parse().map_err(|_| bad("history cap"))?;
                    settings.history_cap = cap.max(1);
                }
                "tool_suppression_ms" => {
                    settings.tool_suppression_ms = value.parse().map_err(|_| bad("duration"))?
                }
                "default_stroke_width" => {
                    let w: u32 = value.parse().map_err(|_| bad("stroke width"))?;
                    settings.default_stroke_width = w.clamp(1, MAX_STROKE_WIDTH);
                }
                "resize_interpolation" => {
                    settings.resize_interpolation = match value {
                        "nearest" => Interpolation::Nearest,
                        "bilinear" => Interpolation::Bilinear,
                        _ => return Err(bad("interpolation")),
                    }
                }
                "png_compression" => {
                    settings.png_compression = match value {
                        "fast" => PngCompression::Fast,
                        "default" => PngCompression::Default,
                        "best" => PngCompression::Best,
                        _ => return Err(bad("compression")),
                    }
                }
                other => {
                    log_warn!("settings: ignoring unknown key {:?}", other);
                }
            }
        }
        Ok(settings)
    }

    pub fn to_config_string(&self) -> String {
        let interp = match self.resize_interpolation {
            Interpolation::Nearest => "nearest",
            Interpolation::Bilinear => "bilinear",
        };
        format!(
            "background={}\n\
             history_cap={}\n\
             tool_suppression_ms={}\n\
             default_color={}\n\
             default_stroke_width={}\n\
             resize_interpolation={interp}\n\
             png_compression={}\n",
            format_hex(self.background),
            self.history_cap,
            self.tool_suppression_ms,
            format_hex(self.default_color),
            self.default_stroke_width,
            self.png_compression.as_str(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behaviour() {
        let s = EngineSettings::default();
        assert_eq!(s.history_cap, 20);
        assert_eq!(s.tool_suppression_ms, 100);
        assert_eq!(s.background, Rgba([255, 255, 255, 255]));
        assert_eq!(s.default_stroke_width, 3);
    }

    #[test]
    fn parse_overrides_and_skips_comments() {
        let text = "# engine\n\nhistory_cap = 5\nbackground=#102030\nresize_interpolation=bilinear\nmystery=1\n";
        let s = EngineSettings::parse(text).unwrap();
        assert_eq!(s.history_cap, 5);
        assert_eq!(s.background, Rgba([0x10, 0x20, 0x30, 255]));
        assert_eq!(s.resize_interpolation, Interpolation::Bilinear);
        assert_eq!(s.tool_suppression_ms, 100);
    }

    #[test]
    fn zero_history_cap_is_raised_to_one() {
        let s = EngineSettings::parse("history_cap=0").unwrap();
        assert_eq!(s.history_cap, 1);
    }

    #[test]
    fn malformed_values_are_config_errors() {
        assert!(matches!(
            EngineSettings::parse("history_cap=lots"),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineSettings::parse("no equals sign"),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineSettings::parse("background=#zzzzzz"),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn config_string_parses_back() {
        let mut s = EngineSettings::default();
        s.history_cap = 7;
        s.png_compression = PngCompression::Best;
        s.default_color = Rgba([1, 2, 3, 255]);
        assert_eq!(EngineSettings::parse(&s.to_config_string()).unwrap(), s);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("sketchfe-no-such-settings.cfg");
        let s = EngineSettings::load_or_default(&path).unwrap();
        assert_eq!(s, EngineSettings::default());
    }
}
