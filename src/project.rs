use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use uuid::Uuid;

use crate::canvas::{PixelSurface, Snapshot};
use crate::components::history::HistoryStack;
use crate::components::input::{GestureOutcome, PointerEvent, StrokeInputPipeline};
use crate::components::tools::{Tool, ToolState};
use crate::error::EngineResult;
use crate::io::{self, ExportedImage};
use crate::settings::EngineSettings;

/// One editing session: a surface, its history, the tool state and the
/// input pipeline feeding them.
///
/// All mutation is sequenced through `&mut self`, so a fill or resize always
/// completes before the next pointer event is looked at.
pub struct EditorSession {
    pub id: Uuid,
    surface: PixelSurface,
    history: HistoryStack,
    tools: ToolState,
    pipeline: StrokeInputPipeline,
    settings: EngineSettings,
    /// Last size reported by the display, if any.
    display_size: Option<(u32, u32)>,
}

impl EditorSession {
    /// Mount a blank surface and record it as history entry 0.
    pub fn new(width: u32, height: u32, settings: EngineSettings) -> EngineResult<Self> {
        let surface = PixelSurface::new(width, height, settings.background)?
            .with_interpolation(settings.resize_interpolation);
        let mut history = HistoryStack::new(settings.history_cap);
        history.commit(surface.snapshot());

        let session = Self {
            id: Uuid::new_v4(),
            surface,
            history,
            tools: ToolState::new(settings.default_color, settings.default_stroke_width),
            pipeline: StrokeInputPipeline::new(Duration::from_millis(settings.tool_suppression_ms)),
            settings,
            display_size: Some((width, height)),
        };
        log_info!("Session {} mounted at {}×{}", session.id, width, height);
        Ok(session)
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_position(&self) -> Option<usize> {
        self.history.position()
    }

    pub fn history_memory(&self) -> usize {
        self.history.memory_usage()
    }

    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.history.current()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_stroking(&self) -> bool {
        self.pipeline.is_stroking()
    }

    // ---- tool controls ------------------------------------------------------

    /// Programmatic tool changes (scripts, restored preferences).  Unlike the
    /// `select_*` calls these do not open the suppression window.
    pub fn tools_mut(&mut self) -> &mut ToolState {
        &mut self.tools
    }

    /// A tool control was clicked without changing anything.
    pub fn note_tool_click(&mut self, at: Instant) {
        self.pipeline.note_tool_interaction(at);
    }

    pub fn select_tool(&mut self, tool: Tool, at: Instant) -> bool {
        self.pipeline.note_tool_interaction(at);
        self.tools.set_tool(tool)
    }

    pub fn select_color(&mut self, color: Rgba<u8>, at: Instant) -> bool {
        self.pipeline.note_tool_interaction(at);
        self.tools.set_color(color)
    }

    pub fn select_stroke_width(&mut self, width: u32, at: Instant) -> bool {
        self.pipeline.note_tool_interaction(at);
        self.tools.set_stroke_width(width)
    }

    // ---- input --------------------------------------------------------------

    pub fn handle_pointer(&mut self, event: PointerEvent) -> EngineResult<GestureOutcome> {
        self.pipeline
            .handle(event, &mut self.surface, &mut self.history, &self.tools)
    }

    /// Commit any stroke still in progress (e.g. before teardown or undo).
    pub fn finish_gesture(&mut self) -> GestureOutcome {
        self.pipeline.finish(&self.surface, &mut self.history)
    }

    // ---- history ------------------------------------------------------------

    pub fn undo(&mut self) -> EngineResult<()> {
        self.finish_gesture();
        let snapshot = self.history.undo()?.clone();
        self.apply_snapshot(&snapshot)?;
        log_info!("Undo → position {:?}", self.history.position());
        Ok(())
    }

    pub fn redo(&mut self) -> EngineResult<()> {
        self.finish_gesture();
        let snapshot = self.history.redo()?.clone();
        self.apply_snapshot(&snapshot)?;
        log_info!("Redo → position {:?}", self.history.position());
        Ok(())
    }

    /// Restore a snapshot, then re-fit it to the display if it was captured
    /// at another size.
    fn apply_snapshot(&mut self, snapshot: &Snapshot) -> EngineResult<()> {
        self.surface.restore(snapshot);
        if let Some((w, h)) = self.display_size {
            self.surface.resize(w, h)?;
        }
        Ok(())
    }

    /// Wipe to background and record the wipe as an undoable step.
    pub fn clear(&mut self) {
        self.finish_gesture();
        self.surface.clear();
        self.history.commit(self.surface.snapshot());
        log_info!("Surface cleared");
    }

    // ---- display ------------------------------------------------------------

    /// The display area changed size.  Content is scaled, not cropped, and
    /// no history entry is written.  Returns `false` if the size is unchanged.
    pub fn resize_display(&mut self, width: u32, height: u32) -> EngineResult<bool> {
        let changed = self.surface.resize(width, height)?;
        self.display_size = Some((width, height));
        if changed {
            log_info!("Display resized to {}×{}", width, height);
        }
        Ok(changed)
    }

    /// Place an uploaded image on the surface, fitted to its current size.
    pub fn load_image(&mut self, image: &RgbaImage) {
        self.finish_gesture();
        self.surface.import_fitted(image);
        self.history.commit(self.surface.snapshot());
        log_info!(
            "Imported {}×{} image onto {}×{} surface",
            image.width(),
            image.height(),
            self.surface.width(),
            self.surface.height()
        );
    }

    // ---- export -------------------------------------------------------------

    /// The surface as PNG bytes, for submission to the generation service.
    pub fn current_image(&self) -> EngineResult<ExportedImage> {
        let exported = io::export_image(self.surface.image(), self.settings.png_compression)?;
        log_info!(
            "Exported {}×{} PNG ({} bytes)",
            exported.width,
            exported.height,
            exported.bytes.len()
        );
        Ok(exported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn session(w: u32, h: u32) -> EditorSession {
        EditorSession::new(w, h, EngineSettings::default()).unwrap()
    }

    fn stroke(s: &mut EditorSession, from: (f32, f32), to: (f32, f32), at: Instant) {
        s.handle_pointer(PointerEvent::begin(from.0, from.1, at)).unwrap();
        s.handle_pointer(PointerEvent::moved(to.0, to.1, at)).unwrap();
        s.handle_pointer(PointerEvent::end(to.0, to.1, at)).unwrap();
    }

    #[test]
    fn fresh_session_has_one_entry_and_cannot_undo() {
        let mut s = session(10, 10);
        assert_eq!(s.history_len(), 1);
        assert_eq!(s.history_position(), Some(0));
        let before = s.surface().snapshot();
        assert!(matches!(s.undo(), Err(EngineError::NothingToUndo)));
        assert_eq!(s.surface().snapshot(), before);
    }

    #[test]
    fn tool_selection_suppresses_the_next_begin() {
        let mut s = session(20, 20);
        let t = Instant::now();
        s.select_tool(Tool::Eraser, t);
        let out = s.handle_pointer(PointerEvent::begin(5.0, 5.0, t + Duration::from_millis(20)));
        assert_eq!(out.unwrap(), GestureOutcome::Suppressed);
    }

    #[test]
    fn clear_is_undoable() {
        let mut s = session(20, 20);
        let t = Instant::now();
        stroke(&mut s, (2.0, 2.0), (15.0, 2.0), t);
        let drawn = s.surface().snapshot();
        s.clear();
        assert!(s.surface().image().pixels().all(|p| *p == WHITE));
        s.undo().unwrap();
        assert_eq!(s.surface().snapshot(), drawn);
    }

    #[test]
    fn resize_writes_no_history() {
        let mut s = session(10, 10);
        assert!(s.resize_display(30, 20).unwrap());
        assert!(!s.resize_display(30, 20).unwrap());
        assert_eq!(s.history_len(), 1);
        assert_eq!(s.surface().dimensions(), (30, 20));
    }

    #[test]
    fn undo_after_resize_refits_to_the_display() {
        let mut s = session(10, 10);
        let t = Instant::now();
        stroke(&mut s, (1.0, 5.0), (8.0, 5.0), t);
        s.resize_display(20, 20).unwrap();
        s.undo().unwrap();
        assert_eq!(s.surface().dimensions(), (20, 20));
        assert!(s.surface().image().pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn undo_mid_stroke_commits_the_stroke_first() {
        let mut s = session(20, 20);
        let t = Instant::now();
        s.handle_pointer(PointerEvent::begin(1.0, 1.0, t)).unwrap();
        s.handle_pointer(PointerEvent::moved(10.0, 1.0, t)).unwrap();
        s.undo().unwrap();
        assert!(!s.is_stroking());
        assert_eq!(s.history_position(), Some(0));
        assert!(s.can_redo());
    }

    #[test]
    fn load_image_fits_and_commits() {
        let mut s = session(8, 8);
        s.load_image(&RgbaImage::from_pixel(4, 4, RED));
        assert_eq!(s.history_len(), 2);
        assert_eq!(s.surface().get_pixel(7, 7), Some(RED));
    }

    #[test]
    fn export_is_png_of_surface_size() {
        let s = session(12, 7);
        let out = s.current_image().unwrap();
        assert_eq!((out.width, out.height), (12, 7));
        assert!(out.to_data_url().starts_with("data:image/png;base64,"));
    }
}
