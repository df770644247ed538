// ============================================================================
// STROKE INPUT PIPELINE - pointer/touch gestures → surface edits + history
// ============================================================================

use std::time::{Duration, Instant};

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::canvas::PixelSurface;
use crate::components::colors;
use crate::components::history::HistoryStack;
use crate::components::tools::ToolState;
use crate::error::EngineResult;
use crate::ops::{brush, fill};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    Begin,
    Move,
    End,
    /// The pipeline lost pointer capture (window blur, touch cancel...).
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerSource {
    #[default]
    Mouse,
    Touch,
}

/// One engagement event, in surface-relative coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub x: f32,
    pub y: f32,
    pub source: PointerSource,
    /// `false` when the event originated on a control rather than the surface.
    pub on_surface: bool,
    pub at: Instant,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, x: f32, y: f32, at: Instant) -> Self {
        Self {
            phase,
            x,
            y,
            source: PointerSource::Mouse,
            on_surface: true,
            at,
        }
    }

    pub fn begin(x: f32, y: f32, at: Instant) -> Self {
        Self::new(PointerPhase::Begin, x, y, at)
    }

    pub fn moved(x: f32, y: f32, at: Instant) -> Self {
        Self::new(PointerPhase::Move, x, y, at)
    }

    pub fn end(x: f32, y: f32, at: Instant) -> Self {
        Self::new(PointerPhase::End, x, y, at)
    }

    pub fn cancel(at: Instant) -> Self {
        Self::new(PointerPhase::Cancel, 0.0, 0.0, at)
    }

    pub fn with_source(mut self, source: PointerSource) -> Self {
        self.source = source;
        self
    }

    pub fn off_surface(mut self) -> Self {
        self.on_surface = false;
        self
    }
}

/// What a single event did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Dropped: not on the surface, or no gesture in progress.
    Ignored,
    /// Dropped: arrived inside the window after a tool-control click.
    Suppressed,
    StrokeStarted,
    StrokeExtended,
    /// Stroke finished and a snapshot was committed.
    StrokeCommitted,
    /// Stroke finished without drawing anything; no snapshot.
    StrokeAbandoned,
    /// Bucket fill recoloured this many pixels (0 = no-op, nothing committed).
    Filled(usize),
}

#[derive(Clone, Copy, Debug)]
struct ActiveStroke {
    last: (f32, f32),
    color: Rgba<u8>,
    width: u32,
    source: PointerSource,
    segments: usize,
}

#[derive(Clone, Copy, Debug, Default)]
enum GestureState {
    #[default]
    Idle,
    Stroking(ActiveStroke),
}

/// Turns engagement events into strokes and fills.
///
/// Colour and width are fixed when a stroke begins; tool changes made
/// mid-stroke apply to the next gesture.
#[derive(Debug)]
pub struct StrokeInputPipeline {
    state: GestureState,
    last_tool_interaction: Option<Instant>,
    suppression: Duration,
}

impl Default for StrokeInputPipeline {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl StrokeInputPipeline {
    pub fn new(suppression: Duration) -> Self {
        Self {
            state: GestureState::Idle,
            last_tool_interaction: None,
            suppression,
        }
    }

    pub fn is_stroking(&self) -> bool {
        matches!(self.state, GestureState::Stroking(_))
    }

    /// Record a click on a tool control.  Begin events within the
    /// suppression window after `at` are dropped.
    pub fn note_tool_interaction(&mut self, at: Instant) {
        self.last_tool_interaction = Some(at);
    }

    fn suppressed(&self, at: Instant) -> bool {
        self.last_tool_interaction
            .is_some_and(|t| at.saturating_duration_since(t) < self.suppression)
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        surface: &mut PixelSurface,
        history: &mut HistoryStack,
        tools: &ToolState,
    ) -> EngineResult<GestureOutcome> {
        match (self.state, event.phase) {
            (GestureState::Idle, PointerPhase::Begin) => self.begin(event, surface, history, tools),
            (GestureState::Idle, _) => Ok(GestureOutcome::Ignored),

            (GestureState::Stroking(_), PointerPhase::Begin) => {
                // Missed release: close the old stroke before starting over
                self.finish(surface, history);
                self.begin(event, surface, history, tools)
            }
            (GestureState::Stroking(mut stroke), PointerPhase::Move) => {
                // Honoured even off the surface: capture is held until release
                let to = (event.x, event.y);
                brush::draw_segment(surface, stroke.last, to, stroke.width, stroke.color);
                stroke.last = to;
                stroke.segments += 1;
                self.state = GestureState::Stroking(stroke);
                Ok(GestureOutcome::StrokeExtended)
            }
            (GestureState::Stroking(_), PointerPhase::End | PointerPhase::Cancel) => {
                Ok(self.finish(surface, history))
            }
        }
    }

    fn begin(
        &mut self,
        event: PointerEvent,
        surface: &mut PixelSurface,
        history: &mut HistoryStack,
        tools: &ToolState,
    ) -> EngineResult<GestureOutcome> {
        if !event.on_surface {
            log_debug!("Ignoring engagement that started on a control");
            return Ok(GestureOutcome::Ignored);
        }
        if self.suppressed(event.at) {
            log_debug!("Ignoring engagement inside the tool-click window");
            return Ok(GestureOutcome::Suppressed);
        }

        if !tools.tool().strokes() {
            let (x, y) = clamp_to_surface(surface, event.x, event.y);
            let written = fill::flood_fill_surface(surface, x, y, tools.color())?;
            if written > 0 {
                history.commit(surface.snapshot());
                log_info!(
                    "Bucket fill at ({}, {}) with {}: {} px",
                    x,
                    y,
                    colors::format_hex(tools.color()),
                    written
                );
            }
            return Ok(GestureOutcome::Filled(written));
        }

        self.state = GestureState::Stroking(ActiveStroke {
            last: (event.x, event.y),
            color: tools.effective_stroke_color(surface.background()),
            width: tools.stroke_width(),
            source: event.source,
            segments: 0,
        });
        Ok(GestureOutcome::StrokeStarted)
    }

    /// End any stroke in progress, committing it if it drew anything.
    pub fn finish(&mut self, surface: &PixelSurface, history: &mut HistoryStack) -> GestureOutcome {
        let GestureState::Stroking(stroke) = std::mem::take(&mut self.state) else {
            return GestureOutcome::Ignored;
        };
        if stroke.segments == 0 {
            return GestureOutcome::StrokeAbandoned;
        }
        history.commit(surface.snapshot());
        log_info!(
            "Stroke committed ({:?}, {} segments, width {})",
            stroke.source,
            stroke.segments,
            stroke.width
        );
        GestureOutcome::StrokeCommitted
    }
}

/// Floor and clamp a pointer coordinate onto a valid pixel.
fn clamp_to_surface(surface: &PixelSurface, x: f32, y: f32) -> (u32, u32) {
    let (w, h) = surface.dimensions();
    let cx = x.floor().clamp(0.0, (w - 1) as f32) as u32;
    let cy = y.floor().clamp(0.0, (h - 1) as f32) as u32;
    (cx, cy)
}
