// ============================================================================
// COMPONENTS - editing state machines that sit on top of the pixel surface
// ============================================================================
//
//   colors.rs   - hex colour parsing and the drawing palette
//   tools.rs    - active tool, colour, stroke width
//   input.rs    - pointer/touch gestures → strokes, fills, commits
//   history.rs  - bounded linear undo/redo of surface snapshots
// ============================================================================

pub mod colors;
pub mod history;
pub mod input;
pub mod tools;

pub use history::HistoryStack;
pub use input::{GestureOutcome, PointerEvent, PointerPhase, PointerSource, StrokeInputPipeline};
pub use tools::{Tool, ToolState};
