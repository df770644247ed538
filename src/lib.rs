//! SketchFE - in-memory raster editing engine for a sketch-to-image form.
//!
//! Owns an RGBA surface, applies freehand strokes and paint-bucket fills to
//! it, keeps it sized to its display without losing content, and keeps a
//! bounded undo/redo history of surface snapshots.  [`EditorSession`] wires
//! the pieces together; each piece is also usable on its own.

#![allow(clippy::too_many_arguments)]

#[macro_use]
pub mod logger;

pub mod canvas;
pub mod components;
pub mod error;
pub mod io;
pub mod ops;
pub mod project;
pub mod settings;

pub use canvas::{PixelSurface, Snapshot};
pub use error::{EngineError, EngineResult};
pub use io::ExportedImage;
pub use project::EditorSession;
pub use settings::EngineSettings;
