// ============================================================================
// ENGINE ERRORS - local, recoverable conditions raised by the editing core
// ============================================================================

use std::fmt;

/// Error type for surface, fill, history and export operations.
///
/// Everything here is recoverable: callers catch it and leave the surface
/// untouched. Allocation failure is the only hard failure and is not modelled.
#[derive(Debug)]
pub enum EngineError {
    /// A buffer or snapshot does not have the shape the operation expects.
    DimensionMismatch { expected: usize, actual: usize },
    /// Width or height of zero (or too large to address).
    InvalidSize { width: u32, height: u32 },
    /// History is already at its oldest entry.
    NothingToUndo,
    /// History is already at its newest entry.
    NothingToRedo,
    /// A coordinate outside the buffer was handed to the fill engine.
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },
    Encode(String),
    Decode(String),
    Io(std::io::Error),
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::DimensionMismatch { expected, actual } => write!(
                f,
                "Dimension mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            EngineError::InvalidSize { width, height } => {
                write!(f, "Invalid surface size {}×{}", width, height)
            }
            EngineError::NothingToUndo => write!(f, "Nothing to undo"),
            EngineError::NothingToRedo => write!(f, "Nothing to redo"),
            EngineError::OutOfBounds { x, y, width, height } => write!(
                f,
                "Coordinate ({}, {}) is outside the {}×{} surface",
                x, y, width, height
            ),
            EngineError::Encode(e) => write!(f, "Encode error: {}", e),
            EngineError::Decode(e) => write!(f, "Decode error: {}", e),
            EngineError::Io(e) => write!(f, "I/O error: {}", e),
            EngineError::Config(e) => write!(f, "Config error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e)
    }
}

impl From<png::EncodingError> for EngineError {
    fn from(e: png::EncodingError) -> Self {
        EngineError::Encode(e.to_string())
    }
}

impl From<image::ImageError> for EngineError {
    fn from(e: image::ImageError) -> Self {
        EngineError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_boundary() {
        assert_eq!(EngineError::NothingToUndo.to_string(), "Nothing to undo");
        let oob = EngineError::OutOfBounds { x: 5, y: 9, width: 4, height: 4 };
        assert!(oob.to_string().contains("(5, 9)"));
    }

    #[test]
    fn io_errors_keep_their_source() {
        use std::error::Error;
        let err: EngineError = std::io::Error::other("disk gone").into();
        assert!(err.source().is_some());
    }
}
