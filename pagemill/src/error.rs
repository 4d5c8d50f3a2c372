//! Error types for rasterization.

use crate::engine::EngineError;
use core::fmt;

/// A specialized [`Result`] type for rasterization operations.
pub type Result<T> = core::result::Result<T, RenderError>;

/// An error that aborted a rasterization.
///
/// None of these are retried. When one is returned, no pixel data is handed out.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The requested color model is not one of Gray, RGB, CMYK or RGBA.
    InvalidColorModel(String),
    /// The transform and rectangles do not describe a usable pixel area.
    InvalidGeometry(GeometryError),
    /// The engine could not report the size of the buffer it needs.
    SizeQuery(Option<EngineError>),
    /// The pixel buffer could not be allocated.
    OutOfMemory {
        /// The number of bytes that were requested.
        requested: usize,
    },
    /// The engine failed while filling the buffer.
    Fill(EngineError),
    /// The progress monitor asked the engine to stop.
    Cancelled,
    /// The buffer size reported by the engine does not fit the pixel dimensions.
    BufferSize {
        /// The number of bytes the dimensions require.
        expected: usize,
        /// The number of bytes the engine reported.
        actual: usize,
    },
}

/// Details of an [`RenderError::InvalidGeometry`] error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// The transformed source rectangle does not start at the pixel origin.
    Misaligned {
        /// The x coordinate of the minimum corner.
        x: f64,
        /// The y coordinate of the minimum corner.
        y: f64,
    },
    /// The destination has no pixels, or is not finite.
    Empty {
        /// The rounded width.
        width: f64,
        /// The rounded height.
        height: f64,
    },
    /// The pixel buffer for the destination would not fit into memory.
    TooLarge {
        /// The width in pixels.
        width: u32,
        /// The height in pixels.
        height: u32,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColorModel(name) => write!(f, "unsupported color model: {name}"),
            Self::InvalidGeometry(e) => write!(f, "invalid geometry: {e}"),
            Self::SizeQuery(Some(e)) => write!(f, "failed to query buffer size: {e}"),
            Self::SizeQuery(None) => f.write_str("engine reported an empty buffer size"),
            Self::OutOfMemory { requested } => {
                write!(f, "failed to allocate {requested} bytes for the pixel buffer")
            }
            Self::Fill(e) => write!(f, "failed to fill pixel buffer: {e}"),
            Self::Cancelled => f.write_str("rasterization was cancelled"),
            Self::BufferSize { expected, actual } => write!(
                f,
                "engine buffer holds {actual} bytes, but the page needs at least {expected}"
            ),
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Misaligned { x, y } => {
                write!(f, "destination starts at ({x}, {y}) instead of the origin")
            }
            Self::Empty { width, height } => {
                write!(f, "destination of {width}x{height} pixels is empty")
            }
            Self::TooLarge { width, height } => {
                write!(f, "destination of {width}x{height} pixels is too large")
            }
        }
    }
}

impl core::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::SizeQuery(Some(e)) | Self::Fill(e) => Some(e),
            _ => None,
        }
    }
}

impl core::error::Error for GeometryError {}

impl From<GeometryError> for RenderError {
    fn from(value: GeometryError) -> Self {
        Self::InvalidGeometry(value)
    }
}
