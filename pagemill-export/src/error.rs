//! Error types for exporting images.

use core::fmt;
use pagemill::{ColorModel, RenderError};

/// A specialized [`Result`] type for export operations.
pub type Result<T> = core::result::Result<T, ExportError>;

/// An error encountered while exporting an image.
#[derive(Debug)]
pub enum ExportError {
    /// The file format cannot store the color model.
    UnsupportedColorModel(ColorModel),
    /// The combination of color model and bit depth cannot be stored.
    UnsupportedBitDepth {
        /// The color model.
        color_model: ColorModel,
        /// The number of bits per channel.
        bits_per_channel: u8,
    },
    /// The length of a buffer does not match its dimensions.
    Layout {
        /// The number of bytes the dimensions require.
        expected: usize,
        /// The number of bytes that are present.
        actual: usize,
    },
    /// The size of an image plane cannot be computed without overflowing.
    TooLarge {
        /// The width of the plane in pixels.
        width: u32,
        /// The height of the plane in pixels.
        height: u32,
    },
    /// The rasterization result could not be turned into an image.
    Render(RenderError),
    /// The encoder failed.
    Encoding(png::EncodingError),
    /// The output could not be written.
    Io(std::io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedColorModel(model) => {
                write!(f, "color model {model} cannot be exported")
            }
            Self::UnsupportedBitDepth {
                color_model,
                bits_per_channel,
            } => write!(
                f,
                "{bits_per_channel} bits per channel are not supported for {color_model}"
            ),
            Self::Layout { expected, actual } => {
                write!(f, "expected {expected} bytes of image data, got {actual}")
            }
            Self::TooLarge { width, height } => {
                write!(f, "image of {width}x{height} pixels is too large")
            }
            Self::Render(e) => write!(f, "{e}"),
            Self::Encoding(e) => write!(f, "failed to encode image: {e}"),
            Self::Io(e) => write!(f, "failed to write image: {e}"),
        }
    }
}

impl core::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Render(e) => Some(e),
            Self::Encoding(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderError> for ExportError {
    fn from(value: RenderError) -> Self {
        Self::Render(value)
    }
}

impl From<png::EncodingError> for ExportError {
    fn from(value: png::EncodingError) -> Self {
        Self::Encoding(value)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
