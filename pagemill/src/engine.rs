//! The interface to the engine that actually draws pages.

use crate::geometry::Rotation;
use crate::settings::{ColorModel, DrawFlags, OcContext, OutputProfile, RenderIntent, SmoothFlags};
use core::fmt;
use core::ops::ControlFlow;
use kurbo::{Affine, Rect};
use log::info;

/// Everything the engine needs to know to draw a page into memory.
///
/// The same request is used for the size query and for the actual fill, so both agree on
/// the buffer layout.
#[derive(Debug, Clone, Copy)]
pub struct FillRequest<'a> {
    /// The part of the page to draw, in source space.
    pub source_rect: Rect,
    /// The transform from source space to pixel space.
    pub transform: Affine,
    /// The pixel rectangle to draw into.
    pub dest_rect: Rect,
    /// The width of the pixel buffer.
    pub width: u32,
    /// The height of the pixel buffer.
    pub height: u32,
    /// The color model of the pixels.
    pub color_model: ColorModel,
    /// The number of bits per channel.
    pub bits_per_channel: u8,
    /// Anti-aliasing and resampling options.
    pub smooth_flags: SmoothFlags,
    /// Drawing options.
    pub draw_flags: DrawFlags,
    /// The rendering intent.
    pub intent: RenderIntent,
    /// The profile to convert colors into.
    pub output_profile: Option<&'a OutputProfile>,
    /// Which layers are visible.
    pub oc_context: Option<&'a OcContext>,
}

impl FillRequest<'_> {
    /// The number of bytes in a row of the engine's output.
    ///
    /// Rows are padded to a multiple of 32 bits, no matter the color model. Returns `None`
    /// if the stride does not fit into a `usize`.
    pub fn padded_row_stride(&self) -> Option<usize> {
        crate::raster::padded_row_stride(
            self.width,
            self.bits_per_channel,
            self.color_model.channels(),
        )
    }

    /// The smallest buffer the engine can draw this request into, or `None` if its size
    /// does not fit into a `usize`.
    ///
    /// Requests built by [`rasterize`](crate::rasterize) always have a size.
    pub fn min_buffer_size(&self) -> Option<usize> {
        self.padded_row_stride()?.checked_mul(self.height as usize)
    }
}

/// How a call to [`DocumentEngine::fill`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    /// The call finished. Holds the number of bytes that are required (for a size query) or
    /// that were written.
    Completed(usize),
    /// A progress monitor asked the engine to stop.
    Cancelled,
}

/// A failure reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    message: String,
}

impl EngineError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message of the error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for EngineError {}

/// Receives progress reports while a page is drawn.
///
/// The engine calls the monitor on the thread that requested the rasterization.
pub trait ProgressMonitor {
    /// Report that `stage_name` (stage number `stage`) is `fraction` done, with `fraction`
    /// between 0 and 1. Returning [`ControlFlow::Break`] asks the engine to stop.
    fn progress(&mut self, fraction: f32, stage_name: &str, stage: u32) -> ControlFlow<()>;
}

impl<F> ProgressMonitor for F
where
    F: FnMut(f32, &str, u32) -> ControlFlow<()>,
{
    fn progress(&mut self, fraction: f32, stage_name: &str, stage: u32) -> ControlFlow<()> {
        self(fraction, stage_name, stage)
    }
}

/// A monitor that logs every report and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMonitor;

impl ProgressMonitor for LogMonitor {
    fn progress(&mut self, fraction: f32, stage_name: &str, stage: u32) -> ControlFlow<()> {
        info!("{stage_name} stage {stage}: {}%", fraction * 100.0);

        ControlFlow::Continue(())
    }
}

/// An engine that can draw pages of a document into memory.
///
/// Implementations wrap whatever library does the actual parsing and drawing.
pub trait DocumentEngine {
    /// A handle to a single page.
    type Page;

    /// The clockwise rotation the page is displayed with.
    fn page_rotation(&self, page: &Self::Page) -> Rotation;

    /// Draw a page into memory.
    ///
    /// If `buffer` is `None`, nothing is drawn and the number of bytes required for the
    /// request is returned. Otherwise, the page is drawn into `buffer` in row-major order,
    /// top to bottom, with every row padded to a multiple of 4 bytes, and the number of bytes
    /// written is returned.
    fn fill(
        &self,
        page: &Self::Page,
        request: &FillRequest<'_>,
        buffer: Option<&mut [u8]>,
        monitor: Option<&mut dyn ProgressMonitor>,
    ) -> Result<FillStatus, EngineError>;
}
