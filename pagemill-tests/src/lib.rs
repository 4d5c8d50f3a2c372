//! A fake engine for exercising `pagemill` without a real PDF library.
//!
//! The engine does not draw anything meaningful. Every byte of a row that carries pixel data
//! is set to [`sample`], while the row padding is left untouched, so tests can check exactly
//! which bytes survive the compaction.

use pagemill::{
    ColorModel, DocumentEngine, EngineError, FillRequest, FillStatus, ProgressMonitor, Rect,
    Rotation, compact_row_stride,
};
use std::cell::RefCell;

/// The value the engine writes at `byte` of row `row`.
pub fn sample(row: u32, byte: usize) -> u8 {
    (row as usize * 31 + byte * 7 + 1) as u8
}

/// A page of the fake document.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticPage {
    pub media_box: Rect,
    pub rotation: Rotation,
}

impl SyntheticPage {
    /// A US Letter page.
    pub fn letter() -> Self {
        Self::new(Rect::new(0.0, 0.0, 612.0, 792.0))
    }

    pub fn new(media_box: Rect) -> Self {
        Self {
            media_box,
            rotation: Rotation::None,
        }
    }

    pub fn rotated(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }
}

/// The parts of a [`FillRequest`] that can be compared between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSummary {
    pub source_rect: Rect,
    pub transform: pagemill::Affine,
    pub dest_rect: Rect,
    pub width: u32,
    pub height: u32,
    pub color_model: ColorModel,
    pub bits_per_channel: u8,
    pub has_output_profile: bool,
    pub has_oc_context: bool,
}

impl From<&FillRequest<'_>> for RequestSummary {
    fn from(request: &FillRequest<'_>) -> Self {
        Self {
            source_rect: request.source_rect,
            transform: request.transform,
            dest_rect: request.dest_rect,
            width: request.width,
            height: request.height,
            color_model: request.color_model,
            bits_per_channel: request.bits_per_channel,
            has_output_profile: request.output_profile.is_some(),
            has_oc_context: request.oc_context.is_some(),
        }
    }
}

/// A single call to [`DocumentEngine::fill`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub request: RequestSummary,
    pub buffer_len: Option<usize>,
    pub has_monitor: bool,
    /// Whether every alpha byte was zero before drawing. Only recorded for RGBA fills.
    pub alpha_cleared: Option<bool>,
}

/// An engine that records how it is called.
#[derive(Debug, Default)]
pub struct SyntheticEngine {
    reported_size: Option<usize>,
    fail_size_query: bool,
    monitor_size_query: bool,
    fail_fill: bool,
    stages: u32,
    calls: RefCell<Vec<RecordedCall>>,
}

impl SyntheticEngine {
    pub fn new() -> Self {
        Self {
            stages: 2,
            ..Self::default()
        }
    }

    /// Answer size queries with `size` instead of the size the request needs.
    pub fn reporting_size(mut self, size: usize) -> Self {
        self.reported_size = Some(size);
        self
    }

    pub fn failing_size_query(mut self) -> Self {
        self.fail_size_query = true;
        self
    }

    /// Consult the monitor during the size query as well, and give up if it asks to stop.
    pub fn monitoring_size_query(mut self) -> Self {
        self.monitor_size_query = true;
        self
    }

    pub fn failing_fill(mut self) -> Self {
        self.fail_fill = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }
}

impl DocumentEngine for SyntheticEngine {
    type Page = SyntheticPage;

    fn page_rotation(&self, page: &SyntheticPage) -> Rotation {
        page.rotation
    }

    fn fill(
        &self,
        _: &SyntheticPage,
        request: &FillRequest<'_>,
        buffer: Option<&mut [u8]>,
        monitor: Option<&mut dyn ProgressMonitor>,
    ) -> Result<FillStatus, EngineError> {
        let mut call = RecordedCall {
            request: request.into(),
            buffer_len: buffer.as_ref().map(|b| b.len()),
            has_monitor: monitor.is_some(),
            alpha_cleared: None,
        };

        let (Some(stride), Some(size)) = (request.padded_row_stride(), request.min_buffer_size())
        else {
            self.calls.borrow_mut().push(call);
            return Err(EngineError::new("page is too large"));
        };

        let Some(buffer) = buffer else {
            self.calls.borrow_mut().push(call);

            if self.fail_size_query {
                return Err(EngineError::new("cannot measure page"));
            }

            if self.monitor_size_query
                && let Some(monitor) = monitor
                && monitor.progress(0.0, "Measuring", 0).is_break()
            {
                return Ok(FillStatus::Cancelled);
            }

            return Ok(FillStatus::Completed(self.reported_size.unwrap_or(size)));
        };

        if request.color_model == ColorModel::Rgba {
            call.alpha_cleared = Some(buffer.chunks_exact(4).all(|p| p[3] == 0));
        }

        self.calls.borrow_mut().push(call);

        if self.fail_fill {
            return Err(EngineError::new("cannot draw page"));
        }

        if let Some(monitor) = monitor {
            for stage in 0..self.stages {
                for fraction in [0.0, 0.5, 1.0] {
                    if monitor.progress(fraction, "Drawing", stage).is_break() {
                        return Ok(FillStatus::Cancelled);
                    }
                }
            }
        }

        let used = compact_row_stride(
            request.width,
            request.bits_per_channel,
            request.color_model.channels(),
        )
        .unwrap_or(stride);

        for (y, row) in buffer
            .chunks_exact_mut(stride)
            .take(request.height as usize)
            .enumerate()
        {
            for (i, byte) in row[..used].iter_mut().enumerate() {
                *byte = sample(y as u32, i);
            }
        }

        Ok(FillStatus::Completed(size))
    }
}
