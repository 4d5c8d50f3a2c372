/*!
A crate for turning rendered pages into pixel buffers.

Engines that draw PDF pages into memory usually hand back bitmaps in a layout that suits the
engine: rows padded to 32 bits, and the alpha channel interleaved with the color channels. This
crate sits between such an engine and whatever consumes the pixels. It

- derives the transform from source space into pixel space, taking page rotation and resolution
  into account,
- computes the size of the pixel grid,
- asks the engine how large the buffer needs to be, allocates it and lets the engine fill it,
- strips the row padding, and
- splits RGBA output into an RGB image and a soft mask.

The engine itself is abstracted behind the [`DocumentEngine`] trait.

## Safety
This crate forbids unsafe code via a crate-level attribute.

## Logging
Diagnostics are emitted through the [`log`] crate. If [`RenderSettings::verbose`] is set,
progress reports of the engine and the time spent drawing are logged at the `info` level.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod engine;
mod error;
mod geometry;
mod raster;
mod settings;

pub use engine::{
    DocumentEngine, EngineError, FillRequest, FillStatus, LogMonitor, ProgressMonitor,
};
pub use error::{GeometryError, RenderError, Result};
pub use geometry::{
    GEOMETRY_TOLERANCE, Rotation, compute_destination_rect, compute_transform, pixel_dimensions,
    placement_rect,
};
pub use kurbo::{Affine, Point, Rect};
pub use raster::{
    ImagePlane, PageImage, RasterizationResult, RowLayout, compact_row_stride, padded_row_stride,
};
pub use settings::{
    BaseState, ColorModel, DEFAULT_RESOLUTION, DrawFlags, OcContext, OutputProfile,
    RenderIntent, RenderSettings, SmoothFlags,
};

use log::{debug, info, warn};
use std::time::Instant;

/// Rasterize the `source` area of a page with the given settings.
///
/// If [`RenderSettings::verbose`] is set, the engine receives a [`LogMonitor`]. Otherwise, it
/// receives no monitor at all.
pub fn rasterize<E: DocumentEngine>(
    engine: &E,
    page: &E::Page,
    source: Rect,
    settings: &RenderSettings,
) -> Result<RasterizationResult> {
    if settings.verbose {
        rasterize_impl(engine, page, source, settings, Some(&mut LogMonitor))
    } else {
        rasterize_impl(engine, page, source, settings, None)
    }
}

/// Rasterize the `source` area of a page, reporting progress to `monitor`.
///
/// If the monitor asks the engine to stop, [`RenderError::Cancelled`] is returned.
pub fn rasterize_with_monitor<E: DocumentEngine>(
    engine: &E,
    page: &E::Page,
    source: Rect,
    settings: &RenderSettings,
    monitor: &mut dyn ProgressMonitor,
) -> Result<RasterizationResult> {
    rasterize_impl(engine, page, source, settings, Some(monitor))
}

fn rasterize_impl<E: DocumentEngine>(
    engine: &E,
    page: &E::Page,
    source: Rect,
    settings: &RenderSettings,
    mut monitor: Option<&mut dyn ProgressMonitor>,
) -> Result<RasterizationResult> {
    let rotation = engine.page_rotation(page);
    let transform = compute_transform(rotation, source, settings.scale_factor(), settings.transform);
    let dest_rect = compute_destination_rect(transform, source, settings.dest_rect)?;
    let (width, height) = pixel_dimensions(dest_rect)?;

    let request = FillRequest {
        source_rect: source,
        transform,
        dest_rect,
        width,
        height,
        color_model: settings.color_model(),
        bits_per_channel: settings.bits_per_channel(),
        smooth_flags: settings.smooth_flags,
        draw_flags: settings.draw_flags,
        intent: settings.intent,
        output_profile: settings.output_profile.as_ref(),
        oc_context: settings.oc_context.as_ref(),
    };

    debug!(
        "rasterizing {source:?} (rotated by {} degrees) into {width}x{height} {} pixels",
        rotation.degrees(),
        request.color_model,
    );

    let expected = request
        .min_buffer_size()
        .ok_or(GeometryError::TooLarge { width, height })?;

    // The casts shorten the trait object lifetime, so the monitor can be lent out twice.
    let query_monitor = monitor.as_mut().map(|m| &mut **m as &mut dyn ProgressMonitor);

    // Both calls need to see the exact same request, otherwise the size might not match.
    let size = match engine.fill(page, &request, None, query_monitor) {
        Ok(FillStatus::Completed(0)) => return Err(RenderError::SizeQuery(None)),
        Ok(FillStatus::Completed(size)) => size,
        Ok(FillStatus::Cancelled) => return Err(RenderError::Cancelled),
        Err(e) => return Err(RenderError::SizeQuery(Some(e))),
    };

    if size < expected {
        return Err(RenderError::BufferSize {
            expected,
            actual: size,
        });
    }

    let mut buffer = raster::allocate_buffer(size, request.color_model)?;

    let fill_monitor = monitor.as_mut().map(|m| &mut **m as &mut dyn ProgressMonitor);

    let start = Instant::now();
    match engine.fill(page, &request, Some(buffer.as_mut_slice()), fill_monitor) {
        Ok(FillStatus::Completed(written)) => {
            if written < expected {
                warn!("engine only wrote {written} of {expected} bytes");
            }
        }
        Ok(FillStatus::Cancelled) => return Err(RenderError::Cancelled),
        Err(e) => return Err(RenderError::Fill(e)),
    }

    if settings.verbose {
        info!("rendering time: {} s", start.elapsed().as_secs_f64());
    }

    let mut result = RasterizationResult::from_padded(
        buffer,
        width,
        height,
        request.color_model,
        request.bits_per_channel,
        settings.resolution(),
    )?;

    result.compact_rows();
    result.split_alpha()?;

    Ok(result)
}
