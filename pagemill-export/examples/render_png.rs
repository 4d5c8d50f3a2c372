//! This example shows you how you can rasterize a page and store it as a PNG file.
//!
//! The engine used here draws a gradient instead of an actual PDF page. Run it with
//! `cargo run --example render_png -- <color model> <resolution>`, for example
//! `cargo run --example render_png -- DeviceRGBA 150`.

use pagemill::{
    ColorModel, DocumentEngine, EngineError, FillRequest, FillStatus, ProgressMonitor, Rect,
    RenderSettings, Rotation, placement_rect, rasterize,
};

fn main() {
    if let Ok(()) = log::set_logger(&LOGGER) {
        log::set_max_level(log::LevelFilter::Info);
    }

    let mut args = std::env::args().skip(1);
    let color_model = args
        .next()
        .map(|name| name.parse::<ColorModel>().unwrap())
        .unwrap_or(ColorModel::Rgb);
    let resolution = args.next().map(|r| r.parse::<f64>().unwrap()).unwrap_or(72.0);

    let page = GradientPage {
        media_box: Rect::new(0.0, 0.0, 612.0, 792.0),
        rotation: Rotation::None,
    };

    let mut settings = RenderSettings::default()
        .with_color_model(color_model)
        .with_resolution(resolution);
    settings.verbose = true;

    let result = rasterize(&GradientEngine, &page, page.media_box, &settings).unwrap();
    let image = result
        .into_image(placement_rect(page.media_box, page.rotation))
        .unwrap();

    pagemill_export::write_png(&image, "rendered.png").unwrap();
}

struct GradientPage {
    media_box: Rect,
    rotation: Rotation,
}

struct GradientEngine;

impl DocumentEngine for GradientEngine {
    type Page = GradientPage;

    fn page_rotation(&self, page: &GradientPage) -> Rotation {
        page.rotation
    }

    fn fill(
        &self,
        _: &GradientPage,
        request: &FillRequest<'_>,
        buffer: Option<&mut [u8]>,
        mut monitor: Option<&mut dyn ProgressMonitor>,
    ) -> Result<FillStatus, EngineError> {
        let (Some(stride), Some(size)) = (request.padded_row_stride(), request.min_buffer_size())
        else {
            return Err(EngineError::new("page is too large"));
        };

        let Some(buffer) = buffer else {
            return Ok(FillStatus::Completed(size));
        };

        if request.bits_per_channel != 8 {
            return Err(EngineError::new("only 8 bits per channel are supported"));
        }

        let channels = request.color_model.channels() as usize;

        for (y, row) in buffer.chunks_exact_mut(stride).enumerate() {
            if let Some(monitor) = monitor.as_deref_mut() {
                let fraction = y as f32 / request.height as f32;

                if monitor.progress(fraction, "Drawing", 0).is_break() {
                    return Ok(FillStatus::Cancelled);
                }
            }

            for (x, pixel) in row
                .chunks_exact_mut(channels)
                .take(request.width as usize)
                .enumerate()
            {
                let value = (x * 255 / request.width as usize) as u8;
                pixel.fill(value);

                if request.color_model == ColorModel::Rgba {
                    pixel[3] = (y * 255 / request.height as usize) as u8;
                }
            }
        }

        if let Some(monitor) = monitor {
            let _ = monitor.progress(1.0, "Drawing", 0);
        }

        Ok(FillStatus::Completed(buffer.len()))
    }
}

/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::LevelFilter::Info
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            let args = record.args();

            match record.level() {
                log::Level::Error => eprintln!("Error (in {target}): {args}"),
                log::Level::Warn => eprintln!("Warning (in {target}): {args}"),
                _ => eprintln!("{args}"),
            }
        }
    }

    fn flush(&self) {}
}
