/*!
Encoding pages rasterized with [`pagemill`] as image files.

Currently, PNG is the only supported format. The following inputs can be exported:

- gray with 1, 8 or 24 bits per channel (24-bit samples are reduced to 16 bits),
- RGB with 8 bits per channel,
- RGB with a soft mask, which is merged back into an RGBA image.

The resolution of the image is stored in the file's pixel density (`pHYs`) chunk.

CMYK images cannot be stored in PNG files and are rejected, since no color conversion is
performed here.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;

pub use error::{ExportError, Result};

use log::debug;
use pagemill::{ColorModel, ImagePlane, PageImage, RasterizationResult, Rect};
use png::{BitDepth, ColorType, PixelDimensions, Unit};
use std::borrow::Cow;
use std::path::Path;

const METERS_PER_INCH: f64 = 0.0254;

/// Encode an image into a PNG file.
pub fn encode_png(image: &PageImage) -> Result<Vec<u8>> {
    let (samples, color_type, bit_depth) = png_samples(&image.color, image.soft_mask.as_ref())?;

    debug!(
        "encoding {}x{} image as {color_type:?} with {bit_depth:?} bits at {} dpi",
        image.color.width, image.color.height, image.resolution
    );

    let mut png_data = Vec::new();
    let mut encoder = png::Encoder::new(&mut png_data, image.color.width, image.color.height);
    encoder.set_color(color_type);
    encoder.set_depth(bit_depth);
    encoder.set_pixel_dims(pixel_dims(image.resolution));

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&samples)?;
    writer.finish()?;

    Ok(png_data)
}

/// Convert a resolution in dots per inch into the pixel density of a PNG file.
///
/// Returns `None` if the density cannot be stored.
pub fn pixel_dims(resolution: f64) -> Option<PixelDimensions> {
    let ppu = (resolution / METERS_PER_INCH).round();

    if !(1.0..=u32::MAX as f64).contains(&ppu) {
        return None;
    }

    Some(PixelDimensions {
        xppu: ppu as u32,
        yppu: ppu as u32,
        unit: Unit::Meter,
    })
}

/// Encode an image into a PNG file and write it to `path`.
pub fn write_png(image: &PageImage, path: impl AsRef<Path>) -> Result<()> {
    let png_data = encode_png(image)?;
    std::fs::write(path, png_data)?;

    Ok(())
}

/// Consume a rasterization result and encode it into a PNG file.
pub fn result_to_png(result: RasterizationResult) -> Result<Vec<u8>> {
    let placement = Rect::new(0.0, 0.0, result.width() as f64, result.height() as f64);
    encode_png(&result.into_image(placement)?)
}

type Samples<'a> = (Cow<'a, [u8]>, ColorType, BitDepth);

fn png_samples<'a>(
    color: &'a ImagePlane,
    soft_mask: Option<&'a ImagePlane>,
) -> Result<Samples<'a>> {
    let stride = check_layout(color)?;
    let borrowed = Cow::Borrowed(color.data.as_slice());

    let samples = match (color.color_model, color.bits_per_channel) {
        (ColorModel::Gray, 8) => (borrowed, ColorType::Grayscale, BitDepth::Eight),
        (ColorModel::Gray, 1) => (
            Cow::Owned(expand_bits(color, stride)),
            ColorType::Grayscale,
            BitDepth::Eight,
        ),
        (ColorModel::Gray, 24) => (
            Cow::Owned(reduce_to_16_bits(color)),
            ColorType::Grayscale,
            BitDepth::Sixteen,
        ),
        (ColorModel::Rgb, 8) => (borrowed, ColorType::Rgb, BitDepth::Eight),
        (ColorModel::Cmyk | ColorModel::Rgba, _) => {
            return Err(ExportError::UnsupportedColorModel(color.color_model));
        }
        (color_model, bits_per_channel) => {
            return Err(ExportError::UnsupportedBitDepth {
                color_model,
                bits_per_channel,
            });
        }
    };

    let Some(mask) = soft_mask else {
        return Ok(samples);
    };

    check_layout(mask)?;

    if color.color_model != ColorModel::Rgb
        || mask.color_model != ColorModel::Gray
        || mask.bits_per_channel != 8
        || mask.width != color.width
        || mask.height != color.height
    {
        return Err(ExportError::UnsupportedColorModel(color.color_model));
    }

    let rgba = color
        .data
        .chunks_exact(3)
        .zip(mask.data.iter())
        .flat_map(|(rgb, a)| [rgb[0], rgb[1], rgb[2], *a])
        .collect::<Vec<_>>();

    Ok((Cow::Owned(rgba), ColorType::Rgba, BitDepth::Eight))
}

// Returns the row stride.
fn check_layout(plane: &ImagePlane) -> Result<usize> {
    let too_large = || ExportError::TooLarge {
        width: plane.width,
        height: plane.height,
    };

    let stride = plane.row_stride().ok_or_else(too_large)?;
    let expected = stride
        .checked_mul(plane.height as usize)
        .ok_or_else(too_large)?;

    if plane.data.len() != expected {
        return Err(ExportError::Layout {
            expected,
            actual: plane.data.len(),
        });
    }

    Ok(stride)
}

// A set bit is white.
fn expand_bits(plane: &ImagePlane, stride: usize) -> Vec<u8> {
    let width = plane.width as usize;

    plane
        .data
        .chunks_exact(stride)
        .flat_map(|row| {
            (0..width).map(move |x| {
                if (row[x / 8] >> (7 - x % 8)) & 1 == 1 {
                    255
                } else {
                    0
                }
            })
        })
        .collect()
}

// PNG stores 16-bit samples big endian, like the engine, so the low byte is simply dropped.
fn reduce_to_16_bits(plane: &ImagePlane) -> Vec<u8> {
    plane
        .data
        .chunks_exact(3)
        .flat_map(|s| [s[0], s[1]])
        .collect()
}
