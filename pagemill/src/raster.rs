//! Pixel buffers produced by a rasterization.

use crate::error::{GeometryError, RenderError, Result};
use crate::settings::ColorModel;
use kurbo::{Affine, Rect};
use log::debug;

/// The value the pixel buffer is filled with before the engine draws into it.
pub(crate) const UNFILLED: u8 = 0x7F;

/// The number of bytes in a row as written by the engine, padded to a multiple of 32 bits.
///
/// Returns `None` if the stride does not fit into a `usize`.
pub fn padded_row_stride(width: u32, bits_per_channel: u8, channels: u8) -> Option<usize> {
    row_bits(width, bits_per_channel, channels)?
        .div_ceil(32)
        .checked_mul(4)
}

/// The number of bytes in a row without any padding beyond the next full byte.
///
/// Returns `None` if the stride does not fit into a `usize`.
pub fn compact_row_stride(width: u32, bits_per_channel: u8, channels: u8) -> Option<usize> {
    Some(row_bits(width, bits_per_channel, channels)?.div_ceil(8))
}

fn row_bits(width: u32, bits_per_channel: u8, channels: u8) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(bits_per_channel as usize)?
        .checked_mul(channels as usize)
}

/// Allocate the buffer the engine draws into.
pub(crate) fn allocate_buffer(size: usize, color_model: ColorModel) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|_| RenderError::OutOfMemory { requested: size })?;
    buffer.resize(size, UNFILLED);

    // The engine does not necessarily write the alpha channel, so everything starts out
    // fully transparent.
    if color_model == ColorModel::Rgba {
        for pixel in buffer.chunks_exact_mut(4) {
            pixel[3] = 0;
        }
    }

    Ok(buffer)
}

/// Whether the rows of a buffer still carry the engine's padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    /// Rows are padded to a multiple of 32 bits.
    NotCompacted,
    /// Rows are tightly packed.
    Compacted,
}

/// The output of a rasterization.
///
/// For RGBA, the alpha channel is split off into a separate soft mask, and the main buffer
/// holds RGB data.
#[derive(Debug, Clone)]
pub struct RasterizationResult {
    data: Vec<u8>,
    soft_mask: Option<Vec<u8>>,
    width: u32,
    height: u32,
    color_model: ColorModel,
    bits_per_channel: u8,
    resolution: f64,
    padded_stride: usize,
    compact_stride: usize,
    layout: RowLayout,
}

impl RasterizationResult {
    /// Wrap a buffer as written by an engine.
    ///
    /// Returns an error if `data` is too small to hold `height` padded rows, or if the size
    /// of those rows does not fit into a `usize`.
    pub fn from_padded(
        data: Vec<u8>,
        width: u32,
        height: u32,
        color_model: ColorModel,
        bits_per_channel: u8,
        resolution: f64,
    ) -> Result<Self> {
        let channels = color_model.channels();
        let too_large = || GeometryError::TooLarge { width, height };

        let padded_stride =
            padded_row_stride(width, bits_per_channel, channels).ok_or_else(too_large)?;
        let compact_stride =
            compact_row_stride(width, bits_per_channel, channels).ok_or_else(too_large)?;
        let expected = padded_stride
            .checked_mul(height as usize)
            .ok_or_else(too_large)?;

        if data.len() < expected {
            return Err(RenderError::BufferSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            soft_mask: None,
            width,
            height,
            color_model,
            bits_per_channel,
            resolution,
            padded_stride,
            compact_stride,
            layout: RowLayout::NotCompacted,
        })
    }

    /// The width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The color model that was requested from the engine.
    pub fn color_model(&self) -> ColorModel {
        self.color_model
    }

    /// The number of bits per channel.
    pub fn bits_per_channel(&self) -> u8 {
        self.bits_per_channel
    }

    /// The resolution the page was rendered at.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// The number of channels in [`Self::data`].
    pub fn channels(&self) -> u8 {
        if self.soft_mask.is_some() {
            3
        } else {
            self.color_model.channels()
        }
    }

    /// The current row layout.
    pub fn row_layout(&self) -> RowLayout {
        self.layout
    }

    /// The number of bytes in a row of [`Self::data`].
    pub fn row_stride(&self) -> usize {
        match self.layout {
            RowLayout::NotCompacted => self.padded_stride,
            RowLayout::Compacted if self.soft_mask.is_some() => self.compact_stride / 4 * 3,
            RowLayout::Compacted => self.compact_stride,
        }
    }

    /// The pixel data, in row-major order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The soft mask, one byte per pixel. Only present for RGBA.
    pub fn soft_mask(&self) -> Option<&[u8]> {
        self.soft_mask.as_deref()
    }

    /// Consume the result, returning the pixel data and the soft mask.
    pub fn into_parts(self) -> (Vec<u8>, Option<Vec<u8>>) {
        (self.data, self.soft_mask)
    }

    /// Strip the padding at the end of each row.
    ///
    /// This only does something the first time it is called. If the rows carry no padding,
    /// the buffer is left untouched, including any bytes past the last row.
    pub fn compact_rows(&mut self) {
        if self.layout == RowLayout::Compacted {
            return;
        }

        let (created, desired) = (self.padded_stride, self.compact_stride);

        if created != desired {
            debug!("compacting rows from {created} to {desired} bytes");

            for row in 1..self.height as usize {
                let start = row * created;
                self.data.copy_within(start..start + desired, row * desired);
            }

            self.data.truncate(desired * self.height as usize);
        }

        self.layout = RowLayout::Compacted;
    }

    /// Move the alpha channel of an RGBA result into a separate soft mask.
    ///
    /// Rows are compacted first. Does nothing for other color models, or if the alpha
    /// channel was already split off.
    pub fn split_alpha(&mut self) -> Result<()> {
        if self.color_model != ColorModel::Rgba || self.soft_mask.is_some() {
            return Ok(());
        }

        self.compact_rows();

        let pixels = self.compact_stride / 4 * self.height as usize;
        let mut color = Vec::new();
        let mut alpha = Vec::new();

        color
            .try_reserve_exact(pixels * 3)
            .map_err(|_| RenderError::OutOfMemory {
                requested: pixels * 3,
            })?;
        alpha
            .try_reserve_exact(pixels)
            .map_err(|_| RenderError::OutOfMemory { requested: pixels })?;

        for pixel in self.data.chunks_exact(4).take(pixels) {
            color.extend_from_slice(&pixel[..3]);
            alpha.push(pixel[3]);
        }

        self.data = color;
        self.soft_mask = Some(alpha);

        Ok(())
    }

    /// Turn the result into an image that can be placed on a page.
    ///
    /// The image is stretched to fill `placement`, which is given in source space. If the
    /// aspect ratio of `placement` differs from the rendered area, the image is distorted.
    pub fn into_image(mut self, placement: Rect) -> Result<PageImage> {
        self.compact_rows();
        self.split_alpha()?;

        if self.soft_mask.is_none() {
            self.data.truncate(self.compact_stride * self.height as usize);
        }

        let matrix = Affine::new([
            placement.width(),
            0.0,
            0.0,
            placement.height(),
            placement.x0,
            placement.y0,
        ]);

        let color_model = match self.color_model {
            ColorModel::Rgba => ColorModel::Rgb,
            other => other,
        };

        let soft_mask = self.soft_mask.map(|data| ImagePlane {
            data,
            width: self.width,
            height: self.height,
            color_model: ColorModel::Gray,
            bits_per_channel: 8,
        });

        Ok(PageImage {
            color: ImagePlane {
                data: self.data,
                width: self.width,
                height: self.height,
                color_model,
                bits_per_channel: self.bits_per_channel,
            },
            soft_mask,
            matrix,
            resolution: self.resolution,
        })
    }
}

/// A single image with tightly packed rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlane {
    /// The samples, in row-major order.
    pub data: Vec<u8>,
    /// The width in pixels.
    pub width: u32,
    /// The height in pixels.
    pub height: u32,
    /// The color model. Never [`ColorModel::Rgba`].
    pub color_model: ColorModel,
    /// The number of bits per channel.
    pub bits_per_channel: u8,
}

impl ImagePlane {
    /// The number of bytes in a row, or `None` if it does not fit into a `usize`.
    pub fn row_stride(&self) -> Option<usize> {
        compact_row_stride(
            self.width,
            self.bits_per_channel,
            self.color_model.channels(),
        )
    }
}

/// A rendered page, ready to be placed on a page or exported.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    /// The color data.
    pub color: ImagePlane,
    /// The transparency of each pixel, if any.
    pub soft_mask: Option<ImagePlane>,
    /// Maps the unit square onto the placement rectangle.
    pub matrix: Affine,
    /// The resolution the page was rendered at.
    pub resolution: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(width: u32, height: u32, model: ColorModel, bits: u8) -> RasterizationResult {
        let stride = padded_row_stride(width, bits, model.channels()).unwrap();
        let data = (0..stride * height as usize).map(|i| i as u8).collect();
        RasterizationResult::from_padded(data, width, height, model, bits, 72.0).unwrap()
    }

    #[test]
    fn strides() {
        assert_eq!(padded_row_stride(612, 8, 3), Some(1836));
        assert_eq!(compact_row_stride(612, 8, 3), Some(1836));
        assert_eq!(padded_row_stride(5, 8, 3), Some(16));
        assert_eq!(compact_row_stride(5, 8, 3), Some(15));
        assert_eq!(padded_row_stride(9, 1, 1), Some(4));
        assert_eq!(compact_row_stride(9, 1, 1), Some(2));
        assert_eq!(padded_row_stride(3, 24, 1), Some(12));
        assert_eq!(compact_row_stride(3, 24, 1), Some(9));
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let result = RasterizationResult::from_padded(
            Vec::new(),
            u32::MAX,
            u32::MAX,
            ColorModel::Cmyk,
            8,
            72.0,
        );

        assert_eq!(
            result.unwrap_err(),
            RenderError::InvalidGeometry(GeometryError::TooLarge {
                width: u32::MAX,
                height: u32::MAX
            })
        );
    }

    #[test]
    fn aligned_rows_are_left_alone() {
        let mut result = padded(4, 3, ColorModel::Rgb, 8);
        let before = result.data().to_vec();

        result.compact_rows();

        assert_eq!(result.data(), before.as_slice());
        assert_eq!(result.row_layout(), RowLayout::Compacted);
    }

    #[test]
    fn padding_is_removed() {
        let mut result = padded(5, 3, ColorModel::Rgb, 8);
        assert_eq!(result.row_stride(), 16);

        result.compact_rows();

        assert_eq!(result.row_stride(), 15);
        assert_eq!(result.data().len(), 45);

        let expected = (0..3)
            .flat_map(|row| (row * 16..row * 16 + 15).map(|i| i as u8))
            .collect::<Vec<_>>();
        assert_eq!(result.data(), expected.as_slice());
    }

    #[test]
    fn aligned_compaction_keeps_surplus_bytes() {
        let mut result =
            RasterizationResult::from_padded(vec![1; 20], 4, 2, ColorModel::Gray, 8, 72.0)
                .unwrap();

        result.compact_rows();

        assert_eq!(result.data().len(), 20);
        assert_eq!(result.row_layout(), RowLayout::Compacted);

        let image = result.into_image(Rect::new(0.0, 0.0, 4.0, 2.0)).unwrap();
        assert_eq!(image.color.data, vec![1; 8]);
    }

    #[test]
    fn compaction_happens_once() {
        let mut result = padded(5, 3, ColorModel::Gray, 8);
        result.compact_rows();
        let once = result.data().to_vec();

        result.compact_rows();

        assert_eq!(result.data(), once.as_slice());
    }

    #[test]
    fn too_small_buffer() {
        let result = RasterizationResult::from_padded(vec![0; 10], 5, 3, ColorModel::Rgb, 8, 72.0);

        assert_eq!(
            result.unwrap_err(),
            RenderError::BufferSize {
                expected: 48,
                actual: 10
            }
        );
    }

    #[test]
    fn alpha_is_split_off() {
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let mut result =
            RasterizationResult::from_padded(data, 3, 1, ColorModel::Rgba, 8, 72.0).unwrap();

        result.split_alpha().unwrap();

        assert_eq!(result.channels(), 3);
        assert_eq!(result.data(), &[1, 2, 3, 5, 6, 7, 9, 10, 11]);
        assert_eq!(result.soft_mask(), Some([4, 8, 12].as_slice()));
    }

    #[test]
    fn rgba_buffers_start_transparent() {
        let buffer = allocate_buffer(16, ColorModel::Rgba).unwrap();

        for pixel in buffer.chunks_exact(4) {
            assert_eq!(pixel, &[UNFILLED, UNFILLED, UNFILLED, 0]);
        }

        let buffer = allocate_buffer(6, ColorModel::Rgb).unwrap();
        assert!(buffer.iter().all(|b| *b == UNFILLED));
    }

    #[test]
    fn huge_allocation_fails() {
        assert_eq!(
            allocate_buffer(usize::MAX, ColorModel::Gray),
            Err(RenderError::OutOfMemory {
                requested: usize::MAX
            })
        );
    }

    #[test]
    fn image_matrix_covers_placement() {
        let result = padded(2, 2, ColorModel::Gray, 8);
        let image = result.into_image(Rect::new(10.0, 20.0, 110.0, 70.0)).unwrap();

        assert_eq!(image.matrix, Affine::new([100.0, 0.0, 0.0, 50.0, 10.0, 20.0]));
        assert_eq!(image.color.data.len(), 4);
        assert!(image.soft_mask.is_none());
    }
}
