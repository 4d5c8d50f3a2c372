//! Settings that control how a page is rasterized.

use crate::error::RenderError;
use bitflags::bitflags;
use kurbo::{Affine, Rect};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The default resolution, one pixel per source unit.
pub const DEFAULT_RESOLUTION: f64 = 72.0;

/// The color model of the produced pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorModel {
    /// A single gray channel.
    #[default]
    Gray,
    /// Red, green and blue.
    Rgb,
    /// Cyan, magenta, yellow and black.
    Cmyk,
    /// Red, green and blue plus an alpha channel.
    ///
    /// This is experimental. The alpha channel is split off into a separate soft mask
    /// after rendering.
    Rgba,
}

impl ColorModel {
    /// The number of interleaved channels the engine writes for this model.
    pub fn channels(self) -> u8 {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Cmyk | Self::Rgba => 4,
        }
    }

    /// The device color space name of this model.
    pub fn device_name(self) -> &'static str {
        match self {
            Self::Gray => "DeviceGray",
            Self::Rgb => "DeviceRGB",
            Self::Cmyk => "DeviceCMYK",
            Self::Rgba => "DeviceRGBA",
        }
    }

    /// Whether `bits` is a legal number of bits per channel for this model.
    pub fn supports_bits(self, bits: u8) -> bool {
        match self {
            Self::Gray => matches!(bits, 1 | 8 | 24),
            Self::Rgb | Self::Cmyk | Self::Rgba => bits == 8,
        }
    }
}

impl fmt::Display for ColorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.device_name())
    }
}

impl FromStr for ColorModel {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DeviceGray" => Ok(Self::Gray),
            "DeviceRGB" => Ok(Self::Rgb),
            "DeviceCMYK" => Ok(Self::Cmyk),
            "DeviceRGBA" => Ok(Self::Rgba),
            _ => Err(RenderError::InvalidColorModel(s.to_string())),
        }
    }
}

/// The rendering intent used when converting colors into the target model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderIntent {
    /// Absolute colorimetric.
    AbsoluteColorimetric,
    /// Relative colorimetric.
    #[default]
    RelativeColorimetric,
    /// Saturation.
    Saturation,
    /// Perceptual.
    Perceptual,
    /// Use the intent embedded in the output profile.
    UseEmbeddedProfileIntent,
    /// Use the intent of the current graphics state.
    UseGraphicsStateIntent,
}

bitflags! {
    /// Anti-aliasing and resampling options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SmoothFlags: u32 {
        /// Anti-alias text.
        const TEXT = 1 << 0;
        /// Anti-alias line art.
        const LINE_ART = 1 << 1;
        /// Smooth images.
        const IMAGE = 1 << 2;
        /// Use device-dependent anti-aliasing for text.
        const AA_TEXT_DDR = 1 << 3;
        /// Resample images bicubically.
        const RESAMPLE_BICUBIC = 1 << 4;
        /// Resample images linearly.
        const RESAMPLE_LINEAR = 1 << 5;
        /// Anti-alias image edges. Only has an effect together with one of the
        /// resampling flags.
        const IMAGE_ANTI_ALIAS = 1 << 6;
    }
}

impl SmoothFlags {
    /// Smooth text, line art and images.
    pub fn standard() -> Self {
        Self::TEXT | Self::LINE_ART | Self::IMAGE
    }
}

bitflags! {
    /// Drawing options. These are handed to the engine without interpretation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DrawFlags: u32 {
        /// Only erase the background where content is drawn.
        const LAZY_ERASE = 1 << 0;
        /// Draw the appearances of annotations.
        const ANNOTATION_FACES = 1 << 1;
        /// Simulate overprinting.
        const OVERPRINT_PREVIEW = 1 << 2;
    }
}

impl DrawFlags {
    /// Erase lazily and draw annotation appearances.
    pub fn standard() -> Self {
        Self::LAZY_ERASE | Self::ANNOTATION_FACES
    }
}

/// An ICC profile describing the output color space.
#[derive(Clone)]
pub struct OutputProfile(Arc<dyn AsRef<[u8]> + Send + Sync>);

impl OutputProfile {
    /// Wrap the raw bytes of an ICC profile.
    pub fn new(data: impl AsRef<[u8]> + Send + Sync + 'static) -> Self {
        Self(Arc::new(data))
    }

    /// The raw profile bytes.
    pub fn data(&self) -> &[u8] {
        (*self.0).as_ref()
    }
}

impl fmt::Debug for OutputProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputProfile({} bytes)", self.data().len())
    }
}

/// The state optional content groups start out with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseState {
    /// All groups are visible unless overridden.
    #[default]
    On,
    /// All groups are hidden unless overridden.
    Off,
}

/// Decides which optional content groups (layers) are visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcContext {
    base_state: BaseState,
    overrides: HashMap<String, bool>,
}

impl OcContext {
    /// Create a new context with the given base state and no overrides.
    pub fn new(base_state: BaseState) -> Self {
        Self {
            base_state,
            overrides: HashMap::new(),
        }
    }

    /// A context that starts with every group on and forces `layer` on.
    pub fn only(layer: impl Into<String>) -> Self {
        let mut ctx = Self::new(BaseState::On);
        ctx.set_visible(layer, true);
        ctx
    }

    /// Override the visibility of the group with the given name.
    pub fn set_visible(&mut self, layer: impl Into<String>, visible: bool) {
        self.overrides.insert(layer.into(), visible);
    }

    /// Whether the group with the given name is visible.
    pub fn is_visible(&self, layer: &str) -> bool {
        self.overrides
            .get(layer)
            .copied()
            .unwrap_or(self.base_state == BaseState::On)
    }

    /// The base state.
    pub fn base_state(&self) -> BaseState {
        self.base_state
    }
}

/// Settings to apply during rasterization.
///
/// The color model, bits per channel and resolution are only reachable through
/// setters, so that the stored bits per channel are always legal for the stored color model.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    color_model: ColorModel,
    bits_per_channel: u8,
    resolution: f64,
    /// The rendering intent.
    pub intent: RenderIntent,
    /// Anti-aliasing and resampling options.
    pub smooth_flags: SmoothFlags,
    /// Drawing options.
    pub draw_flags: DrawFlags,
    /// A transform from source space to pixel space. If this is set, it replaces the
    /// transform derived from the page rotation and resolution. No rotation or flipping
    /// is applied on top of it.
    pub transform: Option<Affine>,
    /// The pixel rectangle to render into. If this is set to `None`, it will be derived
    /// from the transform and the source rectangle.
    pub dest_rect: Option<Rect>,
    /// The profile to convert colors into.
    pub output_profile: Option<OutputProfile>,
    /// The optional content visibility to render with. If this is set to `None`, the
    /// engine uses the document's default visibility.
    pub oc_context: Option<OcContext>,
    /// Whether progress and timing should be logged.
    pub verbose: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            color_model: ColorModel::Gray,
            bits_per_channel: 8,
            resolution: DEFAULT_RESOLUTION,
            intent: RenderIntent::default(),
            smooth_flags: SmoothFlags::empty(),
            draw_flags: DrawFlags::empty(),
            transform: None,
            dest_rect: None,
            output_profile: None,
            oc_context: None,
            verbose: false,
        }
    }
}

impl RenderSettings {
    /// The color model.
    pub fn color_model(&self) -> ColorModel {
        self.color_model
    }

    /// The number of channels of the color model.
    pub fn channels(&self) -> u8 {
        self.color_model.channels()
    }

    /// Set the color model. The bits per channel are normalized for the new model.
    pub fn set_color_model(&mut self, color_model: ColorModel) {
        self.color_model = color_model;
        self.set_bits_per_channel(self.bits_per_channel);
    }

    /// The number of bits per channel.
    pub fn bits_per_channel(&self) -> u8 {
        self.bits_per_channel
    }

    /// Set the number of bits per channel.
    ///
    /// Values the current color model does not support are silently replaced with 8.
    pub fn set_bits_per_channel(&mut self, bits: u8) {
        self.bits_per_channel = if self.color_model.supports_bits(bits) {
            bits
        } else {
            8
        };
    }

    /// The resolution, in pixels per 72 source units.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Set the resolution. Values that are not positive reset it to 72.
    pub fn set_resolution(&mut self, resolution: f64) {
        self.resolution = if resolution > 0.0 && resolution.is_finite() {
            resolution
        } else {
            DEFAULT_RESOLUTION
        };
    }

    /// The factor source units are scaled by.
    pub fn scale_factor(&self) -> f64 {
        self.resolution / DEFAULT_RESOLUTION
    }

    /// Return these settings with a different color model.
    pub fn with_color_model(mut self, color_model: ColorModel) -> Self {
        self.set_color_model(color_model);
        self
    }

    /// Return these settings with a different number of bits per channel.
    pub fn with_bits_per_channel(mut self, bits: u8) -> Self {
        self.set_bits_per_channel(bits);
        self
    }

    /// Return these settings with a different resolution.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.set_resolution(resolution);
        self
    }
}
