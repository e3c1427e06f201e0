//! Shared types for the retouch adjustment pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can pass pixel buffers
/// around without depending on `image` directly.
pub use image::RgbaImage;

/// Number of interleaved channels per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new set of dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of an existing image.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Length in bytes of a tightly packed RGBA buffer with these
    /// dimensions, or `None` if it does not fit in `usize`.
    #[must_use]
    pub fn buffer_len(self) -> Option<usize> {
        usize::try_from(self.width)
            .ok()?
            .checked_mul(usize::try_from(self.height).ok()?)?
            .checked_mul(CHANNELS)
    }
}

/// Commit a computed channel value to 8-bit storage.
///
/// Values are clamped to `[0, 255]` and rounded to the nearest integer,
/// ties to even. NaN stores as 0. This is the only place the pipeline
/// clamps; intermediate arithmetic stays unclamped.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn store_channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round_ties_even() as u8
}

/// One of the four user-facing adjustment controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    /// Brightness percentage.
    Brightness,
    /// Contrast percentage.
    Contrast,
    /// Saturation percentage.
    Saturation,
    /// Sharpening intensity.
    Sharpness,
}

impl Param {
    /// All parameters, in pipeline order.
    pub const ALL: [Self; 4] = [
        Self::Brightness,
        Self::Contrast,
        Self::Saturation,
        Self::Sharpness,
    ];

    /// Declared `(min, max)` range for this control.
    #[must_use]
    pub const fn range(self) -> (f64, f64) {
        match self {
            Self::Brightness => (FilterParams::MIN_BRIGHTNESS, FilterParams::MAX_BRIGHTNESS),
            Self::Contrast => (FilterParams::MIN_CONTRAST, FilterParams::MAX_CONTRAST),
            Self::Saturation => (FilterParams::MIN_SATURATION, FilterParams::MAX_SATURATION),
            Self::Sharpness => (FilterParams::MIN_SHARPNESS, FilterParams::MAX_SHARPNESS),
        }
    }

    /// Identity value for this control.
    #[must_use]
    pub const fn identity(self) -> f64 {
        match self {
            Self::Brightness => FilterParams::DEFAULT_BRIGHTNESS,
            Self::Contrast => FilterParams::DEFAULT_CONTRAST,
            Self::Saturation => FilterParams::DEFAULT_SATURATION,
            Self::Sharpness => FilterParams::DEFAULT_SHARPNESS,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brightness => f.write_str("brightness"),
            Self::Contrast => f.write_str("contrast"),
            Self::Saturation => f.write_str("saturation"),
            Self::Sharpness => f.write_str("sharpness"),
        }
    }
}

/// Adjustment parameters for one pipeline run.
///
/// `brightness`, `contrast` and `saturation` are percentages where 100
/// leaves the image unchanged. `sharpness` is an intensity where 0 (or
/// anything negative) disables sharpening and 10 applies the canonical
/// unsharp-mask kernel unscaled.
///
/// The pipeline itself accepts any value. The `MIN_*`/`MAX_*` constants
/// describe the ranges a front end normally exposes; use
/// [`validate`](Self::validate) to reject values outside them or
/// [`clamped`](Self::clamped) to pull them back in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Brightness percentage; each color channel is multiplied by
    /// `brightness / 100`.
    pub brightness: f64,
    /// Contrast percentage; channels are scaled around 128 by
    /// `contrast / 100`.
    pub contrast: f64,
    /// Saturation percentage; 0 is full grayscale.
    pub saturation: f64,
    /// Sharpening intensity; the kernel is scaled by `sharpness / 10`.
    pub sharpness: f64,
}

impl FilterParams {
    /// Identity brightness.
    pub const DEFAULT_BRIGHTNESS: f64 = 100.0;
    /// Identity contrast.
    pub const DEFAULT_CONTRAST: f64 = 100.0;
    /// Identity saturation.
    pub const DEFAULT_SATURATION: f64 = 100.0;
    /// Identity sharpness (no sharpening).
    pub const DEFAULT_SHARPNESS: f64 = 0.0;

    /// Lowest brightness a front end normally offers.
    pub const MIN_BRIGHTNESS: f64 = 0.0;
    /// Highest brightness a front end normally offers.
    pub const MAX_BRIGHTNESS: f64 = 200.0;
    /// Lowest contrast a front end normally offers.
    pub const MIN_CONTRAST: f64 = 0.0;
    /// Highest contrast a front end normally offers.
    pub const MAX_CONTRAST: f64 = 200.0;
    /// Lowest saturation a front end normally offers.
    pub const MIN_SATURATION: f64 = 0.0;
    /// Highest saturation a front end normally offers.
    pub const MAX_SATURATION: f64 = 200.0;
    /// Lowest sharpness a front end normally offers.
    pub const MIN_SHARPNESS: f64 = 0.0;
    /// Highest sharpness a front end normally offers.
    pub const MAX_SHARPNESS: f64 = 100.0;

    /// The identity parameters: running the pipeline with these returns
    /// the input unchanged.
    pub const IDENTITY: Self = Self {
        brightness: Self::DEFAULT_BRIGHTNESS,
        contrast: Self::DEFAULT_CONTRAST,
        saturation: Self::DEFAULT_SATURATION,
        sharpness: Self::DEFAULT_SHARPNESS,
    };

    /// Create parameters from the four control values.
    #[must_use]
    pub const fn new(brightness: f64, contrast: f64, saturation: f64, sharpness: f64) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
            sharpness,
        }
    }

    /// Read a single control value.
    #[must_use]
    pub const fn get(&self, param: Param) -> f64 {
        match param {
            Param::Brightness => self.brightness,
            Param::Contrast => self.contrast,
            Param::Saturation => self.saturation,
            Param::Sharpness => self.sharpness,
        }
    }

    /// Set a single control value.
    pub const fn set(&mut self, param: Param, value: f64) {
        match param {
            Param::Brightness => self.brightness = value,
            Param::Contrast => self.contrast = value,
            Param::Saturation => self.saturation = value,
            Param::Sharpness => self.sharpness = value,
        }
    }

    /// Whether the sharpening stage will run.
    ///
    /// NaN and non-positive values disable it.
    #[must_use]
    pub fn sharpens(&self) -> bool {
        self.sharpness > 0.0
    }

    /// Whether these parameters leave every pixel unchanged.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        #[allow(clippy::float_cmp)]
        let tone_identity = self.brightness == Self::DEFAULT_BRIGHTNESS
            && self.contrast == Self::DEFAULT_CONTRAST
            && self.saturation == Self::DEFAULT_SATURATION;
        tone_identity && !self.sharpens()
    }

    /// Check every control against its declared range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ParameterOutOfRange`] for the first
    /// control (in pipeline order) that is non-finite or outside its
    /// range.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for param in Param::ALL {
            let value = self.get(param);
            let (min, max) = param.range();
            if !value.is_finite() || value < min || value > max {
                return Err(PipelineError::ParameterOutOfRange {
                    param,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Return a copy with every control clamped into its declared range.
    ///
    /// Non-finite values are replaced by the control's identity value.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for param in Param::ALL {
            let value = self.get(param);
            let (min, max) = param.range();
            let fixed = if value.is_finite() {
                value.clamp(min, max)
            } else {
                param.identity()
            };
            out.set(param, fixed);
        }
        out
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Result of running the pipeline with all intermediate images preserved.
///
/// Uses custom `Serialize`/`Deserialize` implementations because
/// `RgbaImage` (from the `image` crate) does not implement serde traits.
/// Raster images are serialized as `(width, height, raw_pixels)` tuples.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedResult {
    /// Input image, untouched.
    pub original: RgbaImage,
    /// Output of the brightness/contrast/saturation stage.
    pub adjusted: RgbaImage,
    /// Final output (equal to `adjusted` when sharpening was skipped).
    pub output: RgbaImage,
    /// Whether the sharpening stage ran.
    pub sharpened: bool,
    /// Parameters the run used.
    pub params: FilterParams,
    /// Image dimensions in pixels.
    pub dimensions: Dimensions,
}

/// Serde-compatible proxy for `StagedResult`.
#[derive(Serialize, Deserialize)]
struct StagedResultProxy {
    original: (u32, u32, Vec<u8>),
    adjusted: (u32, u32, Vec<u8>),
    output: (u32, u32, Vec<u8>),
    sharpened: bool,
    params: FilterParams,
    dimensions: Dimensions,
}

fn raster_parts(image: &RgbaImage) -> (u32, u32, Vec<u8>) {
    (image.width(), image.height(), image.as_raw().clone())
}

impl Serialize for StagedResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = StagedResultProxy {
            original: raster_parts(&self.original),
            adjusted: raster_parts(&self.adjusted),
            output: raster_parts(&self.output),
            sharpened: self.sharpened,
            params: self.params,
            dimensions: self.dimensions,
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StagedResult {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = StagedResultProxy::deserialize(deserializer)?;

        let original = RgbaImage::from_raw(proxy.original.0, proxy.original.1, proxy.original.2)
            .ok_or_else(|| serde::de::Error::custom("invalid original image dimensions"))?;
        let adjusted = RgbaImage::from_raw(proxy.adjusted.0, proxy.adjusted.1, proxy.adjusted.2)
            .ok_or_else(|| serde::de::Error::custom("invalid adjusted image dimensions"))?;
        let output = RgbaImage::from_raw(proxy.output.0, proxy.output.1, proxy.output.2)
            .ok_or_else(|| serde::de::Error::custom("invalid output image dimensions"))?;

        Ok(Self {
            original,
            adjusted,
            output,
            sharpened: proxy.sharpened,
            params: proxy.params,
            dimensions: proxy.dimensions,
        })
    }
}

/// Errors that can occur while adjusting an image.
///
/// Every variant is a caller-side contract violation or a codec failure;
/// numeric overflow inside the filters is never an error.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. Codec variants are serialized as
/// their `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The raw buffer length does not match `width * height * 4`.
    #[error(
        "pixel buffer holds {actual} bytes but a {width}x{height} RGBA image needs {expected}"
    )]
    BufferSizeMismatch {
        /// Bytes required by the declared dimensions.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },

    /// No image has been loaded yet.
    #[error("no input image has been loaded")]
    NoImage,

    /// A control value is outside its declared range.
    #[error("{param} = {value} is outside the accepted range [{min}, {max}]")]
    ParameterOutOfRange {
        /// Which control.
        param: Param,
        /// The rejected value.
        value: f64,
        /// Lower bound of the declared range.
        min: f64,
        /// Upper bound of the declared range.
        max: f64,
    },

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Failed to encode the output image.
    #[error("failed to encode image: {0}")]
    ImageEncode(#[source] image::ImageError),
}

/// Serde-compatible proxy for `PipelineError`.
///
/// The codec variants store their `Display` string; a deserialized codec
/// error wraps that message in an I/O error.
#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    BufferSizeMismatch {
        expected: usize,
        actual: usize,
        width: u32,
        height: u32,
    },
    NoImage,
    ParameterOutOfRange {
        param: Param,
        value: f64,
        min: f64,
        max: f64,
    },
    EmptyInput,
    ImageDecode(String),
    ImageEncode(String),
}

fn message_error(msg: String) -> image::ImageError {
    image::ImageError::IoError(std::io::Error::other(msg))
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::BufferSizeMismatch {
                expected,
                actual,
                width,
                height,
            } => PipelineErrorProxy::BufferSizeMismatch {
                expected: *expected,
                actual: *actual,
                width: *width,
                height: *height,
            },
            Self::NoImage => PipelineErrorProxy::NoImage,
            Self::ParameterOutOfRange {
                param,
                value,
                min,
                max,
            } => PipelineErrorProxy::ParameterOutOfRange {
                param: *param,
                value: *value,
                min: *min,
                max: *max,
            },
            Self::EmptyInput => PipelineErrorProxy::EmptyInput,
            Self::ImageDecode(e) => PipelineErrorProxy::ImageDecode(e.to_string()),
            Self::ImageEncode(e) => PipelineErrorProxy::ImageEncode(e.to_string()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PipelineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            PipelineErrorProxy::BufferSizeMismatch {
                expected,
                actual,
                width,
                height,
            } => Self::BufferSizeMismatch {
                expected,
                actual,
                width,
                height,
            },
            PipelineErrorProxy::NoImage => Self::NoImage,
            PipelineErrorProxy::ParameterOutOfRange {
                param,
                value,
                min,
                max,
            } => Self::ParameterOutOfRange {
                param,
                value,
                min,
                max,
            },
            PipelineErrorProxy::EmptyInput => Self::EmptyInput,
            PipelineErrorProxy::ImageDecode(msg) => Self::ImageDecode(message_error(msg)),
            PipelineErrorProxy::ImageEncode(msg) => Self::ImageEncode(message_error(msg)),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    // --- store_channel tests ---

    #[test]
    fn store_channel_clamps_out_of_range() {
        assert_eq!(store_channel(-12.5), 0);
        assert_eq!(store_channel(300.0), 255);
        assert_eq!(store_channel(f64::INFINITY), 255);
        assert_eq!(store_channel(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn store_channel_rounds_to_nearest() {
        assert_eq!(store_channel(0.7), 1);
        assert_eq!(store_channel(191.99999999), 192);
        assert_eq!(store_channel(12.2), 12);
    }

    #[test]
    fn store_channel_ties_to_even() {
        assert_eq!(store_channel(0.5), 0);
        assert_eq!(store_channel(1.5), 2);
        assert_eq!(store_channel(2.5), 2);
    }

    #[test]
    fn store_channel_maps_nan_to_zero() {
        assert_eq!(store_channel(f64::NAN), 0);
    }

    // --- Dimensions tests ---

    #[test]
    fn buffer_len_is_four_bytes_per_pixel() {
        assert_eq!(Dimensions::new(3, 2).buffer_len(), Some(24));
        assert_eq!(Dimensions::new(0, 10).buffer_len(), Some(0));
    }

    #[test]
    fn pixel_count_does_not_overflow_u32() {
        let dims = Dimensions::new(u32::MAX, 2);
        assert_eq!(dims.pixel_count(), u64::from(u32::MAX) * 2);
    }

    // --- FilterParams tests ---

    #[test]
    fn default_params_are_identity() {
        let params = FilterParams::default();
        assert_eq!(params, FilterParams::new(100.0, 100.0, 100.0, 0.0));
        assert!(params.is_identity());
        assert!(!params.sharpens());
    }

    #[test]
    fn negative_and_nan_sharpness_do_not_sharpen() {
        let mut params = FilterParams::default();
        params.sharpness = -5.0;
        assert!(!params.sharpens());
        params.sharpness = f64::NAN;
        assert!(!params.sharpens());
        params.sharpness = 0.5;
        assert!(params.sharpens());
    }

    #[test]
    fn get_and_set_address_the_same_field() {
        let mut params = FilterParams::default();
        for (i, param) in Param::ALL.into_iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let value = 10.0 + i as f64;
            params.set(param, value);
            assert!((params.get(param) - value).abs() < f64::EPSILON);
        }
        assert_eq!(params, FilterParams::new(10.0, 11.0, 12.0, 13.0));
    }

    #[test]
    fn validate_accepts_declared_bounds() {
        assert!(FilterParams::new(0.0, 200.0, 0.0, 100.0).validate().is_ok());
        assert!(FilterParams::default().validate().is_ok());
    }

    #[test]
    fn validate_reports_first_offending_param() {
        let err = FilterParams::new(100.0, 250.0, -1.0, 0.0)
            .validate()
            .unwrap_err();
        match err {
            PipelineError::ParameterOutOfRange {
                param, value, max, ..
            } => {
                assert_eq!(param, Param::Contrast);
                assert!((value - 250.0).abs() < f64::EPSILON);
                assert!((max - 200.0).abs() < f64::EPSILON);
            }
            other => panic!("expected ParameterOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_non_finite() {
        let params = FilterParams::new(f64::INFINITY, 100.0, 100.0, 0.0);
        assert!(matches!(
            params.validate(),
            Err(PipelineError::ParameterOutOfRange {
                param: Param::Brightness,
                ..
            })
        ));
    }

    #[test]
    fn clamped_pulls_values_into_range() {
        let params = FilterParams::new(-20.0, 500.0, f64::NAN, 150.0).clamped();
        assert_eq!(params, FilterParams::new(0.0, 200.0, 100.0, 100.0));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn params_deserialize_partial_json() {
        let params: FilterParams = serde_json::from_str(r#"{"brightness": 150}"#).unwrap();
        assert_eq!(params, FilterParams::new(150.0, 100.0, 100.0, 0.0));
    }

    #[test]
    fn params_serde_round_trip() {
        let params = FilterParams::new(120.0, 80.0, 0.0, 25.0);
        let json = serde_json::to_string(&params).unwrap();
        let back: FilterParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn param_display_is_lowercase_name() {
        assert_eq!(Param::Saturation.to_string(), "saturation");
    }

    // --- PipelineError tests ---

    #[test]
    fn buffer_mismatch_message_mentions_sizes() {
        let err = PipelineError::BufferSizeMismatch {
            expected: 36,
            actual: 35,
            width: 3,
            height: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("35"), "{msg}");
        assert!(msg.contains("36"), "{msg}");
        assert!(msg.contains("3x3"), "{msg}");
    }

    #[test]
    fn error_serde_keeps_structured_variants() {
        let err = PipelineError::ParameterOutOfRange {
            param: Param::Sharpness,
            value: 101.0,
            min: 0.0,
            max: 100.0,
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: PipelineError = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            back,
            PipelineError::ParameterOutOfRange {
                param: Param::Sharpness,
                ..
            }
        ));
    }

    #[test]
    fn error_serde_preserves_codec_message() {
        let err = PipelineError::ImageDecode(message_error("bad header".to_string()));
        let json = serde_json::to_string(&err).unwrap();
        let back: PipelineError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, PipelineError::ImageDecode(_)));
        assert!(back.to_string().contains("bad header"));
    }

    // --- StagedResult tests ---

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn staged_result_serde_round_trip() {
        let image = RgbaImage::from_fn(2, 3, |x, y| image::Rgba([x as u8, y as u8, 7, 255]));
        let staged = StagedResult {
            original: image.clone(),
            adjusted: image.clone(),
            output: image,
            sharpened: false,
            params: FilterParams::default(),
            dimensions: Dimensions::new(2, 3),
        };
        let json = serde_json::to_string(&staged).unwrap();
        let back: StagedResult = serde_json::from_str(&json).unwrap();
        assert_eq!(staged, back);
    }

    #[test]
    fn staged_result_rejects_inconsistent_raster() {
        let json = r#"{
            "original": [2, 2, [0, 0, 0]],
            "adjusted": [0, 0, []],
            "output": [0, 0, []],
            "sharpened": false,
            "params": {},
            "dimensions": {"width": 2, "height": 2}
        }"#;
        let result: Result<StagedResult, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
