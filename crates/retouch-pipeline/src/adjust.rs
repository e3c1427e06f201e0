//! Brightness, contrast and saturation.
//!
//! Every color channel goes through three steps in a fixed order:
//!
//! ```text
//! v'   = v * brightness / 100
//! v''  = v' * c + 128 * (1 - c)                 where c = contrast / 100
//! v''' = gray + (v'' - gray) * saturation / 100
//! gray = 0.2989 * R'' + 0.5870 * G'' + 0.1140 * B''
//! ```
//!
//! Contrast sees the brightness-adjusted value, and the saturation luma
//! sees the unclamped result of both. Values are clamped only when the
//! final result is committed to 8-bit storage (see
//! [`store_channel`]). Alpha is never touched.
//!
//! The work is a per-pixel map with no cross-pixel dependency, so it runs
//! in place. With the `parallel` feature the pixels are split across the
//! rayon pool; every worker owns a disjoint set of pixels.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::types::{CHANNELS, FilterParams, RgbaImage, store_channel};

/// ITU-R BT.601 luma weights for R, G and B.
pub const LUMA_WEIGHTS: [f64; 3] = [0.2989, 0.5870, 0.1140];

/// Channel value that contrast scales around.
pub const CONTRAST_PIVOT: f64 = 128.0;

/// Per-run coefficients derived from [`FilterParams`].
///
/// Computing the factors once keeps the per-pixel loop to multiplies and
/// adds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneAdjustment {
    brightness_factor: f64,
    contrast_factor: f64,
    contrast_offset: f64,
    saturation_factor: f64,
}

impl ToneAdjustment {
    /// Derive the coefficients for `params`. `sharpness` is ignored.
    #[must_use]
    pub fn new(params: &FilterParams) -> Self {
        let contrast_factor = params.contrast / 100.0;
        Self {
            brightness_factor: params.brightness / 100.0,
            contrast_factor,
            contrast_offset: CONTRAST_PIVOT * (1.0 - contrast_factor),
            saturation_factor: params.saturation / 100.0,
        }
    }

    /// Brightness followed by contrast for a single channel value.
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn brightness_contrast(&self, value: f64) -> f64 {
        let brightened = value * self.brightness_factor;
        brightened * self.contrast_factor + self.contrast_offset
    }

    /// Blend the three color channels toward their luma.
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn saturate(&self, rgb: [f64; 3]) -> [f64; 3] {
        let gray = luma(rgb);
        rgb.map(|v| gray + (v - gray) * self.saturation_factor)
    }

    /// Run all three steps on an unclamped RGB triple.
    #[must_use]
    pub fn apply_rgb(&self, rgb: [u8; 3]) -> [f64; 3] {
        self.saturate(rgb.map(|v| self.brightness_contrast(f64::from(v))))
    }

    /// Adjust one RGBA pixel in place, leaving alpha as is.
    ///
    /// `pixel` must hold at least three channels.
    fn apply_pixel(&self, pixel: &mut [u8]) {
        let adjusted = self.apply_rgb([pixel[0], pixel[1], pixel[2]]);
        for (channel, value) in pixel.iter_mut().zip(adjusted) {
            *channel = store_channel(value);
        }
    }
}

/// Luma of an RGB triple using [`LUMA_WEIGHTS`].
#[must_use]
#[allow(clippy::suboptimal_flops)]
pub fn luma(rgb: [f64; 3]) -> f64 {
    LUMA_WEIGHTS[0] * rgb[0] + LUMA_WEIGHTS[1] * rgb[1] + LUMA_WEIGHTS[2] * rgb[2]
}

/// Adjust a tightly packed RGBA byte buffer in place.
///
/// A trailing partial pixel (fewer than four bytes) is left untouched;
/// callers that accept raw buffers check the length first.
pub fn adjust_raw(pixels: &mut [u8], params: &FilterParams) {
    let tone = ToneAdjustment::new(params);

    #[cfg(feature = "parallel")]
    pixels
        .par_chunks_exact_mut(CHANNELS)
        .for_each(|pixel| tone.apply_pixel(pixel));

    #[cfg(not(feature = "parallel"))]
    pixels
        .chunks_exact_mut(CHANNELS)
        .for_each(|pixel| tone.apply_pixel(pixel));
}

/// Apply brightness, contrast and saturation to `image` in place.
pub fn adjust_in_place(image: &mut RgbaImage, params: &FilterParams) {
    log::debug!(
        "adjusting {}x{} image: brightness={} contrast={} saturation={}",
        image.width(),
        image.height(),
        params.brightness,
        params.contrast,
        params.saturation,
    );
    adjust_raw(image, params);
}

/// Apply brightness, contrast and saturation to a copy of `image`.
#[must_use = "returns the adjusted image"]
pub fn adjust(image: &RgbaImage, params: &FilterParams) -> RgbaImage {
    let mut out = image.clone();
    adjust_in_place(&mut out, params);
    out
}
