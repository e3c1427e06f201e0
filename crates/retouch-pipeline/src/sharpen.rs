//! 3x3 unsharp-mask sharpening.
//!
//! The filter reads from an immutable snapshot of its input and writes
//! into a separate output buffer, so no output pixel ever feeds into a
//! neighbor's sum. The one-pixel border has an incomplete neighborhood and
//! keeps the input value.
//!
//! With the `parallel` feature, interior rows are split across the rayon
//! pool. Every worker owns exactly one output row and only reads the
//! shared snapshot.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::types::{CHANNELS, Dimensions, PipelineError, RgbaImage, store_channel};

/// A 3x3 convolution kernel with integer weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    weights: [[i32; 3]; 3],
}

impl Kernel {
    /// The unsharp-mask kernel: center 5, orthogonal neighbors -1,
    /// corners 0. Weights sum to 1, so uniform regions are unchanged at
    /// unit scale.
    pub const SHARPEN: Self = Self {
        weights: [[0, -1, 0], [-1, 5, -1], [0, -1, 0]],
    };

    /// Unscaled integer weights, row-major.
    #[must_use]
    pub const fn weights(&self) -> [[i32; 3]; 3] {
        self.weights
    }

    /// Weights multiplied by `sharpness / 10`.
    ///
    /// `sharpness = 10` reproduces the unscaled kernel.
    #[must_use]
    pub fn scaled(&self, sharpness: f64) -> [[f64; 3]; 3] {
        self.weights.map(|row| row.map(|w| f64::from(w) * sharpness / 10.0))
    }
}

/// Whether `sharpness` enables the filter. NaN and non-positive values do
/// not.
fn enabled(sharpness: f64) -> bool {
    sharpness > 0.0
}

/// Sharpen `image`, returning a new image.
///
/// Returns an unchanged copy when `sharpness <= 0` or is NaN. Border
/// pixels and every alpha value are copied from `image` unchanged.
#[must_use = "returns the sharpened image"]
pub fn sharpen(image: &RgbaImage, sharpness: f64) -> RgbaImage {
    let mut out = image.clone();
    if !enabled(sharpness) {
        return out;
    }

    log::debug!(
        "sharpening {}x{} image: sharpness={sharpness}",
        image.width(),
        image.height(),
    );
    convolve_interior(
        image.as_raw(),
        &mut out,
        Dimensions::of(image),
        &Kernel::SHARPEN.scaled(sharpness),
    );
    out
}

/// Sharpen a tightly packed RGBA byte buffer.
///
/// # Errors
///
/// Returns [`PipelineError::BufferSizeMismatch`] if `snapshot.len()` is
/// not `width * height * 4`.
pub fn sharpen_raw(
    snapshot: &[u8],
    dimensions: Dimensions,
    sharpness: f64,
) -> Result<Vec<u8>, PipelineError> {
    crate::check_buffer_len(snapshot, dimensions)?;
    let mut out = snapshot.to_vec();
    if enabled(sharpness) {
        convolve_interior(
            snapshot,
            &mut out,
            dimensions,
            &Kernel::SHARPEN.scaled(sharpness),
        );
    }
    Ok(out)
}

/// Convolve every interior pixel of `snapshot` into `out`.
///
/// `out` must already hold a copy of `snapshot`; border pixels and alpha
/// are left as they are.
fn convolve_interior(
    snapshot: &[u8],
    out: &mut [u8],
    dimensions: Dimensions,
    weights: &[[f64; 3]; 3],
) {
    let (Ok(width), Ok(height)) = (
        usize::try_from(dimensions.width),
        usize::try_from(dimensions.height),
    ) else {
        return;
    };
    if width < 3 || height < 3 {
        return;
    }

    let stride = width * CHANNELS;
    let interior = &mut out[stride..stride * (height - 1)];

    #[cfg(feature = "parallel")]
    interior
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(i, row)| convolve_row(snapshot, row, i + 1, width, weights));

    #[cfg(not(feature = "parallel"))]
    interior
        .chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(i, row)| convolve_row(snapshot, row, i + 1, width, weights));
}

/// Convolve the interior pixels of row `y` into `row`.
fn convolve_row(
    snapshot: &[u8],
    row: &mut [u8],
    y: usize,
    width: usize,
    weights: &[[f64; 3]; 3],
) {
    let stride = width * CHANNELS;
    for x in 1..width - 1 {
        for c in 0..3 {
            let mut sum = 0.0;
            for (ky, kernel_row) in weights.iter().enumerate() {
                let base = (y + ky - 1) * stride;
                for (kx, &weight) in kernel_row.iter().enumerate() {
                    let idx = base + (x + kx - 1) * CHANNELS + c;
                    sum += f64::from(snapshot[idx]) * weight;
                }
            }
            row[x * CHANNELS + c] = store_channel(sum);
        }
    }
}
