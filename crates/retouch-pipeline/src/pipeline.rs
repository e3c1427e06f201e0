//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate image before continuing.
//!
//! Unlike [`crate::run`] which returns only the final image, [`Pipeline`]
//! lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use retouch_pipeline::{FilterParams, Pipeline, RgbaImage};
//! let image = RgbaImage::from_pixel(3, 3, image::Rgba([128, 128, 128, 255]));
//! let params = FilterParams::new(150.0, 100.0, 100.0, 10.0);
//!
//! let adjusted = Pipeline::new(image, params).adjust();
//! assert_eq!(adjusted.adjusted().get_pixel(0, 0).0, [192, 192, 192, 255]);
//!
//! let staged = adjusted.sharpen().into_result();
//! assert!(staged.sharpened);
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state,
//! carrying the previously computed images. Stages cannot be skipped or
//! reordered: brightness/contrast/saturation always run before
//! sharpening.

use crate::types::{Dimensions, FilterParams, RgbaImage, StagedResult};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`adjust`](Self::adjust) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .adjust() to continue"]
pub struct Pending {
    params: FilterParams,
    original: RgbaImage,
}

impl Pending {
    /// The source image.
    #[must_use]
    pub const fn original(&self) -> &RgbaImage {
        &self.original
    }

    /// The parameters this run will use.
    #[must_use]
    pub const fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Apply brightness, contrast and saturation and advance to the
    /// [`Adjusted`] stage.
    pub fn adjust(self) -> Adjusted {
        let adjusted = crate::adjust::adjust(&self.original, &self.params);
        Adjusted {
            params: self.params,
            original: self.original,
            adjusted,
        }
    }
}

// ───────────────────────── Stage 1: Adjusted ─────────────────────────

/// Pipeline state after the per-pixel tone adjustments.
///
/// Call [`sharpen`](Self::sharpen) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing; call .sharpen() to continue"]
pub struct Adjusted {
    params: FilterParams,
    original: RgbaImage,
    adjusted: RgbaImage,
}

impl Adjusted {
    /// The source image.
    #[must_use]
    pub const fn original(&self) -> &RgbaImage {
        &self.original
    }

    /// The brightness/contrast/saturation output.
    #[must_use]
    pub const fn adjusted(&self) -> &RgbaImage {
        &self.adjusted
    }

    /// Run the sharpening filter (when `params.sharpness > 0`) and
    /// advance to the [`Sharpened`] stage.
    ///
    /// The adjusted image is kept as the filter's read-only snapshot;
    /// the output is a separate buffer.
    pub fn sharpen(self) -> Sharpened {
        let applied = self.params.sharpens();
        let output = if applied {
            crate::sharpen::sharpen(&self.adjusted, self.params.sharpness)
        } else {
            self.adjusted.clone()
        };
        Sharpened {
            params: self.params,
            original: self.original,
            adjusted: self.adjusted,
            output,
            applied,
        }
    }
}

// ───────────────────────── Stage 2: Sharpened ────────────────────────

/// Final pipeline state.
///
/// Call [`into_result`](Self::into_result) to collect every image.
#[must_use = "call .into_result() or .into_output() to collect the output"]
pub struct Sharpened {
    params: FilterParams,
    original: RgbaImage,
    adjusted: RgbaImage,
    output: RgbaImage,
    applied: bool,
}

impl Sharpened {
    /// The final output image.
    #[must_use]
    pub const fn output(&self) -> &RgbaImage {
        &self.output
    }

    /// The brightness/contrast/saturation output, before sharpening.
    #[must_use]
    pub const fn adjusted(&self) -> &RgbaImage {
        &self.adjusted
    }

    /// Whether the sharpening filter actually ran.
    #[must_use]
    pub const fn applied(&self) -> bool {
        self.applied
    }

    /// Image dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.output)
    }

    /// Consume the pipeline and return only the final image.
    #[must_use]
    pub fn into_output(self) -> RgbaImage {
        self.output
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        let dimensions = self.dimensions();
        StagedResult {
            original: self.original,
            adjusted: self.adjusted,
            output: self.output,
            sharpened: self.applied,
            params: self.params,
            dimensions,
        }
    }
}

/// Entry point for the typed, stage-by-stage API.
///
/// ```rust
/// # use retouch_pipeline::{FilterParams, Pipeline, RgbaImage};
/// # let image = RgbaImage::new(4, 4);
/// let result = Pipeline::new(image, FilterParams::default())
///     .adjust()
///     .sharpen()
///     .into_result();
/// assert!(!result.sharpened);
/// ```
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from a source image and parameters.
    ///
    /// No processing is performed until [`.adjust()`](Pending::adjust).
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(image: RgbaImage, params: FilterParams) -> Pending {
        Pending {
            params,
            original: image,
        }
    }
}
