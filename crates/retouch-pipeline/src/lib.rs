//! retouch-pipeline: Pure pixel adjustment pipeline (sans-IO).
//!
//! Applies photographic adjustments to an 8-bit RGBA image:
//! brightness -> contrast -> saturation -> optional 3x3 sharpening.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! pixel buffers (and, for convenience, encoded image bytes) and returns
//! new buffers. Reading and writing files lives in the `retouch` binary.

pub mod adjust;
pub mod codec;
pub mod diagnostics;
pub mod pipeline;
pub mod session;
pub mod sharpen;
pub mod types;

pub use diagnostics::{Clock, PipelineDiagnostics, SystemClock, process_staged_with_diagnostics};
pub use pipeline::Pipeline;
pub use session::Session;
pub use sharpen::Kernel;
pub use types::{
    Dimensions, FilterParams, Param, PipelineError, RgbaImage, StagedResult, store_channel,
};

/// Run the full adjustment pipeline on `source`.
///
/// The source is left untouched. Brightness, contrast and saturation are
/// applied to a copy; when `params.sharpness > 0` the copy is then
/// sharpened into a fresh buffer. Dimensions and alpha are preserved.
///
/// The result depends only on the inputs: the same image and parameters
/// always produce the same bytes.
#[must_use = "returns the adjusted image"]
pub fn run(source: &RgbaImage, params: &FilterParams) -> RgbaImage {
    let adjusted = adjust::adjust(source, params);
    if params.sharpens() {
        sharpen::sharpen(&adjusted, params.sharpness)
    } else {
        adjusted
    }
}

/// Run the full adjustment pipeline on a raw RGBA byte buffer.
///
/// `source` must be tightly packed, row-major, four bytes per pixel:
/// channel `c` of pixel `(x, y)` is at `(y * width + x) * 4 + c`.
///
/// # Errors
///
/// Returns [`PipelineError::BufferSizeMismatch`] if `source.len()` is not
/// `width * height * 4`. No pixel is processed in that case.
pub fn run_raw(
    source: &[u8],
    width: u32,
    height: u32,
    params: &FilterParams,
) -> Result<Vec<u8>, PipelineError> {
    let dimensions = Dimensions::new(width, height);
    check_buffer_len(source, dimensions)?;

    let mut adjusted = source.to_vec();
    adjust::adjust_raw(&mut adjusted, params);
    if params.sharpens() {
        sharpen::sharpen_raw(&adjusted, dimensions, params.sharpness)
    } else {
        Ok(adjusted)
    }
}

/// Decode `image_bytes` and run the pipeline on the result.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
pub fn process(image_bytes: &[u8], params: &FilterParams) -> Result<RgbaImage, PipelineError> {
    let image = codec::decode(image_bytes)?;
    Ok(run(&image, params))
}

/// Run the pipeline keeping every intermediate image.
#[must_use]
pub fn process_staged(image: RgbaImage, params: &FilterParams) -> StagedResult {
    Pipeline::new(image, *params)
        .adjust()
        .sharpen()
        .into_result()
}

/// Reject a raw buffer whose length does not match `dimensions`.
pub(crate) fn check_buffer_len(buffer: &[u8], dimensions: Dimensions) -> Result<(), PipelineError> {
    let expected = dimensions.buffer_len();
    if expected == Some(buffer.len()) {
        return Ok(());
    }
    Err(PipelineError::BufferSizeMismatch {
        expected: expected.unwrap_or(usize::MAX),
        actual: buffer.len(),
        width: dimensions.width,
        height: dimensions.height,
    })
}
