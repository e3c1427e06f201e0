//! Interactive editing session.
//!
//! A [`Session`] holds the currently loaded image and the current control
//! values. Front ends call a setter whenever a control moves and then
//! [`render`](Session::render) to get a fresh preview. Every render
//! starts again from the loaded image, so edits never compound.

use crate::types::{Dimensions, FilterParams, Param, PipelineError, RgbaImage};

/// File name suggested for exported images.
pub const DEFAULT_EXPORT_NAME: &str = "enhanced-image.png";

/// Loaded image plus current adjustment parameters.
#[derive(Debug, Clone, Default)]
pub struct Session {
    original: Option<RgbaImage>,
    params: FilterParams,
}

impl Session {
    /// Create an empty session with identity parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` and make the result the session's image.
    ///
    /// The current parameters are kept. On error the previously loaded
    /// image (if any) stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] or
    /// [`PipelineError::ImageDecode`] from [`crate::codec::decode`].
    pub fn load(&mut self, bytes: &[u8]) -> Result<Dimensions, PipelineError> {
        let image = crate::codec::decode(bytes)?;
        Ok(self.load_image(image))
    }

    /// Make an already decoded image the session's image.
    pub fn load_image(&mut self, image: RgbaImage) -> Dimensions {
        let dimensions = Dimensions::of(&image);
        log::debug!(
            "session image loaded: {}x{}",
            dimensions.width,
            dimensions.height
        );
        self.original = Some(image);
        dimensions
    }

    /// Whether an image has been loaded.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.original.is_some()
    }

    /// The loaded image, untouched by any adjustment.
    #[must_use]
    pub const fn original(&self) -> Option<&RgbaImage> {
        self.original.as_ref()
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> FilterParams {
        self.params
    }

    /// Replace all parameters at once.
    pub const fn set_params(&mut self, params: FilterParams) {
        self.params = params;
    }

    /// Set a single control.
    pub const fn set(&mut self, param: Param, value: f64) {
        self.params.set(param, value);
    }

    /// Set brightness.
    pub const fn set_brightness(&mut self, value: f64) {
        self.params.brightness = value;
    }

    /// Set contrast.
    pub const fn set_contrast(&mut self, value: f64) {
        self.params.contrast = value;
    }

    /// Set saturation.
    pub const fn set_saturation(&mut self, value: f64) {
        self.params.saturation = value;
    }

    /// Set sharpness.
    pub const fn set_sharpness(&mut self, value: f64) {
        self.params.sharpness = value;
    }

    /// Restore every control to its identity value.
    pub const fn reset(&mut self) {
        self.params = FilterParams::IDENTITY;
    }

    /// Run the pipeline on the loaded image with the current parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoImage`] if nothing has been loaded.
    pub fn render(&self) -> Result<RgbaImage, PipelineError> {
        let original = self.original.as_ref().ok_or(PipelineError::NoImage)?;
        Ok(crate::run(original, &self.params))
    }

    /// Render and encode the result as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoImage`] if nothing has been loaded, or
    /// [`PipelineError::ImageEncode`] if encoding fails.
    pub fn export_png(&self) -> Result<Vec<u8>, PipelineError> {
        let rendered = self.render()?;
        crate::codec::encode_png(&rendered)
    }
}
