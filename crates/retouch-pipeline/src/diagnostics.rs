//! Pipeline diagnostics: timing and pixel counts for each stage.
//!
//! [`process_staged_with_diagnostics`] runs the same stages as
//! [`crate::run`] and records what each one did. Front ends use this to
//! report how long an adjustment took and how much of the image it
//! clipped.
//!
//! Timing goes through the [`Clock`] trait so callers (and tests) can
//! supply their own time source. [`SystemClock`] uses the `web-time`
//! crate, which is `performance.now()` on WASM and
//! `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::types::{FilterParams, RgbaImage, StagedResult};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by [`web_time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = web_time::Instant;

    fn now(&self) -> Self::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &Self::Instant) -> Duration {
        since.elapsed()
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: brightness, contrast and saturation.
    pub adjust: StageDiagnostics,
    /// Stage 2: sharpening (only when `params.sharpness > 0`).
    pub sharpen: Option<StageDiagnostics>,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Brightness/contrast/saturation metrics.
    Adjust {
        /// Brightness percentage used.
        brightness: f64,
        /// Contrast percentage used.
        contrast: f64,
        /// Saturation percentage used.
        saturation: f64,
        /// Pixels whose RGB changed.
        changed_pixel_count: u64,
        /// Color channels stored at 0 or 255 in the stage output.
        clipped_channel_count: u64,
    },
    /// Sharpening metrics.
    Sharpen {
        /// Sharpness used.
        sharpness: f64,
        /// Pixels with a full 3x3 neighborhood.
        interior_pixel_count: u64,
        /// Pixels whose RGB changed.
        changed_pixel_count: u64,
        /// Color channels stored at 0 or 255 in the stage output.
        clipped_channel_count: u64,
    },
}

/// High-level summary for the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Pixels that differ between the original and the final output.
    pub changed_pixel_count: u64,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let mut stages = vec![("Adjust", &self.adjust)];
        if let Some(ref s) = self.sharpen {
            stages.push(("Sharpen", s));
        }

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }
        if self.sharpen.is_none() {
            lines.push(format!("{:<24} {:>10}", "Sharpen", "skipped"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Changed pixels: {} of {}",
            self.summary.changed_pixel_count, self.summary.pixel_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Adjust {
            brightness,
            contrast,
            saturation,
            changed_pixel_count,
            clipped_channel_count,
        } => format!(
            "b={brightness} c={contrast} s={saturation} changed={changed_pixel_count} \
             clipped={clipped_channel_count}"
        ),
        StageMetrics::Sharpen {
            sharpness,
            interior_pixel_count,
            changed_pixel_count,
            clipped_channel_count,
        } => format!(
            "sharpness={sharpness} interior={interior_pixel_count} \
             changed={changed_pixel_count} clipped={clipped_channel_count}"
        ),
    }
}

/// Number of pixels whose RGB channels differ between `a` and `b`.
///
/// Both images must have the same dimensions.
pub(crate) fn count_changed_pixels(a: &RgbaImage, b: &RgbaImage) -> u64 {
    a.pixels()
        .zip(b.pixels())
        .map(|(p, q)| u64::from(p.0[..3] != q.0[..3]))
        .sum()
}

/// Number of color channels (alpha excluded) stored at 0 or 255.
pub(crate) fn count_clipped_channels(image: &RgbaImage) -> u64 {
    image
        .pixels()
        .flat_map(|p| p.0[..3].iter().copied())
        .map(|v| u64::from(v == 0 || v == u8::MAX))
        .sum()
}

/// Pixels with a complete 3x3 neighborhood.
fn interior_pixel_count(image: &RgbaImage) -> u64 {
    u64::from(image.width().saturating_sub(2)) * u64::from(image.height().saturating_sub(2))
}

/// Run the staged pipeline and collect per-stage diagnostics.
#[must_use]
pub fn process_staged_with_diagnostics<C: Clock>(
    image: RgbaImage,
    params: &FilterParams,
    clock: &C,
) -> (StagedResult, PipelineDiagnostics) {
    let total_start = clock.now();

    let start = clock.now();
    let adjusted = Pipeline::new(image, *params).adjust();
    let adjust_duration = clock.elapsed(&start);
    let adjust = StageDiagnostics {
        duration: adjust_duration,
        metrics: StageMetrics::Adjust {
            brightness: params.brightness,
            contrast: params.contrast,
            saturation: params.saturation,
            changed_pixel_count: count_changed_pixels(adjusted.original(), adjusted.adjusted()),
            clipped_channel_count: count_clipped_channels(adjusted.adjusted()),
        },
    };

    let start = clock.now();
    let sharpened = adjusted.sharpen();
    let sharpen_duration = clock.elapsed(&start);
    let sharpen = sharpened.applied().then(|| StageDiagnostics {
        duration: sharpen_duration,
        metrics: StageMetrics::Sharpen {
            sharpness: params.sharpness,
            interior_pixel_count: interior_pixel_count(sharpened.output()),
            changed_pixel_count: count_changed_pixels(sharpened.adjusted(), sharpened.output()),
            clipped_channel_count: count_clipped_channels(sharpened.output()),
        },
    });

    let staged = sharpened.into_result();
    let total_duration = clock.elapsed(&total_start);

    let summary = PipelineSummary {
        image_width: staged.dimensions.width,
        image_height: staged.dimensions.height,
        pixel_count: staged.dimensions.pixel_count(),
        changed_pixel_count: count_changed_pixels(&staged.original, &staged.output),
    };

    log::debug!(
        "pipeline finished in {:.3}ms ({} of {} pixels changed)",
        duration_ms(total_duration),
        summary.changed_pixel_count,
        summary.pixel_count,
    );

    (
        staged,
        PipelineDiagnostics {
            adjust,
            sharpen,
            total_duration,
            summary,
        },
    )
}
