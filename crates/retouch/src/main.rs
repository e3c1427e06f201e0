//! retouch: apply photographic adjustments to an image file.
//!
//! Reads an image, runs brightness, contrast, saturation and optional
//! sharpening from `retouch-pipeline`, and writes the result. The output
//! format follows the output path's extension.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin retouch -- [OPTIONS] <INPUT>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use image::{DynamicImage, ImageFormat};
use retouch_pipeline::session::DEFAULT_EXPORT_NAME;
use retouch_pipeline::{FilterParams, Param, PipelineError, RgbaImage, SystemClock};

/// Brightness, contrast, saturation and sharpening for image files.
///
/// Control values are percentages: 100 leaves brightness, contrast and
/// saturation unchanged, and sharpness 0 disables the sharpening filter.
#[derive(Parser)]
#[command(name = "retouch", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Where to write the result. The format is chosen from the extension.
    #[arg(short, long, default_value = DEFAULT_EXPORT_NAME)]
    output: PathBuf,

    /// Brightness percentage (0-200).
    #[arg(long, default_value_t = FilterParams::DEFAULT_BRIGHTNESS, allow_negative_numbers = true)]
    brightness: f64,

    /// Contrast percentage (0-200).
    #[arg(long, default_value_t = FilterParams::DEFAULT_CONTRAST, allow_negative_numbers = true)]
    contrast: f64,

    /// Saturation percentage (0-200).
    #[arg(long, default_value_t = FilterParams::DEFAULT_SATURATION, allow_negative_numbers = true)]
    saturation: f64,

    /// Sharpening strength (0-100). 10 applies the kernel at full weight.
    #[arg(long, default_value_t = FilterParams::DEFAULT_SHARPNESS, allow_negative_numbers = true)]
    sharpness: f64,

    /// Filter parameters as a JSON string.
    ///
    /// When provided, the individual parameter flags are ignored. Missing
    /// fields take their default value.
    #[arg(long, conflicts_with = "config")]
    config_json: Option<String>,

    /// Path to a JSON file holding the filter parameters.
    ///
    /// Same format as `--config-json`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail on out-of-range parameters instead of clamping them.
    #[arg(long)]
    strict: bool,

    /// Print the per-stage diagnostics report.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON instead of the human-readable report.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Errors surfaced by the command-line front end.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("error parsing --config-json: {0}")]
    ConfigJson(#[source] serde_json::Error),

    #[error("error reading config {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing config {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("error reading {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error writing {}: {source}", path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("error serializing diagnostics: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Build [`FilterParams`] from CLI arguments.
///
/// `--config-json` or `--config` replace the individual flags. The result
/// is then validated (`--strict`) or clamped into range.
fn params_from_cli(cli: &Cli) -> Result<FilterParams, CliError> {
    let requested: FilterParams = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(CliError::ConfigJson)?
    } else if let Some(ref path) = cli.config {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::ParseConfig {
            path: path.clone(),
            source,
        })?
    } else {
        FilterParams::new(cli.brightness, cli.contrast, cli.saturation, cli.sharpness)
    };

    if cli.strict {
        requested.validate()?;
        return Ok(requested);
    }

    let clamped = requested.clamped();
    for param in Param::ALL {
        let (from, to) = (requested.get(param), clamped.get(param));
        if from.to_bits() != to.to_bits() {
            log::warn!("{param} {from} is out of range; using {to}");
        }
    }
    Ok(clamped)
}

/// Write `image` to `path` in the format named by its extension.
///
/// Formats without an alpha channel get the RGB channels only.
fn save_output(image: &RgbaImage, path: &Path) -> Result<(), CliError> {
    let wrap = |source| CliError::WriteOutput {
        path: path.to_path_buf(),
        source,
    };
    let format = ImageFormat::from_path(path).map_err(wrap)?;
    if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgba8(image.clone())
            .to_rgb8()
            .save_with_format(path, format)
            .map_err(wrap)
    } else {
        image.save_with_format(path, format).map_err(wrap)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let params = params_from_cli(cli)?;
    log::info!("parameters: {params:?}");

    let image_bytes = std::fs::read(&cli.input).map_err(|source| CliError::ReadInput {
        path: cli.input.clone(),
        source,
    })?;
    eprintln!(
        "Image: {} ({} bytes)",
        cli.input.display(),
        image_bytes.len()
    );

    let image = retouch_pipeline::codec::decode(&image_bytes)?;
    let (staged, diagnostics) =
        retouch_pipeline::process_staged_with_diagnostics(image, &params, &SystemClock);

    if cli.json {
        let json = serde_json::to_string_pretty(&diagnostics).map_err(CliError::Serialize)?;
        println!("{json}");
    } else if cli.diagnostics {
        println!("{}", diagnostics.report());
    }

    save_output(&staged.output, &cli.output)?;
    eprintln!(
        "Saved {}x{} image to {}",
        staged.dimensions.width,
        staged.dimensions.height,
        cli.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
