// ============================================================================
// cropgen CLI - crop, preview, export and submit one image headlessly
// ============================================================================
//
// Usage examples:
//   cropgen portrait.jpg --preview preview.png
//   cropgen portrait.jpg --crop 10,5,60,60 --rotate 15 --export crop.png
//   STABILITY_API_KEY=... cropgen portrait.jpg --submit --output sailor.png
//   cropgen wide.png --aspect free --crop 0,0,100,50 --submit --prompt "as a pirate"

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use cropgen_app::{
    ConfigError, GeneratedArtifact, GenerationClient, GenerationConfig, GenerationError,
    GenerationParams, Session, SessionError, SessionOptions, SessionState,
};
use cropgen_core::encode::{encode_surface, EncodeError};
use cropgen_core::{AspectRatio, CropRegion, GeometryError, Transform};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Aspect ratio argument: `W:H`, or `free` for an unlocked crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectArg(pub Option<AspectRatio>);

fn parse_aspect(value: &str) -> Result<AspectArg, String> {
    if value.eq_ignore_ascii_case("free") {
        return Ok(AspectArg(None));
    }
    value
        .parse::<AspectRatio>()
        .map(|ratio| AspectArg(Some(ratio)))
        .map_err(|e| e.to_string())
}

/// Crop argument in percent of the image: `x,y,width,height`.
fn parse_crop(value: &str) -> Result<CropRegion, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number in crop {value:?}: {e}"))?;
    match parts.as_slice() {
        [x, y, width, height] => Ok(CropRegion::percent(*x, *y, *width, *height)),
        _ => Err(format!("crop must be x,y,width,height, got {value:?}")),
    }
}

/// Crop an image and restyle it with an image-to-image model.
#[derive(Parser, Debug)]
#[command(
    name = "cropgen",
    version,
    about = "Crop an image and restyle it with an image-to-image model",
    long_about = "Crop, scale and rotate an image, render a preview, export the crop\n\
                  as a 1024x1024 PNG and optionally submit it for image-to-image\n\
                  generation.\n\n\
                  Generation reads API_HOST and STABILITY_API_KEY from the environment."
)]
pub struct CliArgs {
    /// Image file to crop (PNG or JPEG).
    pub input: PathBuf,

    /// Aspect ratio as W:H, or "free".
    #[arg(long, default_value = "1:1", value_parser = parse_aspect, value_name = "W:H")]
    pub aspect: AspectArg,

    /// Crop rectangle in percent of the image. Defaults to a centered 90% crop.
    #[arg(long, value_parser = parse_crop, value_name = "X,Y,W,H")]
    pub crop: Option<CropRegion>,

    /// Scale factor applied around the image center.
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Clockwise rotation in degrees.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub rotate: f64,

    /// Device pixel ratio for the preview bitmap.
    #[arg(long, default_value_t = 1.0)]
    pub dpr: f64,

    /// Write the rendered preview to this PNG file.
    #[arg(long, value_name = "FILE")]
    pub preview: Option<PathBuf>,

    /// Write the 1024x1024 export to this PNG file.
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Submit the export for generation.
    #[arg(long)]
    pub submit: bool,

    /// Where to write the generated image.
    #[arg(short, long, default_value = "generated.png", value_name = "FILE")]
    pub output: PathBuf,

    /// Prompt sent with the image.
    #[arg(long)]
    pub prompt: Option<String>,

    /// Give up on the generation request after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("could not read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no preview was rendered")]
    NoPreview,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the CLI and return an OS exit code.
/// `0` = everything requested succeeded, `1` = something failed.
pub async fn run(args: CliArgs) -> ExitCode {
    match execute(args).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

async fn execute(args: CliArgs) -> Result<ExitCode, CliError> {
    let bytes = std::fs::read(&args.input).map_err(|source| CliError::Read {
        path: args.input.clone(),
        source,
    })?;

    let mut session = Session::new(SessionOptions {
        aspect: args.aspect.0,
        device_pixel_ratio: args.dpr,
        download_dir: None,
        ..Default::default()
    });
    session.select_file(&bytes)?;

    match args.crop {
        Some(crop) => {
            session.update_crop(crop)?;
        }
        None if session.crop().is_none() => {
            // Free aspect has no initial crop; start from a centered 90% one
            let (width, height) = session.source().map_or((0, 0), |s| s.dimensions());
            session.update_crop(cropgen_core::compute_initial_crop(width, height, None)?)?;
        }
        None => {}
    }

    session.set_transform(Transform::new(args.scale, args.rotate)?);
    session.complete_crop()?;
    session.render_preview_now()?;

    if let Some(path) = &args.preview {
        let png = session
            .with_preview(encode_surface)
            .ok_or(CliError::NoPreview)??;
        write_file(path, &png)?;
    }

    if let Some(path) = &args.export {
        let artifact = session.export_artifact()?;
        write_file(path, &artifact.bytes)?;
    }

    if !args.submit {
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = GenerationConfig::from_env()?;
    config.timeout = args.timeout.map(Duration::from_secs);
    let mut params = GenerationParams::default();
    if let Some(prompt) = args.prompt {
        params.prompt = prompt;
    }
    let client = GenerationClient::new(config)?.with_params(params);

    match session.submit(&client).await? {
        Some(base64) => {
            let generated = GeneratedArtifact {
                base64,
                seed: None,
                finish_reason: None,
            };
            write_file(&args.output, &generated.decode()?)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            if let SessionState::Failed { message, .. } = session.state() {
                eprintln!("error: {message}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
