//! Fixed-resolution export of the current crop.
//!
//! The export re-renders the crop from the source rather than upscaling
//! the preview bitmap, so the artifact is always exactly
//! [`EXPORT_SIZE`] x [`EXPORT_SIZE`] pixels no matter how large the crop is
//! on screen or what shape it has.
//!
//! # Example
//!
//! ```ignore
//! use cropgen_core::export::{ExportPipeline, ExportRequest};
//!
//! let artifact = ExportPipeline::default().export(ExportRequest {
//!     source: &source,
//!     completed: Some(&completed),
//!     preview: Some(&preview_surface),
//!     transform: &transform,
//! })?;
//! assert_eq!(artifact.filename, "image.png");
//! ```

use thiserror::Error;

use crate::decode::SourceImage;
use crate::encode::{encode_surface, EncodeError, PNG_MIME_TYPE};
use crate::geometry::CompletedCrop;
use crate::render::{render_crop, InterpolationFilter, RenderError, RenderTarget, Surface};
use crate::Transform;

/// Width and height of every exported artifact.
pub const EXPORT_SIZE: u32 = 1024;

/// Synthetic filename attached to exported artifacts.
pub const EXPORT_FILENAME: &str = "image.png";

/// Missing inputs that make an export impossible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPrecondition {
    /// No crop has been completed yet.
    NoCompletedCrop,
    /// No preview has been rendered for the completed crop.
    NoRenderedSurface,
}

impl std::fmt::Display for ExportPrecondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportPrecondition::NoCompletedCrop => f.write_str("no completed crop"),
            ExportPrecondition::NoRenderedSurface => f.write_str("no rendered surface"),
        }
    }
}

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export precondition failed: {0}")]
    Precondition(ExportPrecondition),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// An encoded export, ready to be attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

impl ExportedArtifact {
    /// Wrap PNG bytes with the export filename and MIME type.
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            filename: EXPORT_FILENAME.to_string(),
            mime_type: PNG_MIME_TYPE.to_string(),
        }
    }
}

/// Inputs for one export, borrowed from the live session.
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    pub source: &'a SourceImage,
    pub completed: Option<&'a CompletedCrop>,
    pub preview: Option<&'a Surface>,
    pub transform: &'a Transform,
}

/// Renders and encodes crops at a fixed output size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportPipeline {
    pub width: u32,
    pub height: u32,
    pub filter: InterpolationFilter,
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self {
            width: EXPORT_SIZE,
            height: EXPORT_SIZE,
            filter: InterpolationFilter::Lanczos3,
        }
    }
}

impl ExportPipeline {
    /// Export the request's crop as a PNG artifact.
    ///
    /// # Errors
    ///
    /// - `ExportError::Precondition` if there is no completed crop or no
    ///   rendered preview surface
    /// - `ExportError::Render` / `ExportError::Encode` if drawing or
    ///   encoding fails
    pub fn export(&self, request: ExportRequest<'_>) -> Result<ExportedArtifact, ExportError> {
        let completed = request
            .completed
            .ok_or(ExportError::Precondition(ExportPrecondition::NoCompletedCrop))?;
        match request.preview {
            Some(surface) if !surface.is_empty() => {}
            _ => {
                return Err(ExportError::Precondition(
                    ExportPrecondition::NoRenderedSurface,
                ))
            }
        }

        let target = RenderTarget::fixed(self.width, self.height);
        let mut surface = Surface::new();
        render_crop(
            request.source,
            completed,
            request.transform,
            &target,
            &mut surface,
            self.filter,
        )?;
        let bytes = encode_surface(&surface)?;

        log::info!(
            "exported {}x{} crop as {}x{} PNG ({} bytes)",
            completed.width().round(),
            completed.height().round(),
            self.width,
            self.height,
            bytes.len()
        );

        Ok(ExportedArtifact::png(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CropRegion;
    use image::{Rgba, RgbaImage};

    fn source(width: u32, height: u32) -> SourceImage {
        SourceImage::new(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255])
        }))
        .unwrap()
    }

    fn rendered_preview() -> Surface {
        let mut surface = Surface::new();
        surface.resize(1, 1);
        surface
    }

    fn decoded_size(artifact: &ExportedArtifact) -> (u32, u32) {
        let img = image::load_from_memory(&artifact.bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_export_is_always_1024_square() {
        let src = source(300, 200);
        let preview = rendered_preview();
        let pipeline = ExportPipeline::default();

        for (w, h) in [(300.0, 200.0), (37.0, 150.0), (120.0, 9.0)] {
            let crop = CompletedCrop::new(&CropRegion::pixel(0.0, 0.0, w, h), 300, 200).unwrap();
            let artifact = pipeline
                .export(ExportRequest {
                    source: &src,
                    completed: Some(&crop),
                    preview: Some(&preview),
                    transform: &Transform::default(),
                })
                .unwrap();
            assert_eq!(decoded_size(&artifact), (EXPORT_SIZE, EXPORT_SIZE));
        }
    }

    #[test]
    fn test_export_artifact_metadata() {
        let src = source(50, 50);
        let preview = rendered_preview();
        let crop = CompletedCrop::new(&CropRegion::percent(10.0, 10.0, 80.0, 80.0), 50, 50).unwrap();
        let pipeline = ExportPipeline {
            width: 32,
            height: 32,
            ..Default::default()
        };

        let artifact = pipeline
            .export(ExportRequest {
                source: &src,
                completed: Some(&crop),
                preview: Some(&preview),
                transform: &Transform::new(1.0, 45.0).unwrap(),
            })
            .unwrap();

        assert_eq!(artifact.filename, "image.png");
        assert_eq!(artifact.mime_type, "image/png");
        assert_eq!(decoded_size(&artifact), (32, 32));
    }

    #[test]
    fn test_export_without_completed_crop() {
        let src = source(10, 10);
        let preview = rendered_preview();
        let err = ExportPipeline::default()
            .export(ExportRequest {
                source: &src,
                completed: None,
                preview: Some(&preview),
                transform: &Transform::default(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ExportError::Precondition(ExportPrecondition::NoCompletedCrop)
        ));
    }

    #[test]
    fn test_export_without_rendered_surface() {
        let src = source(10, 10);
        let crop = CompletedCrop::new(&CropRegion::pixel(0.0, 0.0, 5.0, 5.0), 10, 10).unwrap();
        let blank = Surface::new();

        for preview in [None, Some(&blank)] {
            let err = ExportPipeline::default()
                .export(ExportRequest {
                    source: &src,
                    completed: Some(&crop),
                    preview,
                    transform: &Transform::default(),
                })
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Export precondition failed: no rendered surface"
            );
        }
    }
}
