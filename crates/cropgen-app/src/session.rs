//! The crop-and-generate session.
//!
//! A session owns one selected image at a time and walks it through
//!
//! ```text
//! Idle -> FileSelected -> Cropping <-> CropCompleted
//!                                          |
//!                                      Exporting -> Submitting -> Succeeded | Failed
//! ```
//!
//! Selecting a new file always restarts from `Idle` and bumps the session
//! epoch. Preview renders and submission results carry the epoch or
//! submission id they were started for, and anything that arrives for an
//! older one is dropped.
//!
//! Submissions are split in two halves so callers can keep editing while a
//! request is outstanding: [`Session::begin_submission`] exports and
//! raises the loading flag synchronously, [`Submission::run`] awaits the
//! network without borrowing the session, and
//! [`Session::finish_submission`] applies the outcome.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cropgen_core::decode::decode_image;
use cropgen_core::{
    compute_initial_crop, constrain_crop, to_percent_units, AspectRatio, CompletedCrop,
    CropConstraints, CropRegion, DecodeError, ExportError, ExportPipeline, ExportRequest,
    ExportedArtifact, GeometryError, RenderError, SourceImage, Surface, Transform,
};
use thiserror::Error;

use crate::debounce::DEFAULT_QUIET_PERIOD;
use crate::download::DownloadSlot;
use crate::generation::{GenerationClient, GenerationError, GenerationResult, Transport};
use crate::preview::{PreviewJob, PreviewRenderer};
use crate::status::{InFlight, LoadingFlag};

/// Errors returned by session operations.
///
/// Generation failures after a request was sent are not errors; they move
/// the session to [`SessionState::Failed`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No image selected")]
    NoImage,

    #[error("No crop selected")]
    NoCrop,

    #[error("A submission is already in flight")]
    SubmissionPending,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Why the last submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The client that ran the submission had no API key. `submit` and
    /// `begin_submission` refuse up front, so this only happens when a
    /// [`Submission`] is run with a different client than it was begun with.
    MissingCredential,
    Transport,
    HttpStatus(u16),
    MalformedResponse,
}

impl From<&GenerationError> for FailureReason {
    fn from(err: &GenerationError) -> Self {
        match err {
            GenerationError::MissingCredential => FailureReason::MissingCredential,
            GenerationError::Transport(_) => FailureReason::Transport,
            GenerationError::Status { status, .. } => FailureReason::HttpStatus(*status),
            GenerationError::MalformedResponse(_) => FailureReason::MalformedResponse,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MissingCredential => f.write_str("missing credential"),
            FailureReason::Transport => f.write_str("network error"),
            FailureReason::HttpStatus(status) => write!(f, "HTTP {status}"),
            FailureReason::MalformedResponse => f.write_str("malformed response"),
        }
    }
}

/// Where the session is in its workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    FileSelected,
    Cropping,
    CropCompleted,
    Exporting,
    Submitting { id: u64 },
    Succeeded,
    Failed { reason: FailureReason, message: String },
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Quiet period before a preview re-renders.
    pub quiet_period: Duration,
    pub device_pixel_ratio: f64,
    /// Aspect ratio locked on new selections; `None` allows free-form crops.
    pub aspect: Option<AspectRatio>,
    pub constraints: CropConstraints,
    pub export: ExportPipeline,
    /// Directory for the staged download; `None` disables staging.
    pub download_dir: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            device_pixel_ratio: 1.0,
            aspect: Some(AspectRatio::SQUARE),
            constraints: CropConstraints::default(),
            export: ExportPipeline::default(),
            download_dir: Some(std::env::temp_dir()),
        }
    }
}

/// A submission that has been exported and is ready to send.
///
/// Holds the loading flag raised until [`run`](Self::run) settles or the
/// submission is dropped.
#[derive(Debug)]
pub struct Submission {
    id: u64,
    artifact: ExportedArtifact,
    in_flight: InFlight,
}

impl Submission {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn artifact(&self) -> &ExportedArtifact {
        &self.artifact
    }

    /// Send the artifact and wait for the service.
    pub async fn run<T: Transport>(self, client: &GenerationClient<T>) -> SubmissionOutcome {
        let result = client.submit(&self.artifact).await;
        drop(self.in_flight);
        SubmissionOutcome {
            id: self.id,
            result,
        }
    }
}

/// Result of a [`Submission`], to be applied with
/// [`Session::finish_submission`].
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub id: u64,
    pub result: Result<GenerationResult, GenerationError>,
}

#[derive(Debug)]
pub struct Session {
    options: SessionOptions,
    state: SessionState,
    epoch: u64,
    source: Option<Arc<SourceImage>>,
    crop: Option<CropRegion>,
    completed: Option<CompletedCrop>,
    aspect: Option<AspectRatio>,
    transform: Transform,
    generated: Option<String>,
    next_submission: u64,
    preview: PreviewRenderer,
    loading: LoadingFlag,
    download: Option<DownloadSlot>,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            state: SessionState::Idle,
            epoch: 0,
            source: None,
            crop: None,
            completed: None,
            aspect: options.aspect,
            transform: Transform::default(),
            generated: None,
            next_submission: 0,
            preview: PreviewRenderer::new(options.quiet_period),
            loading: LoadingFlag::new(),
            download: options.download_dir.clone().map(DownloadSlot::new),
            options,
        }
    }

    /// Decode `bytes` and make it the session's image.
    ///
    /// The session restarts from `Idle` first, so on a decode error it is
    /// left with no image.
    pub fn select_file(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.reset();
        let source = decode_image(bytes)?;
        self.load(source)
    }

    /// Make an already decoded image the session's image.
    pub fn select_image(&mut self, source: SourceImage) -> Result<(), SessionError> {
        self.reset();
        self.load(source)
    }

    /// Drop the image and everything derived from it.
    ///
    /// An outstanding submission keeps running, but its result will be
    /// ignored.
    pub fn reset(&mut self) {
        self.preview.cancel();
        self.preview.clear();
        if let Some(slot) = &mut self.download {
            slot.clear();
        }
        self.epoch += 1;
        self.source = None;
        self.crop = None;
        self.completed = None;
        self.generated = None;
        self.state = SessionState::Idle;
    }

    fn load(&mut self, source: SourceImage) -> Result<(), SessionError> {
        let (width, height) = source.dimensions();
        self.source = Some(Arc::new(source));
        self.state = SessionState::FileSelected;

        if let Some(aspect) = self.aspect {
            self.crop = Some(compute_initial_crop(width, height, Some(aspect))?);
            self.state = SessionState::Cropping;
        }

        log::info!(
            "selected {}x{} image (epoch {})",
            width,
            height,
            self.epoch
        );
        Ok(())
    }

    fn source_dimensions(&self) -> Result<(u32, u32), SessionError> {
        self.source
            .as_ref()
            .map(|s| s.dimensions())
            .ok_or(SessionError::NoImage)
    }

    fn is_submitting(&self) -> bool {
        matches!(self.state, SessionState::Submitting { .. })
    }

    /// Replace the live crop with `region`, normalized to the image bounds,
    /// the current aspect ratio and the configured constraints.
    ///
    /// Returns the stored region in percent units.
    pub fn update_crop(&mut self, region: CropRegion) -> Result<CropRegion, SessionError> {
        let (width, height) = self.source_dimensions()?;
        let constrained = constrain_crop(
            &region,
            width,
            height,
            self.aspect,
            &self.options.constraints,
        )?;
        let normalized = to_percent_units(&constrained, width, height)?;

        self.crop = Some(normalized);
        if !self.is_submitting() {
            self.state = SessionState::Cropping;
        }
        Ok(normalized)
    }

    /// Confirm the live crop and queue a preview render.
    pub fn complete_crop(&mut self) -> Result<CompletedCrop, SessionError> {
        let (width, height) = self.source_dimensions()?;
        let crop = self.crop.ok_or(SessionError::NoCrop)?;
        let completed = CompletedCrop::new(&crop, width, height)?;

        self.completed = Some(completed);
        if !self.is_submitting() {
            self.state = SessionState::CropCompleted;
        }
        self.request_preview();
        Ok(completed)
    }

    /// Lock crops to `aspect`, or unlock them with `None`.
    ///
    /// The live crop is re-fitted; with no crop yet, an initial one is
    /// computed.
    pub fn set_aspect(&mut self, aspect: Option<AspectRatio>) -> Result<(), SessionError> {
        self.aspect = aspect;
        let Ok((width, height)) = self.source_dimensions() else {
            return Ok(());
        };
        match (self.crop, aspect) {
            (Some(crop), Some(_)) => {
                self.update_crop(crop)?;
            }
            (None, Some(_)) => {
                self.crop = Some(compute_initial_crop(width, height, aspect)?);
                if !self.is_submitting() {
                    self.state = SessionState::Cropping;
                }
            }
            (_, None) => {}
        }
        Ok(())
    }

    /// Change scale and rotation and queue a preview render.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.request_preview();
    }

    fn preview_job(&self) -> Option<PreviewJob> {
        Some(PreviewJob {
            epoch: self.epoch,
            source: Arc::clone(self.source.as_ref()?),
            completed: self.completed?,
            transform: self.transform,
            device_pixel_ratio: self.options.device_pixel_ratio,
        })
    }

    fn request_preview(&self) {
        if let Some(job) = self.preview_job() {
            self.preview.request(job);
        }
    }

    /// Render the preview immediately instead of waiting for the debounce.
    pub fn render_preview_now(&self) -> Result<(), SessionError> {
        if self.source.is_none() {
            return Err(SessionError::NoImage);
        }
        let job = self.preview_job().ok_or(SessionError::NoCrop)?;
        self.preview.render_now(&job)?;
        Ok(())
    }

    fn export_with(
        &self,
        source: &SourceImage,
        preview: Option<&Surface>,
    ) -> Result<ExportedArtifact, ExportError> {
        self.options.export.export(ExportRequest {
            source,
            completed: self.completed.as_ref(),
            preview,
            transform: &self.transform,
        })
    }

    /// Export the completed crop as a PNG artifact.
    ///
    /// Requires a completed crop and a preview rendered for the current
    /// image.
    pub fn export_artifact(&self) -> Result<ExportedArtifact, SessionError> {
        let source = self.source.as_deref().ok_or(SessionError::NoImage)?;
        let exported = self
            .preview
            .with_latest(self.epoch, |p| self.export_with(source, Some(&p.surface)));
        let artifact = match exported {
            Some(result) => result?,
            None => self.export_with(source, None)?,
        };
        Ok(artifact)
    }

    /// Export the crop and raise the loading flag.
    ///
    /// Nothing changes if this fails. The credential is checked before
    /// anything else, so a missing key never leads to an export or a
    /// request.
    pub fn begin_submission<T: Transport>(
        &mut self,
        client: &GenerationClient<T>,
    ) -> Result<Submission, SessionError> {
        client.ensure_credential()?;
        if self.loading.get() {
            return Err(SessionError::SubmissionPending);
        }

        let previous = std::mem::replace(&mut self.state, SessionState::Exporting);
        let artifact = match self.export_artifact() {
            Ok(artifact) => artifact,
            Err(e) => {
                self.state = previous;
                return Err(e);
            }
        };
        let Some(in_flight) = self.loading.begin() else {
            self.state = previous;
            return Err(SessionError::SubmissionPending);
        };

        if let Some(slot) = &mut self.download {
            if let Err(e) = slot.stage(&artifact) {
                log::warn!("failed to stage export for download: {e}");
            }
        }

        self.next_submission += 1;
        let id = self.next_submission;
        self.state = SessionState::Submitting { id };
        log::info!("submission {id} started ({} bytes)", artifact.bytes.len());

        Ok(Submission {
            id,
            artifact,
            in_flight,
        })
    }

    /// Apply a submission outcome.
    ///
    /// Returns the generated image on success. Outcomes for anything but
    /// the current submission are ignored.
    pub fn finish_submission(&mut self, outcome: SubmissionOutcome) -> Option<&str> {
        match self.state {
            SessionState::Submitting { id } if id == outcome.id => {}
            _ => {
                log::warn!("ignoring result of superseded submission {}", outcome.id);
                return None;
            }
        }

        let image = outcome.result.and_then(|result| {
            result.first_image().map(str::to_owned).ok_or_else(|| {
                GenerationError::MalformedResponse("response contains no image".to_string())
            })
        });
        match image {
            Ok(image) => {
                log::info!("submission {} succeeded", outcome.id);
                self.state = SessionState::Succeeded;
                self.generated = Some(image);
                self.generated.as_deref()
            }
            Err(e) => {
                log::error!("submission {} failed: {e}", outcome.id);
                self.state = SessionState::Failed {
                    reason: FailureReason::from(&e),
                    message: e.to_string(),
                };
                None
            }
        }
    }

    /// Export, send and apply one submission.
    ///
    /// Returns the generated image, or `None` if generation failed (see
    /// [`state`](Self::state) for why).
    pub async fn submit<T: Transport>(
        &mut self,
        client: &GenerationClient<T>,
    ) -> Result<Option<String>, SessionError> {
        let submission = self.begin_submission(client)?;
        let outcome = submission.run(client).await;
        Ok(self.finish_submission(outcome).map(str::to_owned))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_deref()
    }

    /// The live crop in percent units.
    pub fn crop(&self) -> Option<CropRegion> {
        self.crop
    }

    pub fn completed_crop(&self) -> Option<CompletedCrop> {
        self.completed
    }

    pub fn aspect(&self) -> Option<AspectRatio> {
        self.aspect
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Base64 of the most recently generated image.
    pub fn generated_image(&self) -> Option<&str> {
        self.generated.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    /// Shared handle for observing the loading flag.
    pub fn loading_flag(&self) -> &LoadingFlag {
        &self.loading
    }

    /// Path of the staged export, if staging is enabled and one exists.
    pub fn download_path(&self) -> Option<&Path> {
        self.download.as_ref().and_then(|slot| slot.path())
    }

    /// Run `f` on the preview surface rendered for the current image.
    pub fn with_preview<R>(&self, f: impl FnOnce(&Surface) -> R) -> Option<R> {
        self.preview.with_latest(self.epoch, |p| f(&p.surface))
    }

    pub fn is_preview_pending(&self) -> bool {
        self.preview.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::generation::testing::RecordingTransport;
    use cropgen_core::encode::encode_png;
    use cropgen_core::ExportPrecondition;
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;

    const SUCCESS_BODY: &str = r#"{"artifacts":[{"base64":"AAAA"}]}"#;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        encode_png(img.as_raw(), width, height).unwrap()
    }

    fn options() -> SessionOptions {
        SessionOptions {
            export: ExportPipeline {
                width: 64,
                height: 64,
                ..Default::default()
            },
            download_dir: None,
            ..Default::default()
        }
    }

    fn ready_session() -> Session {
        let mut session = Session::new(options());
        session.select_file(&png_bytes(200, 100)).unwrap();
        session.complete_crop().unwrap();
        session.render_preview_now().unwrap();
        session
    }

    fn client(key: Option<&str>, transport: RecordingTransport) -> GenerationClient<RecordingTransport> {
        let mut config = GenerationConfig::default();
        if let Some(key) = key {
            config = config.with_api_key(key);
        }
        GenerationClient::with_transport(config, transport)
    }

    fn record_loading(session: &Session) -> Arc<Mutex<Vec<bool>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        session
            .loading_flag()
            .subscribe(move |v| sink.lock().unwrap().push(v));
        seen
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[tokio::test]
    async fn test_select_file_starts_square_crop() {
        let mut session = Session::new(options());

        session.select_file(&png_bytes(200, 100)).unwrap();

        assert_eq!(session.state(), &SessionState::Cropping);
        let crop = session.crop().unwrap();
        assert_close(crop.x, 27.5);
        assert_close(crop.y, 5.0);
        assert_close(crop.width, 45.0);
        assert_close(crop.height, 90.0);
    }

    #[tokio::test]
    async fn test_free_aspect_waits_for_user_crop() {
        let mut session = Session::new(SessionOptions {
            aspect: None,
            ..options()
        });

        session.select_file(&png_bytes(50, 50)).unwrap();

        assert_eq!(session.state(), &SessionState::FileSelected);
        assert!(session.crop().is_none());
        assert!(matches!(session.complete_crop(), Err(SessionError::NoCrop)));
    }

    #[tokio::test]
    async fn test_invalid_file_leaves_session_idle() {
        let mut session = ready_session();

        let err = session.select_file(b"definitely not an image").unwrap_err();

        assert!(matches!(err, SessionError::Decode(_)));
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.source().is_none());
        assert!(session.with_preview(|_| ()).is_none());
    }

    #[tokio::test]
    async fn test_crop_edits_move_between_states() {
        let mut session = Session::new(options());
        session.select_file(&png_bytes(200, 100)).unwrap();

        session.complete_crop().unwrap();
        assert_eq!(session.state(), &SessionState::CropCompleted);

        // Oversized and misshapen drag is fitted back to a square inside the image
        let fitted = session
            .update_crop(CropRegion::pixel(150.0, 20.0, 80.0, 30.0))
            .unwrap();
        assert_eq!(session.state(), &SessionState::Cropping);
        assert_close(fitted.x, 60.0);
        assert_close(fitted.width, 40.0);
        assert_close(fitted.height, 80.0);

        let completed = session.complete_crop().unwrap();
        assert_close(completed.width(), 80.0);
        assert_close(completed.height(), 80.0);
    }

    #[tokio::test]
    async fn test_set_aspect_refits_crop() {
        let mut session = Session::new(SessionOptions {
            aspect: None,
            ..options()
        });
        session.select_file(&png_bytes(200, 100)).unwrap();

        session.set_aspect(Some(AspectRatio::new(2, 1).unwrap())).unwrap();
        let crop = session.crop().unwrap();
        assert_eq!(session.state(), &SessionState::Cropping);
        assert_close(crop.width, 90.0);
        assert_close(crop.height, 90.0);

        session.set_aspect(Some(AspectRatio::SQUARE)).unwrap();
        let square = session.crop().unwrap();
        // 100x100 pixels on a 200x100 image
        assert_close(square.width, 50.0);
        assert_close(square.height, 100.0);
    }

    #[tokio::test]
    async fn test_operations_without_image() {
        let mut session = Session::new(options());

        assert!(matches!(session.complete_crop(), Err(SessionError::NoImage)));
        assert!(matches!(
            session.update_crop(CropRegion::percent(0.0, 0.0, 10.0, 10.0)),
            Err(SessionError::NoImage)
        ));
        assert!(matches!(session.render_preview_now(), Err(SessionError::NoImage)));
        assert!(matches!(session.export_artifact(), Err(SessionError::NoImage)));
    }

    #[tokio::test]
    async fn test_missing_credential_sends_nothing() {
        let mut session = ready_session();
        let seen = record_loading(&session);
        let client = client(None, RecordingTransport::replying(200, SUCCESS_BODY));

        let err = session.submit(&client).await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Generation(GenerationError::MissingCredential)
        ));
        assert_eq!(client.transport().call_count(), 0);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(session.state(), &SessionState::CropCompleted);
    }

    #[tokio::test]
    async fn test_submission_run_without_key_marks_failed() {
        let mut session = ready_session();
        let keyed = client(Some("sk-test"), RecordingTransport::replying(200, SUCCESS_BODY));
        let keyless = client(None, RecordingTransport::replying(200, SUCCESS_BODY));

        let submission = session.begin_submission(&keyed).unwrap();
        let outcome = submission.run(&keyless).await;

        assert!(session.finish_submission(outcome).is_none());
        assert!(matches!(
            session.state(),
            SessionState::Failed {
                reason: FailureReason::MissingCredential,
                ..
            }
        ));
        assert_eq!(keyless.transport().call_count(), 0);
        assert!(!session.is_loading());
    }

    #[test]
    fn test_edits_render_without_async_runtime() {
        let mut session = Session::new(options());
        session.select_file(&png_bytes(100, 100)).unwrap();

        session.complete_crop().unwrap();
        assert_eq!(session.with_preview(|s| (s.width(), s.height())), Some((90, 90)));

        session.set_transform(Transform::new(1.0, 90.0).unwrap());
        assert!(!session.is_preview_pending());
        assert_eq!(session.state(), &SessionState::CropCompleted);
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let mut session = ready_session();
        let seen = record_loading(&session);
        let client = client(Some("sk-test"), RecordingTransport::replying(200, SUCCESS_BODY));

        let generated = session.submit(&client).await.unwrap();

        assert_eq!(generated.as_deref(), Some("AAAA"));
        assert_eq!(session.generated_image(), Some("AAAA"));
        assert_eq!(session.state(), &SessionState::Succeeded);
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
        assert!(!session.is_loading());

        let calls = client.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].filename, "image.png");
        assert_eq!(calls[0].mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_transport_error_marks_failed() {
        let mut session = ready_session();
        let seen = record_loading(&session);
        let client = client(
            Some("sk-test"),
            RecordingTransport::failing(GenerationError::Transport("connection refused".to_string())),
        );

        let generated = session.submit(&client).await.unwrap();

        assert_eq!(generated, None);
        assert_eq!(session.generated_image(), None);
        assert!(matches!(
            session.state(),
            SessionState::Failed {
                reason: FailureReason::Transport,
                ..
            }
        ));
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_error_status_marks_failed() {
        let mut session = ready_session();
        let client = client(
            Some("sk-test"),
            RecordingTransport::replying(500, r#"{"message":"internal error"}"#),
        );

        session.submit(&client).await.unwrap();

        assert_eq!(
            session.state(),
            &SessionState::Failed {
                reason: FailureReason::HttpStatus(500),
                message: "Generation service returned HTTP 500: internal error".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_second_submission_while_pending() {
        let mut session = ready_session();
        let client = client(Some("sk-test"), RecordingTransport::replying(200, SUCCESS_BODY));

        let first = session.begin_submission(&client).unwrap();
        let err = session.begin_submission(&client).unwrap_err();
        assert!(matches!(err, SessionError::SubmissionPending));
        assert!(session.is_loading());

        let outcome = first.run(&client).await;
        assert_eq!(session.finish_submission(outcome), Some("AAAA"));
        assert_eq!(client.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_result_for_replaced_file_is_ignored() {
        let mut session = ready_session();
        let client = client(Some("sk-test"), RecordingTransport::replying(200, SUCCESS_BODY));

        let submission = session.begin_submission(&client).unwrap();
        session.select_file(&png_bytes(80, 60)).unwrap();
        let outcome = submission.run(&client).await;

        assert_eq!(session.finish_submission(outcome), None);
        assert_eq!(session.generated_image(), None);
        assert_eq!(session.state(), &SessionState::Cropping);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_dropped_submission_lowers_flag() {
        let mut session = ready_session();
        let seen = record_loading(&session);
        let client = client(Some("sk-test"), RecordingTransport::replying(200, SUCCESS_BODY));

        let submission = session.begin_submission(&client).unwrap();
        drop(submission);

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
        assert!(session.begin_submission(&client).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_preconditions() {
        let mut session = Session::new(options());
        session.select_file(&png_bytes(100, 100)).unwrap();
        let client = client(Some("sk-test"), RecordingTransport::replying(200, SUCCESS_BODY));

        let err = session.begin_submission(&client).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Export(ExportError::Precondition(ExportPrecondition::NoCompletedCrop))
        ));
        assert_eq!(session.state(), &SessionState::Cropping);

        // Completed, but the debounced preview has not rendered yet
        session.complete_crop().unwrap();
        let err = session.begin_submission(&client).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Export(ExportError::Precondition(ExportPrecondition::NoRenderedSurface))
        ));
        assert_eq!(session.state(), &SessionState::CropCompleted);
        assert!(!session.is_loading());
        assert_eq!(client.transport().call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preview_follows_last_edit() {
        let mut session = Session::new(options());
        session.select_file(&png_bytes(100, 100)).unwrap();
        session.complete_crop().unwrap();

        for rotate in [10.0, 20.0, 30.0] {
            session.set_transform(Transform::new(1.5, rotate).unwrap());
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(session.with_preview(|_| ()).is_none());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let size = session.with_preview(|s| (s.width(), s.height()));
        assert_eq!(size, Some((90, 90)));
        assert!(!session.is_preview_pending());
    }

    #[tokio::test]
    async fn test_export_is_staged_for_download() {
        let dir = std::env::temp_dir().join(format!("cropgen-session-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut session = Session::new(SessionOptions {
            download_dir: Some(dir.clone()),
            ..options()
        });
        session.select_file(&png_bytes(100, 100)).unwrap();
        session.complete_crop().unwrap();
        session.render_preview_now().unwrap();
        let client = client(Some("sk-test"), RecordingTransport::replying(200, SUCCESS_BODY));

        session.submit(&client).await.unwrap();
        let staged = session.download_path().unwrap().to_path_buf();
        let decoded = image::load_from_memory(&std::fs::read(&staged).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));

        session.select_file(&png_bytes(10, 10)).unwrap();
        assert!(!staged.exists());
        assert!(session.download_path().is_none());

        drop(session);
        std::fs::remove_dir_all(dir).unwrap();
    }
}
