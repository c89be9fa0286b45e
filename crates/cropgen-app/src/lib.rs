//! Cropgen App - interactive crop session and image-to-image submission
//!
//! This crate wraps `cropgen-core` with everything that involves time or
//! the network: debounced preview rendering, the generation client, the
//! loading flag presentation code watches, and the session state machine
//! that ties a selected file to one generated image.
//!
//! # Module Structure
//!
//! - `config` - Endpoint and credential configuration from the environment
//! - `debounce` - Cancellable, single-flight debounce scheduler
//! - `download` - Owned staging file for the latest export
//! - `generation` - Request/response types, transport and client
//! - `preview` - Debounced preview rendering into a shared slot
//! - `session` - The session state machine
//! - `status` - Loading flag with an RAII in-flight guard
//!
//! # Usage
//!
//! ```ignore
//! use cropgen_app::{GenerationClient, GenerationConfig, Session, SessionOptions};
//!
//! let mut session = Session::new(SessionOptions::default());
//! session.select_file(&std::fs::read("portrait.jpg")?)?;
//! session.complete_crop()?;
//! session.render_preview_now()?;
//!
//! let client = GenerationClient::new(GenerationConfig::from_env()?)?;
//! if let Some(base64) = session.submit(&client).await? {
//!     println!("generated {} base64 chars", base64.len());
//! }
//! ```

pub mod config;
pub mod debounce;
pub mod download;
pub mod generation;
pub mod preview;
pub mod session;
pub mod status;

pub use config::{ConfigError, GenerationConfig};
pub use debounce::{DebounceScheduler, DebounceToken, DEFAULT_QUIET_PERIOD};
pub use download::DownloadSlot;
pub use generation::{
    GeneratedArtifact, GenerationClient, GenerationError, GenerationParams, GenerationRequest,
    GenerationResult, HttpTransport, Transport, TransportResponse,
};
pub use preview::{PreviewJob, PreviewRenderer, RenderedPreview};
pub use session::{
    FailureReason, Session, SessionError, SessionOptions, SessionState, Submission,
    SubmissionOutcome,
};
pub use status::{InFlight, LoadingFlag};
