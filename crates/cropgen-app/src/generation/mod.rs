//! Image-to-image generation.
//!
//! One exported crop goes out as a multipart POST and one base64 image
//! comes back. The HTTP layer sits behind the [`Transport`] trait so the
//! client and the session can be driven without a network.
//!
//! # Wire format
//!
//! ```text
//! POST {API_HOST}/v1/generation/{engine}/image-to-image
//! Authorization: Bearer <key>
//! Accept: application/json
//!
//! init_image            file part, "image.png", image/png
//! init_image_mode       IMAGE_STRENGTH
//! image_strength        0.35
//! text_prompts[0][text] outfit me as a sailor
//! cfg_scale             7
//! samples               1
//! steps                 30
//! ```
//!
//! A 2xx response carries `{"artifacts": [{"base64": "..."}]}`; only the
//! first artifact is used.

mod client;
mod request;
mod response;
#[cfg(test)]
pub(crate) mod testing;
mod transport;

use thiserror::Error;

pub use client::GenerationClient;
pub use request::{GenerationParams, GenerationRequest, DEFAULT_PROMPT, INIT_IMAGE_FIELD};
pub use response::{GeneratedArtifact, GenerationResult};
pub use transport::{HttpTransport, Transport, TransportResponse};

/// Errors that can occur while generating an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// No API key is configured. Raised before any request is built.
    #[error("Missing API key: set STABILITY_API_KEY")]
    MissingCredential,

    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("Generation service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// A success response that does not contain a usable image.
    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),
}
