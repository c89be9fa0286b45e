//! HTTP transport for generation requests.

use std::future::Future;

use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};

use super::request::{GenerationRequest, INIT_IMAGE_FIELD};
use super::GenerationError;
use crate::config::GenerationConfig;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a multipart generation request.
///
/// Implementations return `GenerationError::Transport` when no HTTP
/// response was received. Any response, successful or not, is returned
/// as-is for the client to interpret.
pub trait Transport: Send + Sync {
    fn post_multipart(
        &self,
        url: &str,
        api_key: &str,
        request: &GenerationRequest<'_>,
    ) -> impl Future<Output = Result<TransportResponse, GenerationError>> + Send;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| GenerationError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http_client })
    }

    fn map_reqwest_error(e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Transport(format!("request timed out: {e}"))
        } else if e.is_connect() {
            GenerationError::Transport(format!("could not connect: {e}"))
        } else {
            GenerationError::Transport(format!("request failed: {e}"))
        }
    }
}

impl Transport for HttpTransport {
    async fn post_multipart(
        &self,
        url: &str,
        api_key: &str,
        request: &GenerationRequest<'_>,
    ) -> Result<TransportResponse, GenerationError> {
        let artifact = request.init_image;
        let image = Part::bytes(artifact.bytes.clone())
            .file_name(artifact.filename.clone())
            .mime_str(&artifact.mime_type)
            .map_err(Self::map_reqwest_error)?;

        let mut form = Form::new().part(INIT_IMAGE_FIELD, image);
        for (name, value) in request.text_fields() {
            form = form.text(name, value);
        }

        let response = self
            .http_client
            .post(url)
            .header(ACCEPT, "application/json")
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(Self::map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(Self::map_reqwest_error)?
            .to_vec();

        Ok(TransportResponse { status, body })
    }
}
