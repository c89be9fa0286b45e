//! Generation client.

use cropgen_core::ExportedArtifact;

use super::request::{GenerationParams, GenerationRequest};
use super::response::{error_message, GenerationResult};
use super::transport::{HttpTransport, Transport};
use super::GenerationError;
use crate::config::GenerationConfig;

/// Submits exported crops to the generation service.
///
/// Each call to [`submit`](Self::submit) issues at most one request and
/// never retries.
#[derive(Debug)]
pub struct GenerationClient<T = HttpTransport> {
    config: GenerationConfig,
    params: GenerationParams,
    transport: T,
}

impl GenerationClient<HttpTransport> {
    /// Client that talks HTTP to the configured endpoint.
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> GenerationClient<T> {
    pub fn with_transport(config: GenerationConfig, transport: T) -> Self {
        Self {
            config,
            params: GenerationParams::default(),
            transport,
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The configured API key, or `MissingCredential`.
    pub fn ensure_credential(&self) -> Result<&str, GenerationError> {
        self.config
            .api_key()
            .ok_or(GenerationError::MissingCredential)
    }

    /// Send `artifact` for generation and parse the response.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` before anything is sent if no key is configured
    /// - `Transport` if no response was received
    /// - `Status` for a non-2xx response
    /// - `MalformedResponse` for a 2xx body without a usable image
    pub async fn submit(
        &self,
        artifact: &ExportedArtifact,
    ) -> Result<GenerationResult, GenerationError> {
        let api_key = self.ensure_credential()?;
        let url = self.config.endpoint();
        let request = GenerationRequest::new(artifact, &self.params);

        log::info!(
            "submitting {} ({} bytes) to {}",
            artifact.filename,
            artifact.bytes.len(),
            url
        );

        let response = self.transport.post_multipart(&url, api_key, &request).await?;
        if !response.is_success() {
            let message = error_message(&response.body);
            log::warn!("generation failed with HTTP {}: {}", response.status, message);
            return Err(GenerationError::Status {
                status: response.status,
                message,
            });
        }

        let result = GenerationResult::from_json(&response.body)?;
        log::info!(
            "generation returned {} artifact(s)",
            result.artifacts.len()
        );
        Ok(result)
    }
}
