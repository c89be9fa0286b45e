//! In-memory transport for tests.

use std::sync::Mutex;

use super::request::GenerationRequest;
use super::transport::{Transport, TransportResponse};
use super::GenerationError;

/// What a [`RecordingTransport`] saw for one call.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub url: String,
    pub api_key: String,
    pub filename: String,
    pub mime_type: String,
    pub image_len: usize,
    pub fields: Vec<(&'static str, String)>,
}

/// Transport that records every call and replies with a canned result.
#[derive(Debug)]
pub(crate) struct RecordingTransport {
    reply: Result<TransportResponse, GenerationError>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingTransport {
    pub fn replying(status: u16, body: &str) -> Self {
        Self {
            reply: Ok(TransportResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self {
            reply: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transport for RecordingTransport {
    async fn post_multipart(
        &self,
        url: &str,
        api_key: &str,
        request: &GenerationRequest<'_>,
    ) -> Result<TransportResponse, GenerationError> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            api_key: api_key.to_string(),
            filename: request.init_image.filename.clone(),
            mime_type: request.init_image.mime_type.clone(),
            image_len: request.init_image.bytes.len(),
            fields: request.text_fields(),
        });
        self.reply.clone()
    }
}
