mod client;
mod dto;

pub use client::GeminiClient;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

pub const RESPONSE_MIME_JSON: &str = "application/json";

/// One outbound attempt against a single candidate model.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub response_schema: Value,
    pub temperature: f32,
    pub response_mime_type: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Gemini API error ({status}): {body}")]
    Status { status: StatusCode, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unreadable response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

/// Text-generation backend. `Ok(None)` means the model answered without text.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<Option<String>, ClientError>;
}
