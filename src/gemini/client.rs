use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::dto::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, OutPart};
use super::{ClientError, GenerationClient, GenerationRequest};
use crate::config::GeminiConfig;

#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            http: builder.build()?,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<Option<String>, ClientError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![OutPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: request.response_mime_type,
                response_schema: &request.response_schema,
                temperature: request.temperature,
            },
        };

        let resp = self
            .http
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        let text = parsed.text();
        debug!(model = %request.model, chars = text.as_ref().map_or(0, |t| t.len()), "gemini responded");
        Ok(text)
    }
}
