//! Gemini REST client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{GenerateContentRequest, GenerateContentResponse};
use crate::{ImageModel, ModalityHint, ModelError, TextModel};

/// Connection settings for `GeminiClient`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_text_model() -> String {
    "gemini-flash-latest".to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_timeout_ms() -> u64 {
    120_000
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Gemini API client serving both text and image completions
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ModelError> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::Config(
                "GEMINI_API_KEY is not set; campaign generation needs an API key".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ModelError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            model
        )
    }

    /// Issue one `generateContent` call against `model`
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ModelError> {
        tracing::debug!(model, "Calling generateContent");

        let response = self
            .client
            .post(self.url(model))
            .header("x-goog-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model, status = status.as_u16(), "generateContent failed");
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| ModelError::Parse(format!("Failed to decode response: {}", e)))
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn complete_text(&self, prompt: &str) -> Result<String, ModelError> {
        let request = GenerateContentRequest::text(prompt);
        let response = self
            .generate_content(&self.config.text_model, &request)
            .await?;

        response.text().ok_or(ModelError::EmptyResponse)
    }

    fn text_model_name(&self) -> &str {
        &self.config.text_model
    }
}

#[async_trait]
impl ImageModel for GeminiClient {
    async fn complete_image(
        &self,
        prompt: &str,
        hint: ModalityHint,
    ) -> Result<GenerateContentResponse, ModelError> {
        let request = GenerateContentRequest::text(prompt).with_modality(hint);
        self.generate_content(&self.config.image_model, &request)
            .await
    }

    fn image_model_name(&self) -> &str {
        &self.config.image_model
    }
}
