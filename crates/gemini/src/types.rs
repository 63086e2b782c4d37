//! `generateContent` wire types
//!
//! The response side accepts both the REST (camelCase) and SDK (snake_case)
//! spellings of the inline payload fields, so callers deal with one schema.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::ModalityHint;

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,

    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,

    #[serde(rename = "generation_config", skip_serializing_if = "Option::is_none")]
    pub legacy_generation_config: Option<LegacyGenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestContent {
    pub role: String,
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestPart {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    pub response_modalities: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyGenerationConfig {
    pub response_modalities: Vec<String>,
}

impl GenerateContentRequest {
    /// Plain single-turn text prompt
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user".to_string(),
                parts: vec![RequestPart {
                    text: prompt.into(),
                }],
            }],
            generation_config: None,
            legacy_generation_config: None,
        }
    }

    /// Attach the image-output constraint in the shape selected by `hint`
    pub fn with_modality(mut self, hint: ModalityHint) -> Self {
        match hint {
            ModalityHint::GenerationConfig => {
                self.generation_config = Some(GenerationConfig {
                    response_modalities: vec!["IMAGE".to_string()],
                });
            }
            ModalityHint::AlternateParameter => {
                self.legacy_generation_config = Some(LegacyGenerationConfig {
                    response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
                });
            }
            ModalityHint::Unconstrained => {}
        }
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default, rename = "inlineData", alias = "inline_data")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InlineData {
    #[serde(default, rename = "mimeType", alias = "mime_type")]
    pub mime_type: Option<String>,

    #[serde(default)]
    pub data: InlinePayload,
}

impl InlineData {
    /// Declared MIME type, `image/png` when absent or blank
    pub fn mime_type(&self) -> &str {
        match self.mime_type.as_deref() {
            Some(mime) if !mime.trim().is_empty() => mime,
            _ => "image/png",
        }
    }
}

/// Inline binary payload: either already raw bytes or base64 text
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum InlinePayload {
    Raw(Vec<u8>),
    Encoded(String),
}

impl Default for InlinePayload {
    fn default() -> Self {
        InlinePayload::Raw(Vec::new())
    }
}

impl InlinePayload {
    /// Raw bytes, decoding base64 only when the payload arrived as text
    pub fn into_bytes(self) -> Result<Vec<u8>, base64::DecodeError> {
        match self {
            InlinePayload::Raw(bytes) => Ok(bytes),
            InlinePayload::Encoded(text) => STANDARD.decode(text.trim()),
        }
    }
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.trim().is_empty() { None } else { Some(text) }
    }
}
