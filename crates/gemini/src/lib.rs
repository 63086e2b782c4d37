//! Gemini model boundary
//!
//! The pipeline only ever talks to generative models through the two
//! capabilities defined here. `GeminiClient` implements both against the
//! `generateContent` REST endpoint; tests inject their own implementations.

pub mod client;
pub mod error;
pub mod types;

pub use client::{GeminiClient, GeminiConfig};
pub use error::ModelError;
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, InlineData, InlinePayload,
    Part,
};

use async_trait::async_trait;

/// Text completion: prompt in, raw model text out
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn complete_text(&self, prompt: &str) -> Result<String, ModelError>;

    fn text_model_name(&self) -> &str;
}

/// Image completion: prompt in, structured response with inline payloads out
#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn complete_image(
        &self,
        prompt: &str,
        hint: ModalityHint,
    ) -> Result<GenerateContentResponse, ModelError>;

    fn image_model_name(&self) -> &str;
}

/// How the image-output constraint is expressed on the request.
///
/// Deployments disagree on which request shape they accept, so callers try
/// these in `ATTEMPT_ORDER` until one succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalityHint {
    /// `generationConfig.responseModalities = ["IMAGE"]`
    GenerationConfig,
    /// `generation_config.response_modalities = ["TEXT", "IMAGE"]`
    AlternateParameter,
    /// No generation config; the model's default modality
    Unconstrained,
}

impl ModalityHint {
    pub const ATTEMPT_ORDER: [ModalityHint; 3] = [
        ModalityHint::GenerationConfig,
        ModalityHint::AlternateParameter,
        ModalityHint::Unconstrained,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModalityHint::GenerationConfig => "generation_config",
            ModalityHint::AlternateParameter => "alternate_parameter",
            ModalityHint::Unconstrained => "unconstrained",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_order_starts_with_primary_config() {
        assert_eq!(ModalityHint::ATTEMPT_ORDER[0], ModalityHint::GenerationConfig);
        assert_eq!(ModalityHint::ATTEMPT_ORDER[2], ModalityHint::Unconstrained);
    }
}
