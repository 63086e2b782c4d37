// Pipeline experts - one per LLM-backed stage

mod creative_synthesizer;
mod idea_evaluator;
mod idea_generator;
mod image_generator;

pub use creative_synthesizer::{
    default_ad_copy, default_text_layers, renderable_layers, truncate_chars, CreativeSynthesizer,
    CTA_MAX_CHARS, HEADLINE_MAX_CHARS,
};
pub use idea_evaluator::{select_top_ideas, IdeaEvaluator, MIN_SELECTION};
pub use idea_generator::{default_ideas, IdeaGenerator, IDEA_BATCH_SIZE};
pub use image_generator::{extension_for_mime, ImageGenerator, ImageRequest, UPLOADS_PREFIX};

use gemini::ModelError;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ExpertError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Strip a leading markdown code fence (```json or ```) if present
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let inner = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    let inner = inner.trim_start();
    let inner = inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("JSON"))
        .unwrap_or(inner);
    inner.trim()
}

/// Parse model output as JSON after removing any code fence
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T, ExpertError> {
    serde_json::from_str(strip_code_fence(text))
        .map_err(|e| ExpertError::Parse(format!("Failed to parse model output: {}", e)))
}

/// Eight hex characters for generated file names
pub(crate) fn short_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use gemini::{GenerateContentResponse, ImageModel, ModalityHint, ModelError, TextModel};
    use std::sync::Mutex;

    /// Replies with the first scripted answer whose marker appears in the prompt
    pub struct ScriptedText {
        replies: Vec<(&'static str, Result<String, ()>)>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedText {
        pub fn new() -> Self {
            Self {
                replies: Vec::new(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn reply(mut self, marker: &'static str, text: impl Into<String>) -> Self {
            self.replies.push((marker, Ok(text.into())));
            self
        }

        pub fn fail(mut self, marker: &'static str) -> Self {
            self.replies.push((marker, Err(())));
            self
        }
    }

    #[async_trait]
    impl TextModel for ScriptedText {
        async fn complete_text(&self, prompt: &str) -> Result<String, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            for (marker, reply) in &self.replies {
                if prompt.contains(marker) {
                    return reply
                        .clone()
                        .map_err(|_| ModelError::Network("scripted failure".to_string()));
                }
            }
            Err(ModelError::EmptyResponse)
        }

        fn text_model_name(&self) -> &str {
            "scripted-text"
        }
    }

    /// Fails for the listed hints, otherwise returns `response`
    pub struct ScriptedImage {
        pub response: serde_json::Value,
        pub failing: Vec<ModalityHint>,
        pub attempts: Mutex<Vec<ModalityHint>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedImage {
        pub fn new(response: serde_json::Value) -> Self {
            Self {
                response,
                failing: Vec::new(),
                attempts: Mutex::new(Vec::new()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(mut self, hints: &[ModalityHint]) -> Self {
            self.failing = hints.to_vec();
            self
        }
    }

    #[async_trait]
    impl ImageModel for ScriptedImage {
        async fn complete_image(
            &self,
            prompt: &str,
            hint: ModalityHint,
        ) -> Result<GenerateContentResponse, ModelError> {
            self.attempts.lock().unwrap().push(hint);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.failing.contains(&hint) {
                return Err(ModelError::Api {
                    status: 400,
                    body: format!("{} not supported", hint.as_str()),
                });
            }
            serde_json::from_value(self.response.clone())
                .map_err(|e| ModelError::Parse(e.to_string()))
        }

        fn image_model_name(&self) -> &str {
            "scripted-image"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("  ```\n{\"a\": 1}\n```  "), "{\"a\": 1}");
        assert_eq!(strip_code_fence("[1]"), "[1]");
        assert_eq!(strip_code_fence("```json\n[1]"), "[1]");
    }

    #[test]
    fn test_parse_model_json() {
        let values: Vec<u32> = parse_model_json("```json\n[1, 2, 3]\n```").unwrap();
        assert_eq!(values, vec![1, 2, 3]);

        let err = parse_model_json::<Vec<u32>>("Sure! Here are your ideas").unwrap_err();
        assert!(matches!(err, ExpertError::Parse(_)));
    }

    #[test]
    fn test_short_id() {
        let id = short_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
