// Error types for the model boundary

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout(err.to_string())
        } else if err.is_decode() {
            ModelError::Parse(err.to_string())
        } else {
            ModelError::Network(err.to_string())
        }
    }
}
