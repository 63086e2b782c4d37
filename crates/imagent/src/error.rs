// Error types for imagent

use thiserror::Error;

/// Result type for imagent operations
pub type Result<T> = std::result::Result<T, ImagentError>;

/// Errors that can occur while compositing
#[derive(Error, Debug)]
pub enum ImagentError {
    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Image encode error: {0}")]
    Encode(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for ImagentError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => ImagentError::Io(io),
            image::ImageError::Decoding(_) | image::ImageError::Unsupported(_) => {
                ImagentError::Decode(err.to_string())
            }
            other => ImagentError::Encode(other.to_string()),
        }
    }
}
