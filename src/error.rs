//! Error types for Glimt.

use crate::video::VideoError;
use thiserror::Error;

/// Library-level error type for Glimt operations.
#[derive(Error, Debug)]
pub enum GlimtError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Video error: {0}")]
    Video(#[from] VideoError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JPEG encoding error: {0}")]
    Jpeg(#[from] jpeg_encoder::EncodingError),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Glimt operations.
pub type Result<T> = std::result::Result<T, GlimtError>;
