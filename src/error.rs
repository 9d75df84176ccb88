use thiserror::Error;

use crate::effect::EffectParameter;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Pipeline Error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Configuration Error: {0}")]
    Configuration(#[from] config::ConfigError),
    #[error("Failed to open {1}: {0}")]
    File(std::io::Error, String),
}

// Pipeline Error Type
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No registered provider supports effect {0:?}")]
    UnsupportedEffect(EffectParameter),
    #[error("Invalid effect {parameter:?}: {reason}")]
    InvalidParameter {
        parameter: EffectParameter,
        reason: String,
    },
    #[error("Provider '{provider}' does not implement effect {parameter:?}")]
    NotImplemented {
        provider: &'static str,
        parameter: EffectParameter,
    },
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("Cannot encode {frames} frames as {format:?}")]
    AnimationUnsupported {
        format: image::ImageFormat,
        frames: usize,
    },
    #[error("Stream error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read setting: {0}")]
    Setting(#[from] config::ConfigError),
    #[error("Pipeline execution was cancelled.")]
    Cancelled,
}
