pub mod config;
pub mod effect;
pub mod error;
pub mod imaging;
pub mod metrics;
pub mod pipeline;
pub mod provider;
pub mod setting;

#[cfg(test)]
mod testing;

pub use effect::{EffectKind, EffectParameter, GrayscaleMode};
pub use error::{AppError, PipelineError};
pub use pipeline::{BuilderFactory, Pipeline, PipelineBuilder, PipelineNode};
pub use provider::{EffectProvider, ImagingProvider, ProviderSetting};
