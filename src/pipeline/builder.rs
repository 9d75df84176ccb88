use std::ops::Add;
use std::sync::Arc;

use super::executable::Pipeline;
use super::node::PipelineNode;
use crate::effect::{EffectParameter, GrayscaleMode};
use crate::error::PipelineError;
use crate::provider::ProviderRegistry;

/// Immutable fluent front end.
///
/// Every `append` returns a new builder wrapping a new terminal node; the
/// receiver is left untouched, so a prefix can be branched several ways.
/// Nothing is executed while building.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    registry: Arc<ProviderRegistry>,
    terminal: Option<Arc<PipelineNode>>,
}

impl PipelineBuilder {
    pub(crate) fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            terminal: None,
        }
    }

    /// Validates `parameter`, resolves its provider and chains a new node.
    ///
    /// Fails fast with [`PipelineError::InvalidParameter`] or
    /// [`PipelineError::UnsupportedEffect`].
    pub fn append(&self, parameter: EffectParameter) -> Result<Self, PipelineError> {
        parameter.validate()?;
        let node = self.registry.resolve(self.terminal.clone(), parameter)?;
        Ok(Self {
            registry: Arc::clone(&self.registry),
            terminal: Some(node),
        })
    }

    pub fn grayscale(&self) -> Result<Self, PipelineError> {
        self.append(EffectParameter::Grayscale)
    }

    pub fn grayscale_with_mode(&self, mode: GrayscaleMode) -> Result<Self, PipelineError> {
        self.append(EffectParameter::grayscale_with_mode(mode))
    }

    pub fn resize(&self, width: u32, height: u32) -> Result<Self, PipelineError> {
        self.append(EffectParameter::resize(width, height))
    }

    pub fn build(&self) -> Pipeline {
        Pipeline::from_terminal(self.terminal.clone())
    }

    pub fn len(&self) -> usize {
        self.terminal.as_ref().map_or(0, |node| node.len())
    }

    pub fn is_empty(&self) -> bool {
        self.terminal.is_none()
    }
}

impl Add<EffectParameter> for PipelineBuilder {
    type Output = Result<PipelineBuilder, PipelineError>;

    fn add(self, parameter: EffectParameter) -> Self::Output {
        self.append(parameter)
    }
}

impl Add<EffectParameter> for &PipelineBuilder {
    type Output = Result<PipelineBuilder, PipelineError>;

    fn add(self, parameter: EffectParameter) -> Self::Output {
        self.append(parameter)
    }
}

// Lets `builder + a + b` chain; the first error short-circuits.
impl Add<EffectParameter> for Result<PipelineBuilder, PipelineError> {
    type Output = Result<PipelineBuilder, PipelineError>;

    fn add(self, parameter: EffectParameter) -> Self::Output {
        self.and_then(|builder| builder.append(parameter))
    }
}
