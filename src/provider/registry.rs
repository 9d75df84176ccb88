use std::fmt;
use std::sync::Arc;

use super::EffectProvider;
use crate::effect::EffectParameter;
use crate::error::PipelineError;
use crate::pipeline::PipelineNode;

/// Ordered provider set; resolution is first match in registration order.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn EffectProvider>>,
}

/// A parameter claimed by more than one registered provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousRegistration {
    pub parameter: EffectParameter,
    /// Claiming providers in registration order; the first one wins.
    pub providers: Vec<&'static str>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Arc<dyn EffectProvider>>) -> Self {
        Self { providers }
    }

    pub fn with_provider(mut self, provider: Arc<dyn EffectProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn find(&self, parameter: &EffectParameter) -> Option<&Arc<dyn EffectProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.can_process(parameter))
    }

    /// Creates the node for `parameter` from the first provider that claims it.
    pub fn resolve(
        &self,
        predecessor: Option<Arc<PipelineNode>>,
        parameter: EffectParameter,
    ) -> Result<Arc<PipelineNode>, PipelineError> {
        let provider = self
            .find(&parameter)
            .ok_or(PipelineError::UnsupportedEffect(parameter))?;
        tracing::debug!(
            "Resolved {} to provider {}",
            parameter.name(),
            provider.name()
        );
        Ok(provider.create_node(predecessor, parameter))
    }

    /// Registration lint: representative parameters of every variant that
    /// more than one provider claims.
    pub fn ambiguities(&self) -> Vec<AmbiguousRegistration> {
        EffectParameter::representatives()
            .into_iter()
            .filter_map(|parameter| {
                let providers: Vec<&'static str> = self
                    .providers
                    .iter()
                    .filter(|provider| provider.can_process(&parameter))
                    .map(|provider| provider.name())
                    .collect();
                (providers.len() > 1).then_some(AmbiguousRegistration {
                    parameter,
                    providers,
                })
            })
            .collect()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|provider| provider.name()))
            .finish()
    }
}
