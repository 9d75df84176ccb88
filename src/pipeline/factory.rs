use std::sync::Arc;

use tracing::{info, warn};

use super::builder::PipelineBuilder;
use crate::effect::EffectParameter;
use crate::error::PipelineError;
use crate::provider::{EffectProvider, ProviderRegistry};

/// Entry point holding the registered providers.
///
/// Every builder it hands out shares the same registry.
#[derive(Debug, Clone)]
pub struct BuilderFactory {
    registry: Arc<ProviderRegistry>,
}

impl BuilderFactory {
    pub fn new(providers: Vec<Arc<dyn EffectProvider>>) -> Self {
        Self::from_registry(ProviderRegistry::new(providers))
    }

    pub fn from_registry(registry: ProviderRegistry) -> Self {
        for ambiguity in registry.ambiguities() {
            warn!(
                "Effect {} is claimed by {:?}; {} wins",
                ambiguity.parameter.name(),
                ambiguity.providers,
                ambiguity.providers[0]
            );
        }
        info!("Builder factory ready with providers {:?}", registry);
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// An empty builder; building it right away yields the identity pipeline.
    pub fn create(&self) -> PipelineBuilder {
        PipelineBuilder::new(Arc::clone(&self.registry))
    }

    pub fn create_with(&self, parameter: EffectParameter) -> Result<PipelineBuilder, PipelineError> {
        self.create().append(parameter)
    }
}
