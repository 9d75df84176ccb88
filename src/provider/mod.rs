pub mod imaging;
pub mod registry;

use std::sync::Arc;

use crate::effect::EffectParameter;
use crate::pipeline::PipelineNode;

pub use imaging::{ImagingExecutor, ImagingProvider, ProviderSetting};
pub use registry::{AmbiguousRegistration, ProviderRegistry};

/// Pluggable capability that recognizes and executes a subset of effects.
pub trait EffectProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Total over every parameter variant; answers `false` for anything the
    /// provider does not understand.
    fn can_process(&self, parameter: &EffectParameter) -> bool;

    /// Builds a node for `parameter` linked to `predecessor`.
    ///
    /// Only valid after [`EffectProvider::can_process`] returned `true` for the
    /// same parameter.
    fn create_node(
        &self,
        predecessor: Option<Arc<PipelineNode>>,
        parameter: EffectParameter,
    ) -> Arc<PipelineNode>;
}
