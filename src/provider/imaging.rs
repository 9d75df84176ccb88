use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::EffectProvider;
use crate::effect::{EffectKind, EffectParameter};
use crate::error::PipelineError;
use crate::imaging::{ImageEngine, RasterEngine};
use crate::metrics::{MetricReporter, NoopMetrics};
use crate::pipeline::{ExecutionContext, PipelineNode, RunExecutor};
use crate::setting::SettingStore;

const PROVIDER_NAME: &str = "imaging";

/// Setting for the imaging provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProviderSetting {
    /// Merge adjacent imaging steps into one decode/encode cycle.
    #[serde(default = "default_optimized")]
    pub optimized: bool,
}

fn default_optimized() -> bool {
    true
}

impl ProviderSetting {
    pub const KEY: &'static str = "providers.imaging";

    pub fn new(optimized: bool) -> Self {
        Self { optimized }
    }
}

impl Default for ProviderSetting {
    fn default() -> Self {
        Self {
            optimized: default_optimized(),
        }
    }
}

/// Provider executing effects through an [`ImageEngine`].
pub struct ImagingProvider {
    executor: Arc<ImagingExecutor>,
    metrics: Arc<dyn MetricReporter>,
}

impl ImagingProvider {
    pub fn new(
        engine: Arc<dyn ImageEngine>,
        metrics: Arc<dyn MetricReporter>,
        setting: ProviderSetting,
    ) -> Self {
        Self {
            executor: Arc::new(ImagingExecutor {
                engine,
                optimized: setting.optimized,
                capabilities: EffectKind::ALL.to_vec(),
            }),
            metrics,
        }
    }

    /// Raster engine, no metrics, optimized.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(RasterEngine::new()),
            Arc::new(NoopMetrics),
            ProviderSetting::default(),
        )
    }

    /// Reads [`ProviderSetting::KEY`] once; a missing store or key means
    /// optimized.
    pub async fn from_settings(
        engine: Arc<dyn ImageEngine>,
        metrics: Arc<dyn MetricReporter>,
        store: Option<&dyn SettingStore>,
    ) -> Result<Self, PipelineError> {
        let setting = match store {
            Some(store) => store
                .get::<ProviderSetting>(ProviderSetting::KEY)
                .await?
                .unwrap_or_default(),
            None => ProviderSetting::default(),
        };
        debug!("Imaging provider optimized={}", setting.optimized);
        Ok(Self::new(engine, metrics, setting))
    }

    /// Restricts the effects this provider claims.
    pub fn with_capabilities(self, capabilities: &[EffectKind]) -> Self {
        let executor = ImagingExecutor {
            engine: Arc::clone(&self.executor.engine),
            optimized: self.executor.optimized,
            capabilities: capabilities.to_vec(),
        };
        Self {
            executor: Arc::new(executor),
            metrics: self.metrics,
        }
    }

    pub fn is_optimized(&self) -> bool {
        self.executor.optimized
    }
}

impl EffectProvider for ImagingProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn can_process(&self, parameter: &EffectParameter) -> bool {
        self.executor.supports(parameter)
    }

    fn create_node(
        &self,
        predecessor: Option<Arc<PipelineNode>>,
        parameter: EffectParameter,
    ) -> Arc<PipelineNode> {
        debug_assert!(
            self.can_process(&parameter),
            "create_node called with unsupported {parameter:?}"
        );
        let executor: Arc<dyn RunExecutor> = self.executor.clone();
        Arc::new(PipelineNode::new(
            parameter,
            predecessor,
            executor,
            Arc::clone(&self.metrics),
        ))
    }
}

/// Shared by every node one [`ImagingProvider`] creates.
pub struct ImagingExecutor {
    engine: Arc<dyn ImageEngine>,
    optimized: bool,
    capabilities: Vec<EffectKind>,
}

impl ImagingExecutor {
    fn supports(&self, parameter: &EffectParameter) -> bool {
        self.capabilities.contains(&parameter.kind())
    }
}

#[async_trait]
impl RunExecutor for ImagingExecutor {
    fn provider(&self) -> &'static str {
        PROVIDER_NAME
    }

    // Merges only with nodes of the same provider instance.
    fn merges_into(&self, _current: &PipelineNode, next: &PipelineNode) -> bool {
        self.optimized
            && next
                .executor()
                .as_any()
                .downcast_ref::<ImagingExecutor>()
                .is_some_and(|other| std::ptr::eq(self, other))
    }

    async fn execute_run(
        &self,
        context: &ExecutionContext,
        input: &mut (dyn AsyncRead + Unpin + Send),
        output: &mut (dyn AsyncWrite + Unpin + Send),
        run: &[&PipelineNode],
    ) -> Result<(), PipelineError> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes).await?;

        let mut image = self.engine.decode(&bytes)?;
        drop(bytes);
        debug!(
            "Decoded {:?} image {:?} ({} frames) with {}",
            image.format,
            image.dimensions(),
            image.frame_count(),
            self.engine.name()
        );

        for node in run {
            let parameter = node.parameter();
            if !self.supports(parameter) {
                return Err(PipelineError::NotImplemented {
                    provider: PROVIDER_NAME,
                    parameter: *parameter,
                });
            }
            image = self.engine.apply(image, parameter)?;
        }

        let encoded = self.engine.encode(image)?;
        output.write_all(&encoded).await?;
        output.flush().await?;
        debug!(
            "Run {}/{} wrote {} bytes",
            context.run_index() + 1,
            context.run_count(),
            encoded.len()
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
