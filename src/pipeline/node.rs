use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use super::context::ExecutionContext;
use super::driver;
use crate::effect::EffectParameter;
use crate::error::PipelineError;
use crate::metrics::MetricReporter;

/// Provider-specific behavior attached to every node a provider creates.
#[async_trait]
pub trait RunExecutor: Send + Sync + 'static {
    /// Name of the provider that owns this executor.
    fn provider(&self) -> &'static str;

    /// Whether the step of `current` (a node backed by this executor) can be
    /// deferred and folded into the materialization of `next`.
    fn merges_into(&self, current: &PipelineNode, next: &PipelineNode) -> bool;

    /// Materializes `run` (oldest first): decode `input` once, apply every
    /// parameter in order, encode once to `output`.
    async fn execute_run(
        &self,
        context: &ExecutionContext,
        input: &mut (dyn AsyncRead + Unpin + Send),
        output: &mut (dyn AsyncWrite + Unpin + Send),
        run: &[&PipelineNode],
    ) -> Result<(), PipelineError>;

    fn as_any(&self) -> &dyn Any;
}

/// One immutable link of a pipeline, pointing back at its predecessor.
///
/// Nodes are shared through `Arc`, so builders branching from the same
/// prefix share the same predecessor nodes.
pub struct PipelineNode {
    parameter: EffectParameter,
    predecessor: Option<Arc<PipelineNode>>,
    executor: Arc<dyn RunExecutor>,
    metrics: Arc<dyn MetricReporter>,
}

impl PipelineNode {
    pub fn new(
        parameter: EffectParameter,
        predecessor: Option<Arc<PipelineNode>>,
        executor: Arc<dyn RunExecutor>,
        metrics: Arc<dyn MetricReporter>,
    ) -> Self {
        Self {
            parameter,
            predecessor,
            executor,
            metrics,
        }
    }

    pub fn parameter(&self) -> &EffectParameter {
        &self.parameter
    }

    pub fn predecessor(&self) -> Option<&Arc<PipelineNode>> {
        self.predecessor.as_ref()
    }

    pub fn executor(&self) -> &Arc<dyn RunExecutor> {
        &self.executor
    }

    pub fn metrics(&self) -> &Arc<dyn MetricReporter> {
        &self.metrics
    }

    pub fn provider(&self) -> &'static str {
        self.executor.provider()
    }

    pub fn merges_into(&self, next: &PipelineNode) -> bool {
        self.executor.merges_into(self, next)
    }

    /// The whole chain ending at this node, oldest first.
    pub fn chain(&self) -> Vec<&PipelineNode> {
        let mut nodes = Vec::new();
        let mut current = Some(self);
        while let Some(node) = current {
            nodes.push(node);
            current = node.predecessor.as_deref();
        }
        nodes.reverse();
        nodes
    }

    pub fn len(&self) -> usize {
        self.chain().len()
    }

    pub async fn execute<R, W>(&self, input: &mut R, output: &mut W) -> Result<(), PipelineError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        driver::execute_chain(&self.chain(), input, output, None).await
    }

    pub async fn execute_with_cancellation<R, W>(
        &self,
        input: &mut R,
        output: &mut W,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        driver::execute_chain(&self.chain(), input, output, Some(cancel)).await
    }
}

impl fmt::Debug for PipelineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineNode")
            .field("parameter", &self.parameter)
            .field("provider", &self.provider())
            .field("predecessor", &self.predecessor.as_ref().map(|p| p.parameter))
            .finish()
    }
}
