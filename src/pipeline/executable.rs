use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use super::driver;
use super::node::PipelineNode;
use crate::effect::EffectParameter;
use crate::error::PipelineError;

/// The built, executable artifact.
///
/// Wraps the terminal node of a chain, or nothing for a pipeline without
/// effects, which copies input to output unchanged. Cloning is cheap and
/// clones may be executed concurrently against distinct streams.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    terminal: Option<Arc<PipelineNode>>,
}

impl Pipeline {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_terminal(terminal: Option<Arc<PipelineNode>>) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> Option<&Arc<PipelineNode>> {
        self.terminal.as_ref()
    }

    pub fn len(&self) -> usize {
        self.terminal.as_ref().map_or(0, |node| node.len())
    }

    pub fn is_empty(&self) -> bool {
        self.terminal.is_none()
    }

    /// Effects in execution order.
    pub fn parameters(&self) -> Vec<EffectParameter> {
        self.chain().iter().map(|node| *node.parameter()).collect()
    }

    fn chain(&self) -> Vec<&PipelineNode> {
        self.terminal
            .as_deref()
            .map(PipelineNode::chain)
            .unwrap_or_default()
    }

    pub async fn execute<R, W>(&self, input: &mut R, output: &mut W) -> Result<(), PipelineError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        driver::execute_chain(&self.chain(), input, output, None).await
    }

    /// Like [`Pipeline::execute`], but stops before the next materialization
    /// once `cancel` fires. Runs already flushed are not rolled back.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_pipeline_is_identity() {
        let pipeline = Pipeline::empty();
        let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

        let mut input: &[u8] = &payload;
        let mut output = Vec::new();
        pipeline.execute(&mut input, &mut output).await.unwrap();

        assert_eq!(output, payload);
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.len(), 0);
        assert!(pipeline.parameters().is_empty());
    }

    #[tokio::test]
    async fn cancelled_empty_pipeline_copies_nothing() {
        let token = CancellationToken::new();
        token.cancel();

        let mut input: &[u8] = b"bytes";
        let mut output = Vec::new();
        let result = Pipeline::empty()
            .execute_with_cancellation(&mut input, &mut output, &token)
            .await;

        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert!(output.is_empty());
    }
}
