//! Walks a node chain once and materializes it.
//!
//! Adjacent nodes whose executor agrees to merge forward are grouped into a
//! single run, and each run is decoded, applied and encoded exactly once.
//! Runs are executed strictly front to back. Every run except the last writes
//! into an owned buffer that becomes the input of the following run.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, Instrument};

use super::context::ExecutionContext;
use super::node::PipelineNode;
use crate::error::PipelineError;

/// Splits `chain` into maximal mergeable runs, preserving order.
///
/// The merge predicate is asked exactly once per adjacent pair.
pub(crate) fn plan_runs<'a>(chain: &[&'a PipelineNode]) -> Vec<Vec<&'a PipelineNode>> {
    let mut runs = Vec::new();
    let mut pending = Vec::new();

    for (index, node) in chain.iter().enumerate() {
        pending.push(*node);
        if let Some(next) = chain.get(index + 1) {
            if node.merges_into(next) {
                continue;
            }
        }
        runs.push(std::mem::take(&mut pending));
    }

    runs
}

pub(crate) async fn execute_chain(
    chain: &[&PipelineNode],
    input: &mut (dyn AsyncRead + Unpin + Send),
    output: &mut (dyn AsyncWrite + Unpin + Send),
    cancel: Option<&CancellationToken>,
) -> Result<(), PipelineError> {
    if chain.is_empty() {
        return passthrough(input, output, cancel).await;
    }

    let runs = plan_runs(chain);
    let run_count = runs.len();
    debug!(
        "Executing {} effects in {} materializations",
        chain.len(),
        run_count
    );

    let mut carried: Option<Vec<u8>> = None;
    for (run_index, run) in runs.iter().enumerate() {
        ensure_not_cancelled(cancel)?;

        let context = ExecutionContext::new(run_index, run_count);
        let mut buffer = Vec::new();
        {
            let mut carried_reader: &[u8] = carried.as_deref().unwrap_or_default();
            let source: &mut (dyn AsyncRead + Unpin + Send) = if carried.is_some() {
                &mut carried_reader
            } else {
                &mut *input
            };
            let sink: &mut (dyn AsyncWrite + Unpin + Send) = if context.is_final_run() {
                &mut *output
            } else {
                &mut buffer
            };

            materialize(&context, run, source, sink).await?;
        }

        carried = if context.is_final_run() {
            None
        } else {
            Some(buffer)
        };
    }

    Ok(())
}

async fn materialize(
    context: &ExecutionContext,
    run: &[&PipelineNode],
    input: &mut (dyn AsyncRead + Unpin + Send),
    output: &mut (dyn AsyncWrite + Unpin + Send),
) -> Result<(), PipelineError> {
    // The last node of a run owns its materialization.
    let Some(terminal) = run.last() else {
        return Ok(());
    };

    let span = info_span!(
        "materialize",
        correlation_id = %context.correlation_id(),
        provider = terminal.provider(),
        run = context.run_index(),
        effects = run.len(),
    );

    async move {
        debug!("Start");
        let metrics = terminal.metrics();
        metrics.hit();

        let result = {
            let _scope = metrics.start_scope();
            terminal
                .executor()
                .execute_run(context, input, output, run)
                .await
        };

        match &result {
            Ok(()) => debug!("Completed in {}us", context.elapsed().as_micros()),
            Err(e) => error!(error = ?e, "Materialization failed: {}", e),
        }
        result
    }
    .instrument(span)
    .await
}

async fn passthrough(
    input: &mut (dyn AsyncRead + Unpin + Send),
    output: &mut (dyn AsyncWrite + Unpin + Send),
    cancel: Option<&CancellationToken>,
) -> Result<(), PipelineError> {
    ensure_not_cancelled(cancel)?;
    let copied = tokio::io::copy(input, output).await?;
    output.flush().await?;
    debug!("Empty pipeline copied {} bytes", copied);
    Ok(())
}

fn ensure_not_cancelled(cancel: Option<&CancellationToken>) -> Result<(), PipelineError> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(PipelineError::Cancelled),
        _ => Ok(()),
    }
}
