use std::time::{Duration, Instant};
use uuid::Uuid;

/// Request-scoped context handed to every materialization.
///
/// A fresh context (and correlation id) is created for each run; it is passed
/// explicitly to the run executor and recorded on the materialization span.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    correlation_id: Uuid,
    run_index: usize,
    run_count: usize,
    processing_start: Instant,
}

impl ExecutionContext {
    pub fn new(run_index: usize, run_count: usize) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            run_index,
            run_count,
            processing_start: Instant::now(),
        }
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn run_index(&self) -> usize {
        self.run_index
    }

    pub fn run_count(&self) -> usize {
        self.run_count
    }

    /// True for the run that writes to the caller's output stream.
    pub fn is_final_run(&self) -> bool {
        self.run_index + 1 == self.run_count
    }

    pub fn elapsed(&self) -> Duration {
        self.processing_start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_context_gets_its_own_correlation_id() {
        let first = ExecutionContext::new(0, 2);
        let second = ExecutionContext::new(1, 2);
        assert_ne!(first.correlation_id(), second.correlation_id());
        assert!(!first.is_final_run());
        assert!(second.is_final_run());
    }
}
