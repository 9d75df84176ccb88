use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Metrics sink used around every materialization.
pub trait MetricReporter: Send + Sync {
    /// Fire-and-forget counter increment.
    fn hit(&self);

    /// Starts timing a unit of work; the duration is recorded when the
    /// returned scope is dropped.
    fn start_scope(&self) -> MetricScope;
}

/// Drop guard returned by [`MetricReporter::start_scope`].
pub struct MetricScope {
    start: Instant,
    on_close: Option<Box<dyn FnOnce(Duration) + Send>>,
}

impl MetricScope {
    pub fn new<F>(on_close: F) -> Self
    where
        F: FnOnce(Duration) + Send + 'static,
    {
        Self {
            start: Instant::now(),
            on_close: Some(Box::new(on_close)),
        }
    }

    pub fn noop() -> Self {
        Self {
            start: Instant::now(),
            on_close: None,
        }
    }

}

impl Drop for MetricScope {
    fn drop(&mut self) {
        if let Some(on_close) = self.on_close.take() {
            on_close(self.start.elapsed());
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricReporter for NoopMetrics {
    fn hit(&self) {}

    fn start_scope(&self) -> MetricScope {
        MetricScope::noop()
    }
}

/// Performance monitoring reporter
#[derive(Clone, Default)]
pub struct PerformanceMonitor {
    stats: Arc<Mutex<MaterializationStats>>,
}

#[derive(Debug, Clone, Default)]
pub struct MaterializationStats {
    pub hits: usize,
    pub completed_scopes: usize,
    pub average_duration_us: f32,
    pub max_duration_us: u64,
    pub total_duration_us: u64,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_stats(&self) -> MaterializationStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_ewma(current: f32, new_value: u64, alpha: f32) -> f32 {
        current * (1.0 - alpha) + new_value as f32 * alpha
    }

    fn record(stats: &Mutex<MaterializationStats>, duration: Duration) {
        const ALPHA: f32 = 0.1; // EWMA smoothing factor

        let duration_us = duration.as_micros() as u64;
        let mut stats = stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.average_duration_us = if stats.completed_scopes == 0 {
            duration_us as f32
        } else {
            Self::update_ewma(stats.average_duration_us, duration_us, ALPHA)
        };
        stats.completed_scopes += 1;
        stats.max_duration_us = stats.max_duration_us.max(duration_us);
        stats.total_duration_us += duration_us;

        // Flag slow materializations (> 500ms)
        if duration_us > 500_000 {
            tracing::warn!("Slow materialization: {}us", duration_us);
        }
    }
}

impl MetricReporter for PerformanceMonitor {
    fn hit(&self) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.hits += 1;
    }

    fn start_scope(&self) -> MetricScope {
        let stats = Arc::clone(&self.stats);
        MetricScope::new(move |duration| Self::record(&stats, duration))
    }
}
