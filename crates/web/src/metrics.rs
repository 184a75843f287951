use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_runs: AtomicUsize,
    completed_runs: AtomicUsize,
    rejected_runs: AtomicUsize,
    warnings: AtomicUsize,

    // Timing (in microseconds)
    total_pipeline_time_us: AtomicU64,

    // Counts
    total_extractions: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_runs: AtomicUsize::new(0),
            completed_runs: AtomicUsize::new(0),
            rejected_runs: AtomicUsize::new(0),
            warnings: AtomicUsize::new(0),
            total_pipeline_time_us: AtomicU64::new(0),
            total_extractions: AtomicUsize::new(0),
        })
    }

    /// Submission refused before any provider call (credentials, provider)
    pub fn record_rejected(&self) {
        self.total_runs.fetch_add(1, Ordering::Relaxed);
        self.rejected_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self, duration: Duration, extractions: usize, warnings: usize) {
        self.total_runs.fetch_add(1, Ordering::Relaxed);
        self.completed_runs.fetch_add(1, Ordering::Relaxed);
        self.total_pipeline_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_extractions.fetch_add(extractions, Ordering::Relaxed);
        self.warnings.fetch_add(warnings, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let completed = self.completed_runs.load(Ordering::Relaxed);
        let total_us = self.total_pipeline_time_us.load(Ordering::Relaxed) as f64;

        MetricsSnapshot {
            total_runs: self.total_runs.load(Ordering::Relaxed),
            completed_runs: completed,
            rejected_runs: self.rejected_runs.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            total_extractions: self.total_extractions.load(Ordering::Relaxed),
            avg_pipeline_time_ms: if completed > 0 {
                total_us / completed as f64 / 1000.0 // Convert to ms
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_runs: usize,
    pub completed_runs: usize,
    pub rejected_runs: usize,
    pub warnings: usize,
    pub total_extractions: usize,
    pub avg_pipeline_time_ms: f64,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_averages() {
        let metrics = Metrics::new();
        metrics.record_rejected();
        metrics.record_completed(Duration::from_millis(10), 3, 1);
        metrics.record_completed(Duration::from_millis(30), 2, 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_runs, 3);
        assert_eq!(snapshot.completed_runs, 2);
        assert_eq!(snapshot.rejected_runs, 1);
        assert_eq!(snapshot.total_extractions, 5);
        assert_eq!(snapshot.warnings, 1);
        assert!((snapshot.avg_pipeline_time_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Metrics::new().snapshot();
        assert_eq!(snapshot.total_runs, 0);
        assert_eq!(snapshot.avg_pipeline_time_ms, 0.0);
    }
}
