//! Metrics collection and registry.

use crate::calculator::CalculatorStats;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of calculator state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Frames in the sequence.
    pub frames: usize,
    /// Boxes extracted.
    pub boxes_computed: u64,
    /// Requests served from the cache.
    pub cache_hits: u64,
    /// Extracted boxes without a foreground object.
    pub empty_boxes: u64,
    /// Completed batch calls.
    pub batches: u64,
    /// Completed batch calls that used a worker pool.
    pub parallel_batches: u64,
    /// Workers used by the most recent batch.
    pub last_batch_workers: usize,
    /// Frames sampled for the background.
    pub background_samples: usize,
}

impl From<&CalculatorStats> for MetricsSnapshot {
    fn from(stats: &CalculatorStats) -> Self {
        Self {
            frames: stats.frames,
            boxes_computed: stats.boxes_computed,
            cache_hits: stats.cache_hits,
            empty_boxes: stats.empty_boxes,
            batches: stats.batches,
            parallel_batches: stats.parallel_batches,
            last_batch_workers: stats.last_batch_workers,
            background_samples: stats.background_samples,
        }
    }
}

/// Prometheus metrics registry for box extraction.
pub struct MetricsRegistry {
    registry: Registry,

    frames: IntGauge,
    boxes_computed_total: IntCounter,
    cache_hits_total: IntCounter,
    empty_boxes_total: IntCounter,

    batches_total: IntCounter,
    parallel_batches_total: IntCounter,
    last_batch_workers: IntGauge,

    background_samples: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all extraction metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames = IntGauge::new("bgsub_frames", "Frames in the analysed sequence")?;
        let boxes_computed_total = IntCounter::new(
            "bgsub_boxes_computed_total",
            "Bounding boxes extracted from frames",
        )?;
        let cache_hits_total = IntCounter::new(
            "bgsub_cache_hits_total",
            "Box requests answered from the cache",
        )?;
        let empty_boxes_total = IntCounter::new(
            "bgsub_empty_boxes_total",
            "Extracted frames without a foreground object",
        )?;

        let batches_total = IntCounter::new("bgsub_batches_total", "Completed batch calls")?;
        let parallel_batches_total = IntCounter::new(
            "bgsub_parallel_batches_total",
            "Completed batch calls that ran on a worker pool",
        )?;
        let last_batch_workers = IntGauge::new(
            "bgsub_last_batch_workers",
            "Workers used by the most recent batch (0 = sequential)",
        )?;

        let background_samples = IntGauge::new(
            "bgsub_background_samples",
            "Frames sampled for the background median",
        )?;

        registry.register(Box::new(frames.clone()))?;
        registry.register(Box::new(boxes_computed_total.clone()))?;
        registry.register(Box::new(cache_hits_total.clone()))?;
        registry.register(Box::new(empty_boxes_total.clone()))?;
        registry.register(Box::new(batches_total.clone()))?;
        registry.register(Box::new(parallel_batches_total.clone()))?;
        registry.register(Box::new(last_batch_workers.clone()))?;
        registry.register(Box::new(background_samples.clone()))?;

        Ok(Self {
            registry,
            frames,
            boxes_computed_total,
            cache_hits_total,
            empty_boxes_total,
            batches_total,
            parallel_batches_total,
            last_batch_workers,
            background_samples,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.frames.set(snapshot.frames as i64);
        self.last_batch_workers.set(snapshot.last_batch_workers as i64);
        self.background_samples.set(snapshot.background_samples as i64);

        // Counters only move forward by the difference
        advance(&self.boxes_computed_total, snapshot.boxes_computed);
        advance(&self.cache_hits_total, snapshot.cache_hits);
        advance(&self.empty_boxes_total, snapshot.empty_boxes);
        advance(&self.batches_total, snapshot.batches);
        advance(&self.parallel_batches_total, snapshot.parallel_batches);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}
