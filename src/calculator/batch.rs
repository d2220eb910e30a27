//! Batch scheduling: worker-count heuristic and the parallel fan-out.
//!
//! Workers only read: they share the frame reader and the background by
//! reference and return boxes in input order. The owning calculator
//! merges a batch into its cache after every chunk has finished, so an
//! aborted batch leaves no trace in the cache.

use super::BoxError;
use crate::background::BackgroundModel;
use crate::extraction::{BoundingBox, BoxExtractor};
use crate::frames::FrameReader;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Frame indices per chunk when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Cooperative cancellation flag for batch runs.
///
/// Clones share one flag. Workers check it before each frame and the
/// batch fails with [`BoxError::Cancelled`] once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every batch holding a clone.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options for one batch computation.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Requested worker count; `None` derives it from the workload.
    pub num_workers: Option<usize>,
    /// Frame indices per unit of work.
    pub chunk_size: usize,
    /// Optional cancellation flag.
    pub cancel: Option<CancellationToken>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            num_workers: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancel: None,
        }
    }
}

impl BatchOptions {
    /// Sets the requested worker count.
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = Some(num_workers);
        self
    }

    /// Sets the number of indices per chunk.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Attaches a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Logical CPUs available to the process.
pub fn available_parallelism() -> usize {
    num_cpus::get()
}

/// Decides how many workers a batch of `num_tasks` frames gets.
///
/// Without a request the count is `min(available / 2, tasks / (2 * chunk))`
/// rounded half to even. Either way it never exceeds the number of full
/// chunks, and a count of one or less means "run sequentially" (`0`).
pub fn resolve_worker_count(
    num_tasks: usize,
    chunk_size: usize,
    requested: Option<usize>,
    available: usize,
) -> usize {
    if chunk_size == 0 {
        return 0;
    }

    let workers = requested.unwrap_or_else(|| {
        let by_cpu = available as f64 / 2.0;
        let by_load = num_tasks as f64 / (2 * chunk_size) as f64;
        by_cpu.min(by_load).round_ties_even() as usize
    });

    // no point having workers without full chunks of work
    let workers = workers.min(num_tasks / chunk_size);

    if workers <= 1 {
        0
    } else {
        workers
    }
}

fn ensure_running(cancel: Option<&CancellationToken>) -> Result<(), BoxError> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(BoxError::Cancelled),
        _ => Ok(()),
    }
}

/// Reads one frame and extracts its box.
pub(super) fn compute_box<R: FrameReader + ?Sized>(
    reader: &R,
    background: &BackgroundModel,
    extractor: &BoxExtractor,
    index: usize,
) -> Result<BoundingBox, BoxError> {
    let frame = reader.frame_at(index)?;
    Ok(extractor.extract(&frame, background.image())?)
}

/// Computes boxes for `indices` one after another on the calling thread.
pub(super) fn run_sequential<R: FrameReader + ?Sized>(
    reader: &R,
    background: &BackgroundModel,
    extractor: &BoxExtractor,
    indices: &[usize],
    cancel: Option<&CancellationToken>,
) -> Result<Vec<BoundingBox>, BoxError> {
    indices
        .iter()
        .map(|&index| {
            ensure_running(cancel)?;
            compute_box(reader, background, extractor, index)
        })
        .collect()
}

/// Computes boxes for `indices` on a dedicated pool of `workers` threads,
/// `chunk_size` indices at a time. Output order matches `indices`.
pub(super) fn run_parallel<R: FrameReader + ?Sized>(
    reader: &R,
    background: &BackgroundModel,
    extractor: &BoxExtractor,
    indices: &[usize],
    workers: usize,
    chunk_size: usize,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<BoundingBox>, BoxError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("bgsub-worker-{i}"))
        .build()?;

    let chunks: Vec<Vec<BoundingBox>> = pool.install(|| {
        indices
            .par_chunks(chunk_size)
            .map(|chunk| {
                tracing::debug!(
                    first = chunk.first().copied(),
                    len = chunk.len(),
                    "Processing chunk"
                );
                run_sequential(reader, background, extractor, chunk, cancel)
            })
            .collect::<Result<Vec<_>, BoxError>>()
    })?;

    Ok(chunks.into_iter().flatten().collect())
}
