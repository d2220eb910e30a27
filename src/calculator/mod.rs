//! Lazy, cached bounding-box computation over a frame sequence.
//!
//! [`BoxCalculator`] owns the background model and the [`BoxCache`].
//! Both are filled on first demand and never invalidated. Batch calls
//! pick sequential or parallel execution with [`resolve_worker_count`].

mod batch;
mod cache;
mod config;

pub use batch::{
    available_parallelism, resolve_worker_count, BatchOptions, CancellationToken,
    DEFAULT_CHUNK_SIZE,
};
pub use cache::{BoxCache, NOT_COMPUTED};
pub use config::{CalculatorConfig, ConfigError, FileConfig, OutputConfig};

use crate::background::{BackgroundError, BackgroundModel};
use crate::extraction::{BoundingBox, BoxExtractor, ExtractionError};
use crate::frames::{FrameError, FrameReader};
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Errors surfaced by [`BoxCalculator`].
#[derive(Debug, Error)]
pub enum BoxError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Background(#[from] BackgroundError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("batch cancelled before completion")]
    Cancelled,
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Counters describing the work a calculator has done.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CalculatorStats {
    /// Frames in the sequence.
    pub frames: usize,
    /// Boxes extracted (each index at most once).
    pub boxes_computed: u64,
    /// Requests answered from the cache.
    pub cache_hits: u64,
    /// Extracted boxes with no foreground object.
    pub empty_boxes: u64,
    /// Batch calls completed.
    pub batches: u64,
    /// Batch calls that ran on a worker pool.
    pub parallel_batches: u64,
    /// Workers used by the most recent batch (0 = sequential).
    pub last_batch_workers: usize,
    /// Frames sampled for the background, once estimated.
    pub background_samples: usize,
}

/// Computes per-frame bounding boxes of the single foreground object.
///
/// # Example
///
/// ```no_run
/// use bgsub_boxes::{BatchOptions, BoxCalculator, CalculatorConfig, ImageDirectory};
///
/// let frames = ImageDirectory::open("frames", ".png").unwrap();
/// let mut calculator = BoxCalculator::new(frames, CalculatorConfig::default()).unwrap();
///
/// let first = calculator.get_bbox(0).unwrap();
/// let all = calculator.calc_all(&BatchOptions::default()).unwrap();
/// assert_eq!(all[0], first);
/// ```
pub struct BoxCalculator<R> {
    reader: R,
    config: CalculatorConfig,
    extractor: BoxExtractor,
    rng: ChaCha20Rng,
    background: Option<Arc<BackgroundModel>>,
    cache: BoxCache,
    stats: CalculatorStats,
}

impl<R: FrameReader> BoxCalculator<R> {
    /// Binds a calculator to `reader`.
    ///
    /// Fails without building anything if the configuration is invalid.
    pub fn new(reader: R, config: CalculatorConfig) -> Result<Self, BoxError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => {
                let mut seed = [0u8; 32];
                rand_core::OsRng.fill_bytes(&mut seed);
                ChaCha20Rng::from_seed(seed)
            }
        };

        let frames = reader.len();
        tracing::debug!(frames, ?config, "BoxCalculator created");

        Ok(Self {
            extractor: BoxExtractor::new(config.diff_thresh),
            cache: BoxCache::new(frames),
            stats: CalculatorStats {
                frames,
                ..Default::default()
            },
            background: None,
            reader,
            config,
            rng,
        })
    }

    /// Uses a precomputed background instead of sampling one.
    pub fn with_background(mut self, background: BackgroundModel) -> Self {
        self.stats.background_samples = background.sampled_indices().len();
        self.background = Some(Arc::new(background));
        self
    }

    /// Returns the frame source.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Number of frames in the sequence.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns true if the sequence holds no frames.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Current state of every entry without forcing computation.
    ///
    /// `None` marks frames whose box has not been computed yet.
    pub fn all_bboxes(&self) -> &[Option<BoundingBox>] {
        self.cache.entries()
    }

    /// Returns the box cache.
    pub fn cache(&self) -> &BoxCache {
        &self.cache
    }

    /// Returns work counters.
    pub fn stats(&self) -> &CalculatorStats {
        &self.stats
    }

    /// Returns the background, estimating it on first use.
    pub fn get_background(&mut self) -> Result<Arc<BackgroundModel>, BoxError> {
        if let Some(background) = &self.background {
            return Ok(Arc::clone(background));
        }

        let started = Instant::now();
        let background = Arc::new(BackgroundModel::estimate(
            &self.reader,
            self.config.bg_probes,
            &mut self.rng,
        )?);

        self.stats.background_samples = background.sampled_indices().len();
        tracing::info!(
            samples = self.stats.background_samples,
            shape = %background.shape(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Background estimated"
        );

        self.background = Some(Arc::clone(&background));
        Ok(background)
    }

    /// Returns the box for frame `index`, computing it at most once.
    pub fn get_bbox(&mut self, index: usize) -> Result<BoundingBox, BoxError> {
        self.check_index(index)?;

        if let Some(bbox) = self.cache.get(index) {
            self.stats.cache_hits += 1;
            return Ok(bbox);
        }

        let background = self.get_background()?;
        let bbox = batch::compute_box(&self.reader, &background, &self.extractor, index)?;
        self.record(index, bbox);
        Ok(bbox)
    }

    /// Computes the boxes for `indices` and returns them in the same order.
    ///
    /// Already cached frames are not recomputed. The batch is all or
    /// nothing: on any error, including cancellation, no entry computed
    /// by this call reaches the cache.
    pub fn calc_specified(
        &mut self,
        indices: &[usize],
        options: &BatchOptions,
    ) -> Result<Vec<BoundingBox>, BoxError> {
        if options.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize.into());
        }
        for &index in indices {
            self.check_index(index)?;
        }

        let started = Instant::now();
        let background = self.get_background()?;

        let hits = indices
            .iter()
            .filter(|&&i| self.cache.is_computed(i))
            .count();
        let mut seen = HashSet::with_capacity(indices.len());
        let pending: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| !self.cache.is_computed(i) && seen.insert(i))
            .collect();

        let workers = resolve_worker_count(
            pending.len(),
            options.chunk_size,
            options.num_workers,
            available_parallelism(),
        );
        tracing::info!(
            requested = indices.len(),
            pending = pending.len(),
            workers,
            chunk_size = options.chunk_size,
            "Extracting bounding boxes"
        );

        let cancel = options.cancel.as_ref();
        let computed = if workers == 0 {
            batch::run_sequential(&self.reader, &background, &self.extractor, &pending, cancel)
        } else {
            batch::run_parallel(
                &self.reader,
                &background,
                &self.extractor,
                &pending,
                workers,
                options.chunk_size,
                cancel,
            )
        };

        let computed = match computed {
            Ok(boxes) => boxes,
            Err(e) => {
                tracing::warn!(error = %e, pending = pending.len(), "Batch aborted");
                return Err(e);
            }
        };

        for (&index, &bbox) in pending.iter().zip(&computed) {
            self.record(index, bbox);
        }

        self.stats.cache_hits += hits as u64;
        self.stats.batches += 1;
        self.stats.last_batch_workers = workers;
        if workers > 0 {
            self.stats.parallel_batches += 1;
        }

        tracing::info!(
            computed = computed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch complete"
        );

        indices.iter().map(|&i| self.cached(i)).collect()
    }

    /// Computes the boxes of every frame, in frame order.
    pub fn calc_all(&mut self, options: &BatchOptions) -> Result<Vec<BoundingBox>, BoxError> {
        let indices: Vec<usize> = (0..self.len()).collect();
        self.calc_specified(&indices, options)
    }

    fn check_index(&self, index: usize) -> Result<(), FrameError> {
        if index < self.cache.len() {
            Ok(())
        } else {
            Err(FrameError::IndexOutOfRange {
                index,
                len: self.cache.len(),
            })
        }
    }

    fn cached(&self, index: usize) -> Result<BoundingBox, BoxError> {
        self.cache.get(index).ok_or_else(|| {
            FrameError::IndexOutOfRange {
                index,
                len: self.cache.len(),
            }
            .into()
        })
    }

    fn record(&mut self, index: usize, bbox: BoundingBox) {
        self.cache.insert(index, bbox);
        self.stats.boxes_computed += 1;
        if bbox.is_empty() {
            self.stats.empty_boxes += 1;
        }
    }
}

impl<R> std::fmt::Debug for BoxCalculator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxCalculator")
            .field("config", &self.config)
            .field("frames", &self.cache.len())
            .field("computed", &self.cache.computed_count())
            .field("has_background", &self.background.is_some())
            .finish()
    }
}
