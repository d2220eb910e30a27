//! Prometheus metrics for box extraction.
//!
//! # Metrics Exposed
//!
//! - `bgsub_frames` - Frames in the analysed sequence
//! - `bgsub_boxes_computed_total` - Boxes extracted (each frame at most once)
//! - `bgsub_cache_hits_total` - Requests answered from the cache
//! - `bgsub_empty_boxes_total` - Frames where no object was found
//! - `bgsub_batches_total` - Completed batch calls
//! - `bgsub_parallel_batches_total` - Batch calls that used a worker pool
//! - `bgsub_last_batch_workers` - Workers of the most recent batch
//! - `bgsub_background_samples` - Frames sampled for the background
//!
//! # Example
//!
//! ```no_run
//! use bgsub_boxes::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     frames: 1000,
//!     boxes_computed: 1000,
//!     batches: 1,
//!     parallel_batches: 1,
//!     last_batch_workers: 4,
//!     background_samples: 100,
//!     ..Default::default()
//! };
//!
//! registry.update(&snapshot);
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
