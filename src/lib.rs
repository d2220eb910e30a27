//! Background-Subtraction Bounding Boxes
//!
//! Extracts, for every frame of a sequence, the bounding rectangle of the
//! single foreground object moving against a roughly static background.
//!
//! # Architecture
//!
//! ```text
//! frames ──► background (median of sampled frames)
//!    │              │
//!    └──► extraction (diff → threshold → morphology → contours → bbox)
//!                   │
//!              calculator (lazy cache, sequential / parallel batches)
//!                   │
//!           persist, metrics
//! ```
//!
//! # Design Principles
//!
//! - **Lazy**: the background and each box are computed on first demand
//! - **At most once**: cached results are never recomputed
//! - **All or nothing batches**: a failed batch leaves the cache untouched
//! - **Read-only workers**: parallel workers share frames and background
//!   without any shared mutable state
//!
//! # Example
//!
//! ```no_run
//! use bgsub_boxes::{BatchOptions, BoxCalculator, CalculatorConfig, ImageDirectory};
//!
//! let frames = ImageDirectory::open("recording/frames", ".png").unwrap();
//! let config = CalculatorConfig::with_sampling(100, 10);
//! let mut calculator = BoxCalculator::new(frames, config).unwrap();
//!
//! // Single frame on demand
//! let bbox = calculator.get_bbox(42).unwrap();
//! println!("frame 42: {bbox}");
//!
//! // Everything else in parallel
//! let boxes = calculator.calc_all(&BatchOptions::default()).unwrap();
//! assert_eq!(boxes.len(), calculator.len());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod background;
pub mod calculator;
pub mod extraction;
pub mod frames;
pub mod metrics;
pub mod persist;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at crate root
pub use background::{BackgroundError, BackgroundModel};
pub use calculator::{
    BatchOptions, BoxCache, BoxCalculator, BoxError, CalculatorConfig, CalculatorStats,
    CancellationToken, ConfigError, FileConfig,
};
pub use extraction::{extract_box, BoundingBox, BoxExtractor, ExtractionError};
pub use frames::{Frame, FrameError, FrameReader, FrameShape, ImageDirectory, InMemoryFrames};
pub use persist::{BoxRecords, PersistError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
