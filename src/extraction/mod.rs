//! Per-frame bounding-box extraction.
//!
//! Converts one frame plus the background model into the bounding box of
//! the single foreground object:
//!
//! ```text
//! absdiff → threshold → open 5×5 → dilate 11×11 → external contours
//!         → largest area → bounding rectangle
//! ```
//!
//! The pipeline is a pure function of its inputs and holds no state, so
//! workers may run it concurrently against a shared background.

mod bbox;
pub mod contour;
pub mod mask;

pub use bbox::BoundingBox;

use crate::frames::{Frame, FrameShape};
use thiserror::Error;

/// Errors that can occur during extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("frame shape {frame} does not match background shape {background}")]
    ShapeMismatch {
        frame: FrameShape,
        background: FrameShape,
    },
    #[error("pixel buffer holds {found} bytes, shape needs {expected}")]
    MalformedFrame { expected: usize, found: usize },
}

/// Extracts the bounding box of the largest foreground region.
///
/// Returns [`BoundingBox::EMPTY`] when the processed mask has no contour.
#[derive(Debug, Clone, Copy)]
pub struct BoxExtractor {
    diff_thresh: u8,
}

impl BoxExtractor {
    /// Creates an extractor with the given foreground threshold.
    pub fn new(diff_thresh: u8) -> Self {
        Self { diff_thresh }
    }

    /// Returns the intensity-difference threshold.
    pub fn diff_thresh(&self) -> u8 {
        self.diff_thresh
    }

    /// Runs the full pipeline for one frame.
    pub fn extract(&self, frame: &Frame, background: &Frame) -> Result<BoundingBox, ExtractionError> {
        let raw = mask::difference_mask(frame, background, self.diff_thresh)?;
        let cleaned = mask::clean_mask(&raw);

        let contours = contour::external_contours(&cleaned);
        let bbox = contour::largest_contour(&contours)
            .and_then(contour::contour_bounds)
            .unwrap_or(BoundingBox::EMPTY);

        tracing::trace!(
            index = frame.index(),
            contours = contours.len(),
            %bbox,
            "Extracted bounding box"
        );

        Ok(bbox)
    }
}

impl Default for BoxExtractor {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Convenience wrapper around [`BoxExtractor::extract`].
pub fn extract_box(
    frame: &Frame,
    background: &Frame,
    diff_thresh: u8,
) -> Result<BoundingBox, ExtractionError> {
    BoxExtractor::new(diff_thresh).extract(frame, background)
}
