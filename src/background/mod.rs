//! Static background estimation.
//!
//! The background is the per-pixel median of a random subsample of the
//! sequence. A moving object occupies any given pixel in only a minority
//! of the sampled frames, so the median recovers the empty scene without
//! needing a frame known to be free of the object.

mod median;

pub use median::median_u8;

use crate::frames::{Frame, FrameError, FrameReader, FrameShape};
use rand::Rng;
use thiserror::Error;

/// Errors that can occur while estimating the background.
#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("cannot estimate a background from zero frames")]
    NoFrames,
    #[error("frame {index} has shape {found}, expected {expected}")]
    ShapeMismatch {
        index: usize,
        expected: FrameShape,
        found: FrameShape,
    },
    #[error("frame {index} has {found} bytes, its shape needs {expected}")]
    MalformedFrame {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Estimated static background of a frame sequence.
///
/// Same shape as one frame; immutable once built.
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    image: Frame,
    sampled: Vec<usize>,
}

impl BackgroundModel {
    /// Estimates the background from `min(probes, reader.len())` frames
    /// drawn uniformly without replacement.
    pub fn estimate<R, G>(reader: &R, probes: usize, rng: &mut G) -> Result<Self, BackgroundError>
    where
        R: FrameReader + ?Sized,
        G: Rng + ?Sized,
    {
        let length = reader.len();
        let size = probes.min(length);
        if size == 0 {
            return Err(BackgroundError::NoFrames);
        }

        let indices = rand::seq::index::sample(rng, length, size).into_vec();
        tracing::info!(
            frames = length,
            probes = size,
            "Estimating background from sampled frames"
        );

        Self::from_indices(reader, &indices)
    }

    /// Builds the background from an explicit set of frame indices.
    pub fn from_indices<R>(reader: &R, indices: &[usize]) -> Result<Self, BackgroundError>
    where
        R: FrameReader + ?Sized,
    {
        let mut frames = Vec::with_capacity(indices.len());
        for &index in indices {
            let frame = reader.frame_at(index)?;
            check_frame(&frame, frames.first().map(Frame::shape))?;
            frames.push(frame);
        }

        let Some(shape) = frames.first().map(Frame::shape) else {
            return Err(BackgroundError::NoFrames);
        };

        let pixels = median::median_stack(&frames);
        tracing::debug!(%shape, samples = frames.len(), "Background median computed");

        Ok(Self {
            image: Frame::new(pixels, shape.width, shape.height, shape.channels, 0),
            sampled: indices.to_vec(),
        })
    }

    /// Background pixels as a frame.
    #[inline]
    pub fn image(&self) -> &Frame {
        &self.image
    }

    /// Raw background pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        self.image.pixels()
    }

    /// Shape of the background (equal to the frame shape).
    #[inline]
    pub fn shape(&self) -> FrameShape {
        self.image.shape()
    }

    /// Frame indices the median was computed from, in sampling order.
    pub fn sampled_indices(&self) -> &[usize] {
        &self.sampled
    }
}

fn check_frame(frame: &Frame, expected: Option<FrameShape>) -> Result<(), BackgroundError> {
    if !frame.is_valid() {
        return Err(BackgroundError::MalformedFrame {
            index: frame.index(),
            expected: frame.shape().byte_len(),
            found: frame.pixels().len(),
        });
    }
    match expected {
        Some(expected) if expected != frame.shape() => Err(BackgroundError::ShapeMismatch {
            index: frame.index(),
            expected,
            found: frame.shape(),
        }),
        _ => Ok(()),
    }
}
