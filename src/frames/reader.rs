//! Frame reader abstraction.
//!
//! This module provides a trait-based abstraction over frame sequences,
//! allowing both decoded-on-demand sources and in-memory sequences for
//! testing.

use super::Frame;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading frames.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame index {index} out of range for sequence of {len} frames")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no frames with extension {extension:?} in {dir}")]
    EmptyDirectory { dir: PathBuf, extension: String },
}

/// Trait for frame sequence implementations.
///
/// Readers must support random and repeated access and must be safe to
/// share between worker threads: batch computation calls [`frame_at`]
/// concurrently from several workers without coordination.
///
/// [`frame_at`]: FrameReader::frame_at
pub trait FrameReader: Send + Sync {
    /// Number of frames in the sequence.
    fn len(&self) -> usize;

    /// Returns true if the sequence holds no frames.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the frame at `index`.
    ///
    /// Fails with [`FrameError::IndexOutOfRange`] for `index >= len()`.
    fn frame_at(&self, index: usize) -> Result<Frame, FrameError>;
}

impl<R: FrameReader + ?Sized> FrameReader for &R {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn frame_at(&self, index: usize) -> Result<Frame, FrameError> {
        (**self).frame_at(index)
    }
}

/// A reader over frames that are already decoded.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFrames {
    frames: Vec<Frame>,
}

impl InMemoryFrames {
    /// Wraps already decoded frames.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Returns the underlying frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

impl FromIterator<Frame> for InMemoryFrames {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl FrameReader for InMemoryFrames {
    fn len(&self) -> usize {
        self.frames.len()
    }

    fn frame_at(&self, index: usize) -> Result<Frame, FrameError> {
        self.frames
            .get(index)
            .cloned()
            .ok_or(FrameError::IndexOutOfRange {
                index,
                len: self.frames.len(),
            })
    }
}
