//! Synthetic frame sequences shared by unit tests.

use crate::frames::{Frame, FrameError, FrameReader, InMemoryFrames};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Gray frame of `background` with one filled `(x, y, w, h)` block,
/// clipped to the frame.
pub fn frame_with_rect(
    width: u32,
    height: u32,
    background: u8,
    foreground: u8,
    rect: (u32, u32, u32, u32),
    index: usize,
) -> Frame {
    frame_with_rects(width, height, background, foreground, &[rect], index)
}

/// Gray frame of `background` with several filled blocks.
pub fn frame_with_rects(
    width: u32,
    height: u32,
    background: u8,
    foreground: u8,
    rects: &[(u32, u32, u32, u32)],
    index: usize,
) -> Frame {
    let mut pixels = vec![background; (width * height) as usize];
    for &(x, y, w, h) in rects {
        for row in y..(y + h).min(height) {
            for col in x..(x + w).min(width) {
                pixels[(row * width + col) as usize] = foreground;
            }
        }
    }
    Frame::gray(pixels, width, height, index)
}

/// `len` uniform 64x64 frames of intensity 100; the frames listed in
/// `objects` carry a bright block instead.
pub fn scene(len: usize, objects: &[(usize, (u32, u32, u32, u32))]) -> InMemoryFrames {
    (0..len)
        .map(|i| match objects.iter().find(|(at, _)| *at == i) {
            Some(&(_, rect)) => frame_with_rect(64, 64, 100, 200, rect, i),
            None => Frame::gray(vec![100; 64 * 64], 64, 64, i),
        })
        .collect()
}

/// Reader wrapper counting `frame_at` calls.
pub struct CountingReader<R> {
    inner: R,
    reads: AtomicUsize,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl<R: FrameReader> FrameReader for CountingReader<R> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn frame_at(&self, index: usize) -> Result<Frame, FrameError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.frame_at(index)
    }
}
