//! Frame sources and pixel buffers.
//!
//! The calculator never owns decoding logic. It consumes any
//! [`FrameReader`]: an indexable, length-bounded sequence of frames
//! that all share one shape and can be read concurrently.

mod directory;
mod frame;
mod reader;

pub use directory::ImageDirectory;
pub use frame::{Frame, FrameShape};
pub use reader::{FrameError, FrameReader, InMemoryFrames};
