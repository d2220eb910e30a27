//! Saving and loading computed results.
//!
//! Boxes are written as a JSON document alongside the parameters that
//! produced them. Parent directories are created on save.

use crate::background::BackgroundModel;
use crate::calculator::{BoxCalculator, CalculatorConfig};
use crate::extraction::BoundingBox;
use crate::frames::FrameReader;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while persisting results.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("file does not exist: {0}")]
    NotFound(PathBuf),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed box file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("background with {0} channels cannot be encoded")]
    UnsupportedChannels(u8),
}

/// Snapshot of a calculator's box cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxRecords {
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    /// Sampling size used for the background.
    pub bg_probes: usize,
    /// Foreground threshold used for extraction.
    pub diff_thresh: u8,
    /// One entry per frame; `None` where no box was computed.
    pub boxes: Vec<Option<BoundingBox>>,
}

impl BoxRecords {
    /// Captures the current cache of `calculator`.
    pub fn from_calculator<R: FrameReader>(calculator: &BoxCalculator<R>) -> Self {
        Self::new(calculator.config(), calculator.all_bboxes().to_vec())
    }

    /// Builds records for `boxes` produced under `config`.
    pub fn new(config: &CalculatorConfig, boxes: Vec<Option<BoundingBox>>) -> Self {
        Self {
            created_at: Utc::now(),
            bg_probes: config.bg_probes,
            diff_thresh: config.diff_thresh,
            boxes,
        }
    }

    /// Number of frames covered.
    pub fn frame_count(&self) -> usize {
        self.boxes.len()
    }
}

/// Creates the parent directory of `path` if it doesn't exist.
pub fn create_parent_directory(path: &Path) -> Result<(), PersistError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| PersistError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Writes `records` to `path` as pretty-printed JSON.
pub fn save_records(records: &BoxRecords, path: impl AsRef<Path>) -> Result<(), PersistError> {
    let path = path.as_ref();
    create_parent_directory(path)?;

    let io_err = |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut writer, records).map_err(|source| PersistError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_err)?;

    tracing::info!(
        path = %path.display(),
        frames = records.frame_count(),
        "Saved bounding boxes"
    );
    Ok(())
}

/// Reads records previously written by [`save_records`].
pub fn load_records(path: impl AsRef<Path>) -> Result<BoxRecords, PersistError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => PersistError::NotFound(path.to_path_buf()),
        _ => PersistError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| PersistError::Format {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the background model as an image; the format follows the
/// file extension.
pub fn save_background(
    background: &BackgroundModel,
    path: impl AsRef<Path>,
) -> Result<(), PersistError> {
    let path = path.as_ref();
    let image = background
        .image()
        .to_image()
        .ok_or(PersistError::UnsupportedChannels(background.shape().channels))?;

    create_parent_directory(path)?;
    image.save(path).map_err(|source| PersistError::Image {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), "Saved background image");
    Ok(())
}
