//! Frame sequence backed by a directory of image files.

use super::{Frame, FrameError, FrameReader};
use std::path::{Path, PathBuf};

/// Reads frames from image files in a directory.
///
/// Files are selected by extension and ordered by file name, so a
/// sequence exported as `frame_0001.png`, `frame_0002.png`, ... keeps its
/// temporal order. Frames are decoded on every [`frame_at`] call; the
/// reader holds only the path list and is freely shareable between
/// workers.
///
/// [`frame_at`]: FrameReader::frame_at
#[derive(Debug, Clone)]
pub struct ImageDirectory {
    root: PathBuf,
    paths: Vec<PathBuf>,
}

impl ImageDirectory {
    /// Scans `dir` for files whose name ends with `extension`.
    ///
    /// An empty `extension` selects every regular file.
    pub fn open(dir: impl AsRef<Path>, extension: &str) -> Result<Self, FrameError> {
        let root = dir.as_ref().to_path_buf();
        let io_err = |source| FrameError::Io {
            path: root.clone(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if !entry.file_type().map_err(io_err)?.is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().ends_with(extension) {
                paths.push(entry.path());
            }
        }

        if paths.is_empty() {
            return Err(FrameError::EmptyDirectory {
                dir: root,
                extension: extension.to_string(),
            });
        }

        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        tracing::info!(
            dir = %root.display(),
            frames = paths.len(),
            "Opened image directory"
        );

        Ok(Self { root, paths })
    }

    /// Returns the scanned directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file backing frame `index`, if any.
    pub fn path_of(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }
}

impl FrameReader for ImageDirectory {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn frame_at(&self, index: usize) -> Result<Frame, FrameError> {
        let path = self.paths.get(index).ok_or(FrameError::IndexOutOfRange {
            index,
            len: self.paths.len(),
        })?;

        let image = image::open(path).map_err(|source| FrameError::Decode {
            path: path.clone(),
            source,
        })?;

        tracing::trace!(index, path = %path.display(), "Decoded frame");
        Ok(Frame::from_image(image, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "bgsub-boxes-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_frames_sorted_by_name() {
        let dir = scratch_dir("sorted");
        for (name, value) in [("b.png", 20u8), ("a.png", 10), ("c.png", 30)] {
            GrayImage::from_pixel(4, 3, Luma([value]))
                .save(dir.join(name))
                .unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let reader = ImageDirectory::open(&dir, ".png").unwrap();
        assert_eq!(reader.len(), 3);

        let values: Vec<u8> = (0..3)
            .map(|i| reader.frame_at(i).unwrap().pixels()[0])
            .collect();
        assert_eq!(values, vec![10, 20, 30]);

        let frame = reader.frame_at(1).unwrap();
        assert_eq!(frame.channels(), 1);
        assert_eq!(frame.index(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_directory_rejected() {
        let dir = scratch_dir("empty");
        assert!(matches!(
            ImageDirectory::open(&dir, ".png"),
            Err(FrameError::EmptyDirectory { .. })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = std::env::temp_dir().join("bgsub-boxes-does-not-exist-42");
        assert!(matches!(
            ImageDirectory::open(&dir, ".png"),
            Err(FrameError::Io { .. })
        ));
    }
}
