//! Foreground mask via background differencing.
//!
//! Removes the static scene by comparing each frame against the
//! background model. Only pixels that changed by more than the
//! threshold contribute to the mask, which is then cleaned with
//! morphological opening and dilation.

use super::ExtractionError;
use crate::frames::Frame;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Mask value for foreground pixels.
pub const FOREGROUND: u8 = 255;

/// Side of the square structuring element used for opening.
pub const OPEN_KERNEL: u8 = 5;

/// Side of the square structuring element used for dilation.
pub const DILATE_KERNEL: u8 = 11;

/// Binarizes `|frame - background|` against `diff_thresh`.
///
/// A pixel is foreground when the difference of any of its channels is
/// strictly greater than `diff_thresh`; ties are background.
pub fn difference_mask(
    frame: &Frame,
    background: &Frame,
    diff_thresh: u8,
) -> Result<GrayImage, ExtractionError> {
    if frame.shape() != background.shape() {
        return Err(ExtractionError::ShapeMismatch {
            frame: frame.shape(),
            background: background.shape(),
        });
    }
    for candidate in [frame, background] {
        if !candidate.is_valid() {
            return Err(ExtractionError::MalformedFrame {
                expected: candidate.shape().byte_len(),
                found: candidate.pixels().len(),
            });
        }
    }

    let channels = frame.channels() as usize;
    let width = frame.width() as usize;
    let current = frame.pixels();
    let reference = background.pixels();

    Ok(GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let start = (y as usize * width + x as usize) * channels;
        let end = start + channels;
        let changed = current[start..end]
            .iter()
            .zip(&reference[start..end])
            .any(|(&c, &b)| c.abs_diff(b) > diff_thresh);
        Luma([if changed { FOREGROUND } else { 0 }])
    }))
}

/// Opens the mask to drop speckle noise, then dilates it so that the
/// fragments of one object merge into a single region.
pub fn clean_mask(mask: &GrayImage) -> GrayImage {
    let opened = morphology::open(mask, Norm::LInf, OPEN_KERNEL / 2);
    morphology::dilate(&opened, Norm::LInf, DILATE_KERNEL / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::frame_with_rect;

    fn count_foreground(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p[0] == FOREGROUND).count()
    }

    #[test]
    fn test_identical_frames_empty_mask() {
        let frame = Frame::gray(vec![100u8; 64], 8, 8, 1);
        let mask = difference_mask(&frame, &frame, 10).unwrap();

        assert_eq!(count_foreground(&mask), 0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let background = Frame::gray(vec![100u8; 4], 2, 2, 0);
        let frame = Frame::gray(vec![110, 111, 90, 89], 2, 2, 1);
        let mask = difference_mask(&frame, &background, 10).unwrap();

        assert_eq!(mask.into_raw(), vec![0, FOREGROUND, 0, FOREGROUND]);
    }

    #[test]
    fn test_any_channel_marks_foreground() {
        let background = Frame::new(vec![50; 6], 2, 1, 3, 0);
        let frame = Frame::new(vec![50, 50, 50, 50, 80, 50], 2, 1, 3, 1);
        let mask = difference_mask(&frame, &background, 10).unwrap();

        assert_eq!(mask.into_raw(), vec![0, FOREGROUND]);
    }

    #[test]
    fn test_shape_mismatch() {
        let background = Frame::gray(vec![0; 16], 4, 4, 0);
        let frame = Frame::gray(vec![0; 12], 4, 3, 1);

        assert!(matches!(
            difference_mask(&frame, &background, 10),
            Err(ExtractionError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_opening_removes_speckle() {
        let background = Frame::gray(vec![0; 32 * 32], 32, 32, 0);
        let frame = frame_with_rect(32, 32, 0, 200, (10, 10, 3, 3), 1);

        let raw = difference_mask(&frame, &background, 10).unwrap();
        assert_eq!(count_foreground(&raw), 9);
        assert_eq!(count_foreground(&clean_mask(&raw)), 0);
    }

    #[test]
    fn test_dilation_grows_by_five_pixels() {
        let background = Frame::gray(vec![0; 64 * 64], 64, 64, 0);
        let frame = frame_with_rect(64, 64, 0, 200, (20, 20, 10, 10), 1);

        let raw = difference_mask(&frame, &background, 10).unwrap();
        let cleaned = clean_mask(&raw);

        // 10x10 survives the opening, dilation adds 5px per side.
        assert_eq!(count_foreground(&cleaned), 20 * 20);
        assert_eq!(cleaned.get_pixel(15, 15)[0], FOREGROUND);
        assert_eq!(cleaned.get_pixel(14, 15)[0], 0);
        assert_eq!(cleaned.get_pixel(34, 34)[0], FOREGROUND);
        assert_eq!(cleaned.get_pixel(35, 34)[0], 0);
    }
}
