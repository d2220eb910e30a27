//! Frame type holding one interleaved 8-bit pixel array.

use image::{DynamicImage, GrayImage, RgbImage};

/// Height, width and channel count of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameShape {
    /// Rows.
    pub height: u32,
    /// Columns.
    pub width: u32,
    /// Interleaved channels per pixel (1 for grayscale).
    pub channels: u8,
}

impl FrameShape {
    /// Number of bytes a frame of this shape occupies.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.height as usize * self.width as usize * self.channels as usize
    }
}

impl std::fmt::Display for FrameShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

/// A single frame of the analysed sequence.
///
/// Pixels are stored row-major with channels interleaved, so the
/// value of channel `c` at `(x, y)` lives at
/// `(y * width + x) * channels + c`.
#[derive(Clone)]
pub struct Frame {
    /// Raw pixel data.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Channels per pixel.
    channels: u8,
    /// Position of the frame in its sequence.
    index: usize,
}

impl Frame {
    /// Creates a frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        Self {
            pixels,
            width,
            height,
            channels,
            index,
        }
    }

    /// Creates a single-channel frame.
    pub fn gray(pixels: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        Self::new(pixels, width, height, 1, index)
    }

    /// Creates a frame where every byte has the same value.
    pub fn filled(shape: FrameShape, value: u8, index: usize) -> Self {
        Self::new(
            vec![value; shape.byte_len()],
            shape.width,
            shape.height,
            shape.channels,
            index,
        )
    }

    /// Converts a decoded image, keeping grayscale images single-channel.
    pub fn from_image(image: DynamicImage, index: usize) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => {
                let (width, height) = gray.dimensions();
                Self::gray(gray.into_raw(), width, height, index)
            }
            DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLumaA16(_) => {
                let gray = image.to_luma8();
                let (width, height) = gray.dimensions();
                Self::gray(gray.into_raw(), width, height, index)
            }
            other => {
                let rgb = other.to_rgb8();
                let (width, height) = rgb.dimensions();
                Self::new(rgb.into_raw(), width, height, 3, index)
            }
        }
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of interleaved channels.
    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Returns the sequence index.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the frame shape.
    #[inline]
    pub fn shape(&self) -> FrameShape {
        FrameShape {
            height: self.height,
            width: self.width,
            channels: self.channels,
        }
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches the shape.
    pub fn is_valid(&self) -> bool {
        self.channels > 0 && self.pixels.len() == self.shape().byte_len()
    }

    /// Converts the frame into an `image` buffer for encoding.
    ///
    /// Returns `None` for channel layouts other than gray and RGB.
    pub fn to_image(&self) -> Option<DynamicImage> {
        match self.channels {
            1 => GrayImage::from_raw(self.width, self.height, self.pixels.clone())
                .map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(self.width, self.height, self.pixels.clone())
                .map(DynamicImage::ImageRgb8),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("index", &self.index)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}
