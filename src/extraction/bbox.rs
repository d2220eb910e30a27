//! Axis-aligned bounding rectangle.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle `(x, y, width, height)` in pixel units.
///
/// `(x, y)` is the top-left corner. [`BoundingBox::EMPTY`] is the
/// result for a frame in which no foreground object was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// "Computed; no foreground object found."
    pub const EMPTY: BoundingBox = BoundingBox {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    /// Creates a box from its top-left corner and size.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box enclosing every `(x, y)` point, inclusive.
    ///
    /// Returns `None` for an empty iterator.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut points = points.into_iter();
        let (x0, y0) = points.next()?;
        let (min_x, min_y, max_x, max_y) = points.fold(
            (x0, y0, x0, y0),
            |(min_x, min_y, max_x, max_y), (x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        );

        Some(Self::new(
            min_x,
            min_y,
            max_x - min_x + 1,
            max_y - min_y + 1,
        ))
    }

    /// True for the "no object" result.
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Covered pixel count.
    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `[x, y, w, h]`.
    #[inline]
    pub fn as_xywh(&self) -> [i64; 4] {
        [
            self.x as i64,
            self.y as i64,
            self.width as i64,
            self.height as i64,
        ]
    }
}

impl From<BoundingBox> for (u32, u32, u32, u32) {
    fn from(b: BoundingBox) -> Self {
        (b.x, b.y, b.width, b.height)
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.width, self.height)
    }
}
