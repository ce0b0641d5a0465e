//! Row/column points and byte+point lengths.
//!
//! Columns are measured in bytes, matching the byte offsets used everywhere
//! else. Use [`super::LineIndex`] to convert to UTF-16 columns for editors.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use text_size::TextSize;

/// Longest text the engine can address. Offsets and lengths are
/// [`TextSize`], a `u32`; [`crate::Parser::parse`] rejects anything longer.
pub const MAX_TEXT_LEN: usize = u32::MAX as usize;

/// `len` as a [`TextSize`], saturating at [`MAX_TEXT_LEN`].
pub(crate) fn clamped_size(len: usize) -> TextSize {
    TextSize::try_from(len).unwrap_or(TextSize::new(u32::MAX))
}

/// A position in source code (0-indexed row, byte column).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub const ZERO: Point = Point { row: 0, column: 0 };

    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Translates `self` by an extent: a multi-row extent resets the column.
impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        if rhs.row > 0 {
            Point::new(self.row + rhs.row, rhs.column)
        } else {
            Point::new(self.row, self.column + rhs.column)
        }
    }
}

/// The extent between two points; saturates instead of underflowing.
impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        if self.row > rhs.row {
            Point::new(self.row - rhs.row, self.column)
        } else {
            Point::new(0, self.column.saturating_sub(rhs.column))
        }
    }
}

/// Size of a span of text: byte count plus the row/column extent it covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Length {
    pub bytes: TextSize,
    pub extent: Point,
}

impl Length {
    pub const ZERO: Length = Length {
        bytes: TextSize::new(0),
        extent: Point::ZERO,
    };

    pub fn new(bytes: u32, extent: Point) -> Self {
        Self {
            bytes: TextSize::new(bytes),
            extent,
        }
    }

    /// Measure a run of bytes. Rows are counted on `\n`.
    pub fn of(text: &[u8]) -> Length {
        let mut extent = Point::ZERO;
        for &b in text {
            if b == b'\n' {
                extent.row = extent.row.saturating_add(1);
                extent.column = 0;
            } else {
                extent.column = extent.column.saturating_add(1);
            }
        }
        Length {
            bytes: clamped_size(text.len()),
            extent,
        }
    }

    pub fn byte_len(self) -> usize {
        u32::from(self.bytes) as usize
    }

    pub fn is_empty(self) -> bool {
        self.bytes == TextSize::new(0)
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, rhs: Length) -> Length {
        Length {
            bytes: self.bytes + rhs.bytes,
            extent: self.extent + rhs.extent,
        }
    }
}

impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Length) {
        *self = *self + rhs;
    }
}

impl Sub for Length {
    type Output = Length;

    fn sub(self, rhs: Length) -> Length {
        Length {
            bytes: self.bytes.checked_sub(rhs.bytes).unwrap_or_default(),
            extent: self.extent - rhs.extent,
        }
    }
}
