//! Single text edits.

use super::position::{Length, Point, clamped_size};

/// One replacement of `old_text[start_byte..old_end_byte]` by new text ending
/// at `new_end_byte`, with the matching points.
///
/// An edit is well formed when `start_byte <= old_end_byte`,
/// `start_byte <= new_end_byte` and the points agree with the byte offsets.
/// [`InputEdit::new`] derives everything from the old text and the replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_position: Point,
    pub old_end_position: Point,
    pub new_end_position: Point,
}

impl InputEdit {
    /// Describe replacing `old_text[start..old_end]` with `replacement`.
    ///
    /// Offsets past the end of `old_text` are clamped.
    pub fn new(old_text: &[u8], start: usize, old_end: usize, replacement: &[u8]) -> Self {
        let start = start.min(old_text.len());
        let old_end = old_end.clamp(start, old_text.len());
        let start_position = Length::of(&old_text[..start]).extent;
        let old_end_position = start_position + Length::of(&old_text[start..old_end]).extent;
        let new_end_position = start_position + Length::of(replacement).extent;
        Self {
            start_byte: start,
            old_end_byte: old_end,
            new_end_byte: start + replacement.len(),
            start_position,
            old_end_position,
            new_end_position,
        }
    }

    /// Apply the replacement to `old_text`, returning the edited text.
    ///
    /// Offsets past the end of `old_text` are clamped as in [`InputEdit::new`].
    pub fn apply(&self, old_text: &[u8], replacement: &[u8]) -> Vec<u8> {
        let start = self.start_byte.min(old_text.len());
        let old_end = self.old_end_byte.clamp(start, old_text.len());
        let mut text = Vec::with_capacity(old_text.len() + replacement.len());
        text.extend_from_slice(&old_text[..start]);
        text.extend_from_slice(replacement);
        text.extend_from_slice(&old_text[old_end..]);
        text
    }

    pub fn is_well_formed(&self) -> bool {
        self.start_byte <= self.old_end_byte && self.start_byte <= self.new_end_byte
    }

    pub(crate) fn start(&self) -> Length {
        Length {
            bytes: clamped_size(self.start_byte),
            extent: self.start_position,
        }
    }

    pub(crate) fn old_end(&self) -> Length {
        Length {
            bytes: clamped_size(self.old_end_byte),
            extent: self.old_end_position,
        }
    }

    pub(crate) fn new_end(&self) -> Length {
        Length {
            bytes: clamped_size(self.new_end_byte),
            extent: self.new_end_position,
        }
    }
}
