//! Line/column conversion, including UTF-16 columns for editor protocols.

use rustc_hash::FxHashMap;
use text_size::{TextRange, TextSize};

use super::position::{Point, clamped_size};

/// 0-indexed line and column. The unit of `col` depends on the producing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// A multi-byte character inside a line, stored as its byte range within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WideChar {
    start: TextSize,
    end: TextSize,
}

impl WideChar {
    fn len(&self) -> TextSize {
        self.end - self.start
    }

    fn utf16_len(&self) -> u32 {
        if u32::from(self.len()) == 4 { 2 } else { 1 }
    }
}

/// Maps byte offsets to lines and columns for one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the start of every line.
    line_starts: Vec<TextSize>,
    /// Lines that contain non-ASCII characters.
    wide_chars: FxHashMap<u32, Vec<WideChar>>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        let mut wide_chars: FxHashMap<u32, Vec<WideChar>> = FxHashMap::default();
        let mut line = 0u32;
        let mut line_start = 0usize;

        for (offset, c) in text.char_indices() {
            if c == '\n' {
                line = line.saturating_add(1);
                line_start = offset + 1;
                line_starts.push(clamped_size(line_start));
                continue;
            }
            if !c.is_ascii() {
                let start = u32::try_from(offset - line_start).unwrap_or(u32::MAX);
                wide_chars.entry(line).or_default().push(WideChar {
                    start: TextSize::new(start),
                    end: TextSize::new(start.saturating_add(c.len_utf8() as u32)),
                });
            }
        }

        Self {
            line_starts,
            wide_chars,
            len: clamped_size(text.len()),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Line and byte column of `offset`. Offsets past the end clamp to the end.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.len);
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let col = offset - self.line_starts[line];
        LineCol {
            line: line as u32,
            col: col.into(),
        }
    }

    pub fn point(&self, offset: TextSize) -> Point {
        let lc = self.line_col(offset);
        Point::new(lc.line, lc.col)
    }

    /// Byte offset of a line/byte-column pair, if the line exists.
    pub fn offset(&self, line_col: LineCol) -> Option<TextSize> {
        let start = *self.line_starts.get(line_col.line as usize)?;
        let offset = start + TextSize::new(line_col.col);
        (offset <= self.len).then_some(offset)
    }

    /// Byte range of a line, excluding its trailing newline.
    pub fn line_range(&self, line: u32) -> Option<TextRange> {
        let start = *self.line_starts.get(line as usize)?;
        let end = match self.line_starts.get(line as usize + 1) {
            Some(next) => *next - TextSize::new(1),
            None => self.len,
        };
        Some(TextRange::new(start, end))
    }

    /// Convert a byte column to a UTF-16 column.
    pub fn to_utf16(&self, line_col: LineCol) -> LineCol {
        let mut col = line_col.col;
        if let Some(chars) = self.wide_chars.get(&line_col.line) {
            for c in chars {
                if u32::from(c.end) <= line_col.col {
                    col -= u32::from(c.len()) - c.utf16_len();
                } else {
                    break;
                }
            }
        }
        LineCol {
            line: line_col.line,
            col,
        }
    }

    /// Convert a UTF-16 column back to a byte column.
    pub fn from_utf16(&self, line_col: LineCol) -> LineCol {
        let mut col = line_col.col;
        if let Some(chars) = self.wide_chars.get(&line_col.line) {
            for c in chars {
                if u32::from(c.start) < col {
                    col += u32::from(c.len()) - c.utf16_len();
                } else {
                    break;
                }
            }
        }
        LineCol {
            line: line_col.line,
            col,
        }
    }
}
