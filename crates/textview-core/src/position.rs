//! Logical text positions and regions.
//!
//! Columns are counted in `char`s (Unicode scalar values) within a logical line, never in
//! bytes. A column equal to the line length means "after the last character".

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::buffer::TextEdit;

/// A logical position in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextPosition {
    /// Zero-based logical line index.
    pub line: usize,
    /// Zero-based column in characters within the logical line.
    pub column: usize,
}

impl TextPosition {
    /// The start of a document.
    pub const ZERO: TextPosition = TextPosition { line: 0, column: 0 };

    /// Create a new logical position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Shift this position so that it keeps pointing at the same text after `edit`.
    ///
    /// Positions before the edit are untouched. For deletions, positions inside the removed
    /// region collapse onto its start.
    pub fn adjust_for_edit(self, edit: &TextEdit) -> TextPosition {
        let start = edit.region.start;
        let end = edit.region.end;
        if self < start {
            return self;
        }
        if edit.is_insert {
            let line_delta = end.line - start.line;
            if self.line == start.line {
                // Text after the insertion point on the same line moves to the last new line.
                TextPosition::new(
                    self.line + line_delta,
                    end.column + (self.column - start.column),
                )
            } else {
                TextPosition::new(self.line + line_delta, self.column)
            }
        } else if self <= end {
            start
        } else if self.line == end.line {
            TextPosition::new(start.line, start.column + (self.column - end.column))
        } else {
            TextPosition::new(self.line - (end.line - start.line), self.column)
        }
    }
}

impl Ord for TextPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for TextPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TextPosition {
    /// Formats as a 1-based link position (`L12C3`), the inverse of [`FromStr`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}C{}", self.line + 1, self.column)
    }
}

/// Errors from parsing a textual position link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsePositionError {
    #[error("position link has neither a line (L) nor a column (C) part: {0:?}")]
    /// The input contained no `L` or `C` marker.
    MissingMarker(String),

    #[error("invalid number in position link {link:?}: {part:?}")]
    /// A number after `L` or `C` failed to parse.
    InvalidNumber {
        /// The full input.
        link: String,
        /// The offending fragment.
        part: String,
    },
}

impl FromStr for TextPosition {
    type Err = ParsePositionError;

    /// Parse `[#]L<line>[C<col>]` or `[#]C<col>`; lines are 1-based in links.
    fn from_str(link: &str) -> Result<Self, Self::Err> {
        let body = link.trim().trim_start_matches('#');
        let number = |part: &str| -> Result<usize, ParsePositionError> {
            part.parse::<usize>()
                .map_err(|_| ParsePositionError::InvalidNumber {
                    link: link.to_string(),
                    part: part.to_string(),
                })
        };

        let l_idx = body.find('L');
        let c_idx = body.find('C');
        match (l_idx, c_idx) {
            (Some(l), Some(c)) if l < c => {
                let line = number(&body[l + 1..c])?;
                let column = number(&body[c + 1..])?;
                Ok(TextPosition::new(line.saturating_sub(1), column))
            }
            (Some(l), None) => {
                let line = number(&body[l + 1..])?;
                Ok(TextPosition::new(line.saturating_sub(1), 0))
            }
            (None, Some(c)) => Ok(TextPosition::new(0, number(&body[c + 1..])?)),
            _ => Err(ParsePositionError::MissingMarker(link.to_string())),
        }
    }
}

/// A region of text between two positions, with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRegion {
    /// Inclusive start.
    pub start: TextPosition,
    /// Exclusive end.
    pub end: TextPosition,
}

impl TextRegion {
    /// The empty region at the start of the document.
    pub const ZERO: TextRegion = TextRegion {
        start: TextPosition::ZERO,
        end: TextPosition::ZERO,
    };

    /// Create a region from two positions in any order.
    pub fn new(a: TextPosition, b: TextPosition) -> Self {
        if b < a {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    /// A region of `len` characters starting at `start`, on the same line.
    pub fn with_len(start: TextPosition, len: usize) -> Self {
        Self {
            start,
            end: TextPosition::new(start.line, start.column + len),
        }
    }

    /// An empty region at `pos`.
    pub fn caret(pos: TextPosition) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Returns `true` if `start == end`.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` for a non-empty region (an active selection).
    pub fn is_active(&self) -> bool {
        self.start < self.end
    }

    /// Returns `true` if `pos` lies in `[start, end)`.
    pub fn contains(&self, pos: TextPosition) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Number of logical lines touched by the region.
    pub fn line_span(&self) -> usize {
        self.end.line - self.start.line + 1
    }
}
