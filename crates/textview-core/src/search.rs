//! Literal text search over a [`TextBuffer`].
//!
//! The query is escaped and compiled into a regex, then matched line by line. All results
//! are expressed as [`TextPosition`]s with **character** columns (not byte offsets). Matches
//! never span a line break and never overlap within a line.

use regex::{Regex, RegexBuilder};

use crate::buffer::TextBuffer;
use crate::position::{TextPosition, TextRegion};
use crate::text::CharIndex;

/// Maximum number of find results that are highlighted at once.
pub const MAX_FIND_HIGHLIGHTS: usize = 50;

fn compile_literal(find: &str, case_sensitive: bool) -> Option<Regex> {
    match RegexBuilder::new(&regex::escape(find))
        .case_insensitive(!case_sensitive)
        .build()
    {
        Ok(re) => Some(re),
        Err(err) => {
            // An escaped literal only fails on absurd sizes.
            tracing::warn!(target: "textview_core::search", %err, "search pattern rejected");
            None
        }
    }
}

/// Start positions of every occurrence of `find` in `line`, in character columns.
pub fn find_in_line(line: &str, find: &str, case_sensitive: bool) -> Vec<usize> {
    if find.is_empty() {
        return Vec::new();
    }
    let Some(re) = compile_literal(find, case_sensitive) else {
        return Vec::new();
    };
    matches_in_line(&re, line)
}

fn matches_in_line(re: &Regex, line: &str) -> Vec<usize> {
    let mut cols = Vec::new();
    let mut index: Option<CharIndex> = None;
    for m in re.find_iter(line) {
        if m.start() == m.end() {
            continue;
        }
        let index = index.get_or_insert_with(|| CharIndex::new(line));
        cols.push(index.byte_to_char(m.start()));
    }
    cols
}

/// Find every occurrence of `find` in `buffer`, ordered by position.
///
/// Returns an empty list for an empty query. Case-insensitive matching uses Unicode simple
/// case folding.
pub fn find_matches(buffer: &TextBuffer, find: &str, case_sensitive: bool) -> Vec<TextPosition> {
    if find.is_empty() {
        return Vec::new();
    }
    let Some(re) = compile_literal(find, case_sensitive) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (ln, line) in buffer.lines().enumerate() {
        out.extend(
            matches_in_line(&re, &line)
                .into_iter()
                .map(|col| TextPosition::new(ln, col)),
        );
    }
    tracing::trace!(target: "textview_core::search", find, case_sensitive, matches = out.len(), "find");
    out
}

/// Index of the first match strictly after `pos`.
pub fn first_after(matches: &[TextPosition], pos: TextPosition) -> Option<usize> {
    matches.iter().position(|m| *m > pos)
}

/// Index of the first match on `line` or any later line.
pub fn first_from_line(matches: &[TextPosition], line: usize) -> Option<usize> {
    matches.iter().position(|m| m.line >= line)
}

/// The bounded set of regions painted as search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindHighlights {
    regions: Vec<TextRegion>,
}

impl FindHighlights {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the highlighted regions with the first [`MAX_FIND_HIGHLIGHTS`] `matches`,
    /// each `len` characters long.
    pub fn set(&mut self, matches: &[TextPosition], len: usize) {
        self.regions = matches
            .iter()
            .take(MAX_FIND_HIGHLIGHTS)
            .map(|m| TextRegion::with_len(*m, len))
            .collect();
    }

    /// Remove all highlights.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Returns `true` if nothing is highlighted.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of highlighted regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// All highlighted regions.
    pub fn regions(&self) -> &[TextRegion] {
        &self.regions
    }

    /// Highlighted regions touching `line`.
    pub fn on_line(&self, line: usize) -> impl Iterator<Item = &TextRegion> + '_ {
        self.regions
            .iter()
            .filter(move |r| r.start.line <= line && line <= r.end.line)
    }

    /// Smallest line range covering every highlight, if any.
    pub fn line_range(&self) -> Option<(usize, usize)> {
        let first = self.regions.first()?.start.line;
        let last = self.regions.iter().map(|r| r.end.line).max()?;
        Some((first, last))
    }
}
