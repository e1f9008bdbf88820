//! Indentation helpers on [`TextBuffer`].
//!
//! Indentation is measured in levels: one tab, or `tab_width` spaces. Auto-indent copies the
//! level of the previous line, one deeper if that line ends with an indent token (e.g. `{`)
//! and one shallower if the current line starts with an unindent token (e.g. `}`).

use crate::buffer::{TextBuffer, TextEdit};
use crate::position::TextPosition;

/// How one indentation level is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentStyle {
    /// Indent with spaces instead of tabs.
    pub use_spaces: bool,
    /// Cells per level (also the tab stop width).
    pub tab_width: usize,
}

impl Default for IndentStyle {
    fn default() -> Self {
        Self {
            use_spaces: false,
            tab_width: 4,
        }
    }
}

impl IndentStyle {
    /// Create a style.
    pub fn new(use_spaces: bool, tab_width: usize) -> Self {
        Self {
            use_spaces,
            tab_width: tab_width.max(1),
        }
    }

    /// The text of `level` indentation levels.
    pub fn indent_string(&self, level: usize) -> String {
        if self.use_spaces {
            " ".repeat(level * self.tab_width)
        } else {
            "\t".repeat(level)
        }
    }

    /// Column just after `level` indentation levels.
    pub fn char_pos(&self, level: usize) -> usize {
        if self.use_spaces {
            level * self.tab_width
        } else {
            level
        }
    }

    /// Text inserted by one press of Tab.
    pub fn tab_string(&self) -> String {
        self.indent_string(1)
    }
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

impl TextBuffer {
    /// Indentation level of line `ln` and whether it is indented with spaces.
    ///
    /// A line starting with spaces counts `spaces / tab_width` levels; one starting with tabs
    /// counts its leading tabs. Mixed indentation is measured by its first character kind.
    pub fn line_indent(&self, ln: usize, tab_width: usize) -> (usize, bool) {
        let line = self.line(ln);
        match line.chars().next() {
            Some(' ') => {
                let n = line.chars().take_while(|c| *c == ' ').count();
                (n / tab_width.max(1), true)
            }
            Some('\t') => (line.chars().take_while(|c| *c == '\t').count(), false),
            _ => (0, false),
        }
    }

    /// Re-indent line `ln` to `level`, replacing its leading whitespace. Returns the last edit
    /// applied, or `None` if the line was already indented that way.
    pub fn indent_line(&mut self, ln: usize, level: usize, style: IndentStyle) -> Option<TextEdit> {
        if ln >= self.line_count() {
            return None;
        }
        let line = self.line(ln);
        let current = leading_whitespace(&line);
        let target = style.indent_string(level);
        if current == target {
            return None;
        }
        let cur_len = current.chars().count();
        let target_len = target.chars().count();
        if let Some(rest) = target.strip_prefix(current) {
            return self.insert_text(TextPosition::new(ln, cur_len), rest);
        }
        if current.starts_with(target.as_str()) {
            return self.delete_text(
                TextPosition::new(ln, target_len),
                TextPosition::new(ln, cur_len),
            );
        }
        self.delete_text(TextPosition::new(ln, 0), TextPosition::new(ln, cur_len));
        self.insert_text(TextPosition::new(ln, 0), &target)
    }

    /// Indent line `ln` relative to the previous line.
    ///
    /// Returns the edit applied (if any), the resulting level and the column just after the
    /// indentation.
    pub fn auto_indent(
        &mut self,
        ln: usize,
        style: IndentStyle,
        indents: &[String],
        unindents: &[String],
    ) -> (Option<TextEdit>, usize, usize) {
        let mut level = 0;
        if ln > 0 {
            let prev = self.line(ln - 1);
            level = self.line_indent(ln - 1, style.tab_width).0;
            let prev = prev.trim();
            if !prev.is_empty() && indents.iter().any(|tok| prev.ends_with(tok.as_str())) {
                level += 1;
            }
        }
        let cur = self.line(ln);
        let cur = cur.trim();
        if !cur.is_empty() && unindents.iter().any(|tok| cur.starts_with(tok.as_str())) {
            level = level.saturating_sub(1);
        }
        let edit = self.indent_line(ln, level, style);
        (edit, level, style.char_pos(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn braces() -> (Vec<String>, Vec<String>) {
        (vec!["{".to_string()], vec!["}".to_string()])
    }

    #[test]
    fn test_line_indent_counts_levels() {
        let buf = TextBuffer::from_text("        x\n\t\tx\nx\n  x");
        assert_eq!(buf.line_indent(0, 4), (2, true));
        assert_eq!(buf.line_indent(1, 4), (2, false));
        assert_eq!(buf.line_indent(2, 4), (0, false));
        assert_eq!(buf.line_indent(3, 4), (0, true));
    }

    #[test]
    fn test_indent_line_inserts_and_deletes() {
        let style = IndentStyle::new(true, 2);
        let mut buf = TextBuffer::from_text("x\n      y");
        let edit = buf.indent_line(0, 2, style).unwrap();
        assert!(edit.is_insert);
        assert_eq!(buf.line(0), "    x");
        let edit = buf.indent_line(1, 1, style).unwrap();
        assert!(edit.is_deletion());
        assert_eq!(buf.line(1), "  y");
        assert!(buf.indent_line(1, 1, style).is_none());
    }

    #[test]
    fn test_indent_line_replaces_mixed_whitespace() {
        let mut buf = TextBuffer::from_text(" \tx");
        buf.indent_line(0, 1, IndentStyle::new(false, 4));
        assert_eq!(buf.line(0), "\tx");
    }

    #[test]
    fn test_auto_indent_after_open_brace() {
        let (ind, unind) = braces();
        let mut buf = TextBuffer::from_text("\tfn x() {\n");
        let (edit, level, col) = buf.auto_indent(1, IndentStyle::default(), &ind, &unind);
        assert!(edit.is_some());
        assert_eq!((level, col), (2, 2));
        assert_eq!(buf.line(1), "\t\t");
    }

    #[test]
    fn test_auto_indent_dedents_closing_brace() {
        let (ind, unind) = braces();
        let mut buf = TextBuffer::from_text("    a\n}");
        let style = IndentStyle::new(true, 4);
        let (_, level, col) = buf.auto_indent(1, style, &ind, &unind);
        assert_eq!((level, col), (0, 0));
        assert_eq!(buf.line(1), "}");

        let mut buf = TextBuffer::from_text("        a\n}");
        let (_, level, _) = buf.auto_indent(1, style, &ind, &unind);
        assert_eq!(level, 1);
        assert_eq!(buf.line(1), "    }");
    }
}
