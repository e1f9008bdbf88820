//! Completion popup state.
//!
//! The view asks a [`Completer`] for candidates for the text before the cursor and keeps them
//! in a [`CompletionPopup`]. The host draws the popup; while it is open the view routes the
//! popup keys (up/down, enter, escape, tab) to it before anything else.

use crate::position::TextPosition;

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Text inserted when the candidate is accepted.
    pub text: String,
    /// Optional short description shown next to the candidate.
    pub detail: Option<String>,
}

impl Completion {
    /// A candidate without description.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            detail: None,
        }
    }

    /// Attach a description.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Source of completions.
pub trait Completer {
    /// Candidates for `prefix` (line text before the cursor, leading whitespace trimmed).
    fn completions(&self, prefix: &str, pos: TextPosition) -> Vec<Completion>;

    /// Build the replacement for the text before the cursor when `choice` is accepted.
    ///
    /// `line_prefix` is the untrimmed text from line start to the cursor at column `col`.
    /// The default replaces the trailing word of `line_prefix` with `choice`.
    fn apply(&self, line_prefix: &str, col: usize, choice: &Completion) -> String {
        let _ = col;
        let word = trailing_word(line_prefix);
        let keep = &line_prefix[..line_prefix.len() - word.len()];
        format!("{keep}{}", choice.text)
    }
}

/// A completer over a fixed word list, matched case-insensitively on the trailing word.
#[derive(Debug, Clone, Default)]
pub struct WordListCompleter {
    words: Vec<String>,
}

impl WordListCompleter {
    /// Create from a word list.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }
}

fn trailing_word(s: &str) -> &str {
    let start = s
        .char_indices()
        .rev()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &s[start..]
}

impl Completer for WordListCompleter {
    fn completions(&self, prefix: &str, _pos: TextPosition) -> Vec<Completion> {
        let seed = trailing_word(prefix).to_lowercase();
        self.words
            .iter()
            .filter(|w| w.to_lowercase().starts_with(&seed) && w.len() > seed.len())
            .map(Completion::new)
            .collect()
    }
}

/// State of the completion popup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionPopup {
    open: bool,
    seed: String,
    items: Vec<Completion>,
    selected: usize,
    anchor: TextPosition,
}

impl CompletionPopup {
    /// A closed popup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the popup is showing.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The candidates.
    pub fn items(&self) -> &[Completion] {
        &self.items
    }

    /// Index of the highlighted candidate.
    pub fn selected(&self) -> Option<usize> {
        self.open.then_some(self.selected)
    }

    /// The highlighted candidate.
    pub fn selected_item(&self) -> Option<&Completion> {
        self.selected().and_then(|i| self.items.get(i))
    }

    /// The prefix the candidates were computed for.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Cursor position when the popup was opened.
    pub fn anchor(&self) -> TextPosition {
        self.anchor
    }

    /// Open with `items`; an empty list keeps the popup closed. Returns whether it opened.
    pub fn show(&mut self, seed: &str, anchor: TextPosition, items: Vec<Completion>) -> bool {
        if items.is_empty() {
            self.close();
            return false;
        }
        self.seed = seed.to_string();
        self.items = items;
        self.selected = 0;
        self.anchor = anchor;
        self.open = true;
        true
    }

    /// Close and drop the candidates.
    pub fn close(&mut self) {
        self.open = false;
        self.items.clear();
        self.seed.clear();
        self.selected = 0;
    }

    /// Highlight the previous candidate, wrapping to the last.
    pub fn move_up(&mut self) {
        if !self.open || self.items.is_empty() {
            return;
        }
        self.selected = if self.selected == 0 {
            self.items.len() - 1
        } else {
            self.selected - 1
        };
    }

    /// Highlight the next candidate, wrapping to the first.
    pub fn move_down(&mut self) {
        if !self.open || self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.items.len();
    }

    /// Take the highlighted candidate and close.
    pub fn accept(&mut self) -> Option<Completion> {
        let item = self.selected_item().cloned();
        self.close();
        item
    }

    /// Characters every candidate shares beyond the trailing word of the seed.
    ///
    /// This is what a Tab in the popup inserts before offering again.
    pub fn common_extension(&self) -> String {
        let seed_len = trailing_word(&self.seed).chars().count();
        let mut iter = self.items.iter().map(|c| c.text.as_str());
        let Some(first) = iter.next() else {
            return String::new();
        };
        let mut common: Vec<char> = first.chars().collect();
        for other in iter {
            let n = common
                .iter()
                .zip(other.chars())
                .take_while(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
                .count();
            common.truncate(n);
        }
        common.into_iter().skip(seed_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn popup(items: &[&str]) -> CompletionPopup {
        let mut p = CompletionPopup::new();
        p.show(
            "ap",
            TextPosition::ZERO,
            items.iter().map(|s| Completion::new(*s)).collect(),
        );
        p
    }

    #[test]
    fn test_word_list_completer_filters_on_trailing_word() {
        let c = WordListCompleter::new(["apple", "Application", "banana"]);
        let got: Vec<_> = c
            .completions("let x = ap", TextPosition::ZERO)
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(got, vec!["apple", "Application"]);
        assert!(c.completions("apple", TextPosition::ZERO).is_empty());
    }

    #[test]
    fn test_default_apply_replaces_trailing_word() {
        let c = WordListCompleter::default();
        assert_eq!(
            c.apply("  foo(ap", 8, &Completion::new("apple")),
            "  foo(apple"
        );
    }

    #[test]
    fn test_navigation_wraps() {
        let mut p = popup(&["a", "b", "c"]);
        p.move_up();
        assert_eq!(p.selected(), Some(2));
        p.move_down();
        assert_eq!(p.selected(), Some(0));
        assert_eq!(p.accept().unwrap().text, "a");
        assert!(!p.is_open());
        assert_eq!(p.selected(), None);
    }

    #[test]
    fn test_show_empty_keeps_closed() {
        let mut p = CompletionPopup::new();
        assert!(!p.show("x", TextPosition::ZERO, Vec::new()));
        assert!(!p.is_open());
    }

    #[test]
    fn test_common_extension() {
        let p = popup(&["apple", "applet", "application"]);
        assert_eq!(p.common_extension(), "pl");
        let p = popup(&["apple", "banana"]);
        assert_eq!(p.common_extension(), "");
    }
}
