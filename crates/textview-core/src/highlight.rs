//! Highlight adapter: turns raw line text into styled runs via an external tokenizer.
//!
//! Tokenizers are supplied by a [`LexerProvider`] and report byte-offset [`Token`]s. The
//! [`HighlightAdapter`] owns the active `(language, style)` pair, re-initializes the lexer
//! only when that pair changes, and converts tokens to character-column [`StyledRun`]s and
//! [`LinkSpan`]s that the layout cache stores per line.
//!
//! Tokenizer failures are reported as [`HighlightError`]; the layout engine degrades the
//! affected scope to plain text and escalates to a full pass.

use thiserror::Error;

use crate::style::{HighlightStyle, TextStyle};
use crate::text::CharIndex;

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    /// Unclassified text.
    Text,
    /// Language keyword.
    Keyword,
    /// Type name.
    Type,
    /// Function or method name.
    Function,
    /// String literal.
    String,
    /// Numeric literal.
    Number,
    /// Named constant (`true`, `null`, ...).
    Constant,
    /// Comment.
    Comment,
    /// Operator.
    Operator,
    /// Punctuation.
    Punctuation,
    /// Attribute, key or section name.
    Attribute,
    /// Heading (markup languages).
    Heading,
    /// Hyperlink.
    Link,
    /// Lexing error.
    Error,
}

/// One token reported by a [`Tokenizer`], in **byte** offsets within its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Inclusive start byte.
    pub start: usize,
    /// Exclusive end byte.
    pub end: usize,
    /// Category.
    pub kind: TokenKind,
    /// Link target, for tokens that can be activated.
    pub link: Option<String>,
}

impl Token {
    /// A token without a link.
    pub fn new(start: usize, end: usize, kind: TokenKind) -> Self {
        Self {
            start,
            end,
            kind,
            link: None,
        }
    }

    /// A link token pointing at `target`.
    pub fn link(start: usize, end: usize, target: impl Into<String>) -> Self {
        Self {
            start,
            end,
            kind: TokenKind::Link,
            link: Some(target.into()),
        }
    }
}

/// Highlighting errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    #[error("tokenizer for {language} failed: {message}")]
    /// The tokenizer could not process its input.
    Tokenize {
        /// Language of the failing tokenizer.
        language: String,
        /// Tokenizer message.
        message: String,
    },

    #[error("no lexer for language {0:?}")]
    /// The provider has no lexer for the requested language.
    UnknownLanguage(String),

    #[error("tokenizer returned {got} lines of tokens for {expected} lines of text")]
    /// A whole-text pass returned the wrong number of lines.
    LineCountMismatch {
        /// Lines in the text.
        expected: usize,
        /// Lines returned.
        got: usize,
    },
}

/// External "tokenize line(s) into styled spans" service.
pub trait Tokenizer {
    /// Language handled by this tokenizer.
    fn language(&self) -> &str;

    /// Tokenize one line (no trailing newline).
    fn tokenize_line(&mut self, line: &str) -> Result<Vec<Token>, HighlightError>;

    /// Tokenize a whole `'\n'`-separated text, one token list per line.
    ///
    /// Lexers that need cross-line context (block comments) override this; the default
    /// tokenizes each line independently.
    fn tokenize_whole(&mut self, text: &str) -> Result<Vec<Vec<Token>>, HighlightError> {
        text.split('\n').map(|line| self.tokenize_line(line)).collect()
    }
}

/// Source of tokenizers by language name.
pub trait LexerProvider {
    /// A fresh tokenizer for `language`, if supported.
    fn lexer(&self, language: &str) -> Option<Box<dyn Tokenizer>>;
}

/// A run of styled text in **character** columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    /// Inclusive start column.
    pub start: usize,
    /// Exclusive end column.
    pub end: usize,
    /// Token category.
    pub kind: TokenKind,
    /// Resolved style.
    pub style: TextStyle,
}

/// An activatable hyperlink span in **character** columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    /// Inclusive start column.
    pub start: usize,
    /// Exclusive end column.
    pub end: usize,
    /// Link target.
    pub target: String,
}

impl LinkSpan {
    /// Returns `true` if `column` lies on the link.
    pub fn contains(&self, column: usize) -> bool {
        self.start <= column && column < self.end
    }
}

/// Highlighted markup for one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMarkup {
    /// Styled runs, ordered by start column.
    pub runs: Vec<StyledRun>,
    /// Links, ordered by start column.
    pub links: Vec<LinkSpan>,
}

impl LineMarkup {
    /// Returns `true` if the line has no highlighting at all.
    pub fn is_plain(&self) -> bool {
        self.runs.is_empty() && self.links.is_empty()
    }
}

/// Wraps a [`LexerProvider`] and the active highlight parameters.
pub struct HighlightAdapter {
    provider: Option<Box<dyn LexerProvider>>,
    language: Option<String>,
    style_name: String,
    style: HighlightStyle,
    lexer: Option<Box<dyn Tokenizer>>,
}

impl std::fmt::Debug for HighlightAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightAdapter")
            .field("language", &self.language)
            .field("style", &self.style.name())
            .field("has_lexer", &self.lexer.is_some())
            .finish()
    }
}

impl Default for HighlightAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightAdapter {
    /// An adapter without a provider: every line renders as plain text.
    pub fn new() -> Self {
        Self {
            provider: None,
            language: None,
            style_name: crate::style::DEFAULT_STYLE_NAME.to_string(),
            style: HighlightStyle::default(),
            lexer: None,
        }
    }

    /// An adapter that takes lexers from `provider`.
    pub fn with_provider(provider: Box<dyn LexerProvider>) -> Self {
        Self {
            provider: Some(provider),
            ..Self::new()
        }
    }

    /// Replace the lexer provider; the active lexer is rebuilt.
    pub fn set_provider(&mut self, provider: Option<Box<dyn LexerProvider>>) {
        self.provider = provider;
        self.reinit();
    }

    /// Select the language and style.
    ///
    /// Returns `true` if anything changed (the caller must then re-run a full layout). An
    /// unknown language leaves the adapter in plain mode; an unknown style falls back to the
    /// default style.
    pub fn configure(&mut self, language: Option<&str>, style: &str) -> bool {
        let lang_changed = self.language.as_deref() != language;
        let style_changed = self.style_name != style;
        if !lang_changed && !style_changed {
            return false;
        }
        if style_changed {
            self.style_name = style.to_string();
            self.style = HighlightStyle::resolve(style);
        }
        if lang_changed {
            self.language = language.map(str::to_string);
            self.reinit();
        }
        true
    }

    fn reinit(&mut self) {
        self.lexer = match (&self.provider, &self.language) {
            (Some(provider), Some(lang)) => {
                let lexer = provider.lexer(lang);
                if lexer.is_none() {
                    tracing::debug!(target: "textview_core::highlight", language = %lang, "no lexer; plain text");
                }
                lexer
            }
            _ => None,
        };
        tracing::debug!(
            target: "textview_core::highlight",
            language = ?self.language,
            style = self.style.name(),
            "highlighter initialized"
        );
    }

    /// Active language.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Active style.
    pub fn style(&self) -> &HighlightStyle {
        &self.style
    }

    /// Returns `true` if no lexer is active.
    pub fn is_plain(&self) -> bool {
        self.lexer.is_none()
    }

    /// Markup for a whole document in one tokenizer pass.
    pub fn markup_whole(&mut self, lines: &[String]) -> Result<Vec<LineMarkup>, HighlightError> {
        let Some(lexer) = self.lexer.as_mut() else {
            return Ok(vec![LineMarkup::default(); lines.len()]);
        };
        let tokens = lexer.tokenize_whole(&lines.join("\n"))?;
        if tokens.len() != lines.len() {
            return Err(HighlightError::LineCountMismatch {
                expected: lines.len(),
                got: tokens.len(),
            });
        }
        Ok(lines
            .iter()
            .zip(tokens)
            .map(|(line, toks)| to_markup(line, &toks, &self.style))
            .collect())
    }

    /// Markup for a single line.
    pub fn markup_line(&mut self, line: &str) -> Result<LineMarkup, HighlightError> {
        let Some(lexer) = self.lexer.as_mut() else {
            return Ok(LineMarkup::default());
        };
        let tokens = lexer.tokenize_line(line)?;
        Ok(to_markup(line, &tokens, &self.style))
    }
}

/// Convert byte-offset tokens to character-column markup. Out-of-range offsets are clamped
/// and empty tokens dropped.
fn to_markup(line: &str, tokens: &[Token], style: &HighlightStyle) -> LineMarkup {
    let index = CharIndex::new(line);
    let mut markup = LineMarkup::default();
    for tok in tokens {
        let start = index.byte_to_char(tok.start);
        let end = index.byte_to_char(tok.end);
        if start >= end {
            continue;
        }
        if tok.kind != TokenKind::Text {
            markup.runs.push(StyledRun {
                start,
                end,
                kind: tok.kind,
                style: style.style_for(tok.kind),
            });
        }
        if let Some(target) = &tok.link {
            markup.links.push(LinkSpan {
                start,
                end,
                target: target.clone(),
            });
        }
    }
    markup.runs.sort_by_key(|r| r.start);
    markup.links.sort_by_key(|l| l.start);
    markup
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Digits;

    impl Tokenizer for Digits {
        fn language(&self) -> &str {
            "digits"
        }

        fn tokenize_line(&mut self, line: &str) -> Result<Vec<Token>, HighlightError> {
            if line.contains('!') {
                return Err(HighlightError::Tokenize {
                    language: "digits".into(),
                    message: "bang".into(),
                });
            }
            Ok(line
                .char_indices()
                .filter(|(_, c)| c.is_ascii_digit())
                .map(|(i, _)| Token::new(i, i + 1, TokenKind::Number))
                .collect())
        }
    }

    struct Provider;

    impl LexerProvider for Provider {
        fn lexer(&self, language: &str) -> Option<Box<dyn Tokenizer>> {
            (language == "digits").then(|| Box::new(Digits) as Box<dyn Tokenizer>)
        }
    }

    #[test]
    fn test_configure_only_reinitializes_on_change() {
        let mut adapter = HighlightAdapter::with_provider(Box::new(Provider));
        assert!(adapter.configure(Some("digits"), "monokai"));
        assert!(!adapter.is_plain());
        assert!(!adapter.configure(Some("digits"), "monokai"));
        assert!(adapter.configure(Some("other"), "monokai"));
        assert!(adapter.is_plain());
    }

    #[test]
    fn test_unknown_style_falls_back_to_default() {
        let mut adapter = HighlightAdapter::new();
        assert!(adapter.configure(None, "missing"));
        assert_eq!(adapter.style().name(), "default");
        assert!(!adapter.configure(None, "missing"));
    }

    #[test]
    fn test_markup_uses_char_columns() {
        let mut adapter = HighlightAdapter::with_provider(Box::new(Provider));
        adapter.configure(Some("digits"), "default");
        let markup = adapter.markup_line("é1").unwrap();
        assert_eq!(markup.runs.len(), 1);
        assert_eq!((markup.runs[0].start, markup.runs[0].end), (1, 2));
        assert_eq!(markup.runs[0].kind, TokenKind::Number);
    }

    #[test]
    fn test_markup_whole_propagates_errors() {
        let mut adapter = HighlightAdapter::with_provider(Box::new(Provider));
        adapter.configure(Some("digits"), "default");
        let lines = vec!["1".to_string(), "a!".to_string()];
        assert!(adapter.markup_whole(&lines).is_err());
        let ok = adapter
            .markup_whole(&["1".to_string(), "2".to_string()])
            .unwrap();
        assert_eq!(ok.len(), 2);
    }

    #[test]
    fn test_link_tokens_become_link_spans() {
        let markup = to_markup(
            "see http://x.io",
            &[Token::link(4, 15, "http://x.io")],
            &HighlightStyle::default(),
        );
        assert_eq!(markup.links.len(), 1);
        assert!(markup.links[0].contains(4));
        assert!(!markup.links[0].contains(15));
    }
}
