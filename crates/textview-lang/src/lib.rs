#![warn(missing_docs)]
//! `textview-lang` - data-driven language configuration helpers for `textview`.
//!
//! This crate intentionally stays lightweight and does **not** depend on any
//! parsing/highlighting systems. It maps file names to language names and carries the small
//! per-language settings the view needs (auto-indent tokens, comment tokens).

use std::path::Path;

/// Comment tokens/config for a given language.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentConfig {
    /// Line comment token (e.g. `//`, `#`).
    pub line: Option<String>,
    /// Block comment start token (e.g. `/*`).
    pub block_start: Option<String>,
    /// Block comment end token (e.g. `*/`).
    pub block_end: Option<String>,
}

impl CommentConfig {
    /// Create a config that supports only line comments.
    pub fn line(token: impl Into<String>) -> Self {
        Self {
            line: Some(token.into()),
            block_start: None,
            block_end: None,
        }
    }

    /// Create a config that supports both line and block comments.
    pub fn line_and_block(
        line: impl Into<String>,
        block_start: impl Into<String>,
        block_end: impl Into<String>,
    ) -> Self {
        Self {
            line: Some(line.into()),
            block_start: Some(block_start.into()),
            block_end: Some(block_end.into()),
        }
    }

    /// Returns `true` if a line comment token is configured.
    pub fn has_line(&self) -> bool {
        self.line.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Returns `true` if both block comment tokens are configured.
    pub fn has_block(&self) -> bool {
        self.block_start.as_deref().is_some_and(|s| !s.is_empty())
            && self.block_end.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Tokens that drive line-based auto-indentation.
///
/// A line following one that ends with an `indent` token gets one more level; a line that
/// starts with an `unindent` token gets one level less.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentConfig {
    /// Suffixes of the previous line that open a block (e.g. `{`).
    pub indent: Vec<String>,
    /// Prefixes of the current line that close a block (e.g. `}`).
    pub unindent: Vec<String>,
}

impl IndentConfig {
    /// Create an indent config from token lists.
    pub fn new<I, U>(indent: I, unindent: U) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        U: IntoIterator,
        U::Item: Into<String>,
    {
        Self {
            indent: indent.into_iter().map(Into::into).collect(),
            unindent: unindent.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if `trimmed_prev_line` ends with one of the indent tokens.
    pub fn opens_block(&self, trimmed_prev_line: &str) -> bool {
        self.indent
            .iter()
            .any(|t| !t.is_empty() && trimmed_prev_line.ends_with(t.as_str()))
    }

    /// Returns `true` if `trimmed_line` starts with one of the unindent tokens.
    pub fn closes_block(&self, trimmed_line: &str) -> bool {
        self.unindent
            .iter()
            .any(|t| !t.is_empty() && trimmed_line.starts_with(t.as_str()))
    }
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self::new(["{"], ["}"])
    }
}

/// Configuration of one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Canonical language name (lower case, e.g. `rust`). Highlighters are looked up by it.
    pub name: String,
    /// File extensions without the dot.
    pub extensions: Vec<String>,
    /// Auto-indent tokens.
    pub indent: IndentConfig,
    /// Comment tokens.
    pub comments: CommentConfig,
}

impl LanguageConfig {
    /// Create a language config with default `{`/`}` indentation and no comments.
    pub fn new<E>(name: impl Into<String>, extensions: E) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            name: name.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
            indent: IndentConfig::default(),
            comments: CommentConfig::default(),
        }
    }

    /// Replace the indent config.
    pub fn with_indent(mut self, indent: IndentConfig) -> Self {
        self.indent = indent;
        self
    }

    /// Replace the comment config.
    pub fn with_comments(mut self, comments: CommentConfig) -> Self {
        self.comments = comments;
        self
    }

    /// Returns `true` if `ext` (without dot, any case) belongs to this language.
    pub fn matches_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// A set of known languages.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

impl LanguageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the languages bundled with `textview`.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        reg.register(
            LanguageConfig::new("rust", ["rs"])
                .with_comments(CommentConfig::line_and_block("//", "/*", "*/")),
        );
        reg.register(
            LanguageConfig::new("go", ["go"])
                .with_comments(CommentConfig::line_and_block("//", "/*", "*/")),
        );
        reg.register(
            LanguageConfig::new("c", ["c", "h", "cc", "cpp", "hpp"])
                .with_comments(CommentConfig::line_and_block("//", "/*", "*/")),
        );
        reg.register(
            LanguageConfig::new("json", ["json"])
                .with_indent(IndentConfig::new(["{", "["], ["}", "]"])),
        );
        reg.register(
            LanguageConfig::new("ini", ["ini", "cfg", "conf"])
                .with_indent(IndentConfig::new(Vec::<String>::new(), Vec::<String>::new()))
                .with_comments(CommentConfig::line(";")),
        );
        reg.register(
            LanguageConfig::new("python", ["py"])
                .with_indent(IndentConfig::new([":"], Vec::<String>::new()))
                .with_comments(CommentConfig::line("#")),
        );
        reg.register(
            LanguageConfig::new("markdown", ["md", "markdown"])
                .with_indent(IndentConfig::new(Vec::<String>::new(), Vec::<String>::new())),
        );
        reg
    }

    /// Add (or replace, by name) a language.
    pub fn register(&mut self, config: LanguageConfig) {
        if let Some(existing) = self.languages.iter_mut().find(|l| l.name == config.name) {
            *existing = config;
        } else {
            self.languages.push(config);
        }
    }

    /// Look up a language by name.
    pub fn by_name(&self, name: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|l| l.name == name)
    }

    /// Look up a language from a file path's extension.
    pub fn for_path(&self, path: impl AsRef<Path>) -> Option<&LanguageConfig> {
        let ext = path.as_ref().extension()?.to_str()?;
        self.languages.iter().find(|l| l.matches_extension(ext))
    }

    /// Iterate over all registered languages.
    pub fn iter(&self) -> impl Iterator<Item = &LanguageConfig> {
        self.languages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_path_matches_extension_case_insensitively() {
        let reg = LanguageRegistry::builtin();
        assert_eq!(reg.for_path("src/main.rs").unwrap().name, "rust");
        assert_eq!(reg.for_path("README.MD").unwrap().name, "markdown");
        assert!(reg.for_path("Makefile").is_none());
    }

    #[test]
    fn test_indent_tokens() {
        let cfg = IndentConfig::default();
        assert!(cfg.opens_block("fn main() {"));
        assert!(!cfg.opens_block("let x = 1;"));
        assert!(cfg.closes_block("}"));
        assert!(!cfg.closes_block("x }"));
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut reg = LanguageRegistry::new();
        reg.register(LanguageConfig::new("toy", ["toy"]));
        reg.register(LanguageConfig::new("toy", ["t"]));
        assert_eq!(reg.iter().count(), 1);
        assert!(reg.for_path("a.t").is_some());
        assert!(reg.for_path("a.toy").is_none());
    }

    #[test]
    fn test_comment_config_flags() {
        let c = CommentConfig::line_and_block("//", "/*", "*/");
        assert!(c.has_line());
        assert!(c.has_block());
        assert!(!CommentConfig::line("#").has_block());
    }
}
