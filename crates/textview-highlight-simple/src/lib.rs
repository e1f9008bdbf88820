//! `textview-highlight-simple` - Simple (regex-based) tokenizers for `textview-core`.
//!
//! This crate is intended for lightweight formats (JSON/INI/Markdown) and for a readable
//! first pass over C-family code where a full parser is unnecessary. Each language is a list
//! of [`RegexRule`]s; on every line the leftmost match wins, and among matches starting at
//! the same byte the earlier rule wins. C-family languages also carry a block comment pair
//! that is tracked across lines when the whole document is tokenized.

use regex::Regex;
use textview_core::highlight::{HighlightError, LexerProvider, Token, TokenKind, Tokenizer};

/// Languages known to [`SimpleLexers`].
pub const LANGUAGES: &[&str] = &["json", "ini", "rust", "go", "c", "python", "markdown"];

/// A single regex highlighting rule.
#[derive(Debug, Clone)]
pub struct RegexRule {
    regex: Regex,
    kind: TokenKind,
    capture_group: Option<usize>,
    link_group: Option<usize>,
}

impl RegexRule {
    /// A rule marking every match of `pattern` as `kind`.
    pub fn new(pattern: &str, kind: TokenKind) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            kind,
            capture_group: None,
            link_group: None,
        })
    }

    /// Highlight only a capture group of each match.
    ///
    /// Example (INI key):
    /// - pattern: `^\\s*([^=\\s]+)\\s*=`
    /// - capture_group: `1` (the key)
    pub fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = Some(group);
        self
    }

    /// Make each match a link whose target is capture group `group`.
    pub fn with_link_target(mut self, group: usize) -> Self {
        self.link_group = Some(group);
        self
    }

    /// Token category produced by this rule.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The first match at or after byte `at`.
    fn first_at(&self, line: &str, at: usize, priority: usize) -> Option<Candidate> {
        let caps = self.regex.captures_at(line, at)?;
        let m = caps.get(self.capture_group.unwrap_or(0))?;
        if m.start() >= m.end() {
            return None;
        }
        let token = match self.link_group.and_then(|g| caps.get(g)) {
            Some(target) => Token::link(m.start(), m.end(), target.as_str()),
            None => Token::new(m.start(), m.end(), self.kind),
        };
        Some(Candidate {
            priority,
            block: false,
            token,
        })
    }
}

#[derive(Debug)]
struct Candidate {
    priority: usize,
    block: bool,
    token: Token,
}

#[derive(Debug, Clone)]
struct BlockComment {
    open: String,
    close: String,
    regex: Regex,
}

/// A rule-list tokenizer for one language.
#[derive(Debug, Clone)]
pub struct RegexTokenizer {
    language: String,
    rules: Vec<RegexRule>,
    block: Option<BlockComment>,
}

impl RegexTokenizer {
    /// A tokenizer for `language` applying `rules` (earlier rules win ties).
    pub fn new(language: impl Into<String>, rules: Vec<RegexRule>) -> Self {
        Self {
            language: language.into(),
            rules,
            block: None,
        }
    }

    /// Add a block comment delimited by `open` and `close`, which may span lines.
    pub fn with_block_comment(mut self, open: &str, close: &str) -> Result<Self, regex::Error> {
        let pattern = format!(
            "{}.*?(?:{}|$)",
            regex::escape(open),
            regex::escape(close)
        );
        self.block = Some(BlockComment {
            open: open.to_string(),
            close: close.to_string(),
            regex: Regex::new(&pattern)?,
        });
        Ok(self)
    }

    /// The rules, in priority order.
    pub fn rules(&self) -> &[RegexRule] {
        &self.rules
    }

    /// Built-in tokenizer for `language`.
    pub fn for_language(language: &str) -> Result<Self, HighlightError> {
        let built = match language.to_ascii_lowercase().as_str() {
            "json" => Self::json(),
            "ini" => Self::ini(),
            "rust" => Self::rust(),
            "go" => Self::go(),
            "c" => Self::c(),
            "python" => Self::python(),
            "markdown" => Self::markdown(),
            _ => return Err(HighlightError::UnknownLanguage(language.to_string())),
        };
        built.map_err(|e| HighlightError::Tokenize {
            language: language.to_string(),
            message: e.to_string(),
        })
    }

    /// A small default JSON grammar (keys, strings, numbers, booleans, null).
    pub fn json() -> Result<Self, regex::Error> {
        Ok(Self::new(
            "json",
            vec![
                // Object key: the string before a colon
                RegexRule::new(r#"("(?:\\.|[^"\\])*")\s*:"#, TokenKind::Attribute)?
                    .with_capture_group(1),
                // JSON string (single-line, handles escapes)
                RegexRule::new(r#""(?:\\.|[^"\\])*""#, TokenKind::String)?,
                RegexRule::new(
                    r#"-?(?:0|[1-9]\d*)(?:\.\d+)?(?:[eE][+-]?\d+)?"#,
                    TokenKind::Number,
                )?,
                RegexRule::new(r#"\b(?:true|false|null)\b"#, TokenKind::Constant)?,
                RegexRule::new(r#"[{}\[\],:]"#, TokenKind::Punctuation)?,
            ],
        ))
    }

    /// A small default INI grammar (section, key, comment).
    pub fn ini() -> Result<Self, regex::Error> {
        Ok(Self::new(
            "ini",
            vec![
                RegexRule::new(r#"^\s*[;#].*$"#, TokenKind::Comment)?,
                // Section header: [section]
                RegexRule::new(r#"^\s*\[([^\]]+)\]\s*$"#, TokenKind::Heading)?
                    .with_capture_group(1),
                // Key: key = value
                RegexRule::new(r#"^\s*([^=\s]+)\s*="#, TokenKind::Attribute)?
                    .with_capture_group(1),
                RegexRule::new(r#""(?:\\.|[^"\\])*""#, TokenKind::String)?,
                RegexRule::new(r#"\b(?:true|false|yes|no|on|off)\b"#, TokenKind::Constant)?,
                RegexRule::new(r#"\b\d+(?:\.\d+)?\b"#, TokenKind::Number)?,
            ],
        ))
    }

    /// Rust: keywords, primitive and common std types, macros, attributes, lifetimes.
    pub fn rust() -> Result<Self, regex::Error> {
        const KEYWORDS: &[&str] = &[
            "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
            "extern", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
            "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait",
            "type", "unsafe", "use", "where", "while",
        ];
        const TYPES: &[&str] = &[
            "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16",
            "i32", "i64", "i128", "isize", "f32", "f64", "String", "Vec", "Option", "Result",
            "Box",
        ];
        let mut rules = c_family_head()?;
        rules.extend([
            RegexRule::new(r#"'(?:\\.|[^'\\])'"#, TokenKind::String)?,
            RegexRule::new(r#"#!?\[[^\]]*\]"#, TokenKind::Attribute)?,
            RegexRule::new(r#"'[a-z_]\w*"#, TokenKind::Type)?,
            RegexRule::new(r#"\b[a-z_]\w*!"#, TokenKind::Function)?,
            word_rule(KEYWORDS, TokenKind::Keyword)?,
            word_rule(TYPES, TokenKind::Type)?,
            word_rule(&["true", "false", "None"], TokenKind::Constant)?,
        ]);
        rules.extend(c_family_tail()?);
        Self::new("rust", rules).with_block_comment("/*", "*/")
    }

    /// Go: keywords, builtin types, raw strings.
    pub fn go() -> Result<Self, regex::Error> {
        const KEYWORDS: &[&str] = &[
            "break", "case", "chan", "const", "continue", "default", "defer", "else",
            "fallthrough", "for", "func", "go", "goto", "if", "import", "interface", "map",
            "package", "range", "return", "select", "struct", "switch", "type", "var",
        ];
        const TYPES: &[&str] = &[
            "bool", "byte", "error", "float32", "float64", "int", "int8", "int16", "int32",
            "int64", "rune", "string", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr",
        ];
        let mut rules = c_family_head()?;
        rules.extend([
            RegexRule::new(r#"`[^`]*`"#, TokenKind::String)?,
            RegexRule::new(r#"'(?:\\.|[^'\\])'"#, TokenKind::String)?,
            word_rule(KEYWORDS, TokenKind::Keyword)?,
            word_rule(TYPES, TokenKind::Type)?,
            word_rule(&["true", "false", "nil", "iota"], TokenKind::Constant)?,
        ]);
        rules.extend(c_family_tail()?);
        Self::new("go", rules).with_block_comment("/*", "*/")
    }

    /// C: keywords, preprocessor lines.
    pub fn c() -> Result<Self, regex::Error> {
        const KEYWORDS: &[&str] = &[
            "auto", "break", "case", "const", "continue", "default", "do", "else", "enum",
            "extern", "for", "goto", "if", "inline", "register", "return", "sizeof", "static",
            "struct", "switch", "typedef", "union", "volatile", "while",
        ];
        const TYPES: &[&str] = &[
            "char", "double", "float", "int", "long", "short", "signed", "unsigned", "void",
            "size_t",
        ];
        let mut rules = vec![RegexRule::new(r#"^\s*#\s*\w+"#, TokenKind::Attribute)?];
        rules.extend(c_family_head()?);
        rules.extend([
            RegexRule::new(r#"'(?:\\.|[^'\\])'"#, TokenKind::String)?,
            word_rule(KEYWORDS, TokenKind::Keyword)?,
            word_rule(TYPES, TokenKind::Type)?,
            word_rule(&["NULL", "true", "false"], TokenKind::Constant)?,
        ]);
        rules.extend(c_family_tail()?);
        Self::new("c", rules).with_block_comment("/*", "*/")
    }

    /// Python: keywords, `#` comments, decorators.
    pub fn python() -> Result<Self, regex::Error> {
        const KEYWORDS: &[&str] = &[
            "and", "as", "assert", "async", "await", "break", "class", "continue", "def",
            "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
            "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
            "while", "with", "yield",
        ];
        Ok(Self::new(
            "python",
            vec![
                RegexRule::new(r#"#.*$"#, TokenKind::Comment)?,
                RegexRule::new(r#""(?:\\.|[^"\\])*""#, TokenKind::String)?,
                RegexRule::new(r#"'(?:\\.|[^'\\])*'"#, TokenKind::String)?,
                RegexRule::new(r#"@[\w.]+"#, TokenKind::Attribute)?,
                word_rule(KEYWORDS, TokenKind::Keyword)?,
                word_rule(&["True", "False", "None"], TokenKind::Constant)?,
                RegexRule::new(r#"\b([A-Za-z_]\w*)\s*\("#, TokenKind::Function)?
                    .with_capture_group(1),
                number_rule()?,
            ],
        ))
    }

    /// Markdown: headings, inline code, emphasis, `[text](target)` links and bare URLs.
    pub fn markdown() -> Result<Self, regex::Error> {
        Ok(Self::new(
            "markdown",
            vec![
                RegexRule::new(r#"^#{1,6}\s.*$"#, TokenKind::Heading)?,
                RegexRule::new(r#"`[^`]+`"#, TokenKind::String)?,
                RegexRule::new(r#"\[[^\]]*\]\(([^)\s]+)\)"#, TokenKind::Link)?
                    .with_link_target(1),
                RegexRule::new(r#"(https?://[^\s)>\]]+)"#, TokenKind::Link)?
                    .with_link_target(1),
                RegexRule::new(r#"\*\*[^*]+\*\*|__[^_]+__"#, TokenKind::Keyword)?,
                RegexRule::new(r#"^\s*(?:[-*+]|\d+\.)\s"#, TokenKind::Punctuation)?,
            ],
        ))
    }

    /// Tokenize `line` from byte `from`. Returns `true` if an unterminated block comment
    /// runs to the end of the line.
    fn scan(&self, line: &str, from: usize, out: &mut Vec<Token>) -> bool {
        let mut cursor = from;
        let mut open = false;
        while cursor < line.len() {
            let mut best: Option<Candidate> = None;
            let mut consider = |c: Candidate| {
                let better = best.as_ref().is_none_or(|b| {
                    (c.token.start, c.priority) < (b.token.start, b.priority)
                });
                if better {
                    best = Some(c);
                }
            };
            if let Some(block) = &self.block
                && let Some(m) = block.regex.find_at(line, cursor)
            {
                consider(Candidate {
                    priority: 0,
                    block: true,
                    token: Token::new(m.start(), m.end(), TokenKind::Comment),
                });
            }
            for (i, rule) in self.rules.iter().enumerate() {
                if let Some(c) = rule.first_at(line, cursor, i + 1) {
                    consider(c);
                }
            }
            let Some(c) = best else {
                break;
            };
            cursor = c.token.end;
            open = c.block && self.block_is_open(&line[c.token.start..c.token.end]);
            out.push(c.token);
        }
        open
    }

    fn block_is_open(&self, text: &str) -> bool {
        match &self.block {
            Some(b) => text.len() < b.open.len() + b.close.len() || !text.ends_with(&b.close),
            None => false,
        }
    }
}

/// Comments and strings: these must win over anything starting at the same byte.
fn c_family_head() -> Result<Vec<RegexRule>, regex::Error> {
    Ok(vec![
        RegexRule::new(r#"//.*$"#, TokenKind::Comment)?,
        RegexRule::new(r#""(?:\\.|[^"\\])*""#, TokenKind::String)?,
    ])
}

fn c_family_tail() -> Result<Vec<RegexRule>, regex::Error> {
    Ok(vec![
        RegexRule::new(r#"\b([A-Za-z_]\w*)\s*\("#, TokenKind::Function)?.with_capture_group(1),
        number_rule()?,
        RegexRule::new(r#"[-+*/%=<>!&|^~?:]+"#, TokenKind::Operator)?,
    ])
}

fn number_rule() -> Result<RegexRule, regex::Error> {
    RegexRule::new(
        r#"\b(?:0[xX][0-9A-Fa-f_]+|\d[\d_]*(?:\.\d+)?(?:[eE][+-]?\d+)?)\w*"#,
        TokenKind::Number,
    )
}

fn word_rule(words: &[&str], kind: TokenKind) -> Result<RegexRule, regex::Error> {
    RegexRule::new(&format!(r#"\b(?:{})\b"#, words.join("|")), kind)
}

impl Tokenizer for RegexTokenizer {
    fn language(&self) -> &str {
        &self.language
    }

    fn tokenize_line(&mut self, line: &str) -> Result<Vec<Token>, HighlightError> {
        let mut tokens = Vec::new();
        self.scan(line, 0, &mut tokens);
        Ok(tokens)
    }

    fn tokenize_whole(&mut self, text: &str) -> Result<Vec<Vec<Token>>, HighlightError> {
        let mut lines = Vec::new();
        let mut in_block = false;
        for line in text.split('\n') {
            let mut tokens = Vec::new();
            let mut from = 0;
            if in_block {
                let close = self.block.as_ref().map(|b| b.close.as_str()).unwrap_or("*/");
                match line.find(close) {
                    Some(i) => {
                        from = i + close.len();
                        tokens.push(Token::new(0, from, TokenKind::Comment));
                    }
                    None => {
                        if !line.is_empty() {
                            tokens.push(Token::new(0, line.len(), TokenKind::Comment));
                        }
                        lines.push(tokens);
                        continue;
                    }
                }
            }
            in_block = self.scan(line, from, &mut tokens);
            lines.push(tokens);
        }
        tracing::trace!(target: "textview_highlight_simple", language = %self.language, lines = lines.len(), "tokenized document");
        Ok(lines)
    }
}

/// [`LexerProvider`] over the built-in regex grammars.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleLexers;

impl SimpleLexers {
    /// Create the provider.
    pub fn new() -> Self {
        Self
    }

    /// Returns `true` if `language` has a built-in grammar.
    pub fn supports(&self, language: &str) -> bool {
        LANGUAGES.iter().any(|l| l.eq_ignore_ascii_case(language))
    }
}

impl LexerProvider for SimpleLexers {
    fn lexer(&self, language: &str) -> Option<Box<dyn Tokenizer>> {
        match RegexTokenizer::for_language(language) {
            Ok(tokenizer) => Some(Box::new(tokenizer)),
            Err(HighlightError::UnknownLanguage(_)) => {
                tracing::debug!(target: "textview_highlight_simple", language, "no simple grammar");
                None
            }
            Err(e) => {
                tracing::warn!(target: "textview_highlight_simple", language, error = %e, "grammar failed to build");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(tokens: &[Token], line: &str) -> Vec<(String, TokenKind)> {
        tokens
            .iter()
            .map(|t| (line[t.start..t.end].to_string(), t.kind))
            .collect()
    }

    #[test]
    fn test_json_keys_values_and_constants() {
        let line = r#"{ "key": "值", "n": 12, "ok": true, "x": null }"#;
        let mut t = RegexTokenizer::json().unwrap();
        let tokens = t.tokenize_line(line).unwrap();
        let got = kinds(&tokens, line);
        assert!(got.contains(&("\"key\"".to_string(), TokenKind::Attribute)));
        assert!(got.contains(&("\"值\"".to_string(), TokenKind::String)));
        assert!(got.contains(&("12".to_string(), TokenKind::Number)));
        assert!(got.contains(&("true".to_string(), TokenKind::Constant)));
        assert!(got.contains(&("null".to_string(), TokenKind::Constant)));
    }

    #[test]
    fn test_ini_capture_groups() {
        let mut t = RegexTokenizer::ini().unwrap();
        let section = t.tokenize_line("[core]").unwrap();
        assert_eq!(kinds(&section, "[core]"), vec![("core".to_string(), TokenKind::Heading)]);

        let line = "name = textview";
        let key = t.tokenize_line(line).unwrap();
        assert_eq!(kinds(&key, line)[0], ("name".to_string(), TokenKind::Attribute));

        let comment = t.tokenize_line("; a comment = 1").unwrap();
        assert_eq!(comment.len(), 1);
        assert_eq!(comment[0].kind, TokenKind::Comment);
    }

    #[test]
    fn test_leftmost_match_wins() {
        let mut t = RegexTokenizer::rust().unwrap();
        let line = r#"let s = "a // b"; // note "x""#;
        let tokens = t.tokenize_line(line).unwrap();
        let got = kinds(&tokens, line);
        assert!(got.contains(&("\"a // b\"".to_string(), TokenKind::String)));
        assert!(got.contains(&("// note \"x\"".to_string(), TokenKind::Comment)));
        assert_eq!(got[0], ("let".to_string(), TokenKind::Keyword));
    }

    #[test]
    fn test_tokens_are_ordered_and_disjoint() {
        let mut t = RegexTokenizer::go().unwrap();
        let line = "func main() { x := 0x1F + len(`raw`) }";
        let tokens = t.tokenize_line(line).unwrap();
        for pair in tokens.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        let got = kinds(&tokens, line);
        assert!(got.contains(&("main".to_string(), TokenKind::Function)));
        assert!(got.contains(&("0x1F".to_string(), TokenKind::Number)));
        assert!(got.contains(&("`raw`".to_string(), TokenKind::String)));
    }

    #[test]
    fn test_block_comment_spans_lines_in_whole_pass() {
        let mut t = RegexTokenizer::c().unwrap();
        let text = "int a; /* start\nstill comment\nend */ int b;";
        let lines = t.tokenize_whole(text).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            kinds(&lines[0], "int a; /* start").last().cloned(),
            Some(("/* start".to_string(), TokenKind::Comment))
        );
        assert_eq!(
            kinds(&lines[1], "still comment"),
            vec![("still comment".to_string(), TokenKind::Comment)]
        );
        let third = kinds(&lines[2], "end */ int b;");
        assert_eq!(third[0], ("end */".to_string(), TokenKind::Comment));
        assert!(third.contains(&("int".to_string(), TokenKind::Type)));
    }

    #[test]
    fn test_closed_block_comment_does_not_leak() {
        let mut t = RegexTokenizer::rust().unwrap();
        let lines = t.tokenize_whole("/* x */ fn\nfn").unwrap();
        assert_eq!(lines[1].len(), 1);
        assert_eq!(lines[1][0].kind, TokenKind::Keyword);
    }

    #[test]
    fn test_markdown_links_carry_targets() {
        let mut t = RegexTokenizer::markdown().unwrap();
        let line = "see [docs](#L3C2) or https://example.com now";
        let tokens = t.tokenize_line(line).unwrap();
        let links: Vec<_> = tokens.iter().filter_map(|t| t.link.clone()).collect();
        assert_eq!(links, vec!["#L3C2".to_string(), "https://example.com".to_string()]);
        assert_eq!(&line[tokens[0].start..tokens[0].end], "[docs](#L3C2)");
    }

    #[test]
    fn test_provider_languages() {
        let p = SimpleLexers::new();
        for lang in LANGUAGES {
            assert!(p.supports(lang));
            assert_eq!(p.lexer(lang).unwrap().language(), *lang);
        }
        assert!(p.lexer("cobol").is_none());
        assert!(matches!(
            RegexTokenizer::for_language("cobol"),
            Err(HighlightError::UnknownLanguage(l)) if l == "cobol"
        ));
    }
}
