//! Colors, text styles and named highlight styles.
//!
//! A [`HighlightStyle`] maps each [`TokenKind`] to a [`TextStyle`]. Styles are looked up by
//! name from a small built-in set; an unknown name falls back to the `default` style.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::highlight::TokenKind;

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha (255 = opaque).
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// A color with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Visual attributes applied to a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Foreground color; `None` uses the view's default.
    pub fg: Option<Color>,
    /// Background color; `None` is transparent.
    pub bg: Option<Color>,
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
    /// Underline decoration.
    pub underline: bool,
}

impl TextStyle {
    /// A style with only a foreground color.
    pub const fn fg(color: Color) -> Self {
        Self {
            fg: Some(color),
            bg: None,
            bold: false,
            italic: false,
            underline: false,
        }
    }

    /// Same style, bold.
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Same style, italic.
    pub const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Same style, underlined.
    pub const fn underline(mut self) -> Self {
        self.underline = true;
        self
    }
}

/// Name of the style used when a requested style is not found.
pub const DEFAULT_STYLE_NAME: &str = "default";

/// A named token-kind to text-style table.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightStyle {
    name: String,
    background: Color,
    foreground: Color,
    styles: HashMap<TokenKind, TextStyle>,
}

impl HighlightStyle {
    /// Names of the built-in styles.
    pub const BUILTIN: [&'static str; 3] = ["default", "monokai", "solarized-light"];

    /// Create an empty style with the given base colors.
    pub fn new(name: impl Into<String>, foreground: Color, background: Color) -> Self {
        Self {
            name: name.into(),
            background,
            foreground,
            styles: HashMap::new(),
        }
    }

    /// Builder-style setter for one token kind.
    pub fn with(mut self, kind: TokenKind, style: TextStyle) -> Self {
        self.styles.insert(kind, style);
        self
    }

    /// Look up a built-in style by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default_style()),
            "monokai" => Some(Self::monokai()),
            "solarized-light" => Some(Self::solarized_light()),
            _ => None,
        }
    }

    /// Look up a built-in style, falling back to `default` with a warning.
    pub fn resolve(name: &str) -> Self {
        Self::by_name(name).unwrap_or_else(|| {
            tracing::warn!(target: "textview_core::style", style = name, "highlight style not found; using default");
            Self::default_style()
        })
    }

    /// The style name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Background color of the text area.
    pub fn background(&self) -> Color {
        self.background
    }

    /// Default text color.
    pub fn foreground(&self) -> Color {
        self.foreground
    }

    /// Style for `kind`; kinds without an entry get plain text in the foreground color.
    pub fn style_for(&self, kind: TokenKind) -> TextStyle {
        self.styles
            .get(&kind)
            .copied()
            .unwrap_or(TextStyle::fg(self.foreground))
    }

    fn default_style() -> Self {
        Self::new("default", Color::rgb(0x20, 0x20, 0x20), Color::rgb(0xff, 0xff, 0xff))
            .with(TokenKind::Keyword, TextStyle::fg(Color::rgb(0x00, 0x20, 0x80)).bold())
            .with(TokenKind::Type, TextStyle::fg(Color::rgb(0x20, 0x60, 0x80)))
            .with(TokenKind::Function, TextStyle::fg(Color::rgb(0x60, 0x20, 0x80)))
            .with(TokenKind::String, TextStyle::fg(Color::rgb(0xa0, 0x20, 0x20)))
            .with(TokenKind::Number, TextStyle::fg(Color::rgb(0x00, 0x80, 0x00)))
            .with(TokenKind::Constant, TextStyle::fg(Color::rgb(0x80, 0x00, 0x80)))
            .with(TokenKind::Comment, TextStyle::fg(Color::rgb(0x40, 0x80, 0x80)).italic())
            .with(TokenKind::Attribute, TextStyle::fg(Color::rgb(0x80, 0x60, 0x00)))
            .with(TokenKind::Heading, TextStyle::fg(Color::rgb(0x00, 0x00, 0x80)).bold())
            .with(TokenKind::Link, TextStyle::fg(Color::rgb(0x00, 0x00, 0xff)).underline())
            .with(
                TokenKind::Error,
                TextStyle {
                    bg: Some(Color::rgb(0xff, 0xd0, 0xd0)),
                    ..TextStyle::fg(Color::rgb(0xa0, 0x00, 0x00))
                },
            )
    }

    fn monokai() -> Self {
        Self::new("monokai", Color::rgb(0xf8, 0xf8, 0xf2), Color::rgb(0x27, 0x28, 0x22))
            .with(TokenKind::Keyword, TextStyle::fg(Color::rgb(0xf9, 0x26, 0x72)))
            .with(TokenKind::Type, TextStyle::fg(Color::rgb(0x66, 0xd9, 0xef)).italic())
            .with(TokenKind::Function, TextStyle::fg(Color::rgb(0xa6, 0xe2, 0x2e)))
            .with(TokenKind::String, TextStyle::fg(Color::rgb(0xe6, 0xdb, 0x74)))
            .with(TokenKind::Number, TextStyle::fg(Color::rgb(0xae, 0x81, 0xff)))
            .with(TokenKind::Constant, TextStyle::fg(Color::rgb(0xae, 0x81, 0xff)))
            .with(TokenKind::Comment, TextStyle::fg(Color::rgb(0x75, 0x71, 0x5e)))
            .with(TokenKind::Attribute, TextStyle::fg(Color::rgb(0xa6, 0xe2, 0x2e)))
            .with(TokenKind::Heading, TextStyle::fg(Color::rgb(0xf9, 0x26, 0x72)).bold())
            .with(TokenKind::Link, TextStyle::fg(Color::rgb(0x66, 0xd9, 0xef)).underline())
            .with(
                TokenKind::Error,
                TextStyle {
                    bg: Some(Color::rgb(0xf9, 0x26, 0x72)),
                    ..TextStyle::fg(Color::rgb(0xf8, 0xf8, 0xf0))
                },
            )
    }

    fn solarized_light() -> Self {
        Self::new("solarized-light", Color::rgb(0x65, 0x7b, 0x83), Color::rgb(0xfd, 0xf6, 0xe3))
            .with(TokenKind::Keyword, TextStyle::fg(Color::rgb(0x85, 0x99, 0x00)))
            .with(TokenKind::Type, TextStyle::fg(Color::rgb(0xb5, 0x89, 0x00)))
            .with(TokenKind::Function, TextStyle::fg(Color::rgb(0x26, 0x8b, 0xd2)))
            .with(TokenKind::String, TextStyle::fg(Color::rgb(0x2a, 0xa1, 0x98)))
            .with(TokenKind::Number, TextStyle::fg(Color::rgb(0xd3, 0x36, 0x82)))
            .with(TokenKind::Constant, TextStyle::fg(Color::rgb(0xcb, 0x4b, 0x16)))
            .with(TokenKind::Comment, TextStyle::fg(Color::rgb(0x93, 0xa1, 0xa1)).italic())
            .with(TokenKind::Attribute, TextStyle::fg(Color::rgb(0x6c, 0x71, 0xc4)))
            .with(TokenKind::Heading, TextStyle::fg(Color::rgb(0xcb, 0x4b, 0x16)).bold())
            .with(TokenKind::Link, TextStyle::fg(Color::rgb(0x26, 0x8b, 0xd2)).underline())
            .with(TokenKind::Error, TextStyle::fg(Color::rgb(0xdc, 0x32, 0x2f)).bold())
    }
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self::default_style()
    }
}
