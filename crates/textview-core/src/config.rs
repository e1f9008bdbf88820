//! View options and theme.
//!
//! Both are plain serde structs with `#[serde(default)]`, so a JSON document only needs the
//! fields it changes. Values out of range are clamped (and logged) by `from_json` rather
//! than rejected. The theme is passed to each view explicitly; there is no global style table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keymap::{KeyFunction, KeyMap, ParseChordError};
use crate::layout::{FontMetrics, WrapMode};
use crate::style::{Color, DEFAULT_STYLE_NAME};

/// Largest accepted tab width.
pub const MAX_TAB_WIDTH: usize = 16;

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    /// The document is not valid JSON for the target type.
    Json(#[from] serde_json::Error),
    #[error("invalid key binding: {0}")]
    /// A key override names a chord that does not parse.
    Chord(#[from] ParseChordError),
    #[error("unknown key map `{0}`")]
    /// `keymap` names no built-in map.
    UnknownKeyMap(String),
}

/// Behavioural options of one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Indent a new line like the previous one (plus or minus a level on block tokens).
    pub auto_indent: bool,
    /// Indent with spaces instead of tabs.
    pub space_indent: bool,
    /// Tab stop width and spaces per indent level.
    pub tab_width: usize,
    /// Show the line-number gutter.
    pub line_numbers: bool,
    /// Offer completions while typing.
    pub completion: bool,
    /// Typing an opening bracket inserts the closing one too.
    pub auto_close_brackets: bool,
    /// Wrapping of long lines.
    pub wrap: WrapMode,
    /// Refuse edits; navigation, selection, copy and search still work.
    pub read_only: bool,
    /// Cursor blink half-period in milliseconds; 0 keeps the cursor solid.
    pub cursor_blink_ms: u64,
    /// Built-in key map to start from (`standard` or `emacs`).
    pub keymap: String,
    /// Chord → function overrides applied on top of `keymap`.
    pub key_overrides: BTreeMap<String, KeyFunction>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            auto_indent: true,
            space_indent: false,
            tab_width: 4,
            line_numbers: false,
            completion: true,
            auto_close_brackets: true,
            wrap: WrapMode::Word,
            read_only: false,
            cursor_blink_ms: 500,
            keymap: "standard".to_string(),
            key_overrides: BTreeMap::new(),
        }
    }
}

impl EditorOptions {
    /// Parse options from JSON and clamp out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let opts: EditorOptions = serde_json::from_str(json)?;
        Ok(opts.validated())
    }

    /// Clamp out-of-range values, logging each correction.
    pub fn validated(mut self) -> Self {
        let clamped = self.tab_width.clamp(1, MAX_TAB_WIDTH);
        if clamped != self.tab_width {
            tracing::warn!(target: "textview_core::config", tab_width = self.tab_width, clamped, "tab width out of range");
            self.tab_width = clamped;
        }
        self
    }

    /// The key map these options describe.
    pub fn build_keymap(&self) -> Result<KeyMap, ConfigError> {
        let mut map = KeyMap::by_name(&self.keymap)
            .ok_or_else(|| ConfigError::UnknownKeyMap(self.keymap.clone()))?;
        map.apply_overrides(self.key_overrides.iter().map(|(k, f)| (k.as_str(), *f)))?;
        Ok(map)
    }
}

/// Visual parameters of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Font measurements.
    pub metrics: FontMetrics,
    /// Name of the highlight style.
    pub highlight_style: String,
    /// Width of the cursor bar in pixels.
    pub cursor_width: f32,
    /// Cursor color.
    pub cursor_color: Color,
    /// Selection background.
    pub selection_color: Color,
    /// Search-match background.
    pub highlight_color: Color,
    /// Line-number foreground.
    pub line_number_color: Color,
    /// Gutter background.
    pub line_number_background: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            metrics: FontMetrics::default(),
            highlight_style: DEFAULT_STYLE_NAME.to_string(),
            cursor_width: 2.0,
            cursor_color: Color::rgb(0x20, 0x20, 0x20),
            selection_color: Color::rgba(0x4a, 0x90, 0xe2, 0x60),
            highlight_color: Color::rgba(0xff, 0xd7, 0x00, 0x60),
            line_number_color: Color::rgb(0x80, 0x80, 0x80),
            line_number_background: Color::rgb(0xf0, 0xf0, 0xf0),
        }
    }
}

impl Theme {
    /// Parse a theme from JSON and replace unusable metrics with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let theme: Theme = serde_json::from_str(json)?;
        Ok(theme.validated())
    }

    /// Replace non-positive font metrics with the defaults, logging the correction.
    pub fn validated(mut self) -> Self {
        let m = self.metrics;
        if !(m.char_width > 0.0 && m.line_height > 0.0) {
            tracing::warn!(target: "textview_core::config", char_width = m.char_width, line_height = m.line_height, "invalid font metrics; using defaults");
            self.metrics = FontMetrics::default();
        }
        if !(self.cursor_width > 0.0) {
            self.cursor_width = Theme::default().cursor_width;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_options_keep_defaults() {
        let opts = EditorOptions::from_json(r#"{"space_indent": true, "wrap": "char"}"#).unwrap();
        assert!(opts.space_indent);
        assert_eq!(opts.wrap, WrapMode::Char);
        assert!(opts.auto_indent);
        assert_eq!(opts.tab_width, 4);
    }

    #[test]
    fn test_tab_width_is_clamped() {
        let opts = EditorOptions::from_json(r#"{"tab_width": 0}"#).unwrap();
        assert_eq!(opts.tab_width, 1);
        let opts = EditorOptions::from_json(r#"{"tab_width": 99}"#).unwrap();
        assert_eq!(opts.tab_width, MAX_TAB_WIDTH);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            EditorOptions::from_json("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_build_keymap_with_overrides() {
        let opts = EditorOptions::from_json(
            r#"{"keymap": "emacs", "key_overrides": {"Control+J": "recenter"}}"#,
        )
        .unwrap();
        let map = opts.build_keymap().unwrap();
        assert_eq!(
            map.lookup(&"Control+J".parse().unwrap()),
            Some(KeyFunction::Recenter)
        );

        let opts = EditorOptions {
            keymap: "vi".into(),
            ..EditorOptions::default()
        };
        assert!(matches!(
            opts.build_keymap(),
            Err(ConfigError::UnknownKeyMap(_))
        ));
    }

    #[test]
    fn test_theme_from_json_fixes_metrics() {
        let theme = Theme::from_json(
            r#"{"metrics": {"char_width": 0}, "highlight_style": "monokai",
                "selection_color": {"r": 1, "g": 2, "b": 3}}"#,
        )
        .unwrap();
        assert_eq!(theme.metrics, FontMetrics::default());
        assert_eq!(theme.highlight_style, "monokai");
        assert_eq!(theme.selection_color, Color::rgb(1, 2, 3));
    }
}
