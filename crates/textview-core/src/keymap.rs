//! Key chords and the chord → command map.
//!
//! A [`KeyChord`] is a platform-independent key plus modifiers, written in text as
//! `"Shift+Control+Z"`. A [`KeyMap`] maps chords to [`KeyFunction`]s; several chords may map
//! to the same function. Shifted navigation chords fall back to their unshifted binding, and
//! the view reads the shift flag to extend the selection.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a textual key chord.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseChordError {
    #[error("empty key chord")]
    /// The chord string was empty.
    Empty,
    #[error("unknown modifier `{0}`")]
    /// A `+`-separated prefix was not a modifier name.
    UnknownModifier(String),
    #[error("unknown key `{0}`")]
    /// The final component was not a key name or single character.
    UnknownKey(String),
}

/// A key, independent of the platform's key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key. ASCII letters are stored uppercase inside chords.
    Char(char),
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Home.
    Home,
    /// End.
    End,
    /// Tab.
    Tab,
    /// Return / Enter.
    Enter,
    /// Keypad Enter.
    KeypadEnter,
    /// Escape.
    Escape,
    /// Backspace (delete backward).
    Backspace,
    /// Forward delete.
    Delete,
    /// Space bar.
    Space,
    /// Function key `F1`..`F12`.
    F(u8),
}

impl Key {
    fn name(&self) -> String {
        match self {
            Key::Char(c) => c.to_string(),
            Key::Up => "UpArrow".into(),
            Key::Down => "DownArrow".into(),
            Key::Left => "LeftArrow".into(),
            Key::Right => "RightArrow".into(),
            Key::PageUp => "PageUp".into(),
            Key::PageDown => "PageDown".into(),
            Key::Home => "Home".into(),
            Key::End => "End".into(),
            Key::Tab => "Tab".into(),
            Key::Enter => "ReturnEnter".into(),
            Key::KeypadEnter => "KeypadEnter".into(),
            Key::Escape => "Escape".into(),
            Key::Backspace => "DeleteBackspace".into(),
            Key::Delete => "DeleteForward".into(),
            Key::Space => "Spacebar".into(),
            Key::F(n) => format!("F{n}"),
        }
    }

    fn parse(s: &str) -> Option<Key> {
        let key = match s {
            "UpArrow" | "Up" => Key::Up,
            "DownArrow" | "Down" => Key::Down,
            "LeftArrow" | "Left" => Key::Left,
            "RightArrow" | "Right" => Key::Right,
            "PageUp" => Key::PageUp,
            "PageDown" => Key::PageDown,
            "Home" => Key::Home,
            "End" => Key::End,
            "Tab" => Key::Tab,
            "ReturnEnter" | "Enter" | "Return" => Key::Enter,
            "KeypadEnter" => Key::KeypadEnter,
            "Escape" | "Esc" => Key::Escape,
            "DeleteBackspace" | "Backspace" => Key::Backspace,
            "DeleteForward" | "Delete" => Key::Delete,
            "Spacebar" | "Space" => Key::Space,
            _ => {
                if let Some(n) = s.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
                    if (1..=12).contains(&n) {
                        return Some(Key::F(n));
                    }
                }
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }

    fn normalized(self) -> Key {
        match self {
            Key::Char(' ') => Key::Space,
            Key::Char(c) if c.is_ascii_lowercase() => Key::Char(c.to_ascii_uppercase()),
            other => other,
        }
    }
}

/// Modifier keys held with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Shift.
    pub shift: bool,
    /// Control.
    pub control: bool,
    /// Alt / Option.
    pub alt: bool,
    /// Meta / Command / Super.
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers.
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };
    /// Shift only.
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };
    /// Control only.
    pub const CONTROL: Modifiers = Modifiers {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };
    /// Alt only.
    pub const ALT: Modifiers = Modifiers {
        shift: false,
        control: false,
        alt: true,
        meta: false,
    };

    /// Returns true if no modifier is held.
    pub fn is_empty(&self) -> bool {
        !self.shift && !self.control && !self.alt && !self.meta
    }

    /// Returns true if Control or Meta is held; such keys never insert text.
    pub fn has_command(&self) -> bool {
        self.control || self.meta
    }

    /// Same modifiers with shift cleared.
    pub fn without_shift(self) -> Self {
        Self {
            shift: false,
            ..self
        }
    }
}

/// A key together with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    /// The key.
    pub key: Key,
    /// Held modifiers.
    pub modifiers: Modifiers,
}

impl KeyChord {
    /// Create a chord. Letters are normalised so `Control+a` and `Control+A` are equal.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key: key.normalized(),
            modifiers,
        }
    }

    /// A chord with no modifiers.
    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// A chord with Control held.
    pub fn ctrl(key: Key) -> Self {
        Self::new(key, Modifiers::CONTROL)
    }

    /// Same chord with shift cleared.
    pub fn without_shift(self) -> Self {
        Self {
            key: self.key,
            modifiers: self.modifiers.without_shift(),
        }
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (held, name) in [
            (m.shift, "Shift"),
            (m.control, "Control"),
            (m.alt, "Alt"),
            (m.meta, "Meta"),
        ] {
            if held {
                write!(f, "{name}+")?;
            }
        }
        f.write_str(&self.key.name())
    }
}

impl FromStr for KeyChord {
    type Err = ParseChordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseChordError::Empty);
        }
        // A trailing "+" is the plus key itself, as in "Shift+Control++".
        let (mods, key) = match s.strip_suffix("++") {
            Some(head) => (head, "+"),
            None if s == "+" => ("", "+"),
            None => match s.rfind('+') {
                Some(i) => (&s[..i], &s[i + 1..]),
                None => ("", s),
            },
        };
        let mut modifiers = Modifiers::NONE;
        for part in mods.split('+').filter(|p| !p.is_empty()) {
            match part {
                "Shift" => modifiers.shift = true,
                "Control" | "Ctrl" => modifiers.control = true,
                "Alt" | "Option" => modifiers.alt = true,
                "Meta" | "Command" | "Cmd" | "Super" => modifiers.meta = true,
                other => return Err(ParseChordError::UnknownModifier(other.to_string())),
            }
        }
        let key = Key::parse(key).ok_or_else(|| ParseChordError::UnknownKey(key.to_string()))?;
        Ok(KeyChord::new(key, modifiers))
    }
}

/// A key press as delivered by the host: the chord plus the character it produced, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The chord that was pressed.
    pub chord: KeyChord,
    /// The printable character the key produced (already shifted), if any.
    pub text: Option<char>,
}

impl KeyEvent {
    /// A key event for `key` with `modifiers` and no text.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self {
            chord: KeyChord::new(key, modifiers),
            text: None,
        }
    }

    /// A typed character with no modifiers other than shift.
    pub fn char(ch: char) -> Self {
        let modifiers = if ch.is_uppercase() {
            Modifiers::SHIFT
        } else {
            Modifiers::NONE
        };
        Self {
            chord: KeyChord::new(Key::Char(ch), modifiers),
            text: Some(ch),
        }
    }

    /// Parse `chord` and attach no text. Intended for tests and scripted input.
    pub fn parse(chord: &str) -> Result<Self, ParseChordError> {
        Ok(Self {
            chord: chord.parse()?,
            text: None,
        })
    }

    /// Returns true if shift is held.
    pub fn shift(&self) -> bool {
        self.chord.modifiers.shift
    }
}

/// Logical commands a key chord can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFunction {
    /// Cursor up one visual line.
    MoveUp,
    /// Cursor down one visual line.
    MoveDown,
    /// Cursor forward one character.
    MoveRight,
    /// Cursor back one character.
    MoveLeft,
    /// Cursor up one page.
    PageUp,
    /// Cursor down one page.
    PageDown,
    /// Start of line.
    Home,
    /// End of line.
    End,
    /// Start of document.
    DocHome,
    /// End of document.
    DocEnd,
    /// Next word.
    WordRight,
    /// Previous word.
    WordLeft,
    /// Tab: indent or insert a tab.
    FocusNext,
    /// Shift+Tab; left for the parent widget.
    FocusPrev,
    /// Newline.
    Enter,
    /// Accept and leave; left for the parent widget.
    Accept,
    /// Cancel search or selection.
    CancelSelect,
    /// Toggle select mode.
    SelectMode,
    /// Select the whole document.
    SelectAll,
    /// Escape.
    Abort,
    /// Copy the selection.
    Copy,
    /// Cut the selection.
    Cut,
    /// Paste the clipboard.
    Paste,
    /// Delete backward.
    Backspace,
    /// Delete forward.
    Delete,
    /// Delete to end of line.
    Kill,
    /// Undo.
    Undo,
    /// Redo.
    Redo,
    /// Cycle the cursor line through bottom, center and top of the view.
    Recenter,
    /// Offer completions now.
    Complete,
    /// Start or continue interactive search.
    Search,
}

impl KeyFunction {
    /// Returns true for commands that work on read-only views.
    pub fn is_universal(&self) -> bool {
        matches!(
            self,
            KeyFunction::MoveUp
                | KeyFunction::MoveDown
                | KeyFunction::MoveRight
                | KeyFunction::MoveLeft
                | KeyFunction::PageUp
                | KeyFunction::PageDown
                | KeyFunction::Home
                | KeyFunction::End
                | KeyFunction::DocHome
                | KeyFunction::DocEnd
                | KeyFunction::WordRight
                | KeyFunction::WordLeft
                | KeyFunction::SelectMode
                | KeyFunction::CancelSelect
                | KeyFunction::SelectAll
                | KeyFunction::Copy
                | KeyFunction::Search
                | KeyFunction::Abort
                | KeyFunction::Recenter
        )
    }
}

/// A chord → function map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap {
    name: String,
    bindings: HashMap<KeyChord, KeyFunction>,
}

const NAV_STANDARD: &[(&str, KeyFunction)] = &[
    ("UpArrow", KeyFunction::MoveUp),
    ("DownArrow", KeyFunction::MoveDown),
    ("RightArrow", KeyFunction::MoveRight),
    ("LeftArrow", KeyFunction::MoveLeft),
    ("PageUp", KeyFunction::PageUp),
    ("Control+UpArrow", KeyFunction::PageUp),
    ("PageDown", KeyFunction::PageDown),
    ("Control+DownArrow", KeyFunction::PageDown),
    ("Home", KeyFunction::Home),
    ("Alt+LeftArrow", KeyFunction::Home),
    ("End", KeyFunction::End),
    ("Alt+RightArrow", KeyFunction::End),
    ("Control+Home", KeyFunction::DocHome),
    ("Alt+Home", KeyFunction::DocHome),
    ("Control+End", KeyFunction::DocEnd),
    ("Alt+End", KeyFunction::DocEnd),
    ("Control+RightArrow", KeyFunction::WordRight),
    ("Control+LeftArrow", KeyFunction::WordLeft),
    ("Tab", KeyFunction::FocusNext),
    ("Shift+Tab", KeyFunction::FocusPrev),
    ("ReturnEnter", KeyFunction::Enter),
    ("KeypadEnter", KeyFunction::Enter),
    ("Control+ReturnEnter", KeyFunction::Accept),
    ("Escape", KeyFunction::Abort),
    ("DeleteBackspace", KeyFunction::Backspace),
    ("DeleteForward", KeyFunction::Delete),
    ("Control+Spacebar", KeyFunction::SelectMode),
    ("Control+G", KeyFunction::CancelSelect),
    ("Control+K", KeyFunction::Kill),
    ("Control+Z", KeyFunction::Undo),
    ("Shift+Control+Z", KeyFunction::Redo),
    ("Control+L", KeyFunction::Recenter),
    ("Control+.", KeyFunction::Complete),
];

const STANDARD: &[(&str, KeyFunction)] = &[
    ("Control+A", KeyFunction::SelectAll),
    ("Shift+Control+A", KeyFunction::CancelSelect),
    ("Control+C", KeyFunction::Copy),
    ("Control+X", KeyFunction::Cut),
    ("Control+V", KeyFunction::Paste),
    ("Control+Y", KeyFunction::Redo),
    ("Alt+S", KeyFunction::Search),
    ("Control+F", KeyFunction::Search),
];

const EMACS: &[(&str, KeyFunction)] = &[
    ("Control+P", KeyFunction::MoveUp),
    ("Control+N", KeyFunction::MoveDown),
    ("Control+F", KeyFunction::MoveRight),
    ("Control+B", KeyFunction::MoveLeft),
    ("Control+U", KeyFunction::PageUp),
    ("Control+V", KeyFunction::PageDown),
    ("Control+A", KeyFunction::Home),
    ("Control+E", KeyFunction::End),
    ("Alt+<", KeyFunction::DocHome),
    ("Alt+>", KeyFunction::DocEnd),
    ("Alt+A", KeyFunction::SelectAll),
    ("Control+D", KeyFunction::Delete),
    ("Alt+W", KeyFunction::Copy),
    ("Control+W", KeyFunction::Cut),
    ("Control+Y", KeyFunction::Paste),
    ("Control+/", KeyFunction::Undo),
    ("Control+S", KeyFunction::Search),
];

impl KeyMap {
    fn from_tables(name: &str, tables: &[&[(&str, KeyFunction)]]) -> Self {
        let mut map = KeyMap {
            name: name.to_string(),
            bindings: HashMap::new(),
        };
        for table in tables {
            for (chord, func) in table.iter() {
                match chord.parse() {
                    Ok(chord) => {
                        map.bindings.insert(chord, *func);
                    }
                    Err(err) => {
                        tracing::error!(target: "textview_core::keymap", %err, chord, "bad built-in chord")
                    }
                }
            }
        }
        map
    }

    /// Linux/Windows style bindings (`Control+C` copies, `Control+F` searches).
    pub fn standard() -> Self {
        Self::from_tables("standard", &[NAV_STANDARD, STANDARD])
    }

    /// Emacs style navigation on top of the standard arrows; emacs wins in conflicts.
    pub fn emacs() -> Self {
        Self::from_tables("emacs", &[NAV_STANDARD, EMACS])
    }

    /// A built-in map by name (`"standard"` or `"emacs"`).
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            "emacs" => Some(Self::emacs()),
            _ => None,
        }
    }

    /// Name of the preset this map started from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if there are no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bind `chord` to `func`, returning the function it was bound to before.
    pub fn bind(&mut self, chord: KeyChord, func: KeyFunction) -> Option<KeyFunction> {
        self.bindings.insert(chord, func)
    }

    /// Remove the binding for `chord`.
    pub fn unbind(&mut self, chord: &KeyChord) -> Option<KeyFunction> {
        self.bindings.remove(chord)
    }

    /// Apply textual overrides such as `("Control+J", KeyFunction::Search)`.
    pub fn apply_overrides<'a, I>(&mut self, overrides: I) -> Result<usize, ParseChordError>
    where
        I: IntoIterator<Item = (&'a str, KeyFunction)>,
    {
        let mut n = 0;
        for (chord, func) in overrides {
            self.bind(chord.parse()?, func);
            n += 1;
        }
        Ok(n)
    }

    /// The function for `chord`. A shifted chord without its own binding uses the unshifted one.
    pub fn lookup(&self, chord: &KeyChord) -> Option<KeyFunction> {
        if let Some(func) = self.bindings.get(chord) {
            return Some(*func);
        }
        if chord.modifiers.shift {
            return self.bindings.get(&chord.without_shift()).copied();
        }
        None
    }

    /// The first chord (in display order) bound to `func`.
    pub fn chord_for(&self, func: KeyFunction) -> Option<KeyChord> {
        self.bindings
            .iter()
            .filter(|(_, f)| **f == func)
            .map(|(c, _)| *c)
            .min_by_key(|c| c.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_chord() {
        let chord: KeyChord = "Shift+Control+Z".parse().unwrap();
        assert_eq!(chord.key, Key::Char('Z'));
        assert!(chord.modifiers.shift && chord.modifiers.control);
        assert_eq!(chord.to_string(), "Shift+Control+Z");

        let chord: KeyChord = "Ctrl+a".parse().unwrap();
        assert_eq!(chord, KeyChord::ctrl(Key::Char('A')));
        assert_eq!("Control+Spacebar".parse::<KeyChord>().unwrap().key, Key::Space);
        assert_eq!("F10".parse::<KeyChord>().unwrap().key, Key::F(10));
        assert_eq!("Shift+Control++".parse::<KeyChord>().unwrap().key, Key::Char('+'));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<KeyChord>(), Err(ParseChordError::Empty));
        assert_eq!(
            "Hyper+A".parse::<KeyChord>(),
            Err(ParseChordError::UnknownModifier("Hyper".into()))
        );
        assert_eq!(
            "Control+Banana".parse::<KeyChord>(),
            Err(ParseChordError::UnknownKey("Banana".into()))
        );
    }

    #[test]
    fn test_shift_falls_back_to_unshifted_binding() {
        let map = KeyMap::standard();
        let shifted = KeyChord::new(Key::Right, Modifiers::SHIFT);
        assert_eq!(map.lookup(&shifted), Some(KeyFunction::MoveRight));
        let redo: KeyChord = "Shift+Control+Z".parse().unwrap();
        assert_eq!(map.lookup(&redo), Some(KeyFunction::Redo));
        assert_eq!(map.lookup(&KeyChord::plain(Key::F(3))), None);
    }

    #[test]
    fn test_emacs_overrides_standard_chords() {
        let map = KeyMap::emacs();
        assert_eq!(
            map.lookup(&KeyChord::ctrl(Key::Char('f'))),
            Some(KeyFunction::MoveRight)
        );
        assert_eq!(map.lookup(&KeyChord::plain(Key::Up)), Some(KeyFunction::MoveUp));
        assert_eq!(map.name(), "emacs");
    }

    #[test]
    fn test_overrides() {
        let mut map = KeyMap::standard();
        let n = map
            .apply_overrides([("Control+J", KeyFunction::Search)])
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(
            map.lookup(&KeyChord::ctrl(Key::Char('J'))),
            Some(KeyFunction::Search)
        );
        assert!(map.apply_overrides([("Nope+J", KeyFunction::Undo)]).is_err());
    }

    #[test]
    fn test_key_function_serde_names() {
        let json = serde_json::to_string(&KeyFunction::DocHome).unwrap();
        assert_eq!(json, "\"doc_home\"");
        let func: KeyFunction = serde_json::from_str("\"select_all\"").unwrap();
        assert_eq!(func, KeyFunction::SelectAll);
    }
}
