//! `Key` — a parsed, comparable representation of a keybinding literal such
//! as `"ctrl+c"` or `"shift+tab"`, as written in `config.toml` and as
//! translated from terminal input events by `core-actions`.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Escape,
    Enter,
    Tab,
    BackTab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized key literal: {0:?}")]
pub struct ParseKeyError(String);

impl FromStr for Key {
    type Err = ParseKeyError;

    fn from_str(literal: &str) -> Result<Self, Self::Err> {
        let mut modifiers = KeyModifiers::default();
        let mut last = None;
        for part in literal.split('+') {
            match part {
                "ctrl" => modifiers.ctrl = true,
                "shift" => modifiers.shift = true,
                "alt" => modifiers.alt = true,
                other => last = Some(other),
            }
        }
        let name = last.ok_or_else(|| ParseKeyError(literal.to_string()))?;
        let code = match name {
            "escape" => KeyCode::Escape,
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "shift+tab" => KeyCode::BackTab,
            "backspace" => KeyCode::Backspace,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            "delete" => KeyCode::Delete,
            "space" => KeyCode::Char(' '),
            single if single.chars().count() == 1 => {
                KeyCode::Char(single.chars().next().unwrap())
            }
            _ => return Err(ParseKeyError(literal.to_string())),
        };
        // `shift+tab` is conventionally written as a single literal token
        // (matching crossterm's dedicated BackTab code) rather than
        // `shift` + `tab`, so strip the modifier we'd otherwise double-count.
        if matches!(code, KeyCode::BackTab) {
            modifiers.shift = false;
        }
        Ok(Key { code, modifiers })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.modifiers.ctrl {
            parts.push("ctrl".to_string());
        }
        if self.modifiers.alt {
            parts.push("alt".to_string());
        }
        if self.modifiers.shift && !matches!(self.code, KeyCode::BackTab) {
            parts.push("shift".to_string());
        }
        let name = match self.code {
            KeyCode::Char(' ') => "space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Escape => "escape".to_string(),
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Tab => "tab".to_string(),
            KeyCode::BackTab => "shift+tab".to_string(),
            KeyCode::Backspace => "backspace".to_string(),
            KeyCode::Up => "up".to_string(),
            KeyCode::Down => "down".to_string(),
            KeyCode::Left => "left".to_string(),
            KeyCode::Right => "right".to_string(),
            KeyCode::Home => "home".to_string(),
            KeyCode::End => "end".to_string(),
            KeyCode::PageUp => "pageup".to_string(),
            KeyCode::PageDown => "pagedown".to_string(),
            KeyCode::Delete => "delete".to_string(),
        };
        parts.push(name);
        write!(f, "{}", parts.join("+"))
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_char() {
        let key: Key = "j".parse().unwrap();
        assert_eq!(key.code, KeyCode::Char('j'));
        assert!(!key.modifiers.ctrl);
    }

    #[test]
    fn parses_modified_key() {
        let key: Key = "ctrl+c".parse().unwrap();
        assert_eq!(key.code, KeyCode::Char('c'));
        assert!(key.modifiers.ctrl);
    }

    #[test]
    fn parses_shift_tab_as_backtab() {
        let key: Key = "shift+tab".parse().unwrap();
        assert_eq!(key.code, KeyCode::BackTab);
        assert!(!key.modifiers.shift);
    }

    #[test]
    fn parses_space_literal() {
        let key: Key = "space".parse().unwrap();
        assert_eq!(key.code, KeyCode::Char(' '));
    }

    #[test]
    fn rejects_unknown_literal() {
        assert!("nonsense-key".parse::<Key>().is_err());
    }

    #[test]
    fn display_round_trips_modified_key() {
        let key: Key = "ctrl+a".parse().unwrap();
        assert_eq!(key.to_string(), "ctrl+a");
    }
}
