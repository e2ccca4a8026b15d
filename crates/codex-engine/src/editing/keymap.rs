//! Key bindings.
//!
//! Bindings use the `Shift-Mod-z` notation, where `Mod` is the platform's
//! primary modifier (Cmd on macOS, Ctrl elsewhere).

use super::commands::Cmd;
use crate::model::Mark;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Tab,
    Enter,
    Backspace,
    Char(char),
}

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub code: KeyCode,
    pub shift: bool,
    pub primary: bool,
}

impl Key {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            shift: false,
            primary: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Parse a binding such as `Shift-Tab` or `Mod-b`.
    pub fn parse(binding: &str) -> Option<Self> {
        let mut parts: Vec<&str> = binding.split('-').collect();
        // `Mod--` binds the minus key itself
        if binding.ends_with("--") {
            parts.truncate(parts.len() - 2);
            parts.push("-");
        }
        let (name, modifiers) = parts.split_last()?;
        let code = match *name {
            "Tab" => KeyCode::Tab,
            "Enter" => KeyCode::Enter,
            "Backspace" => KeyCode::Backspace,
            other => {
                let mut chars = other.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                KeyCode::Char(c)
            }
        };
        let mut key = Key::new(code);
        for modifier in modifiers {
            match *modifier {
                "Shift" => key.shift = true,
                "Mod" | "Ctrl" | "Cmd" => key.primary = true,
                _ => return None,
            }
        }
        Some(key)
    }
}

/// The command bound to `key`, if any.
pub fn command_for_key(key: &Key, tab_size: usize) -> Option<Cmd> {
    let cmd = match (key.code, key.shift, key.primary) {
        (KeyCode::Tab, false, false) => Cmd::Tab { tab_size },
        (KeyCode::Tab, true, false) => Cmd::ShiftTab { tab_size },
        (KeyCode::Enter, false, false) => Cmd::SplitBlock,
        (KeyCode::Backspace, false, false) => Cmd::Backspace,
        (KeyCode::Char(c), false, true) => match c.to_ascii_lowercase() {
            'b' => Cmd::ToggleMark { mark: Mark::Strong },
            'i' => Cmd::ToggleMark { mark: Mark::Em },
            'u' => Cmd::ToggleMark {
                mark: Mark::Underline,
            },
            '`' => Cmd::ToggleMark { mark: Mark::Code },
            'z' => Cmd::Undo,
            'y' => Cmd::Redo,
            _ => return None,
        },
        (KeyCode::Char(c), true, true) if c.eq_ignore_ascii_case(&'z') => Cmd::Redo,
        _ => return None,
    };
    Some(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Tab", Cmd::Tab { tab_size: 4 })]
    #[case("Shift-Tab", Cmd::ShiftTab { tab_size: 4 })]
    #[case("Mod-b", Cmd::ToggleMark { mark: Mark::Strong })]
    #[case("Mod-i", Cmd::ToggleMark { mark: Mark::Em })]
    #[case("Mod-u", Cmd::ToggleMark { mark: Mark::Underline })]
    #[case("Mod-`", Cmd::ToggleMark { mark: Mark::Code })]
    #[case("Mod-z", Cmd::Undo)]
    #[case("Mod-y", Cmd::Redo)]
    #[case("Shift-Mod-z", Cmd::Redo)]
    #[case("Enter", Cmd::SplitBlock)]
    #[case("Backspace", Cmd::Backspace)]
    fn test_bindings(#[case] binding: &str, #[case] expected: Cmd) {
        let key = Key::parse(binding).unwrap();
        assert_eq!(command_for_key(&key, 4), Some(expected));
    }

    #[test]
    fn test_unbound_keys() {
        assert_eq!(command_for_key(&Key::new(KeyCode::Char('b')), 4), None);
        assert_eq!(command_for_key(&Key::parse("Mod-q").unwrap(), 4), None);
    }

    #[rstest]
    #[case("Hyper-a")]
    #[case("Mod-ab")]
    #[case("")]
    fn test_parse_rejects(#[case] binding: &str) {
        assert_eq!(Key::parse(binding), None);
    }

    #[test]
    fn test_parse_minus_key() {
        let key = Key::parse("Mod--").unwrap();
        assert_eq!(key, Key::new(KeyCode::Char('-')).with_primary());
    }
}
