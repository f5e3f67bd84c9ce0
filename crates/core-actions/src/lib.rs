//! Key event → command dispatch: translates a terminal key event into a
//! configured command name and runs it against an `Editor`. Flat by
//! design — there is no modal state, unlike a text editor's keymap.

use core_config::keys::{KeyCode as CfgKeyCode, KeyModifiers as CfgKeyModifiers};
use core_config::{Config, ConfigError, Key as CfgKey};
use core_events::{Event, KeyCode as CtKeyCode, KeyEvent, KeyModifiers as CtKeyModifiers};
use core_state::Editor;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Exit,
}

pub struct Dispatcher {
    keymap: HashMap<CfgKey, &'static str>,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Result<Dispatcher, ConfigError> {
        Ok(Dispatcher { keymap: config.keymap()? })
    }

    /// Handles one event, mutating `editor` in place. Returns whether the
    /// caller's event loop should keep running.
    pub fn dispatch(&self, editor: &mut Editor, event: Event) -> Outcome {
        match event {
            Event::InputClosed => {
                editor.cancel();
                Outcome::Exit
            }
            Event::Resize => Outcome::Continue,
            Event::Key(key_event) => {
                let Some(key) = translate_key(&key_event) else {
                    return Outcome::Continue;
                };
                match self.keymap.get(&key) {
                    Some(&command) => self.run_command(editor, command),
                    None => {
                        tracing::trace!(?key, "unbound key, ignoring");
                        Outcome::Continue
                    }
                }
            }
        }
    }

    fn run_command(&self, editor: &mut Editor, command: &str) -> Outcome {
        match command {
            "exit" => {
                editor.cancel();
                Outcome::Exit
            }
            "next_cursor" => {
                editor.next_cursor();
                Outcome::Continue
            }
            "prev_cursor" => {
                editor.prev_cursor();
                Outcome::Continue
            }
            "first_cursor" => {
                editor.first_cursor();
                Outcome::Continue
            }
            "last_cursor" => {
                editor.last_cursor();
                Outcome::Continue
            }
            "shrink_cursor" => {
                editor.shrink_cursor();
                Outcome::Continue
            }
            "grow_cursor" => {
                editor.grow_cursor();
                Outcome::Continue
            }
            "select_cursor" => {
                editor.select_cursor();
                Outcome::Continue
            }
            "select_all" => {
                editor.select_all();
                Outcome::Continue
            }
            "confirm" => {
                editor.confirm();
                Outcome::Exit
            }
            "undo" => {
                editor.undo();
                Outcome::Continue
            }
            "redo" => {
                editor.redo();
                Outcome::Continue
            }
            other => {
                tracing::warn!(command = other, "unrecognized command name bound in keymap");
                Outcome::Continue
            }
        }
    }
}

/// Converts a crossterm key event into the config's key representation.
/// Returns `None` for events with no corresponding config key literal (e.g.
/// function keys, media keys).
fn translate_key(event: &KeyEvent) -> Option<CfgKey> {
    let code = match event.code {
        CtKeyCode::Char(c) => CfgKeyCode::Char(c),
        CtKeyCode::Esc => CfgKeyCode::Escape,
        CtKeyCode::Enter => CfgKeyCode::Enter,
        CtKeyCode::Tab => CfgKeyCode::Tab,
        CtKeyCode::BackTab => CfgKeyCode::BackTab,
        CtKeyCode::Backspace => CfgKeyCode::Backspace,
        CtKeyCode::Up => CfgKeyCode::Up,
        CtKeyCode::Down => CfgKeyCode::Down,
        CtKeyCode::Left => CfgKeyCode::Left,
        CtKeyCode::Right => CfgKeyCode::Right,
        CtKeyCode::Home => CfgKeyCode::Home,
        CtKeyCode::End => CfgKeyCode::End,
        CtKeyCode::PageUp => CfgKeyCode::PageUp,
        CtKeyCode::PageDown => CfgKeyCode::PageDown,
        CtKeyCode::Delete => CfgKeyCode::Delete,
        _ => return None,
    };

    // A plain `Char` already reflects shift in its case (terminals deliver
    // 'G', not 'g'+shift); named keys like `BackTab` fold shift into a
    // dedicated code. Either way the modifier is redundant, so it's
    // stripped to match how `Key::from_str` builds its literals.
    let mut modifiers = CfgKeyModifiers {
        ctrl: event.modifiers.contains(CtKeyModifiers::CONTROL),
        alt: event.modifiers.contains(CtKeyModifiers::ALT),
        shift: event.modifiers.contains(CtKeyModifiers::SHIFT),
    };
    if matches!(code, CfgKeyCode::Char(_) | CfgKeyCode::BackTab) {
        modifiers.shift = false;
    }

    Some(CfgKey { code, modifiers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jjdiff_change::{Change, Line};
    use std::path::PathBuf;

    fn key(code: CtKeyCode, modifiers: CtKeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn translate_key_strips_redundant_shift_for_plain_chars() {
        let cfg_key = translate_key(&key(CtKeyCode::Char('G'), CtKeyModifiers::SHIFT)).unwrap();
        assert_eq!(cfg_key, "G".parse().unwrap());
    }

    #[test]
    fn translate_key_keeps_ctrl_modifier() {
        let cfg_key = translate_key(&key(CtKeyCode::Char('a'), CtKeyModifiers::CONTROL)).unwrap();
        assert_eq!(cfg_key, "ctrl+a".parse().unwrap());
    }

    #[test]
    fn translate_key_ignores_unmapped_codes() {
        assert!(translate_key(&key(CtKeyCode::F(1), CtKeyModifiers::NONE)).is_none());
    }

    #[test]
    fn dispatch_select_cursor_then_confirm_ends_the_loop() {
        let config = Config::default();
        let dispatcher = Dispatcher::new(&config).unwrap();
        let mut editor = Editor::new(vec![Change::AddFile {
            path: PathBuf::from("a.txt"),
            lines: vec![Line { old: None, new: Some("x".into()) }],
            is_exec: true,
        }]);

        let outcome = dispatcher.dispatch(&mut editor, Event::Key(key(CtKeyCode::Char(' '), CtKeyModifiers::NONE)));
        assert_eq!(outcome, Outcome::Continue);
        assert!(!editor.included().is_empty());

        let outcome = dispatcher.dispatch(&mut editor, Event::Key(key(CtKeyCode::Enter, CtKeyModifiers::NONE)));
        assert_eq!(outcome, Outcome::Exit);
    }

    #[test]
    fn dispatch_exit_cancels() {
        let config = Config::default();
        let dispatcher = Dispatcher::new(&config).unwrap();
        let mut editor = Editor::new(vec![]);

        let outcome = dispatcher.dispatch(&mut editor, Event::Key(key(CtKeyCode::Esc, CtKeyModifiers::NONE)));
        assert_eq!(outcome, Outcome::Exit);
        assert!(matches!(editor.result(), Some(core_state::EditorResult::Cancelled)));
    }
}
