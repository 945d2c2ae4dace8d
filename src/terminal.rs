//! Terminal session adapters.
//!
//! The shell core only ever sees the [`TerminalSession`] contract: a
//! blocking source of key chords and a text sink. The production adapter
//! wraps rustyline, so line editing and editor history stay the terminal
//! library's business; a scripted adapter drives the same loop from memory
//! in tests.

use crate::key::KeyChord;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;

/// The narrow contract between the session loop and the terminal.
pub trait TerminalSession {
    /// Block until the next key chord. `None` means end of input, which the
    /// loop treats exactly like an explicit exit.
    fn next_event(&mut self, prompt: &str) -> Option<KeyChord>;

    /// Show text to the user.
    fn render(&mut self, text: &str);
}

/// Rustyline-backed adapter.
///
/// Rustyline hands over whole edited lines; each one is replayed as its
/// characters followed by an Enter chord. Ctrl-C maps to the interrupt
/// chord, Ctrl-D to end of input.
pub struct ReadlineSession {
    editor: DefaultEditor,
    pending: VecDeque<KeyChord>,
}

impl ReadlineSession {
    pub fn new() -> rustyline::Result<Self> {
        Ok(ReadlineSession {
            editor: DefaultEditor::new()?,
            pending: VecDeque::new(),
        })
    }
}

impl TerminalSession for ReadlineSession {
    fn next_event(&mut self, prompt: &str) -> Option<KeyChord> {
        if let Some(chord) = self.pending.pop_front() {
            return Some(chord);
        }
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                for c in line.chars() {
                    self.pending.push_back(KeyChord::Char(c));
                }
                self.pending.push_back(KeyChord::Enter);
                self.pending.pop_front()
            }
            Err(ReadlineError::Interrupted) => Some(KeyChord::Ctrl('c')),
            Err(ReadlineError::Eof) => None,
            Err(err) => {
                eprintln!("terminal error: {:?}", err);
                None
            }
        }
    }

    fn render(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// In-memory adapter for tests and non-interactive embedding.
pub struct ScriptedSession {
    events: VecDeque<KeyChord>,
    /// Everything the session rendered, in order.
    pub rendered: Vec<String>,
}

impl ScriptedSession {
    pub fn new(events: impl IntoIterator<Item = KeyChord>) -> Self {
        ScriptedSession {
            events: events.into_iter().collect(),
            rendered: Vec::new(),
        }
    }

    /// Build a session that types each line and presses Enter after it.
    pub fn from_lines(lines: &[&str]) -> Self {
        let mut events = VecDeque::new();
        for line in lines {
            for c in line.chars() {
                events.push_back(KeyChord::Char(c));
            }
            events.push_back(KeyChord::Enter);
        }
        ScriptedSession {
            events,
            rendered: Vec::new(),
        }
    }
}

impl TerminalSession for ScriptedSession {
    fn next_event(&mut self, _prompt: &str) -> Option<KeyChord> {
        self.events.pop_front()
    }

    fn render(&mut self, text: &str) {
        self.rendered.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_session_replays_lines_as_chords() {
        let mut session = ScriptedSession::from_lines(&["hi"]);
        assert_eq!(session.next_event("> "), Some(KeyChord::Char('h')));
        assert_eq!(session.next_event("> "), Some(KeyChord::Char('i')));
        assert_eq!(session.next_event("> "), Some(KeyChord::Enter));
        assert_eq!(session.next_event("> "), None);
    }

    #[test]
    fn test_scripted_session_collects_renders() {
        let mut session = ScriptedSession::new([]);
        session.render("one");
        session.render("two");
        assert_eq!(session.rendered, ["one", "two"]);
    }
}
