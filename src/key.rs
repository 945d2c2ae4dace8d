//! Key chords: the discrete input events produced by a terminal adapter.

use std::fmt;

/// One discrete input event.
///
/// The modal state machine consumes exactly one chord at a time; mode binding
/// tables are keyed by chord. Adapters that only see whole lines (rustyline)
/// synthesize `Char` chords followed by `Enter` for each line they read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyChord {
    /// A printable character.
    Char(char),
    Enter,
    Esc,
    /// A control chord, e.g. `Ctrl('c')` for Ctrl-C. Stored lowercase.
    Ctrl(char),
    /// Anything the adapter could not classify. Carries the adapter's name
    /// for the event so the unknown-key notice can show it.
    Other(String),
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyChord::Char(c) => write!(f, "{}", c),
            KeyChord::Enter => write!(f, "enter"),
            KeyChord::Esc => write!(f, "esc"),
            KeyChord::Ctrl(c) => write!(f, "^{}", c.to_ascii_uppercase()),
            KeyChord::Other(name) => write!(f, "{}", name),
        }
    }
}
