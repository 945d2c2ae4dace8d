//! Input modes and their key-binding tables.

use crate::key::KeyChord;
use std::collections::HashMap;

/// What a committed line means in a mode.
///
/// This is the per-mode flag deciding how free text is interpreted: both
/// kinds buffer printable characters, they differ in where the buffer goes
/// on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    /// A committed line is parsed and dispatched as a command.
    CommandLine,
    /// A committed line is raw input for the rewriting engine.
    TextLine,
}

/// The category of effect a key binding produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Hand the buffered line over according to the mode's [`ModeKind`].
    CommitLine,
    /// Switch to the named mode immediately, leaving the buffer intact.
    SwitchMode(String),
    /// Abort the buffered line. Bound in every mode.
    Interrupt,
    /// End the session cleanly.
    Exit,
}

/// A named configuration of key bindings.
///
/// Modes are built once at startup and immutable for the rest of the
/// session; only the state machine selects between them.
#[derive(Debug)]
pub struct Mode {
    pub id: String,
    pub kind: ModeKind,
    bindings: HashMap<KeyChord, ActionKind>,
}

impl Mode {
    pub fn new(id: impl Into<String>, kind: ModeKind) -> Self {
        Mode {
            id: id.into(),
            kind,
            bindings: HashMap::new(),
        }
    }

    /// Bind a chord to an action. Later bindings for the same chord win.
    pub fn bind(mut self, chord: KeyChord, action: ActionKind) -> Self {
        self.bindings.insert(chord, action);
        self
    }
}

/// The result of looking a chord up in a mode's binding table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The chord is bound to an action.
    Act(ActionKind),
    /// Unbound printable character: buffer it as literal input.
    Insert(char),
    /// Unbound and not printable; surfaces the unknown-key notice.
    Unbound,
}

/// The static set of modes for a session.
#[derive(Debug)]
pub struct ModeRegistry {
    modes: HashMap<String, Mode>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        ModeRegistry {
            modes: HashMap::new(),
        }
    }

    /// The two modes the binary ships with.
    ///
    /// `command` dispatches committed lines as commands, `eval` hands them
    /// to the rewriting engine. Escape toggles between the two; Ctrl-C is
    /// the interrupt chord in both, Ctrl-D the exit chord (the readline
    /// adapter reports it as end of input instead, which the loop treats
    /// the same way).
    pub fn standard() -> Self {
        let mut registry = ModeRegistry::new();
        registry.insert(
            Mode::new("command", ModeKind::CommandLine)
                .bind(KeyChord::Enter, ActionKind::CommitLine)
                .bind(KeyChord::Esc, ActionKind::SwitchMode("eval".to_string()))
                .bind(KeyChord::Ctrl('c'), ActionKind::Interrupt)
                .bind(KeyChord::Ctrl('d'), ActionKind::Exit),
        );
        registry.insert(
            Mode::new("eval", ModeKind::TextLine)
                .bind(KeyChord::Enter, ActionKind::CommitLine)
                .bind(KeyChord::Esc, ActionKind::SwitchMode("command".to_string()))
                .bind(KeyChord::Ctrl('c'), ActionKind::Interrupt)
                .bind(KeyChord::Ctrl('d'), ActionKind::Exit),
        );
        registry
    }

    pub fn insert(&mut self, mode: Mode) {
        self.modes.insert(mode.id.clone(), mode);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Mode> {
        self.modes.get(id)
    }

    /// Mode identifiers in sorted order, for `help` output.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.modes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Look up what a chord means in a mode.
    ///
    /// Pure and side-effect free. Unbound printable characters resolve to
    /// [`Resolution::Insert`]; everything else unbound is
    /// [`Resolution::Unbound`], which the machine reports as a recoverable
    /// unknown-key notice.
    pub fn resolve_binding(&self, mode: &str, chord: &KeyChord) -> Resolution {
        let Some(mode) = self.modes.get(mode) else {
            return Resolution::Unbound;
        };
        if let Some(action) = mode.bindings.get(chord) {
            return Resolution::Act(action.clone());
        }
        match chord {
            KeyChord::Char(c) => Resolution::Insert(*c),
            _ => Resolution::Unbound,
        }
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
