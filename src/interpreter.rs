//! The session loop: pull a chord, feed the state machine, apply effects.

use crate::builtin;
use crate::error::ShellError;
use crate::eval::{EvalSettings, Verbosity};
use crate::key::KeyChord;
use crate::machine::{self, Effect, Session};
use crate::mode::ModeRegistry;
use crate::namespace::NamespaceRegistry;
use crate::parser;
use crate::terminal::TerminalSession;
use anyhow::Context;
use log::debug;

/// The rule file embedded into the binary and loaded by default.
pub const STANDARD_RULES: &str = include_str!("../rules/standard.modal");

/// Startup configuration for an [`Interpreter`].
pub struct Options {
    /// Namespace to start in; created under the root on first reference.
    pub namespace: String,
    /// Mode to start in; must exist in the static mode table.
    pub mode: String,
    /// Rule file contents loaded into the root namespace.
    pub rules_source: String,
    /// Initial evaluation verbosity.
    pub verbosity: Verbosity,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            namespace: "global".to_string(),
            mode: "command".to_string(),
            rules_source: STANDARD_RULES.to_string(),
            verbosity: Verbosity::Quiet,
        }
    }
}

/// The interactive shell: registries, session state, and the driving loop.
///
/// Everything is owned here and threaded by reference into the state
/// machine; there is no ambient static state and no locking, because the
/// loop is the only driver.
#[derive(Debug)]
pub struct Interpreter {
    modes: ModeRegistry,
    registry: NamespaceRegistry,
    session: Session,
    eval: EvalSettings,
}

impl Interpreter {
    /// Build an interpreter from startup configuration.
    ///
    /// A malformed rule file, an unknown starting mode, or a builtin
    /// registration clash is a startup failure, reported before the loop
    /// ever runs.
    pub fn new(options: Options) -> anyhow::Result<Self> {
        let modes = ModeRegistry::standard();
        if !modes.contains(&options.mode) {
            return Err(ShellError::UnknownMode(options.mode).into());
        }

        let mut registry = NamespaceRegistry::new("global");
        builtin::register_all(&mut registry).context("registering built-in commands")?;

        let rules = parser::load_rules(&options.rules_source).context("loading rules")?;
        debug!("loaded {} rules into the root namespace", rules.len());
        registry.root_mut().rules = rules;

        if registry.lookup(&options.namespace).is_none() {
            let root = registry.root_name().to_string();
            registry.create(&options.namespace, &root)?;
        }

        Ok(Interpreter {
            modes,
            registry,
            session: Session::new(options.mode, options.namespace),
            eval: EvalSettings {
                verbosity: options.verbosity,
            },
        })
    }

    /// The current session state (active mode, namespace, history).
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// The prompt shown for the next read: `namespace:mode> `.
    pub fn prompt(&self) -> String {
        format!("{}:{}> ", self.session.namespace, self.session.mode)
    }

    /// Feed one chord through the state machine.
    pub fn handle(&mut self, chord: KeyChord) -> Vec<Effect> {
        machine::on_chord(
            chord,
            &mut self.session,
            &self.modes,
            &mut self.registry,
            &mut self.eval,
        )
    }

    /// Drive the read-evaluate loop until an exit effect or end of input.
    pub fn repl(&mut self, term: &mut dyn TerminalSession) {
        term.render(&format!(
            "namespaced-modal: {} rules loaded; type help for commands, exit to quit",
            self.registry
                .lookup(self.registry.root_name())
                .map_or(0, |space| space.rules.len())
        ));
        loop {
            let prompt = self.prompt();
            // End of input is treated exactly like an explicit exit.
            let Some(chord) = term.next_event(&prompt) else {
                return;
            };
            for effect in self.handle(chord) {
                match effect {
                    Effect::Render(text) => term.render(&text),
                    Effect::Exit => return,
                }
            }
        }
    }
}
