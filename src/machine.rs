//! The modal state machine.
//!
//! [`on_chord`] is the control core of the shell: it consumes one key chord
//! at a time, mutating the [`Session`] and producing [`Effect`]s for the
//! loop to apply. Only one chord is processed at a time, so every mode
//! transition and namespace switch is atomic from the loop's point of view.

use crate::command::{CommandContext, Outcome};
use crate::dispatch;
use crate::error::ShellError;
use crate::eval::{self, EvalSettings};
use crate::key::KeyChord;
use crate::mode::{ActionKind, ModeKind, ModeRegistry, Resolution};
use crate::namespace::NamespaceRegistry;

/// The mutable per-session state.
///
/// One instance per running session, owned by the interpreter and mutated
/// only here.
#[derive(Debug)]
pub struct Session {
    /// Identifier of the active mode.
    pub mode: String,
    /// Name of the active namespace.
    pub namespace: String,
    /// Characters accumulated since the last commit or interrupt.
    pub buffer: String,
    /// Committed lines, append-only, oldest first.
    pub history: Vec<String>,
}

impl Session {
    pub fn new(mode: impl Into<String>, namespace: impl Into<String>) -> Self {
        Session {
            mode: mode.into(),
            namespace: namespace.into(),
            buffer: String::new(),
            history: Vec::new(),
        }
    }
}

/// What the loop should do after a chord was processed.
#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    Render(String),
    Exit,
}

/// Process one key chord.
pub fn on_chord(
    chord: KeyChord,
    session: &mut Session,
    modes: &ModeRegistry,
    registry: &mut NamespaceRegistry,
    eval: &mut EvalSettings,
) -> Vec<Effect> {
    match modes.resolve_binding(&session.mode, &chord) {
        Resolution::Insert(c) => {
            session.buffer.push(c);
            Vec::new()
        }
        Resolution::Unbound => vec![Effect::Render(format!("unknown key: {}", chord))],
        Resolution::Act(ActionKind::Interrupt) => {
            session.buffer.clear();
            vec![Effect::Render("^C".to_string())]
        }
        Resolution::Act(ActionKind::Exit) => vec![Effect::Exit],
        Resolution::Act(ActionKind::SwitchMode(target)) => {
            if modes.contains(&target) {
                session.mode = target;
                Vec::new()
            } else {
                vec![Effect::Render(format!(
                    "error: {}",
                    ShellError::UnknownMode(target)
                ))]
            }
        }
        Resolution::Act(ActionKind::CommitLine) => commit_line(session, modes, registry, eval),
    }
}

fn commit_line(
    session: &mut Session,
    modes: &ModeRegistry,
    registry: &mut NamespaceRegistry,
    eval: &mut EvalSettings,
) -> Vec<Effect> {
    let line = std::mem::take(&mut session.buffer);
    let line = line.trim();
    // Committing an empty buffer is a no-op, not a lookup failure.
    if line.is_empty() {
        return Vec::new();
    }
    session.history.push(line.to_string());

    let Some(mode) = modes.get(&session.mode) else {
        return vec![Effect::Render(format!(
            "error: {}",
            ShellError::UnknownMode(session.mode.clone())
        ))];
    };

    let active = session.namespace.clone();
    let mode_id = session.mode.clone();
    let result = match mode.kind {
        ModeKind::CommandLine => {
            let mut ctx = CommandContext {
                registry: &mut *registry,
                modes,
                eval: &mut *eval,
                active: &active,
                mode: &mode_id,
                history: &session.history,
            };
            dispatch::execute(line, &mut ctx)
        }
        ModeKind::TextLine => eval::run_line(line, registry, &active, eval)
            .map(Outcome::Output)
            .map_err(ShellError::from),
    };

    apply_outcome(result, session, modes, registry)
}

/// Apply a dispatch result to the session.
///
/// Switches re-check their target so the active namespace and mode are
/// either fully updated or left untouched.
fn apply_outcome(
    result: Result<Outcome, ShellError>,
    session: &mut Session,
    modes: &ModeRegistry,
    registry: &NamespaceRegistry,
) -> Vec<Effect> {
    match result {
        Ok(Outcome::Output(text)) => {
            if text.is_empty() {
                Vec::new()
            } else {
                vec![Effect::Render(text)]
            }
        }
        Ok(Outcome::Silent) => Vec::new(),
        Ok(Outcome::SwitchNamespace(target)) => {
            if registry.lookup(&target).is_some() {
                session.namespace = target;
                Vec::new()
            } else {
                vec![Effect::Render(format!(
                    "error: {}",
                    ShellError::NamespaceNotFound(target)
                ))]
            }
        }
        Ok(Outcome::SwitchMode(target)) => {
            if modes.contains(&target) {
                session.mode = target;
                Vec::new()
            } else {
                vec![Effect::Render(format!(
                    "error: {}",
                    ShellError::UnknownMode(target)
                ))]
            }
        }
        Ok(Outcome::Exit) => vec![Effect::Exit],
        Err(e) => vec![Effect::Render(format!("error: {}", e))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Arity, Command, CommandHandler};

    struct Echo;

    impl CommandHandler for Echo {
        fn run(&self, args: &[String], _ctx: &mut CommandContext<'_>) -> anyhow::Result<Outcome> {
            Ok(Outcome::Output(args.join(" ")))
        }
    }

    struct Quit;

    impl CommandHandler for Quit {
        fn run(&self, _args: &[String], _ctx: &mut CommandContext<'_>) -> anyhow::Result<Outcome> {
            Ok(Outcome::Exit)
        }
    }

    struct Jump(&'static str);

    impl CommandHandler for Jump {
        fn run(&self, _args: &[String], _ctx: &mut CommandContext<'_>) -> anyhow::Result<Outcome> {
            Ok(Outcome::SwitchNamespace(self.0.to_string()))
        }
    }

    struct World {
        session: Session,
        modes: ModeRegistry,
        registry: NamespaceRegistry,
        eval: EvalSettings,
    }

    impl World {
        fn new() -> Self {
            let mut registry = NamespaceRegistry::new("global");
            registry
                .register("global", Command::new("echo", Arity::at_least(1), Echo))
                .unwrap();
            registry
                .register("global", Command::new("exit", Arity::exactly(0), Quit))
                .unwrap();
            registry
                .register("global", Command::new("visit", Arity::exactly(0), Jump("scratch")))
                .unwrap();
            registry
                .register("global", Command::new("lost", Arity::exactly(0), Jump("missing")))
                .unwrap();
            World {
                session: Session::new("command", "global"),
                modes: ModeRegistry::standard(),
                registry,
                eval: EvalSettings::default(),
            }
        }

        fn chord(&mut self, chord: KeyChord) -> Vec<Effect> {
            on_chord(
                chord,
                &mut self.session,
                &self.modes,
                &mut self.registry,
                &mut self.eval,
            )
        }

        fn type_line(&mut self, line: &str) -> Vec<Effect> {
            let mut effects = Vec::new();
            for c in line.chars() {
                effects.extend(self.chord(KeyChord::Char(c)));
            }
            effects.extend(self.chord(KeyChord::Enter));
            effects
        }
    }

    #[test]
    fn test_buffered_chars_accumulate_in_order() {
        let mut world = World::new();
        for c in "echo".chars() {
            world.chord(KeyChord::Char(c));
        }
        assert_eq!(world.session.buffer, "echo");
    }

    #[test]
    fn test_commit_dispatches_and_clears_buffer() {
        let mut world = World::new();
        let effects = world.type_line("echo hello world");
        assert_eq!(effects, vec![Effect::Render("hello world".to_string())]);
        assert_eq!(world.session.buffer, "");
        assert_eq!(world.session.history, ["echo hello world"]);
    }

    #[test]
    fn test_empty_commit_is_noop() {
        let mut world = World::new();
        let effects = world.chord(KeyChord::Enter);
        assert!(effects.is_empty());
        assert!(world.session.history.is_empty());
    }

    #[test]
    fn test_unknown_key_changes_nothing() {
        let mut world = World::new();
        world.chord(KeyChord::Char('e'));
        let effects = world.chord(KeyChord::Ctrl('g'));
        assert_eq!(
            effects,
            vec![Effect::Render("unknown key: ^G".to_string())]
        );
        assert_eq!(world.session.buffer, "e");
        assert_eq!(world.session.mode, "command");
        assert_eq!(world.session.namespace, "global");
    }

    #[test]
    fn test_interrupt_clears_buffer_only() {
        let mut world = World::new();
        for c in "echo half".chars() {
            world.chord(KeyChord::Char(c));
        }
        let effects = world.chord(KeyChord::Ctrl('c'));
        assert_eq!(effects, vec![Effect::Render("^C".to_string())]);
        assert_eq!(world.session.buffer, "");
        assert_eq!(world.session.mode, "command");
        assert_eq!(world.session.namespace, "global");
    }

    #[test]
    fn test_escape_toggles_mode() {
        let mut world = World::new();
        world.chord(KeyChord::Esc);
        assert_eq!(world.session.mode, "eval");
        world.chord(KeyChord::Esc);
        assert_eq!(world.session.mode, "command");
    }

    #[test]
    fn test_switch_to_missing_namespace_leaves_active_untouched() {
        let mut world = World::new();
        let effects = world.type_line("lost");
        assert_eq!(world.session.namespace, "global");
        assert!(matches!(&effects[0], Effect::Render(msg) if msg.contains("namespace not found")));
    }

    #[test]
    fn test_switch_to_existing_namespace() {
        let mut world = World::new();
        world.registry.create("scratch", "global").unwrap();
        let effects = world.type_line("visit");
        assert!(effects.is_empty());
        assert_eq!(world.session.namespace, "scratch");
    }

    #[test]
    fn test_command_not_found_is_rendered_and_recoverable() {
        let mut world = World::new();
        let effects = world.type_line("nope");
        assert!(matches!(&effects[0], Effect::Render(msg) if msg.contains("command not found")));
        // The session keeps going.
        let effects = world.type_line("echo ok");
        assert_eq!(effects, vec![Effect::Render("ok".to_string())]);
    }

    #[test]
    fn test_exit_outcome_produces_exit_effect() {
        let mut world = World::new();
        let effects = world.type_line("exit");
        assert_eq!(effects, vec![Effect::Exit]);
    }

    #[test]
    fn test_exit_chord() {
        let mut world = World::new();
        let effects = world.chord(KeyChord::Ctrl('d'));
        assert_eq!(effects, vec![Effect::Exit]);
    }

    #[test]
    fn test_text_mode_evaluates_terms() {
        let mut world = World::new();
        world.chord(KeyChord::Esc);
        let effects = world.type_line("(+ 3 4)");
        assert_eq!(effects, vec![Effect::Render("7".to_string())]);
    }

    #[test]
    fn test_text_mode_reports_eval_errors() {
        let mut world = World::new();
        world.chord(KeyChord::Esc);
        let effects = world.type_line("(/ 1 0)");
        assert!(matches!(&effects[0], Effect::Render(msg) if msg.contains("division by zero")));
        assert_eq!(world.session.mode, "eval");
    }
}
