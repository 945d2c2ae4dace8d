//! The command model: arity, handlers, and outcomes.

use crate::eval::EvalSettings;
use crate::mode::ModeRegistry;
use crate::namespace::NamespaceRegistry;
use std::fmt;
use std::rc::Rc;

/// Declared argument count bounds for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
}

impl Arity {
    pub fn exactly(n: usize) -> Self {
        Arity { min: n, max: Some(n) }
    }

    pub fn at_least(n: usize) -> Self {
        Arity { min: n, max: None }
    }

    pub fn range(min: usize, max: usize) -> Self {
        Arity { min, max: Some(max) }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "exactly {}", self.min),
            Some(max) => write!(f, "between {} and {}", self.min, max),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// What a command handler produced.
///
/// Output is rendered and the session continues; the switch variants are
/// validated by the dispatcher before they travel upward to the state
/// machine; `Exit` ends the session loop cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    /// Completed without anything to show.
    Silent,
    SwitchNamespace(String),
    SwitchMode(String),
    Exit,
}

/// Everything a handler may touch, threaded by reference from the session
/// loop. No ambient state: mutating the world happens through this struct
/// or not at all.
pub struct CommandContext<'a> {
    pub registry: &'a mut NamespaceRegistry,
    pub modes: &'a ModeRegistry,
    pub eval: &'a mut EvalSettings,
    /// Name of the active namespace.
    pub active: &'a str,
    /// Identifier of the active mode.
    pub mode: &'a str,
    /// Committed lines so far, most recent last.
    pub history: &'a [String],
}

/// The behavior bound to a command name.
///
/// Handlers receive the parsed arguments (arity already validated) and the
/// context. Errors they raise are propagated to the caller unchanged and
/// rendered there; they are never swallowed.
pub trait CommandHandler {
    fn run(&self, args: &[String], ctx: &mut CommandContext<'_>) -> anyhow::Result<Outcome>;
}

/// A command registered in a namespace.
///
/// The handler is reference-counted so a resolved command can be invoked
/// while the registry itself is mutably borrowed by the handler's context.
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub arity: Arity,
    pub handler: Rc<dyn CommandHandler>,
}

impl Command {
    pub fn new(
        name: impl Into<String>,
        arity: Arity,
        handler: impl CommandHandler + 'static,
    ) -> Self {
        Command {
            name: name.into(),
            arity,
            handler: Rc::new(handler),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}
