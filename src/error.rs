//! Error taxonomy for the shell core and the rewriting engine.

use crate::lexer::LexError;
use thiserror::Error;

/// Recoverable failures surfaced by the registries and the dispatcher.
///
/// Every variant is rendered to the user and the session continues; nothing
/// here terminates the loop. Registry mutations return these to the command
/// that attempted them, never swallowing them.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A namespace with this name already exists.
    #[error("namespace already exists: {0}")]
    DuplicateNamespace(String),

    /// The namespace is the active one (or the root) and cannot be removed.
    #[error("namespace is in use: {0}")]
    NamespaceInUse(String),

    /// No namespace with this name is registered.
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    /// The command name resolved nowhere along the parent chain.
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// A command with this name is already registered in the namespace.
    #[error("command already defined in namespace {namespace}: {name}")]
    DuplicateCommand { namespace: String, name: String },

    /// The argument count does not fit the command's declared arity.
    #[error("{command}: expected {expected} arguments, got {got}")]
    ArityMismatch {
        command: String,
        expected: String,
        got: usize,
    },

    /// No mode with this identifier is registered.
    #[error("unknown mode: {0}")]
    UnknownMode(String),

    /// The committed line could not be tokenized.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// The rewriting engine rejected the committed line.
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// Opaque error raised by a command's own logic.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

/// Failures produced by the term parser and the rewriting engine.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The input is not a well-formed term or rule line.
    #[error("parse error: {0}")]
    Parse(String),

    /// The rewrite did not reach a normal form within the step limit.
    #[error("rewrite step limit exceeded; the rule set may not terminate")]
    StepLimit,

    #[error("division by zero")]
    DivisionByZero,

    /// A special form was applied to arguments it does not accept.
    #[error("{0}")]
    Malformed(String),
}
