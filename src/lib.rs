//! A modal, namespace-scoped interactive shell with a term-rewriting core.
//!
//! This crate provides the building blocks of an interactive terminal session
//! that interprets input through *modes* (per-mode key bindings deciding what
//! a keystroke means) and resolves commands through *namespaces* (named,
//! hierarchically scoped command tables with private state). Committed lines
//! in the text-entry mode are s-expression terms, rewritten against
//! namespace-scoped rules until they reach a normal form.
//!
//! The main entry point is [`Interpreter`], which owns the mode and namespace
//! registries plus the session state and drives the read-evaluate loop over a
//! [`terminal::TerminalSession`]. The public modules expose the pieces for
//! embedding: [`mode`] and [`namespace`] for the registries, [`command`] for
//! implementing your own commands, [`term`] and [`rules`] for the rewriting
//! engine.

pub mod builtin;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod eval;
pub mod interpreter;
pub mod key;
pub mod lexer;
pub mod machine;
pub mod mode;
pub mod namespace;
pub mod parser;
pub mod rules;
pub mod term;
pub mod terminal;

/// Just a convenient re-export of the interactive session driver.
///
/// See [`interpreter::Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
