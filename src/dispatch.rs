//! Resolution and invocation of committed command lines.

use crate::command::{CommandContext, Outcome};
use crate::error::ShellError;
use crate::lexer;
use log::debug;

/// Execute one committed command line.
///
/// Tokenizes the line (quoting rules documented in [`crate::lexer`]),
/// resolves the command name through the active namespace's parent chain,
/// validates the argument count against the command's declared arity, and
/// invokes the handler. A blank line is a no-op, not an error.
///
/// Switch outcomes are validated here before they travel upward: a handler
/// asking for a nonexistent namespace or mode turns into an error and the
/// active namespace and mode stay untouched.
pub fn execute(line: &str, ctx: &mut CommandContext<'_>) -> Result<Outcome, ShellError> {
    let words = lexer::split_words(line)?;
    let Some((name, args)) = words.split_first() else {
        return Ok(Outcome::Silent);
    };

    let command = ctx.registry.resolve_command(ctx.active, name)?;
    if !command.arity.accepts(args.len()) {
        return Err(ShellError::ArityMismatch {
            command: name.clone(),
            expected: command.arity.to_string(),
            got: args.len(),
        });
    }

    debug!(
        "dispatching {} with {} args from namespace {}",
        name,
        args.len(),
        ctx.active
    );
    let outcome = command.handler.run(args, ctx)?;

    match &outcome {
        Outcome::SwitchNamespace(target) if ctx.registry.lookup(target).is_none() => {
            Err(ShellError::NamespaceNotFound(target.clone()))
        }
        Outcome::SwitchMode(target) if !ctx.modes.contains(target) => {
            Err(ShellError::UnknownMode(target.clone()))
        }
        _ => Ok(outcome),
    }
}
