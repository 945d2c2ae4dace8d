//! Built-in commands, registered into the root namespace at startup.

use crate::command::{Arity, Command, CommandContext, CommandHandler, Outcome};
use crate::error::ShellError;
use crate::eval::{self, Verbosity};
use crate::namespace::NamespaceRegistry;
use anyhow::{Result, bail};

/// Register the built-in command set into the registry's root namespace.
pub fn register_all(registry: &mut NamespaceRegistry) -> Result<(), ShellError> {
    let root = registry.root_name().to_string();
    let commands = [
        Command::new("echo", Arity::at_least(1), Echo),
        Command::new("exit", Arity::exactly(0), Exit),
        Command::new("help", Arity::exactly(0), Help),
        Command::new("ns", Arity::range(1, 3), Ns),
        Command::new("mode", Arity::exactly(1), ModeSwitch),
        Command::new("set", Arity::exactly(2), Set),
        Command::new("get", Arity::exactly(1), Get),
        Command::new("eval", Arity::at_least(1), Eval),
        Command::new("rules", Arity::range(0, 1), Rules),
        Command::new("trace", Arity::range(0, 1), Trace),
        Command::new("history", Arity::exactly(0), History),
    ];
    for command in commands {
        registry.register(&root, command)?;
    }
    Ok(())
}

/// Print the arguments joined by spaces.
struct Echo;

impl CommandHandler for Echo {
    fn run(&self, args: &[String], _ctx: &mut CommandContext<'_>) -> Result<Outcome> {
        Ok(Outcome::Output(args.join(" ")))
    }
}

/// End the session cleanly.
struct Exit;

impl CommandHandler for Exit {
    fn run(&self, _args: &[String], _ctx: &mut CommandContext<'_>) -> Result<Outcome> {
        Ok(Outcome::Exit)
    }
}

struct Help;

impl CommandHandler for Help {
    fn run(&self, _args: &[String], ctx: &mut CommandContext<'_>) -> Result<Outcome> {
        let mut out = String::new();
        out.push_str(&format!(
            "commands visible from namespace {}:\n  {}\n",
            ctx.active,
            ctx.registry.visible_commands(ctx.active).join(" ")
        ));
        out.push_str(&format!(
            "modes: {} (active: {})\n",
            ctx.modes.ids().join(" "),
            ctx.mode
        ));
        out.push_str("rule management (eval mode):\n");
        out.push_str("  <label.name> PATTERN REPLACEMENT   add a rule to the active namespace\n");
        out.push_str("  >label.name<                       remove rules by identifier\n");
        out.push_str("examples:\n");
        out.push_str("  (+ (* 5 9) 13)                     arithmetic\n");
        out.push_str("  (length (1 2 3))                   list operations\n");
        out.push_str("  <math.double>(double ?x) (* ?x 2)  a doubling rule");
        Ok(Outcome::Output(out))
    }
}

/// Namespace management: `ns new NAME [PARENT]`, `ns use NAME`,
/// `ns rm NAME`, `ns list`.
struct Ns;

impl CommandHandler for Ns {
    fn run(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<Outcome> {
        match args[0].as_str() {
            "new" => {
                if args.len() < 2 {
                    bail!("ns new: missing namespace name");
                }
                let parent = args.get(2).map(String::as_str).unwrap_or(ctx.active);
                ctx.registry.create(&args[1], parent)?;
                Ok(Outcome::Output(format!(
                    "created namespace {} under {}",
                    args[1], parent
                )))
            }
            "use" => {
                if args.len() != 2 {
                    bail!("ns use: expected exactly one namespace name");
                }
                Ok(Outcome::SwitchNamespace(args[1].clone()))
            }
            "rm" => {
                if args.len() != 2 {
                    bail!("ns rm: expected exactly one namespace name");
                }
                ctx.registry.remove(&args[1], ctx.active)?;
                Ok(Outcome::Output(format!("removed namespace {}", args[1])))
            }
            "list" => {
                if args.len() != 1 {
                    bail!("ns list: takes no arguments");
                }
                let mut out = Vec::new();
                for space in ctx.registry.iter() {
                    let marker = if space.name == ctx.active { "*" } else { " " };
                    match &space.parent {
                        Some(parent) => out.push(format!("{} {} <- {}", marker, space.name, parent)),
                        None => out.push(format!("{} {} (root)", marker, space.name)),
                    }
                }
                Ok(Outcome::Output(out.join("\n")))
            }
            other => bail!("ns: unknown subcommand {} (expected new, use, rm, or list)", other),
        }
    }
}

/// Switch the input mode.
struct ModeSwitch;

impl CommandHandler for ModeSwitch {
    fn run(&self, args: &[String], _ctx: &mut CommandContext<'_>) -> Result<Outcome> {
        Ok(Outcome::SwitchMode(args[0].clone()))
    }
}

/// Write a key into the active namespace's private state.
struct Set;

impl CommandHandler for Set {
    fn run(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<Outcome> {
        let Some(space) = ctx.registry.lookup_mut(ctx.active) else {
            bail!("active namespace not found: {}", ctx.active);
        };
        space.vars.insert(args[0].clone(), args[1].clone());
        Ok(Outcome::Silent)
    }
}

/// Read a key from the active namespace's state, falling back through the
/// parent chain.
struct Get;

impl CommandHandler for Get {
    fn run(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<Outcome> {
        match ctx.registry.lookup_var(ctx.active, &args[0]) {
            Some(value) => Ok(Outcome::Output(value.to_string())),
            None => bail!("{}: not set", args[0]),
        }
    }
}

/// Rewrite a term without leaving command mode.
struct Eval;

impl CommandHandler for Eval {
    fn run(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<Outcome> {
        let line = args.join(" ");
        let output = eval::run_line(&line, ctx.registry, ctx.active, ctx.eval)?;
        Ok(Outcome::Output(output))
    }
}

/// List rules: all visible from the active namespace, or those owned by one
/// namespace.
struct Rules;

impl CommandHandler for Rules {
    fn run(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<Outcome> {
        if let Some(name) = args.first() {
            let Some(space) = ctx.registry.lookup(name) else {
                return Err(ShellError::NamespaceNotFound(name.clone()).into());
            };
            if space.rules.is_empty() {
                return Ok(Outcome::Output(format!("no rules in namespace {}", name)));
            }
            let lines: Vec<String> = space.rules.iter().map(|r| format!("  {}", r)).collect();
            return Ok(Outcome::Output(format!(
                "rules in namespace {}:\n{}",
                name,
                lines.join("\n")
            )));
        }

        let mut out = Vec::new();
        for space_name in ctx.registry.chain_of(ctx.active) {
            let Some(space) = ctx.registry.lookup(&space_name) else {
                continue;
            };
            if space.rules.is_empty() {
                continue;
            }
            out.push(format!("namespace {} ({} rules):", space_name, space.rules.len()));
            for rule in space.rules.iter() {
                out.push(format!("  {}", rule));
            }
        }
        if out.is_empty() {
            return Ok(Outcome::Output("no rules visible".to_string()));
        }
        Ok(Outcome::Output(out.join("\n")))
    }
}

/// Show or set the evaluation verbosity.
struct Trace;

impl CommandHandler for Trace {
    fn run(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<Outcome> {
        match args.first() {
            None => Ok(Outcome::Output(format!("trace: {}", ctx.eval.verbosity))),
            Some(level) => {
                let verbosity: Verbosity = level.parse().map_err(anyhow::Error::msg)?;
                ctx.eval.verbosity = verbosity;
                Ok(Outcome::Output(format!("trace set to {}", verbosity)))
            }
        }
    }
}

/// Print the committed-line history.
struct History;

impl CommandHandler for History {
    fn run(&self, _args: &[String], ctx: &mut CommandContext<'_>) -> Result<Outcome> {
        if ctx.history.is_empty() {
            return Ok(Outcome::Output("history is empty".to_string()));
        }
        let lines: Vec<String> = ctx
            .history
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:>4}  {}", i + 1, line))
            .collect();
        Ok(Outcome::Output(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch;
    use crate::eval::EvalSettings;
    use crate::mode::ModeRegistry;

    struct Fixture {
        registry: NamespaceRegistry,
        modes: ModeRegistry,
        eval: EvalSettings,
        history: Vec<String>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut registry = NamespaceRegistry::new("global");
            register_all(&mut registry).unwrap();
            Fixture {
                registry,
                modes: ModeRegistry::standard(),
                eval: EvalSettings::default(),
                history: Vec::new(),
            }
        }

        fn run_from(&mut self, active: &str, line: &str) -> Result<Outcome, ShellError> {
            let mut ctx = CommandContext {
                registry: &mut self.registry,
                modes: &self.modes,
                eval: &mut self.eval,
                active,
                mode: "command",
                history: &self.history,
            };
            dispatch::execute(line, &mut ctx)
        }

        fn run(&mut self, line: &str) -> Result<Outcome, ShellError> {
            self.run_from("global", line)
        }
    }

    fn output(outcome: Outcome) -> String {
        match outcome {
            Outcome::Output(text) => text,
            other => panic!("expected output, got {:?}", other),
        }
    }

    #[test]
    fn test_echo() {
        let mut fx = Fixture::new();
        assert_eq!(output(fx.run("echo hello world").unwrap()), "hello world");
    }

    #[test]
    fn test_exit() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run("exit").unwrap(), Outcome::Exit);
    }

    #[test]
    fn test_ns_new_use_rm() {
        let mut fx = Fixture::new();
        assert_eq!(
            output(fx.run("ns new scratch").unwrap()),
            "created namespace scratch under global"
        );
        assert_eq!(
            fx.run("ns use scratch").unwrap(),
            Outcome::SwitchNamespace("scratch".to_string())
        );
        // echo still resolves from the child through the parent chain.
        assert_eq!(
            output(fx.run_from("scratch", "echo hi").unwrap()),
            "hi"
        );
        assert_eq!(
            output(fx.run("ns rm scratch").unwrap()),
            "removed namespace scratch"
        );
        assert!(matches!(
            fx.run("ns use scratch"),
            Err(ShellError::NamespaceNotFound(_))
        ));
    }

    #[test]
    fn test_ns_duplicate_surfaces() {
        let mut fx = Fixture::new();
        fx.run("ns new scratch").unwrap();
        let err = fx.run("ns new scratch").unwrap_err();
        assert!(err.to_string().contains("namespace already exists"));
    }

    #[test]
    fn test_ns_rm_active_fails() {
        let mut fx = Fixture::new();
        fx.run("ns new scratch").unwrap();
        let err = fx.run_from("scratch", "ns rm scratch").unwrap_err();
        assert!(err.to_string().contains("namespace is in use"));
    }

    #[test]
    fn test_ns_new_defaults_parent_to_active() {
        let mut fx = Fixture::new();
        fx.run("ns new outer").unwrap();
        assert_eq!(
            output(fx.run_from("outer", "ns new inner").unwrap()),
            "created namespace inner under outer"
        );
        assert_eq!(
            fx.registry.chain_of("inner"),
            ["inner", "outer", "global"]
        );
    }

    #[test]
    fn test_ns_list_marks_active() {
        let mut fx = Fixture::new();
        fx.run("ns new scratch").unwrap();
        let listing = output(fx.run_from("scratch", "ns list").unwrap());
        assert!(listing.contains("  global (root)"));
        assert!(listing.contains("* scratch <- global"));
    }

    #[test]
    fn test_ns_bad_subcommand() {
        let mut fx = Fixture::new();
        let err = fx.run("ns frobnicate").unwrap_err();
        assert!(err.to_string().contains("unknown subcommand"));
    }

    #[test]
    fn test_mode_switch_outcome() {
        let mut fx = Fixture::new();
        assert_eq!(
            fx.run("mode eval").unwrap(),
            Outcome::SwitchMode("eval".to_string())
        );
        assert!(matches!(
            fx.run("mode nope"),
            Err(ShellError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_set_get_through_chain() {
        let mut fx = Fixture::new();
        fx.run("ns new scratch").unwrap();
        assert_eq!(fx.run("set greeting hi").unwrap(), Outcome::Silent);
        assert_eq!(output(fx.run_from("scratch", "get greeting").unwrap()), "hi");
        // A local value shadows the inherited one.
        fx.run_from("scratch", "set greeting yo").unwrap();
        assert_eq!(output(fx.run_from("scratch", "get greeting").unwrap()), "yo");
        assert_eq!(output(fx.run("get greeting").unwrap()), "hi");
        assert!(fx.run("get missing").is_err());
    }

    #[test]
    fn test_eval_command() {
        let mut fx = Fixture::new();
        assert_eq!(output(fx.run("eval (+ 3 4)").unwrap()), "7");
    }

    #[test]
    fn test_trace_show_and_set() {
        let mut fx = Fixture::new();
        assert_eq!(output(fx.run("trace").unwrap()), "trace: quiet");
        assert_eq!(output(fx.run("trace debug").unwrap()), "trace set to debug");
        assert_eq!(fx.eval.verbosity, Verbosity::Debug);
        let err = fx.run("trace loud").unwrap_err();
        assert!(err.to_string().contains("invalid verbosity"));
    }

    #[test]
    fn test_rules_listing() {
        let mut fx = Fixture::new();
        assert_eq!(output(fx.run("rules").unwrap()), "no rules visible");
        fx.registry.root_mut().rules.add(crate::rules::Rule::new(
            "math",
            "double",
            crate::parser::parse_term("(double ?x)").unwrap(),
            crate::parser::parse_term("(* ?x 2)").unwrap(),
        ));
        let listing = output(fx.run("rules").unwrap());
        assert!(listing.contains("namespace global (1 rules):"));
        assert!(listing.contains("<math.double> (double ?x) (* ?x 2)"));
        let listing = output(fx.run("rules global").unwrap());
        assert!(listing.contains("rules in namespace global"));
        assert!(fx.run("rules missing").is_err());
    }

    #[test]
    fn test_history() {
        let mut fx = Fixture::new();
        assert_eq!(output(fx.run("history").unwrap()), "history is empty");
        fx.history = vec!["echo one".to_string(), "history".to_string()];
        let listing = output(fx.run("history").unwrap());
        assert!(listing.contains("1  echo one"));
        assert!(listing.contains("2  history"));
    }

    #[test]
    fn test_help_lists_commands_and_modes() {
        let mut fx = Fixture::new();
        let text = output(fx.run("help").unwrap());
        assert!(text.contains("echo"));
        assert!(text.contains("ns"));
        assert!(text.contains("modes: command eval"));
        assert!(text.contains(">label.name<"));
    }

    #[test]
    fn test_arity_enforced_for_builtins() {
        let mut fx = Fixture::new();
        assert!(matches!(
            fx.run("set only-one"),
            Err(ShellError::ArityMismatch { .. })
        ));
        assert!(matches!(
            fx.run("ns"),
            Err(ShellError::ArityMismatch { .. })
        ));
        assert!(matches!(
            fx.run("exit now"),
            Err(ShellError::ArityMismatch { .. })
        ));
    }
}
