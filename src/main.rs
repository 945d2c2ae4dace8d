use argh::FromArgs;
use namespaced_modal::eval::Verbosity;
use namespaced_modal::interpreter::{Interpreter, Options, STANDARD_RULES};
use namespaced_modal::terminal::ReadlineSession;
use std::path::PathBuf;

#[derive(FromArgs)]
/// Modal, namespace-scoped term-rewriting shell.
struct Args {
    /// namespace to start in; created under the root if new
    #[argh(option, default = "String::from(\"global\")")]
    namespace: String,

    /// mode to start in (command or eval)
    #[argh(option, default = "String::from(\"command\")")]
    mode: String,

    /// rule file to load instead of the embedded standard rules
    #[argh(option)]
    rules: Option<PathBuf>,

    /// initial evaluation verbosity: quiet, trace, or debug
    #[argh(option, default = "Verbosity::Quiet")]
    trace: Verbosity,
}

fn main() {
    env_logger::init();
    let args: Args = argh::from_env();
    std::process::exit(run(args));
}

fn run(args: Args) -> i32 {
    let rules_source = match &args.rules {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("error: cannot read {}: {}", path.display(), e);
                return 1;
            }
        },
        None => STANDARD_RULES.to_string(),
    };

    let options = Options {
        namespace: args.namespace,
        mode: args.mode,
        rules_source,
        verbosity: args.trace,
    };
    let mut interpreter = match Interpreter::new(options) {
        Ok(interpreter) => interpreter,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return 1;
        }
    };

    let mut term = match ReadlineSession::new() {
        Ok(term) => term,
        Err(e) => {
            eprintln!("error: cannot open terminal: {}", e);
            return 1;
        }
    };

    interpreter.repl(&mut term);
    0
}
