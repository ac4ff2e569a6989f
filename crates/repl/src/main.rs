//! knotr - Interactive REPL for Knot
//!
//! Each line is fed through the incremental parser; an unterminated string
//! or comment switches to a continuation prompt and the next line resumes
//! it. Committed lines compile against the shared VM (bindings persist for
//! the whole session) and run on a background thread, so Ctrl-C cancels a
//! runaway program instead of killing the REPL.
//!
//! Commands:
//!   :quit, :q               # Exit
//!   :show                   # Show the session so far, wrapped to --width
//!   :clear                  # Discard session text (bindings survive)
//!   :help                   # Show help

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Parser as ClapParser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::info;

use knot_core::Expr;
use knot_runtime::{CancelToken, FnIndex, Value, Vm, spawn_run};
use knotc::{ParseOptions, Session, compile, exprs_to_string_wrapped};

#[derive(ClapParser)]
#[command(name = "knotr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interactive REPL for the Knot language", long_about = None)]
struct Args {
    /// Treat a single space as a separator instead of identifier glue
    #[arg(long)]
    space_as_sep: bool,

    /// Display width for :show
    #[arg(long, default_value_t = 80)]
    width: usize,
}

/// How often a running program is checked for completion or Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn main() {
    let args = Args::parse();

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("knotr=info".parse().expect("valid directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Ctrl-C sets a flag; the run loop polls it and cancels the program.
    let interrupted = Arc::new(AtomicBool::new(false));
    if let Err(e) =
        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&interrupted))
    {
        eprintln!("Warning: could not install SIGINT handler: {}", e);
    }

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Error initializing readline: {}", e);
            std::process::exit(1);
        }
    };

    let history_file = home::home_dir().map(|d| d.join(".knotr_history"));
    if let Some(ref path) = history_file {
        let _ = rl.load_history(path);
    }

    let vm = Arc::new(Vm::new());
    let parse_options = ParseOptions {
        space_as_sep: args.space_as_sep,
        partial: true,
    };
    let mut session = Session::new(parse_options);
    // Everything committed so far, for :show.
    let mut log: Vec<Expr> = Vec::new();

    info!("starting session");
    println!("\nKnot REPL (knotr). Type :help for commands, :quit to exit.\n");

    loop {
        let prompt = if session.has_pending() || !session.zipper().is_empty() {
            "....> "
        } else {
            "knot> "
        };
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() && !session.has_pending() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match trimmed {
                    ":quit" | ":q" => {
                        println!("Goodbye!");
                        break;
                    }
                    ":help" => print_help(),
                    ":show" => show_session(&log, args.width),
                    ":clear" => {
                        session = Session::new(parse_options);
                        log.clear();
                        println!("Session cleared (bindings survive).");
                    }
                    _ => handle_line(&vm, &mut session, &mut log, &line, &interrupted),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Cancel the current input, not the REPL.
                println!("^C");
                interrupted.store(false, Ordering::Relaxed);
                session.discard_pending();
                session.zipper_mut().reset();
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Some(ref path) = history_file {
        let _ = rl.save_history(path);
    }
}

/// Feed one line; commit, compile, and run when nothing is left open.
fn handle_line(
    vm: &Arc<Vm>,
    session: &mut Session,
    log: &mut Vec<Expr>,
    line: &str,
    interrupted: &Arc<AtomicBool>,
) {
    // The newline closes any trailing comment.
    let outcome = session.feed(&format!("{}\n", line));
    if let Some(diag) = outcome.diagnostic {
        if diag.is_incomplete() {
            // Continuation prompt; the next line resumes the open construct.
            return;
        }
        eprintln!("Parse error: {}", diag);
        session.discard_pending();
        return;
    }

    let exprs = match session.commit() {
        Ok(exprs) => exprs,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            session.zipper_mut().reset();
            return;
        }
    };
    if exprs.iter().all(Expr::is_comment) {
        log.extend(exprs);
        return;
    }

    let output = match compile(vm, &exprs) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Compile error: {}", e);
            return;
        }
    };
    log.extend(exprs);
    for name in &output.new_symbols {
        println!("new binding: {}", name);
    }
    run_program(vm, output.function, interrupted);
}

/// Run a compiled line on a background thread, cancellable with Ctrl-C.
fn run_program(vm: &Arc<Vm>, function: FnIndex, interrupted: &Arc<AtomicBool>) {
    let token = CancelToken::new();
    interrupted.store(false, Ordering::Relaxed);
    let handle = spawn_run(Arc::clone(vm), function, token.clone());

    while !handle.is_finished() {
        if interrupted.swap(false, Ordering::Relaxed) {
            println!("^C (cancelling)");
            token.cancel();
        }
        thread::sleep(POLL_INTERVAL);
    }

    for text in vm.take_output() {
        println!("{}", text);
    }
    match handle.join() {
        Ok(Ok(stack)) => {
            if !stack.is_empty() {
                println!("{}", format_stack(&stack));
            }
        }
        Ok(Err(e)) => eprintln!("Runtime error: {}", e),
        Err(_) => eprintln!("Run thread panicked"),
    }
}

/// Render a final stack as `[bottom, ..., top]`.
fn format_stack(stack: &[Value]) -> String {
    let items: Vec<String> = stack.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Show everything committed so far, wrapped for the terminal.
fn show_session(log: &[Expr], width: usize) {
    if log.is_empty() {
        println!("(empty session)");
        return;
    }
    println!("{}", exprs_to_string_wrapped(log, width));
}

/// Print help message
fn print_help() {
    println!(
        r#"
Knot REPL Commands:
  :quit, :q     Exit the REPL
  :show         Show the session so far, wrapped to --width
  :clear        Discard session text (bindings survive)
  :help         Show this help

Usage:
  - Type expressions to evaluate them; the stack is shown after each line
  - Bind with =_name (prefix "=_x  5" or postfix "5  =_x")
  - Push a binding's value with _name; a bare name calls it
  - Parens build quotations: "=_sq  (  _x  _x  *  )" then "9  =_x  sq"
  - A single space glues identifiers ("foo bar" is foo_bar); use two
    spaces to separate, or start with --space-as-sep
  - Ctrl-C cancels a running program without leaving the REPL

Examples:
  knot> 3  4  +
  [7]
  knot> =_x  5  _x
  new binding: x
  [5]
  knot> "hello"  print
  "hello"
"#
    );
}
