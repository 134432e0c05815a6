//! The Rill interpreter CLI.
//!
//! Subcommands:
//!
//! - `rill run <file>` - execute a script (`--debug` dumps tokens and tree)
//! - `rill repl` - start the interactive shell
//! - `rill serve <file>` - execute and stay resident (`--watch` reloads on
//!   change, `--workers N` supervises N child processes)
//!
//! Errors print to stderr as
//! `File '<file>', line <l>, column <c>: <message>` and exit with status 1.

mod serve;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use rill_common::error::render_diagnostic;
use rill_common::span::{LineIndex, Span};
use rill_eval::Interpreter;

#[derive(Parser)]
#[command(name = "rill", version, about = "The Rill interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Rill script
    Run {
        /// Path to the script
        file: PathBuf,

        /// Print the token stream and syntax tree before execution
        #[arg(short, long)]
        debug: bool,
    },

    /// Start the interactive shell
    Repl,

    /// Run a script and stay resident
    Serve {
        /// Path to the script
        file: PathBuf,

        /// Re-evaluate the script when its modification time changes
        #[arg(short, long)]
        watch: bool,

        /// Number of worker processes to supervise
        #[arg(long, default_value_t = 1)]
        workers: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Run { file, debug } => run(&file, debug),
        Commands::Repl => match rill_repl::run_repl(&rill_repl::ReplConfig::default()) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("error: {e}");
                1
            }
        },
        Commands::Serve {
            file,
            watch,
            workers,
        } => serve::serve(&file, watch, workers),
    };

    process::exit(code);
}

/// Execute a script end to end. Returns the process exit code.
fn run(path: &Path, debug: bool) -> i32 {
    let file_name = path.display().to_string();

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot read '{file_name}': {e}");
            return 1;
        }
    };
    let index = LineIndex::new(&source);

    let tokens = match rill_lexer::tokenize(&source) {
        Ok(tokens) => tokens,
        Err(e) => {
            print_error(&file_name, &index, Some(e.span), &e.to_string());
            return 1;
        }
    };

    if debug {
        println!("=== Tokens ===");
        for token in &tokens {
            println!("  {token:?}");
        }
        println!();
    }

    let program = match rill_parser::parse_tokens(tokens, &source) {
        Ok(program) => program,
        Err(e) => {
            print_error(&file_name, &index, Some(e.span), &e.message);
            return 1;
        }
    };

    if debug {
        println!("=== Syntax tree ===");
        match serde_json::to_string_pretty(&program) {
            Ok(json) => println!("{json}"),
            Err(_) => println!("{program:#?}"),
        }
        println!();
        println!("=== Output ===");
    }

    let mut interp = Interpreter::new();
    if let Some(dir) = path.parent() {
        interp.set_module_base(dir.to_path_buf());
    }

    match interp.run(&program) {
        Ok(_) => 0,
        Err(e) => {
            print_error(&file_name, &index, e.span, &e.message);
            1
        }
    }
}

/// Print the standard one-line diagnostic form to stderr.
fn print_error(file: &str, index: &LineIndex, span: Option<Span>, message: &str) {
    eprintln!("{}", render_diagnostic(file, index, span, message));
}
