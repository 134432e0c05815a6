//! Interactive shell for the Rill language.
//!
//! A read-eval-print loop over a persistent interpreter. Multi-line input
//! continues while `(`/`@`/`~` opens outnumber their closes or the line
//! ends in a trailing binary operator. Parse and runtime errors render as
//! ariadne reports with the offending span labeled.

pub mod session;

pub use session::ReplSession;

use ariadne::{Label, Report, ReportKind, Source};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use rill_common::span::Span;
use rill_eval::{Interpreter, Value};

/// Configuration for the shell.
pub struct ReplConfig {
    /// Primary prompt (default: `rill> `).
    pub prompt: String,
    /// Continuation prompt for multi-line input (default: `  ... `).
    pub continuation: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "rill> ".to_string(),
            continuation: "  ... ".to_string(),
        }
    }
}

/// Run the interactive shell until `exit`/`quit` or end of input.
pub fn run_repl(config: &ReplConfig) -> Result<(), String> {
    let mut editor = DefaultEditor::new().map_err(|e| e.to_string())?;
    let mut interp = Interpreter::new();
    if let Ok(cwd) = std::env::current_dir() {
        interp.set_module_base(cwd);
    }
    let mut session = ReplSession::new();

    println!("Rill {} interactive shell", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or 'quit' to exit, 'help' for help.");
    println!();

    let mut buffer: Vec<String> = Vec::new();

    loop {
        let prompt = if buffer.is_empty() {
            &config.prompt
        } else {
            &config.continuation
        };

        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => return Err(e.to_string()),
        };

        if buffer.is_empty() {
            match line.trim() {
                "exit" | "quit" => {
                    println!("Goodbye!");
                    break;
                }
                "help" => {
                    print_help();
                    continue;
                }
                "clear" => {
                    print!("\x1b[2J\x1b[H");
                    continue;
                }
                _ => {}
            }
        }

        buffer.push(line);
        let source = buffer.join("\n");

        if needs_more_input(&source) {
            continue;
        }
        buffer.clear();

        if source.trim().is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(source.as_str());

        match evaluate(&mut interp, &source) {
            Ok(Some(rendered)) => {
                println!("{rendered}");
                session.record(Some(rendered));
            }
            Ok(None) => session.record(None),
            Err(()) => {}
        }
    }

    Ok(())
}

/// Parse and run one input against the persistent interpreter. Errors are
/// reported to stderr and swallowed so the session continues.
fn evaluate(interp: &mut Interpreter, source: &str) -> Result<Option<String>, ()> {
    let program = match rill_parser::parse(source) {
        Ok(program) => program,
        Err(e) => {
            report(source, Some(e.span()), &e.to_string());
            return Err(());
        }
    };

    match interp.run(&program) {
        Ok(Value::None) => Ok(None),
        Ok(value) => Ok(Some(render_value(&value))),
        Err(e) => {
            report(source, e.span, &e.message);
            Err(())
        }
    }
}

/// Render an error as an ariadne report with the offending span labeled.
fn report(source: &str, span: Option<Span>, message: &str) {
    let (start, end) = match span {
        Some(span) => (span.start as usize, (span.end as usize).max(span.start as usize + 1)),
        None => (0, source.len().max(1)),
    };
    let end = end.min(source.len().max(1));
    let start = start.min(end.saturating_sub(1));
    let _ = Report::<std::ops::Range<usize>>::build(ReportKind::Error, start..end)
        .with_message(message)
        .with_label(Label::new(start..end).with_message(message))
        .finish()
        .eprint(Source::from(source));
}

/// Language-natural rendering: none, yes/no, quoted text, `[...]`, `{...}`.
pub fn render_value(value: &Value) -> String {
    value.repr_text()
}

/// Whether the input is syntactically mid-flight: unbalanced `(`/`@`/`~`
/// groupings, or a trailing binary operator.
pub fn needs_more_input(source: &str) -> bool {
    let opens = source.matches('@').count()
        + source.matches('~').count()
        + source.matches('(').count();
    let closes = source.matches('#').count()
        + source.matches('!').count()
        + source.matches(')').count();
    if opens > closes {
        return true;
    }

    let trimmed = source.trim_end();
    const SYMBOLIC: &[&str] = &["->", "~>", "+", "-", "*", "/", "=", ","];
    if SYMBOLIC.iter().any(|op| trimmed.ends_with(op)) {
        return true;
    }
    // `and`/`or` only count on a word boundary, not as identifier tails.
    const WORDY: &[&str] = &["and", "or", "not"];
    WORDY.iter().any(|op| {
        trimmed.ends_with(op)
            && !trimmed[..trimmed.len() - op.len()]
                .ends_with(|c: char| c.is_alphanumeric() || c == '_')
    })
}

fn print_help() {
    println!(
        "
Rill shell commands:
  help     Show this help message
  clear    Clear the screen
  exit     Exit the shell
  quit     Exit the shell

Language basics:
  let x = 10               Immutable variable
  mut y = 20               Mutable variable
  print(\"hello\")           Print to console

  conduit add(a, b) @      Function definition
      give a + b
  #

  if x > 5 @ print(x) #    Conditional
  repeat i in 1..10 @ print(i) #

  grab math                Import a module
  grab crypto.sha256       Import one item
"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_eval::ValueMap;

    #[test]
    fn continuation_tracks_delimiters() {
        assert!(needs_more_input("conduit f() @"));
        assert!(needs_more_input("~ 1, 2,"));
        assert!(needs_more_input("(1 + "));
        assert!(!needs_more_input("conduit f() @ give 1 #"));
        assert!(!needs_more_input("1 + 2"));
    }

    #[test]
    fn continuation_tracks_trailing_operators() {
        assert!(needs_more_input("1 +"));
        assert!(needs_more_input("xs ->"));
        assert!(needs_more_input("a and"));
        assert!(!needs_more_input("a + b"));
    }

    #[test]
    fn values_render_language_naturally() {
        assert_eq!(render_value(&Value::None), "none");
        assert_eq!(render_value(&Value::Bool(true)), "yes");
        assert_eq!(render_value(&Value::text("hi")), "'hi'");
        assert_eq!(
            render_value(&Value::list(vec![Value::Int(1), Value::text("a")])),
            "[1, 'a']"
        );
        let mut map = ValueMap::new();
        map.insert_str("k", Value::Int(1));
        assert_eq!(render_value(&Value::map(map)), "{k: 1}");
    }

    #[test]
    fn evaluate_keeps_state_between_inputs() {
        let mut interp = Interpreter::new();
        assert_eq!(evaluate(&mut interp, "mut x = 20"), Ok(None));
        assert_eq!(evaluate(&mut interp, "x + 22"), Ok(Some("42".to_string())));
    }
}
