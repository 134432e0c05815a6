//! REPL session state.
//!
//! Tracks how many inputs have been evaluated and the rendered results, so
//! the shell can expose history without reaching into the interpreter.

/// Persistent state for one interactive session.
pub struct ReplSession {
    eval_counter: u64,
    results: Vec<String>,
}

impl ReplSession {
    pub fn new() -> Self {
        Self {
            eval_counter: 0,
            results: Vec::new(),
        }
    }

    /// Record one evaluated input and its rendered result (if it produced
    /// a value worth echoing).
    pub fn record(&mut self, rendered: Option<String>) {
        self.eval_counter += 1;
        if let Some(rendered) = rendered {
            self.results.push(rendered);
        }
    }

    /// Number of inputs evaluated so far.
    pub fn eval_counter(&self) -> u64 {
        self.eval_counter
    }

    /// Rendered results, oldest first.
    pub fn results(&self) -> &[String] {
        &self.results
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.eval_counter = 0;
        self.results.clear();
    }
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_inputs_and_results() {
        let mut session = ReplSession::new();
        session.record(Some("3".to_string()));
        session.record(None);
        session.record(Some("'hi'".to_string()));
        assert_eq!(session.eval_counter(), 3);
        assert_eq!(session.results(), &["3".to_string(), "'hi'".to_string()]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = ReplSession::new();
        session.record(Some("1".to_string()));
        session.reset();
        assert_eq!(session.eval_counter(), 0);
        assert!(session.results().is_empty());
    }
}
