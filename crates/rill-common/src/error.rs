use std::fmt;

use serde::Serialize;

use crate::span::{LineIndex, Span};

/// A tokenization error with location information.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The specific kind of tokenization error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LexErrorKind {
    /// A character the lexer has no rule for.
    Unexpected(char),
    /// A string literal was not closed before end of input.
    UnterminatedString,
    /// A backtick template was not closed before end of input.
    UnterminatedTemplate,
    /// A `/* ... */` comment was not closed before end of input.
    UnterminatedComment,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unexpected(c) => write!(f, "Unexpected character: {c:?}"),
            Self::UnterminatedString => write!(f, "Unterminated string"),
            Self::UnterminatedTemplate => write!(f, "Unterminated template string"),
            Self::UnterminatedComment => write!(f, "Unterminated multi-line comment"),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for LexError {}

/// A parse error: something expected was missing, or something present
/// was not allowed where it appeared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseErrorKind {
    Expected,
    Unexpected,
}

impl ParseError {
    pub fn expected(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::Expected,
            message: message.into(),
            span,
        }
    }

    pub fn unexpected(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::Unexpected,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Category of a runtime failure.
///
/// The category is part of the error's identity; the message text is opaque
/// to the core and only shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuntimeErrorKind {
    /// A `fail` statement or an uncategorised execution failure.
    Runtime,
    /// Operation not defined for the operand kinds involved.
    Type,
    /// Undefined variable or member.
    Name,
    /// Write to an immutable or constant binding.
    Assign,
    /// Sequence or text index out of range.
    Index,
    /// Map key not present.
    Key,
    /// Division by zero.
    DivZero,
    /// Wrong number or kind of arguments to a host function.
    Arg,
    /// Unknown module or unknown exported item.
    Import,
}

/// An execution-phase error, optionally pinned to a source span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
        }
    }

    /// Attach a span if the error does not already carry one.
    ///
    /// Inner expressions report the most precise location; outer evaluation
    /// layers only fill the gap when nothing closer was recorded.
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Render the standard one-line diagnostic form:
/// `File '<file>', line <l>, column <c>: <message>`.
///
/// Errors without a span render as `File '<file>': <message>`.
pub fn render_diagnostic(
    file: &str,
    index: &LineIndex,
    span: Option<Span>,
    message: &str,
) -> String {
    match span {
        Some(span) => {
            let (line, col) = index.line_col(span.start);
            format!("File '{file}', line {line}, column {col}: {message}")
        }
        None => format!("File '{file}': {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display() {
        let err = LexError::new(LexErrorKind::Unexpected('^'), Span::new(0, 1));
        assert_eq!(err.to_string(), "Unexpected character: '^'");
        assert_eq!(
            LexErrorKind::UnterminatedTemplate.to_string(),
            "Unterminated template string"
        );
    }

    #[test]
    fn runtime_error_span_is_sticky() {
        let err = RuntimeError::new(RuntimeErrorKind::DivZero, "Division by zero")
            .with_span(Span::new(4, 5))
            .with_span(Span::new(0, 9));
        assert_eq!(err.span, Some(Span::new(4, 5)));
    }

    #[test]
    fn diagnostic_rendering() {
        let source = "let x = 1\nx = 2\n";
        let index = LineIndex::new(source);
        let rendered = render_diagnostic(
            "demo.rill",
            &index,
            Some(Span::new(10, 11)),
            "Cannot reassign immutable variable 'x'",
        );
        assert_eq!(
            rendered,
            "File 'demo.rill', line 2, column 1: Cannot reassign immutable variable 'x'"
        );
    }

    #[test]
    fn diagnostic_rendering_without_span() {
        let index = LineIndex::new("");
        assert_eq!(
            render_diagnostic("demo.rill", &index, None, "boom"),
            "File 'demo.rill': boom"
        );
    }
}
