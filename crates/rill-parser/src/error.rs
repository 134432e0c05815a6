use std::fmt;

use rill_common::error::{LexError, ParseError};
use rill_common::span::Span;

/// A front-end failure: either the tokenizer or the parser rejected the
/// source. Callers that only care about "did it parse" handle this one type.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxError {
    Lex(LexError),
    Parse(ParseError),
}

impl SyntaxError {
    /// The source span the error points at.
    pub fn span(&self) -> Span {
        match self {
            Self::Lex(e) => e.span,
            Self::Parse(e) => e.span,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SyntaxError {}

impl From<LexError> for SyntaxError {
    fn from(e: LexError) -> Self {
        Self::Lex(e)
    }
}

impl From<ParseError> for SyntaxError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}
