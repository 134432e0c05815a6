//! Pattern nodes used by `check` cases.
//!
//! Patterns are reparsed from expression-level constructs: a literal becomes
//! a literal match, an identifier becomes a binding (`_` is the wildcard),
//! list and map literals become structural patterns, and anything else is
//! kept as an expression to be evaluated and compared by equality.

use serde::Serialize;

use rill_common::span::Span;

use crate::ast::expr::{Expr, Lit};

#[derive(Debug, Clone, Serialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

impl Pattern {
    pub fn new(kind: PatternKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum PatternKind {
    /// `_` -- matches anything, binds nothing.
    Wildcard,
    /// Matches by structural equality.
    Literal(Lit),
    /// Matches anything, binding the value to the name.
    Binding(String),
    /// Matches numerics within `[start, end]` inclusive.
    Range { start: Box<Expr>, end: Box<Expr> },
    /// Matches sequences of equal length, pairwise by sub-pattern.
    List(Vec<Pattern>),
    /// Matches maps containing every listed key, sub-patterning the values.
    Map(Vec<(Expr, Pattern)>),
    /// Evaluated as a normal expression and compared by equality.
    Expr(Box<Expr>),
}
