//! Pattern parsing for `check` cases.
//!
//! Patterns reuse expression-level constructs: list and map literals are
//! parsed by the expression parser and converted recursively. Within that
//! conversion an identifier becomes a binding (`_` the wildcard), a literal
//! a literal match, and anything else an expression compared by equality.

use rill_common::error::ParseError;
use rill_common::token::TokenKind;

use crate::ast::{Expr, ExprKind, Pattern, PatternKind};

use super::Parser;

impl<'src> Parser<'src> {
    pub(crate) fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        match self.current() {
            // Wildcard: the identifier `_`.
            TokenKind::Ident if self.text(self.current_span()) == "_" => {
                let token = self.advance();
                Ok(Pattern::new(PatternKind::Wildcard, token.span))
            }

            // A number may open a range pattern.
            TokenKind::Number => {
                let start = self.parse_unary()?;
                if matches!(self.current(), TokenKind::DotDot | TokenKind::To) {
                    self.advance();
                    let end = self.parse_unary()?;
                    let span = start.span.cover(end.span);
                    return Ok(Pattern::new(
                        PatternKind::Range {
                            start: Box::new(start),
                            end: Box::new(end),
                        },
                        span,
                    ));
                }
                self.expr_to_pattern(start)
            }

            // Negative literals and ranges: `-5`, `-10 .. -1`.
            TokenKind::Minus => {
                let start = self.parse_unary()?;
                if matches!(self.current(), TokenKind::DotDot | TokenKind::To) {
                    self.advance();
                    let end = self.parse_unary()?;
                    let span = start.span.cover(end.span);
                    return Ok(Pattern::new(
                        PatternKind::Range {
                            start: Box::new(start),
                            end: Box::new(end),
                        },
                        span,
                    ));
                }
                let span = start.span;
                Ok(Pattern::new(PatternKind::Expr(Box::new(start)), span))
            }

            TokenKind::Str | TokenKind::Yes | TokenKind::No | TokenKind::None => {
                let expr = self.parse_unary()?;
                self.expr_to_pattern(expr)
            }

            TokenKind::ListOpen => {
                let expr = self.parse_list_literal()?;
                self.expr_to_pattern(expr)
            }

            TokenKind::BlockOpen => {
                let expr = self.parse_map_literal()?;
                self.expr_to_pattern(expr)
            }

            TokenKind::Ident => {
                let token = self.advance();
                let name = self.text(token.span).to_string();
                Ok(Pattern::new(PatternKind::Binding(name), token.span))
            }

            _ => Err(self.unexpected("Expected pattern")),
        }
    }

    /// Convert an expression-level construct into a pattern, recursively.
    fn expr_to_pattern(&self, expr: Expr) -> Result<Pattern, ParseError> {
        let span = expr.span;
        let kind = match expr.kind {
            ExprKind::Literal(lit) => PatternKind::Literal(lit),
            ExprKind::Ident(name) if name == "_" => PatternKind::Wildcard,
            ExprKind::Ident(name) => PatternKind::Binding(name),
            ExprKind::List(elements) => {
                let mut patterns = Vec::with_capacity(elements.len());
                for element in elements {
                    if matches!(element.kind, ExprKind::Spread(_)) {
                        return Err(ParseError::unexpected(
                            "Spread is not allowed in a list pattern",
                            element.span,
                        ));
                    }
                    patterns.push(self.expr_to_pattern(element)?);
                }
                PatternKind::List(patterns)
            }
            ExprKind::MapLit(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for entry in entries {
                    let Some(key) = entry.key else {
                        return Err(ParseError::unexpected(
                            "Spread is not allowed in a map pattern",
                            entry.value.span,
                        ));
                    };
                    pairs.push((key, self.expr_to_pattern(entry.value)?));
                }
                PatternKind::Map(pairs)
            }
            ExprKind::Range { start, end, .. } => PatternKind::Range { start, end },
            other => PatternKind::Expr(Box::new(Expr::new(other, span))),
        };
        Ok(Pattern::new(kind, span))
    }
}
