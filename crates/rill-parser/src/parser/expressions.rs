//! Expression parsing, lowest precedence first.

use std::rc::Rc;

use rill_common::error::ParseError;
use rill_common::token::{Token, TokenKind};

use crate::ast::{
    AssignOp, BinOp, CaseBody, CheckCase, CheckExpr, CmpOp, Expr, ExprKind, LambdaBody,
    LambdaDecl, Lit, LogicOp, MapEntry, TemplatePart, UnOp,
};

use super::Parser;

impl<'src> Parser<'src> {
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    /// `target = value`, `target += value`, ... (right-associative).
    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_pipeline()?;

        let op = match self.current() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            _ => return Ok(expr),
        };
        self.advance();

        let value = self.parse_assignment()?;
        let span = expr.span.cover(value.span);
        Ok(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(expr),
                value: Box::new(value),
            },
            span,
        ))
    }

    /// `seed -> stage -> stage`; any `~>` marks the whole chain asynchronous.
    fn parse_pipeline(&mut self) -> Result<Expr, ParseError> {
        let seed = self.parse_null_coalesce()?;

        if !matches!(self.current(), TokenKind::Arrow | TokenKind::TildeArrow) {
            return Ok(seed);
        }

        let mut stages = Vec::new();
        let mut is_async = false;
        while matches!(self.current(), TokenKind::Arrow | TokenKind::TildeArrow) {
            if self.advance().kind == TokenKind::TildeArrow {
                is_async = true;
            }
            self.skip_newlines();
            stages.push(self.parse_null_coalesce()?);
        }

        let span = seed.span.cover(stages.last().map(|s| s.span).unwrap_or(seed.span));
        Ok(Expr::new(
            ExprKind::Pipeline {
                seed: Box::new(seed),
                stages,
                is_async,
            },
            span,
        ))
    }

    fn parse_null_coalesce(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_or()?;
        while self.eat(TokenKind::QuestionQuestion) {
            let rhs = self.parse_or()?;
            let span = expr.span.cover(rhs.span);
            expr = Expr::new(
                ExprKind::NullCoalesce {
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_and()?;
        while self.eat(TokenKind::Or) {
            let rhs = self.parse_and()?;
            let span = expr.span.cover(rhs.span);
            expr = Expr::new(
                ExprKind::Logical {
                    op: LogicOp::Or,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_not()?;
        while self.eat(TokenKind::And) {
            let rhs = self.parse_not()?;
            let span = expr.span.cover(rhs.span);
            expr = Expr::new(
                ExprKind::Logical {
                    op: LogicOp::And,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.at(TokenKind::Not) {
            let token = self.advance();
            let operand = self.parse_not()?;
            let span = token.span.cover(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_comparison()?;
        while matches!(self.current(), TokenKind::EqEq | TokenKind::NotEq) {
            let op = if self.advance().kind == TokenKind::EqEq {
                BinOp::Eq
            } else {
                BinOp::Ne
            };
            let rhs = self.parse_comparison()?;
            let span = expr.span.cover(rhs.span);
            expr = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(expr)
    }

    /// `< > <= >= in`, collecting `a < b < c` into one chain node.
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_range()?;

        if comparison_op(self.current()).is_none() {
            return Ok(first);
        }

        let mut ops = Vec::new();
        let mut operands = vec![first];
        while let Some(op) = comparison_op(self.current()) {
            self.advance();
            ops.push(op);
            operands.push(self.parse_range()?);
        }

        let span = operands[0].span.cover(operands[operands.len() - 1].span);

        // A single comparison is an ordinary binary node; only genuine
        // chains get the parallel-array form.
        if ops.len() == 1 {
            let rhs = operands.pop().unwrap();
            let lhs = operands.pop().unwrap();
            return Ok(Expr::new(
                ExprKind::Binary {
                    op: cmp_to_bin(ops[0]),
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            ));
        }

        Ok(Expr::new(ExprKind::Comparison { ops, operands }, span))
    }

    /// `start .. end` or `start to end` (both inclusive).
    fn parse_range(&mut self) -> Result<Expr, ParseError> {
        let start = self.parse_addition()?;
        if matches!(self.current(), TokenKind::DotDot | TokenKind::To) {
            self.advance();
            let end = self.parse_addition()?;
            let span = start.span.cover(end.span);
            return Ok(Expr::new(
                ExprKind::Range {
                    start: Box::new(start),
                    end: Box::new(end),
                    inclusive: true,
                },
                span,
            ));
        }
        Ok(start)
    }

    fn parse_addition(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_multiplication()?;
        while matches!(self.current(), TokenKind::Plus | TokenKind::Minus) {
            let op = if self.advance().kind == TokenKind::Plus {
                BinOp::Add
            } else {
                BinOp::Sub
            };
            let rhs = self.parse_multiplication()?;
            let span = expr.span.cover(rhs.span);
            expr = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_multiplication(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_power()?;
        loop {
            let op = match self.current() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_power()?;
            let span = expr.span.cover(rhs.span);
            expr = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(expr)
    }

    /// `**` binds tighter than unary sign and is right-associative.
    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_unary()?;
        if self.eat(TokenKind::StarStar) {
            let rhs = self.parse_power()?;
            let span = lhs.span.cover(rhs.span);
            return Ok(Expr::new(
                ExprKind::Binary {
                    op: BinOp::Pow,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            ));
        }
        Ok(lhs)
    }

    pub(crate) fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.current(), TokenKind::Minus | TokenKind::Plus) {
            let token = self.advance();
            let op = if token.kind == TokenKind::Minus {
                UnOp::Neg
            } else {
                UnOp::Pos
            };
            let operand = self.parse_unary()?;
            let span = token.span.cover(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_await_yield()
    }

    fn parse_await_yield(&mut self) -> Result<Expr, ParseError> {
        if self.at(TokenKind::Wait) {
            let token = self.advance();
            let operand = self.parse_await_yield()?;
            let span = token.span.cover(operand.span);
            return Ok(Expr::new(ExprKind::Await(Box::new(operand)), span));
        }

        if self.at(TokenKind::Yield) {
            let token = self.advance();
            let value = if self.is_statement_end() {
                None
            } else {
                Some(Box::new(self.parse_expression()?))
            };
            let span = value
                .as_ref()
                .map(|v| token.span.cover(v.span))
                .unwrap_or(token.span);
            return Ok(Expr::new(ExprKind::Yield(value), span));
        }

        self.parse_postfix()
    }

    /// Postfix chain: call, member, safe member, index, safe index, static.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current() {
                TokenKind::LParen => {
                    let (args, end) = self.parse_call_args()?;
                    let span = expr.span.cover(end);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::Dot | TokenKind::QuestionDot => {
                    let safe = self.advance().kind == TokenKind::QuestionDot;
                    let (property, pspan) = self.expect_ident("property name")?;
                    let span = expr.span.cover(pspan);
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property,
                            safe,
                        },
                        span,
                    );
                }
                TokenKind::ListOpen | TokenKind::QuestionTilde => {
                    let safe = self.advance().kind == TokenKind::QuestionTilde;
                    self.skip_newlines();
                    let index = self.parse_expression()?;
                    self.skip_newlines();
                    let close = self.expect(TokenKind::ListClose)?;
                    let span = expr.span.cover(close.span);
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                            safe,
                        },
                        span,
                    );
                }
                TokenKind::ColonColon => {
                    self.advance();
                    let (property, pspan) = self.expect_ident("static member name")?;
                    let span = expr.span.cover(pspan);
                    expr = Expr::new(
                        ExprKind::StaticMember {
                            object: Box::new(expr),
                            property,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// `( args )` with spread elements. Returns the args and the span of
    /// the closing paren.
    fn parse_call_args(
        &mut self,
    ) -> Result<(Vec<Expr>, rill_common::span::Span), ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        self.skip_newlines();
        while !self.at(TokenKind::RParen) {
            if self.at(TokenKind::DotDotDot) {
                let dots = self.advance();
                let inner = self.parse_expression()?;
                let span = dots.span.cover(inner.span);
                args.push(Expr::new(ExprKind::Spread(Box::new(inner)), span));
            } else {
                args.push(self.parse_expression()?);
            }
            self.skip_newlines();
            if !self.at(TokenKind::RParen) {
                self.expect(TokenKind::Comma)?;
                self.skip_newlines();
            }
        }
        let close = self.expect(TokenKind::RParen)?;
        Ok((args, close.span))
    }

    // ── Primary ───────────────────────────────────────────────────────

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.current() {
            TokenKind::Number => {
                let token = self.advance();
                let lit = self.number_literal(&token)?;
                Ok(Expr::new(ExprKind::Literal(lit), token.span))
            }
            TokenKind::Str => {
                let token = self.advance();
                let text = rill_lexer::cook_string(self.text(token.span));
                Ok(Expr::new(ExprKind::Literal(Lit::Text(text)), token.span))
            }
            TokenKind::TemplatePiece | TokenKind::InterpStart => self.parse_template(),
            TokenKind::Yes => {
                let token = self.advance();
                Ok(Expr::new(ExprKind::Literal(Lit::Bool(true)), token.span))
            }
            TokenKind::No => {
                let token = self.advance();
                Ok(Expr::new(ExprKind::Literal(Lit::Bool(false)), token.span))
            }
            TokenKind::None => {
                let token = self.advance();
                Ok(Expr::new(ExprKind::Literal(Lit::None), token.span))
            }
            TokenKind::Me => {
                let token = self.advance();
                Ok(Expr::new(ExprKind::SelfRef, token.span))
            }
            TokenKind::Parent => {
                let token = self.advance();
                Ok(Expr::new(ExprKind::ParentRef, token.span))
            }
            TokenKind::Check => self.parse_check_expr(),
            TokenKind::Ident => {
                let token = self.advance();
                let name = self.text(token.span).to_string();
                Ok(Expr::new(ExprKind::Ident(name), token.span))
            }
            TokenKind::Conduit => self.parse_anonymous_function(),
            TokenKind::LParen => {
                if self.at_lambda_params() {
                    return self.parse_lambda_after_lparen();
                }
                self.advance();
                self.skip_newlines();
                let expr = self.parse_expression()?;
                self.skip_newlines();
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::ListOpen => self.parse_list_literal(),
            TokenKind::BlockOpen => self.parse_map_literal(),
            _ => Err(self.unexpected("Expected expression")),
        }
    }

    /// Base conversion for a number lexeme (the tokenizer has already
    /// elided underscores via `cook_number`).
    fn number_literal(&self, token: &Token) -> Result<Lit, ParseError> {
        let raw = rill_lexer::cook_number(self.text(token.span));

        let lit = if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            i64::from_str_radix(hex, 16).ok().map(Lit::Int)
        } else if let Some(bin) = raw.strip_prefix("0b").or_else(|| raw.strip_prefix("0B")) {
            i64::from_str_radix(bin, 2).ok().map(Lit::Int)
        } else if raw.contains('.') || raw.contains('e') || raw.contains('E') {
            raw.parse::<f64>().ok().map(Lit::Float)
        } else {
            // Integers that overflow i64 fall back to floating point.
            raw.parse::<i64>()
                .ok()
                .map(Lit::Int)
                .or_else(|| raw.parse::<f64>().ok().map(Lit::Float))
        };

        lit.ok_or_else(|| {
            ParseError::unexpected(format!("Invalid number literal: {raw}"), token.span)
        })
    }

    /// Assemble a template string from piece and interpolation tokens.
    fn parse_template(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        let mut end = start;
        let mut parts = Vec::new();

        loop {
            match self.current() {
                TokenKind::TemplatePiece => {
                    let token = self.advance();
                    end = token.span;
                    let text = rill_lexer::cook_template_piece(self.text(token.span));
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(text));
                    }
                }
                TokenKind::InterpStart => {
                    self.advance();
                    let expr = self.parse_expression()?;
                    let close = self.expect(TokenKind::InterpEnd)?;
                    end = close.span;
                    parts.push(TemplatePart::Expr(expr));
                }
                _ => break,
            }
        }

        Ok(Expr::new(ExprKind::Template(parts), start.cover(end)))
    }

    /// `check subject @ case* #`, usable as expression or statement.
    pub(crate) fn parse_check_expr(&mut self) -> Result<Expr, ParseError> {
        let keyword = self.expect(TokenKind::Check)?;
        let subject = self.parse_expression()?;

        self.expect(TokenKind::BlockOpen)?;
        self.skip_newlines();
        let mut cases = Vec::new();
        while !self.at(TokenKind::BlockClose) && !self.at(TokenKind::Eof) {
            cases.push(self.parse_check_case()?);
            self.skip_newlines();
        }
        let close = self.expect(TokenKind::BlockClose)?;

        let span = keyword.span.cover(close.span);
        Ok(Expr::new(
            ExprKind::Check(Box::new(CheckExpr {
                subject,
                cases,
                span,
            })),
            span,
        ))
    }

    /// `pattern [when guard] => body`; cases separated by newlines or `;`.
    fn parse_check_case(&mut self) -> Result<CheckCase, ParseError> {
        let pattern = self.parse_pattern()?;

        let guard = if self.eat(TokenKind::When) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect_with(TokenKind::FatArrow, "Expected '=>' after pattern")?;

        let body = if self.at(TokenKind::BlockOpen) {
            CaseBody::Block(self.parse_block()?)
        } else {
            CaseBody::Expr(self.parse_expression()?)
        };
        self.consume_statement_end();

        Ok(CheckCase {
            pattern,
            guard,
            body,
        })
    }

    // ── Lambdas ───────────────────────────────────────────────────────

    /// Bounded lookahead: is the `(` at the cursor a lambda parameter list?
    ///
    /// Scans `identifier | , | : | = | ...` up to the matching `)` and
    /// requires a `=>` right after it.
    fn at_lambda_params(&self) -> bool {
        let mut i = self.pos + 1;
        loop {
            match self.kind_at(i) {
                TokenKind::RParen => break,
                TokenKind::Ident
                | TokenKind::Comma
                | TokenKind::Colon
                | TokenKind::Eq
                | TokenKind::DotDotDot => i += 1,
                _ => return false,
            }
        }
        self.kind_at(i + 1) == TokenKind::FatArrow
    }

    /// `(params) => body` where body is an expression or a block.
    fn parse_lambda_after_lparen(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LParen)?;
        let params = self.parse_params_tail()?;
        self.expect(TokenKind::FatArrow)?;

        let (body, end) = if self.at(TokenKind::BlockOpen) {
            let block = self.parse_block()?;
            let span = block.span;
            (LambdaBody::Block(block), span)
        } else {
            let expr = self.parse_expression()?;
            let span = expr.span;
            (LambdaBody::Expr(expr), span)
        };

        let span = open.span.cover(end);
        Ok(Expr::new(
            ExprKind::Lambda(Rc::new(LambdaDecl { params, body, span })),
            span,
        ))
    }

    /// Anonymous function: `conduit(params) @ ... #`.
    fn parse_anonymous_function(&mut self) -> Result<Expr, ParseError> {
        let keyword = self.expect(TokenKind::Conduit)?;
        let params = self.parse_parameters()?;
        let block = self.parse_block()?;
        let span = keyword.span.cover(block.span);
        Ok(Expr::new(
            ExprKind::Lambda(Rc::new(LambdaDecl {
                params,
                body: LambdaBody::Block(block),
                span,
            })),
            span,
        ))
    }

    // ── Collection literals ───────────────────────────────────────────

    /// `~ elements !` with spread elements.
    pub(crate) fn parse_list_literal(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::ListOpen)?;
        let mut elements = Vec::new();

        self.skip_newlines();
        while !self.at(TokenKind::ListClose) {
            if self.at(TokenKind::DotDotDot) {
                let dots = self.advance();
                let inner = self.parse_expression()?;
                let span = dots.span.cover(inner.span);
                elements.push(Expr::new(ExprKind::Spread(Box::new(inner)), span));
            } else {
                elements.push(self.parse_expression()?);
            }
            self.skip_newlines();
            if !self.at(TokenKind::ListClose) {
                self.expect(TokenKind::Comma)?;
            }
            self.skip_newlines();
        }
        let close = self.expect(TokenKind::ListClose)?;

        Ok(Expr::new(
            ExprKind::List(elements),
            open.span.cover(close.span),
        ))
    }

    /// `@ key: value, ... #` with identifier/string/computed keys, the
    /// `{name}` shorthand, and spread entries.
    pub(crate) fn parse_map_literal(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::BlockOpen)?;
        let mut entries = Vec::new();

        self.skip_newlines();
        while !self.at(TokenKind::BlockClose) {
            if self.at(TokenKind::Ident) {
                let token = self.advance();
                let name = self.text(token.span).to_string();
                let key = Expr::new(ExprKind::Literal(Lit::Text(name.clone())), token.span);
                // Shorthand: `{ name }` is `{ name: name }`.
                let value = if matches!(
                    self.current(),
                    TokenKind::Comma | TokenKind::BlockClose | TokenKind::Newline
                ) {
                    Expr::new(ExprKind::Ident(name), token.span)
                } else {
                    self.expect(TokenKind::Colon)?;
                    self.parse_expression()?
                };
                entries.push(MapEntry {
                    key: Some(key),
                    value,
                });
            } else if self.at(TokenKind::Str) {
                let token = self.advance();
                let text = rill_lexer::cook_string(self.text(token.span));
                let key = Expr::new(ExprKind::Literal(Lit::Text(text)), token.span);
                self.expect(TokenKind::Colon)?;
                let value = self.parse_expression()?;
                entries.push(MapEntry {
                    key: Some(key),
                    value,
                });
            } else if self.eat(TokenKind::ListOpen) {
                // Computed key: `~ expr !: value`.
                let key = self.parse_expression()?;
                self.expect(TokenKind::ListClose)?;
                self.expect(TokenKind::Colon)?;
                let value = self.parse_expression()?;
                entries.push(MapEntry {
                    key: Some(key),
                    value,
                });
            } else if self.at(TokenKind::DotDotDot) {
                let dots = self.advance();
                let inner = self.parse_expression()?;
                let span = dots.span.cover(inner.span);
                entries.push(MapEntry {
                    key: None,
                    value: Expr::new(ExprKind::Spread(Box::new(inner)), span),
                });
            } else {
                return Err(self.unexpected("Expected map key"));
            }

            self.skip_newlines();
            if !self.at(TokenKind::BlockClose) {
                self.expect(TokenKind::Comma)?;
            }
            self.skip_newlines();
        }
        let close = self.expect(TokenKind::BlockClose)?;

        Ok(Expr::new(
            ExprKind::MapLit(entries),
            open.span.cover(close.span),
        ))
    }
}

fn comparison_op(kind: TokenKind) -> Option<CmpOp> {
    match kind {
        TokenKind::Lt => Some(CmpOp::Lt),
        TokenKind::Gt => Some(CmpOp::Gt),
        TokenKind::LtEq => Some(CmpOp::Le),
        TokenKind::GtEq => Some(CmpOp::Ge),
        TokenKind::In => Some(CmpOp::In),
        _ => None,
    }
}

fn cmp_to_bin(op: CmpOp) -> BinOp {
    match op {
        CmpOp::Lt => BinOp::Lt,
        CmpOp::Gt => BinOp::Gt,
        CmpOp::Le => BinOp::Le,
        CmpOp::Ge => BinOp::Ge,
        CmpOp::In => BinOp::In,
    }
}
