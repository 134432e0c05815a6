//! Recursive-descent parser for Rill.
//!
//! The parser consumes the lexer's token stream and builds the typed AST
//! directly. One method per precedence level, lowest binding first:
//!
//! 1. assignment (`= += -= *= /=`, right-associative)
//! 2. pipeline (`->`, `~>`)
//! 3. null-coalesce (`??`)
//! 4. `or`
//! 5. `and`
//! 6. `not` (prefix)
//! 7. equality (`==`, `!=`)
//! 8. comparison chain (`< > <= >= in`)
//! 9. range (`..`, `to`)
//! 10. additive (`+ -`)
//! 11. multiplicative (`* / %`)
//! 12. exponent (`**`, right-associative)
//! 13. unary sign (`- +`)
//! 14. `wait` / `yield`
//! 15. postfix chain (call, member, safe member, index, safe index, static)
//! 16. primary
//!
//! Newlines terminate statements; they are skipped explicitly inside
//! parenthesised groups, argument and parameter lists, list literals, map
//! literals, and between the statements of a block.

pub(crate) mod expressions;
pub(crate) mod items;
pub(crate) mod patterns;

use rill_common::error::ParseError;
use rill_common::span::Span;
use rill_common::token::{Token, TokenKind};

use crate::ast::Program;
use crate::error::SyntaxError;

/// Tokenize and parse a whole source string.
pub fn parse(source: &str) -> Result<Program, SyntaxError> {
    let tokens = rill_lexer::tokenize(source)?;
    Ok(parse_tokens(tokens, source)?)
}

/// Parse an already-tokenized source string.
pub fn parse_tokens(tokens: Vec<Token>, source: &str) -> Result<Program, ParseError> {
    Parser::new(tokens, source).parse_program()
}

pub(crate) struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(mut tokens: Vec<Token>, source: &'src str) -> Self {
        // The stream always ends with an Eof sentinel; lookahead and
        // `advance` clamp against it.
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let end = source.len() as u32;
            tokens.push(Token::new(TokenKind::Eof, end, end));
        }
        Self {
            tokens,
            pos: 0,
            source,
        }
    }

    fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        self.skip_newlines();
        while !self.at(TokenKind::Eof) {
            body.push(self.parse_statement()?);
            self.skip_newlines();
        }
        Ok(Program { body })
    }

    // ── Lookahead ─────────────────────────────────────────────────────

    /// Kind of the current token (`Eof` past the end).
    pub(crate) fn current(&self) -> TokenKind {
        self.kind_at(self.pos)
    }

    /// Span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos.min(self.tokens.len() - 1))
            .map(|t| t.span)
            .unwrap_or(Span::point(0))
    }

    /// Kind of the token at an absolute index (`Eof` past the end).
    pub(crate) fn kind_at(&self, index: usize) -> TokenKind {
        self.tokens
            .get(index)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// Kind of the Nth token ahead of the current one.
    pub(crate) fn nth(&self, n: usize) -> TokenKind {
        self.kind_at(self.pos + n)
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    /// Slice the source at a span.
    pub(crate) fn text(&self, span: Span) -> &'src str {
        &self.source[span.start as usize..span.end as usize]
    }

    // ── Consumption ───────────────────────────────────────────────────

    /// Consume the current token and return it. Never advances past `Eof`.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the expected kind or fail.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            return Ok(self.advance());
        }
        Err(ParseError::expected(
            format!(
                "Expected {}, got {}",
                kind.describe(),
                self.current().describe()
            ),
            self.current_span(),
        ))
    }

    /// Like [`expect`](Self::expect) but with a custom message.
    pub(crate) fn expect_with(
        &mut self,
        kind: TokenKind,
        message: &str,
    ) -> Result<Token, ParseError> {
        if self.at(kind) {
            return Ok(self.advance());
        }
        Err(ParseError::expected(message, self.current_span()))
    }

    /// Consume an identifier and return its text.
    pub(crate) fn expect_ident(&mut self, what: &str) -> Result<(String, Span), ParseError> {
        if self.at(TokenKind::Ident) {
            let token = self.advance();
            return Ok((self.text(token.span).to_string(), token.span));
        }
        Err(ParseError::expected(
            format!("Expected {what}"),
            self.current_span(),
        ))
    }

    // ── Statement boundaries ──────────────────────────────────────────

    pub(crate) fn skip_newlines(&mut self) {
        while self.at(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Whether the current token ends a statement.
    pub(crate) fn is_statement_end(&self) -> bool {
        matches!(
            self.current(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof | TokenKind::BlockClose
        )
    }

    /// Consume any run of statement terminators.
    pub(crate) fn consume_statement_end(&mut self) {
        while matches!(self.current(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    pub(crate) fn unexpected(&self, context: &str) -> ParseError {
        ParseError::unexpected(
            format!("{context}, got {}", self.current().describe()),
            self.current_span(),
        )
    }
}
