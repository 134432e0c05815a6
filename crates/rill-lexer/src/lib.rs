// Rill lexer -- tokenizer for the Rill scripting language.
//
// Block and collection delimiters use non-standard glyphs: `@` opens a block
// and `#` closes one; `~` opens a list and `!` closes one. Because `#` is a
// closing delimiter, only the `/* ... */` comment form exists.

mod cursor;

use cursor::Cursor;
use rill_common::error::{LexError, LexErrorKind};
use rill_common::span::Span;
use rill_common::token::{keyword_from_str, Token, TokenKind};

/// Tokenize an entire source string.
///
/// The returned vector always ends with an `Eof` token. Fails on the first
/// unrecognised character or unterminated string/template/comment.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

/// The Rill lexer. Converts source text into a token stream.
///
/// Template strings are handled by recursive sub-tokenization: the bytes of
/// each `$@ ... #` interpolation are run through a fresh lexer and the
/// resulting tokens spliced into the stream between `InterpStart` and
/// `InterpEnd` markers, with spans shifted back into the outer source.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    source: &'src str,
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            source,
            tokens: Vec::new(),
        }
    }

    /// Consume the lexer, producing the full token stream.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(c) = self.cursor.peek() {
            match c {
                // Spaces, tabs and carriage returns are discarded; newlines
                // are significant statement terminators.
                ' ' | '\t' | '\r' => {
                    self.cursor.advance();
                }
                '\n' => {
                    let start = self.cursor.pos();
                    self.cursor.advance();
                    self.push(TokenKind::Newline, start);
                }
                '/' if self.cursor.peek_next() == Some('*') => self.skip_comment()?,
                '"' | '\'' => self.lex_string(c)?,
                '`' => self.lex_template()?,
                '0'..='9' => self.lex_number(),
                c if is_ident_start(c) => self.lex_ident(),
                _ => self.lex_operator()?,
            }
        }

        let end = self.cursor.pos();
        self.tokens.push(Token::new(TokenKind::Eof, end, end));
        Ok(self.tokens)
    }

    fn push(&mut self, kind: TokenKind, start: u32) {
        self.tokens.push(Token::new(kind, start, self.cursor.pos()));
    }

    // ── Comments ──────────────────────────────────────────────────────

    /// Skip a `/* ... */` comment. Not nestable.
    fn skip_comment(&mut self) -> Result<(), LexError> {
        let start = self.cursor.pos();
        self.cursor.advance_by(2); // consume `/*`
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedComment,
                        Span::new(start, self.cursor.pos()),
                    ))
                }
                Some('*') if self.cursor.peek_next() == Some('/') => {
                    self.cursor.advance_by(2);
                    return Ok(());
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    // ── String literals ───────────────────────────────────────────────

    /// Lex a quoted string. The token span includes both quotes; escape
    /// decoding happens later via [`cook_string`]. Newlines inside strings
    /// are literal.
    fn lex_string(&mut self, quote: char) -> Result<(), LexError> {
        let start = self.cursor.pos();
        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        Span::new(start, self.cursor.pos()),
                    ))
                }
                Some(c) if c == quote => {
                    self.cursor.advance();
                    self.push(TokenKind::Str, start);
                    return Ok(());
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    // ── Template strings ──────────────────────────────────────────────

    /// Lex a backtick template string.
    ///
    /// Emits alternating `TemplatePiece` and interpolation runs. An
    /// interpolation opens with `$@` and closes with the matching `#`; an
    /// `@`/`#` depth counter keeps map literals and blocks inside the
    /// interpolation from terminating it early.
    fn lex_template(&mut self) -> Result<(), LexError> {
        let start = self.cursor.pos();
        self.cursor.advance(); // opening backtick
        let mut piece_start = self.cursor.pos();
        let mut emitted_any = false;

        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedTemplate,
                        Span::new(start, self.cursor.pos()),
                    ))
                }
                Some('`') => {
                    // An empty template still needs one (empty) piece so the
                    // parser can see it.
                    if self.cursor.pos() > piece_start || !emitted_any {
                        self.push(TokenKind::TemplatePiece, piece_start);
                    }
                    self.cursor.advance();
                    return Ok(());
                }
                Some('$') if self.cursor.peek_next() == Some('@') => {
                    if self.cursor.pos() > piece_start {
                        self.push(TokenKind::TemplatePiece, piece_start);
                    }
                    emitted_any = true;
                    let marker = self.cursor.pos();
                    self.cursor.advance_by(2); // `$@`
                    self.push(TokenKind::InterpStart, marker);
                    self.lex_interpolation(start)?;
                    piece_start = self.cursor.pos();
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Scan an interpolation body up to its closing `#`, sub-tokenize it,
    /// and splice the tokens (minus `Eof`) into the stream.
    fn lex_interpolation(&mut self, template_start: u32) -> Result<(), LexError> {
        let expr_start = self.cursor.pos();
        let mut depth: u32 = 1;
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedTemplate,
                        Span::new(template_start, self.cursor.pos()),
                    ))
                }
                Some('@') => {
                    depth += 1;
                    self.cursor.advance();
                }
                Some('#') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }

        let expr_end = self.cursor.pos();
        let body = self.cursor.slice(expr_start, expr_end);
        if !body.trim().is_empty() {
            let sub = tokenize(body).map_err(|e| {
                LexError::new(
                    e.kind,
                    Span::new(e.span.start + expr_start, e.span.end + expr_start),
                )
            })?;
            for token in sub {
                if token.kind == TokenKind::Eof {
                    continue;
                }
                self.tokens.push(Token::new(
                    token.kind,
                    token.span.start + expr_start,
                    token.span.end + expr_start,
                ));
            }
        }

        let marker = self.cursor.pos();
        self.cursor.advance(); // closing `#`
        self.push(TokenKind::InterpEnd, marker);
        Ok(())
    }

    // ── Number literals ───────────────────────────────────────────────

    /// Lex a number literal. The lexeme keeps its textual form; the parser
    /// applies base conversion via [`cook_number`].
    fn lex_number(&mut self) {
        let start = self.cursor.pos();
        let first = self.cursor.advance();

        if first == Some('0') {
            match self.cursor.peek() {
                Some('x' | 'X') => {
                    self.cursor.advance();
                    self.cursor
                        .eat_while(|c| c.is_ascii_hexdigit() || c == '_');
                    self.push(TokenKind::Number, start);
                    return;
                }
                Some('b' | 'B') => {
                    self.cursor.advance();
                    self.cursor.eat_while(|c| matches!(c, '0' | '1' | '_'));
                    self.push(TokenKind::Number, start);
                    return;
                }
                _ => {}
            }
        }

        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');

        // A dot begins a fractional part unless it is the `..` range operator.
        if self.cursor.peek() == Some('.') && self.cursor.peek_next() != Some('.') {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        self.push(TokenKind::Number, start);
    }

    // ── Identifiers and keywords ──────────────────────────────────────

    fn lex_ident(&mut self) {
        let start = self.cursor.pos();
        self.cursor.advance();
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());
        let kind = keyword_from_str(text).unwrap_or(TokenKind::Ident);
        self.push(kind, start);
    }

    // ── Operators and delimiters ──────────────────────────────────────

    /// Longest-match operator recognition: three characters, then two,
    /// then one.
    fn lex_operator(&mut self) -> Result<(), LexError> {
        let start = self.cursor.pos();

        if self.cursor.starts_with("...") {
            self.cursor.advance_by(3);
            self.push(TokenKind::DotDotDot, start);
            return Ok(());
        }

        const TWO_CHAR: &[(&str, TokenKind)] = &[
            ("==", TokenKind::EqEq),
            ("!=", TokenKind::NotEq),
            ("<=", TokenKind::LtEq),
            (">=", TokenKind::GtEq),
            ("**", TokenKind::StarStar),
            ("??", TokenKind::QuestionQuestion),
            ("?.", TokenKind::QuestionDot),
            ("?~", TokenKind::QuestionTilde),
            ("->", TokenKind::Arrow),
            ("~>", TokenKind::TildeArrow),
            ("=>", TokenKind::FatArrow),
            ("::", TokenKind::ColonColon),
            ("..", TokenKind::DotDot),
            ("+=", TokenKind::PlusEq),
            ("-=", TokenKind::MinusEq),
            ("*=", TokenKind::StarEq),
            ("/=", TokenKind::SlashEq),
        ];

        for (text, kind) in TWO_CHAR {
            if self.cursor.starts_with(text) {
                self.cursor.advance_by(2);
                self.push(*kind, start);
                return Ok(());
            }
        }

        let kind = match self.cursor.peek() {
            Some('+') => TokenKind::Plus,
            Some('-') => TokenKind::Minus,
            Some('*') => TokenKind::Star,
            Some('/') => TokenKind::Slash,
            Some('%') => TokenKind::Percent,
            Some('<') => TokenKind::Lt,
            Some('>') => TokenKind::Gt,
            Some('=') => TokenKind::Eq,
            Some('(') => TokenKind::LParen,
            Some(')') => TokenKind::RParen,
            Some('@') => TokenKind::BlockOpen,
            Some('#') => TokenKind::BlockClose,
            Some('~') => TokenKind::ListOpen,
            Some('!') => TokenKind::ListClose,
            Some(',') => TokenKind::Comma,
            Some('.') => TokenKind::Dot,
            Some(':') => TokenKind::Colon,
            Some(';') => TokenKind::Semicolon,
            Some(c) => {
                return Err(LexError::new(
                    LexErrorKind::Unexpected(c),
                    Span::new(start, start + c.len_utf8() as u32),
                ))
            }
            None => return Ok(()),
        };

        self.cursor.advance();
        self.push(kind, start);
        Ok(())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ── Cooking helpers ───────────────────────────────────────────────────
//
// The tokenizer owns lexeme normalisation; the parser calls these on the
// raw slice of a token's span.

/// Decode a quoted string lexeme (span includes the quotes).
///
/// Recognised escapes: `\n`, `\t`, `\r`, `\\`, the opening quote, `\0`.
/// Any other escaped character passes through verbatim.
pub fn cook_string(raw: &str) -> String {
    let quote = raw.chars().next().unwrap_or('"');
    let inner = &raw[quote.len_utf8()..raw.len() - quote.len_utf8()];
    decode_escapes(inner, quote)
}

/// Decode a template piece (raw text between backticks/interpolations).
///
/// Template escapes additionally cover `` \` `` and `\$`.
pub fn cook_template_piece(raw: &str) -> String {
    decode_escapes(raw, '`')
}

fn decode_escapes(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('0') => out.push('\0'),
            Some('$') if quote == '`' => out.push('$'),
            Some(c) if c == quote => out.push(c),
            Some(c) => out.push(c),
            None => out.push('\\'),
        }
    }
    out
}

/// Elide digit-group underscores from a number lexeme.
pub fn cook_number(raw: &str) -> String {
    raw.chars().filter(|&c| c != '_').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("lexes cleanly")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_declaration() {
        assert_eq!(
            kinds("let x = 42"),
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_block_and_list_glyphs() {
        assert_eq!(
            kinds("if x @ ~ 1, 2 ! #"),
            vec![
                TokenKind::If,
                TokenKind::Ident,
                TokenKind::BlockOpen,
                TokenKind::ListOpen,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::Number,
                TokenKind::ListClose,
                TokenKind::BlockClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_operators_longest_match() {
        assert_eq!(
            kinds("a -> b ~> c ?? d ?. e ?~ f ! :: .. ... ** !="),
            vec![
                TokenKind::Ident,
                TokenKind::Arrow,
                TokenKind::Ident,
                TokenKind::TildeArrow,
                TokenKind::Ident,
                TokenKind::QuestionQuestion,
                TokenKind::Ident,
                TokenKind::QuestionDot,
                TokenKind::Ident,
                TokenKind::QuestionTilde,
                TokenKind::Ident,
                TokenKind::ListClose,
                TokenKind::ColonColon,
                TokenKind::DotDot,
                TokenKind::DotDotDot,
                TokenKind::StarStar,
                TokenKind::NotEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_newlines_are_tokens() {
        assert_eq!(
            kinds("let a = 1\na = 2"),
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_comment_is_discarded() {
        assert_eq!(
            kinds("1 /* a\nb */ + 2"),
            vec![
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_unterminated_comment_fails() {
        let err = tokenize("/* never closed").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
    }

    #[test]
    fn lex_unterminated_string_fails() {
        let err = tokenize("\"open").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn lex_string_spans_include_quotes() {
        let tokens = tokenize(r#"'ab'"#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].span, Span::new(0, 4));
    }

    #[test]
    fn lex_number_forms() {
        for src in ["42", "0xFF", "0b1010", "3.14", "1_000_000", "2e10", "1.5e-3"] {
            let tokens = tokenize(src).unwrap();
            assert_eq!(tokens[0].kind, TokenKind::Number, "source: {src}");
            assert_eq!(tokens.len(), 2, "source: {src}");
        }
    }

    #[test]
    fn lex_dot_dot_is_not_a_fraction() {
        assert_eq!(
            kinds("1..5"),
            vec![
                TokenKind::Number,
                TokenKind::DotDot,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_template_with_interpolation() {
        assert_eq!(
            kinds("`hi $@name#!`"),
            vec![
                TokenKind::TemplatePiece,
                TokenKind::InterpStart,
                TokenKind::Ident,
                TokenKind::InterpEnd,
                TokenKind::TemplatePiece,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_template_tracks_nested_block_glyphs() {
        // The map literal's `@`/`#` inside the interpolation must not
        // terminate it early.
        assert_eq!(
            kinds("`v: $@ @ a: 1 # #`"),
            vec![
                TokenKind::TemplatePiece,
                TokenKind::InterpStart,
                TokenKind::BlockOpen,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::BlockClose,
                TokenKind::InterpEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_template_interpolation_spans_point_into_outer_source() {
        let source = "`ab $@xy#`";
        let tokens = tokenize(source).unwrap();
        let ident = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Ident)
            .expect("interpolated ident");
        assert_eq!(
            &source[ident.span.start as usize..ident.span.end as usize],
            "xy"
        );
    }

    #[test]
    fn lex_unterminated_template_fails() {
        let err = tokenize("`open $@x").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedTemplate);
    }

    #[test]
    fn lex_unexpected_character_fails() {
        let err = tokenize("let ^ = 1").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::Unexpected('^'));
    }

    #[test]
    fn lex_empty_template_emits_one_piece() {
        assert_eq!(
            kinds("``"),
            vec![TokenKind::TemplatePiece, TokenKind::Eof]
        );
    }

    #[test]
    fn cook_string_decodes_escapes() {
        assert_eq!(cook_string(r#""a\nb""#), "a\nb");
        assert_eq!(cook_string(r#""say \"hi\"""#), "say \"hi\"");
        assert_eq!(cook_string(r#"'it\'s'"#), "it's");
        assert_eq!(cook_string(r#""tab\there""#), "tab\there");
        // Unknown escapes pass through verbatim.
        assert_eq!(cook_string(r#""\q""#), "q");
    }

    #[test]
    fn cook_template_piece_decodes_backtick_and_dollar() {
        assert_eq!(cook_template_piece(r"a\`b"), "a`b");
        assert_eq!(cook_template_piece(r"cost \$5"), "cost $5");
    }

    #[test]
    fn cook_number_strips_underscores() {
        assert_eq!(cook_number("1_000_000"), "1000000");
        assert_eq!(cook_number("0xFF_FF"), "0xFFFF");
    }
}
