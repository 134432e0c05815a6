//! Statement and declaration parsing.
//!
//! Statements are selected on their leading token; anything unrecognised
//! falls through to an expression statement.

use std::rc::Rc;

use rill_common::error::ParseError;
use rill_common::span::Span;
use rill_common::token::{Token, TokenKind};

use crate::ast::{
    Accessor, BindKind, Block, CatchClause, ClassDecl, ClassMember, ConstructorDecl,
    DestructurePattern, ElseArm, FunctionDecl, ListBinding, MapBinding, MethodDecl, Param,
    PropertyDecl, Stmt, StmtKind,
};

use super::Parser;

impl<'src> Parser<'src> {
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.skip_newlines();
        match self.current() {
            TokenKind::Let | TokenKind::Mut | TokenKind::Const => self.parse_var_declaration(),
            TokenKind::Conduit => self.parse_function_declaration(false),
            TokenKind::Async => self.parse_async_declaration(),
            TokenKind::Make => self.parse_class_declaration(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Repeat => self.parse_repeat_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::Give => self.parse_give_statement(),
            TokenKind::Fail => self.parse_fail_statement(),
            TokenKind::Stop => {
                let token = self.advance();
                self.consume_statement_end();
                Ok(Stmt::new(StmtKind::Stop, token.span))
            }
            TokenKind::Next => {
                let token = self.advance();
                self.consume_statement_end();
                Ok(Stmt::new(StmtKind::Next, token.span))
            }
            TokenKind::Grab => self.parse_import_statement(),
            TokenKind::Share => self.parse_export_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expression()?;
        self.consume_statement_end();
        let span = expr.span;
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }

    // ── Variable declarations ─────────────────────────────────────────

    /// `let|mut|const name [: Type] [= expr]`, or a destructuring form when
    /// the name position holds `~` or `@`.
    fn parse_var_declaration(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let kind = bind_kind(&keyword);

        if self.at(TokenKind::ListOpen) {
            return self.parse_list_destructuring(kind, keyword.span);
        }
        if self.at(TokenKind::BlockOpen) {
            return self.parse_map_destructuring(kind, keyword.span);
        }

        let (name, _) = self.expect_ident("variable name")?;

        let type_hint = if self.eat(TokenKind::Colon) {
            Some(self.expect_ident("type name")?.0)
        } else {
            None
        };

        let init = if self.eat(TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.consume_statement_end();
        Ok(Stmt::new(
            StmtKind::VarDecl {
                kind,
                name,
                type_hint,
                init,
            },
            keyword.span,
        ))
    }

    /// `let ~ a, b, ...rest ! = value`
    fn parse_list_destructuring(&mut self, kind: BindKind, span: Span) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::ListOpen)?;
        let mut bindings = Vec::new();
        while !self.at(TokenKind::ListClose) {
            let rest = self.eat(TokenKind::DotDotDot);
            let (name, _) = self.expect_ident("binding name")?;
            bindings.push(ListBinding { name, rest });
            if !self.at(TokenKind::ListClose) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::ListClose)?;
        self.expect_with(TokenKind::Eq, "Expected '=' after destructuring pattern")?;
        let value = self.parse_expression()?;
        self.consume_statement_end();

        Ok(Stmt::new(
            StmtKind::Destructure {
                kind,
                pattern: DestructurePattern::List(bindings),
                value,
            },
            span,
        ))
    }

    /// `let @ a, b: alias # = value`
    fn parse_map_destructuring(&mut self, kind: BindKind, span: Span) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::BlockOpen)?;
        let mut bindings = Vec::new();
        while !self.at(TokenKind::BlockClose) {
            let (key, _) = self.expect_ident("binding name")?;
            let alias = if self.eat(TokenKind::Colon) {
                self.expect_ident("alias name")?.0
            } else {
                key.clone()
            };
            bindings.push(MapBinding { key, alias });
            if !self.at(TokenKind::BlockClose) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::BlockClose)?;
        self.expect_with(TokenKind::Eq, "Expected '=' after destructuring pattern")?;
        let value = self.parse_expression()?;
        self.consume_statement_end();

        Ok(Stmt::new(
            StmtKind::Destructure {
                kind,
                pattern: DestructurePattern::Map(bindings),
                value,
            },
            span,
        ))
    }

    // ── Functions ─────────────────────────────────────────────────────

    /// `conduit [*]name(params) [: Type] @ ... #`
    fn parse_function_declaration(&mut self, is_async: bool) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::Conduit)?;
        let is_generator = self.eat(TokenKind::Star);
        let (name, _) = self.expect_ident("function name")?;
        let params = self.parse_parameters()?;
        let return_type = if self.eat(TokenKind::Colon) {
            Some(self.expect_ident("type name")?.0)
        } else {
            None
        };
        let body = self.parse_block()?;

        Ok(Stmt::new(
            StmtKind::FuncDecl(Rc::new(FunctionDecl {
                name,
                params,
                body,
                is_async,
                is_generator,
                return_type,
                span: keyword.span,
            })),
            keyword.span,
        ))
    }

    fn parse_async_declaration(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::Async)?;
        self.parse_function_declaration(true)
    }

    /// `(params)` with defaults, type hints, and a rest parameter.
    pub(crate) fn parse_parameters(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect(TokenKind::LParen)?;
        self.parse_params_tail()
    }

    /// Parameter-list body; consumes through the closing `)`.
    pub(crate) fn parse_params_tail(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();
        self.skip_newlines();
        while !self.at(TokenKind::RParen) {
            let rest = self.eat(TokenKind::DotDotDot);
            let (name, span) = self.expect_ident("parameter name")?;
            let type_hint = if self.eat(TokenKind::Colon) {
                Some(self.expect_ident("type name")?.0)
            } else {
                None
            };
            let default = if self.eat(TokenKind::Eq) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            params.push(Param {
                name,
                type_hint,
                default,
                rest,
                span,
            });
            self.skip_newlines();
            if !self.at(TokenKind::RParen) {
                self.expect(TokenKind::Comma)?;
                self.skip_newlines();
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    /// `@ statements #`
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let open = self.expect(TokenKind::BlockOpen)?;
        self.skip_newlines();
        let mut stmts = Vec::new();
        while !self.at(TokenKind::BlockClose) && !self.at(TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
            self.skip_newlines();
        }
        let close = self.expect(TokenKind::BlockClose)?;
        Ok(Block {
            stmts,
            span: open.span.cover(close.span),
        })
    }

    // ── Classes ───────────────────────────────────────────────────────

    /// `make Name [extend Parent] @ members #`
    fn parse_class_declaration(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::Make)?;
        let (name, _) = self.expect_ident("class name")?;
        let parent = if self.eat(TokenKind::Extend) {
            Some(self.expect_ident("parent class name")?.0)
        } else {
            None
        };

        self.expect(TokenKind::BlockOpen)?;
        self.skip_newlines();
        let mut members = Vec::new();
        while !self.at(TokenKind::BlockClose) && !self.at(TokenKind::Eof) {
            members.push(self.parse_class_member()?);
            self.skip_newlines();
        }
        self.expect(TokenKind::BlockClose)?;

        Ok(Stmt::new(
            StmtKind::ClassDecl(Rc::new(ClassDecl {
                name,
                parent,
                members,
                span: keyword.span,
            })),
            keyword.span,
        ))
    }

    /// One class member: constructor, method, accessor, or property.
    ///
    /// `get` and `set` are contextual: they mark an accessor only when an
    /// identifier spelled `get`/`set` is directly followed by another
    /// identifier.
    fn parse_class_member(&mut self) -> Result<ClassMember, ParseError> {
        self.skip_newlines();
        let is_static = self.eat(TokenKind::Static);
        let is_async = self.eat(TokenKind::Async);

        if self.at(TokenKind::Build) {
            let keyword = self.advance();
            let params = self.parse_parameters()?;
            let body = self.parse_block()?;
            return Ok(ClassMember::Constructor(Rc::new(ConstructorDecl {
                params,
                body,
                span: keyword.span,
            })));
        }

        if self.at(TokenKind::Ident) && self.nth(1) == TokenKind::Ident {
            let marker = self.text(self.current_span());
            let accessor = match marker {
                "get" => Some(Accessor::Getter),
                "set" => Some(Accessor::Setter),
                _ => None,
            };
            if let Some(accessor) = accessor {
                let keyword = self.advance();
                let (name, _) = self.expect_ident("property name")?;
                let params = self.parse_parameters()?;
                let body = self.parse_block()?;
                return Ok(ClassMember::Method(Rc::new(MethodDecl {
                    name,
                    params,
                    body,
                    is_async: false,
                    is_static,
                    accessor: Some(accessor),
                    span: keyword.span,
                })));
            }
        }

        if self.at(TokenKind::Conduit) {
            let keyword = self.advance();
            let (name, _) = self.expect_ident("method name")?;
            let params = self.parse_parameters()?;
            let body = self.parse_block()?;
            return Ok(ClassMember::Method(Rc::new(MethodDecl {
                name,
                params,
                body,
                is_async,
                is_static,
                accessor: None,
                span: keyword.span,
            })));
        }

        if self.at(TokenKind::Ident) {
            let (name, span) = self.expect_ident("property name")?;
            let type_hint = if self.eat(TokenKind::Colon) {
                Some(self.expect_ident("type name")?.0)
            } else {
                None
            };
            let value = if self.eat(TokenKind::Eq) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.consume_statement_end();
            return Ok(ClassMember::Property(PropertyDecl {
                name,
                type_hint,
                value,
                is_static,
                span,
            }));
        }

        Err(self.unexpected("Expected class member"))
    }

    // ── Control flow ──────────────────────────────────────────────────

    fn parse_if_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::If)?;
        let cond = self.parse_expression()?;
        let then_branch = self.parse_block()?;

        self.skip_newlines();
        let else_branch = if self.eat(TokenKind::Else) {
            if self.at(TokenKind::If) {
                Some(ElseArm::If(Box::new(self.parse_if_statement()?)))
            } else {
                Some(ElseArm::Block(self.parse_block()?))
            }
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            keyword.span,
        ))
    }

    fn parse_while_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::While)?;
        let cond = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt::new(StmtKind::While { cond, body }, keyword.span))
    }

    /// `repeat item in iterable @ ... #` or `repeat (i, item) in iterable`.
    fn parse_repeat_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::Repeat)?;

        let (index_binding, binding) = if self.eat(TokenKind::LParen) {
            let (index, _) = self.expect_ident("index name")?;
            self.expect(TokenKind::Comma)?;
            let (item, _) = self.expect_ident("loop variable")?;
            self.expect(TokenKind::RParen)?;
            (Some(index), item)
        } else {
            (None, self.expect_ident("loop variable")?.0)
        };

        self.expect_with(TokenKind::In, "Expected 'in' after loop variable")?;
        let iterable = self.parse_expression()?;
        let body = self.parse_block()?;

        Ok(Stmt::new(
            StmtKind::Repeat {
                binding,
                index_binding,
                iterable,
                body,
            },
            keyword.span,
        ))
    }

    fn parse_try_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::Try)?;
        let body = self.parse_block()?;

        self.skip_newlines();
        let catch = if self.eat(TokenKind::Catch) {
            let binding = if self.at(TokenKind::Ident) {
                let token = self.advance();
                Some(self.text(token.span).to_string())
            } else {
                None
            };
            Some(CatchClause {
                binding,
                body: self.parse_block()?,
            })
        } else {
            None
        };

        self.skip_newlines();
        let finally = if self.eat(TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::Try {
                body,
                catch,
                finally,
            },
            keyword.span,
        ))
    }

    fn parse_give_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::Give)?;
        let value = if self.is_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_statement_end();
        Ok(Stmt::new(StmtKind::Give(value), keyword.span))
    }

    fn parse_fail_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::Fail)?;
        let error = self.parse_expression()?;
        self.consume_statement_end();
        Ok(Stmt::new(StmtKind::Fail(error), keyword.span))
    }

    // ── Modules ───────────────────────────────────────────────────────

    /// `grab module`, `grab module.item`, `grab module.*`, with `as alias`.
    ///
    /// A dotted path's trailing segment is an item import; the wildcard
    /// `.*` imports every export.
    fn parse_import_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::Grab)?;

        let mut parts = vec![self.expect_ident("module name")?.0];
        let mut wildcard = false;
        while self.eat(TokenKind::Dot) {
            if self.eat(TokenKind::Star) {
                wildcard = true;
                break;
            }
            parts.push(self.expect_ident("module path segment")?.0);
        }

        let mut items = Vec::new();
        if parts.len() > 1 && !wildcard {
            items.push(parts.pop().unwrap());
        }
        let module = parts.join(".");

        let alias = if self.eat(TokenKind::As) {
            Some(self.expect_ident("alias name")?.0)
        } else {
            None
        };

        self.consume_statement_end();
        Ok(Stmt::new(
            StmtKind::Import {
                module,
                items,
                alias,
                wildcard,
            },
            keyword.span,
        ))
    }

    /// `share <decl>`, `share name`, or `share @ a, b #`.
    fn parse_export_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::Share)?;

        if matches!(
            self.current(),
            TokenKind::Let
                | TokenKind::Mut
                | TokenKind::Const
                | TokenKind::Conduit
                | TokenKind::Make
        ) {
            let decl = self.parse_statement()?;
            return Ok(Stmt::new(
                StmtKind::Export {
                    decl: Some(Box::new(decl)),
                    names: Vec::new(),
                },
                keyword.span,
            ));
        }

        if self.eat(TokenKind::BlockOpen) {
            let mut names = Vec::new();
            self.skip_newlines();
            while !self.at(TokenKind::BlockClose) {
                names.push(self.expect_ident("export name")?.0);
                self.skip_newlines();
                if !self.at(TokenKind::BlockClose) {
                    self.expect(TokenKind::Comma)?;
                    self.skip_newlines();
                }
            }
            self.expect(TokenKind::BlockClose)?;
            self.consume_statement_end();
            return Ok(Stmt::new(
                StmtKind::Export {
                    decl: None,
                    names,
                },
                keyword.span,
            ));
        }

        let (name, _) = self.expect_ident("export name")?;
        self.consume_statement_end();
        Ok(Stmt::new(
            StmtKind::Export {
                decl: None,
                names: vec![name],
            },
            keyword.span,
        ))
    }
}

fn bind_kind(token: &Token) -> BindKind {
    match token.kind {
        TokenKind::Mut => BindKind::Mut,
        TokenKind::Const => BindKind::Const,
        _ => BindKind::Let,
    }
}
