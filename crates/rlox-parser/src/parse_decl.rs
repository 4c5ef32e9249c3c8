//! Declaration parsing: `class`, `fun`, `var`, and the recovery boundary.

use std::rc::Rc;

use rlox_lexer::token::TokenKind;
use rlox_stack::ensure_sufficient_stack;
use rlox_types::ast::*;
use rlox_types::ErrorCode;

use crate::parser::{Parser, MAX_ARGUMENTS};

impl<'src> Parser<'src> {
    /// `declaration → classDecl | funDecl | varDecl | statement`
    ///
    /// This is where a failed statement is caught: the parser
    /// synchronizes and the statement is dropped from the program.
    pub(crate) fn parse_declaration(&mut self) -> Option<Stmt> {
        let start = self.pos();
        let stmt = ensure_sufficient_stack(|| match self.peek_kind() {
            TokenKind::Class => self.parse_class_decl(),
            TokenKind::Fun => self.parse_fun_decl(),
            TokenKind::Var => self.parse_var_decl(),
            _ => self.parse_statement(),
        });
        if stmt.is_none() {
            self.synchronize(start);
        }
        stmt
    }

    /// `classDecl → "class" IDENT "{" "}"`
    fn parse_class_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `class`
        let name = self.expect_identifier("Expect class name.")?;
        self.expect(&TokenKind::LBrace, "Expect '{' before class body.")?;
        self.expect(&TokenKind::RBrace, "Expect '}' after class body.")?;
        let span = start.to(self.previous_span());
        Some(Stmt::Class(ClassDecl { name, span }))
    }

    /// `funDecl → "fun" IDENT "(" params? ")" block`
    fn parse_fun_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `fun`
        let name = self.expect_identifier("Expect function name.")?;
        self.expect(&TokenKind::LParen, "Expect '(' after function name.")?;

        let mut params = Vec::new();
        if !self.check_exact(&TokenKind::RParen) {
            loop {
                if params.len() == MAX_ARGUMENTS {
                    self.error_at_current(
                        ErrorCode::TOO_MANY_ARGUMENTS,
                        format!("Can't have more than {MAX_ARGUMENTS} parameters."),
                    );
                }
                params.push(self.expect_identifier("Expect parameter name.")?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "Expect ')' after parameters.")?;

        self.expect(&TokenKind::LBrace, "Expect '{' before function body.")?;
        let body = self.parse_block_body()?;
        let span = start.to(self.previous_span());

        Some(Stmt::Function(Rc::new(FunctionDecl {
            name,
            params,
            body,
            span,
        })))
    }

    /// `varDecl → "var" IDENT ( "=" expression )? ";"`
    pub(crate) fn parse_var_decl(&mut self) -> Option<Stmt> {
        self.advance(); // eat `var`
        let name = self.expect_identifier("Expect variable name.")?;
        let initializer = if self.eat(&TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(
            &TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;
        Some(Stmt::Var { name, initializer })
    }
}
