//! Statement parsing.

use rlox_lexer::token::TokenKind;
use rlox_stack::ensure_sufficient_stack;
use rlox_types::ast::*;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// Parse a single statement (no declarations).
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        ensure_sufficient_stack(|| match self.peek_kind() {
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::Print => self.parse_print_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::LBrace => {
                self.advance();
                self.parse_block_body().map(Stmt::Block)
            }
            _ => self.parse_expression_stmt(),
        })
    }

    /// The declarations of a block, after its opening `{`, through the
    /// closing `}`. Errors inside are recovered here so one bad statement
    /// doesn't discard the whole block.
    pub(crate) fn parse_block_body(&mut self) -> Option<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            if let Some(stmt) = self.parse_declaration() {
                stmts.push(stmt);
            }
        }
        self.expect(&TokenKind::RBrace, "Expect '}' after block.")?;
        Some(stmts)
    }

    /// `if ( cond ) then [else otherwise]`
    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        self.advance(); // eat `if`
        self.expect(&TokenKind::LParen, "Expect '(' after 'if'.")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Some(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// `while ( cond ) body`
    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        self.advance(); // eat `while`
        self.expect(&TokenKind::LParen, "Expect '(' after 'while'.")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "Expect ')' after condition.")?;
        let body = Box::new(self.parse_statement()?);
        Some(Stmt::While { condition, body })
    }

    /// `for ( init ; cond ; incr ) body`, desugared on the spot:
    ///
    /// ```text
    /// { init; while (cond) { body; incr; } }
    /// ```
    ///
    /// Absent pieces are left out; a missing condition is `true`.
    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let for_span = self.advance().span; // eat `for`
        self.expect(&TokenKind::LParen, "Expect '(' after 'for'.")?;

        let initializer = match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
                None
            }
            TokenKind::Var => Some(self.parse_var_decl()?),
            _ => Some(self.parse_expression_stmt()?),
        };

        let condition = if self.check_exact(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check_exact(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RParen, "Expect ')' after for clauses.")?;

        let mut body = self.parse_statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = match condition {
            Some(condition) => condition,
            None => self.make_expr(ExprKind::Literal(Literal::Bool(true)), for_span),
        };
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Some(body)
    }

    /// `print expr ;`
    fn parse_print_stmt(&mut self) -> Option<Stmt> {
        self.advance(); // eat `print`
        let value = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon, "Expect ';' after value.")?;
        Some(Stmt::Print(value))
    }

    /// `return [expr] ;`
    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let keyword = self.advance().span; // eat `return`
        let value = if self.check_exact(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon, "Expect ';' after return value.")?;
        Some(Stmt::Return { keyword, value })
    }

    /// `expr ;`
    fn parse_expression_stmt(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon, "Expect ';' after expression.")?;
        Some(Stmt::Expression(expr))
    }
}
