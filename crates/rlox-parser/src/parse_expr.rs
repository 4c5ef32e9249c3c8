//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 9. `=` (assignment, right-associative)
//! 8. `? :` (conditional, right-associative)
//! 7. `or`
//! 6. `and`
//! 5. `==`, `!=`
//! 4. `<`, `<=`, `>`, `>=`
//! 3. `+`, `-`
//! 2. `*`, `/`
//! 1. unary `!`, `-`
//! 0. `()` (call)

use rlox_lexer::token::TokenKind;
use rlox_stack::ensure_sufficient_stack;
use rlox_types::ast::*;
use rlox_types::ErrorCode;

use crate::parser::{Parser, MAX_ARGUMENTS};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        ensure_sufficient_stack(|| self.parse_assignment())
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `assignment → IDENT "=" assignment | conditional`
    ///
    /// The left side is parsed as an ordinary expression first; only once
    /// `=` shows up do we know it was meant as a target.
    fn parse_assignment(&mut self) -> Option<Expr> {
        let expr = self.parse_conditional()?;

        if !self.check_exact(&TokenKind::Eq) {
            return Some(expr);
        }
        let equals = self.advance();
        let value = self.parse_assignment()?;

        match expr.kind {
            ExprKind::Variable(name) => {
                let span = expr.span.to(value.span);
                Some(self.make_expr(
                    ExprKind::Assign {
                        name,
                        value: Box::new(value),
                    },
                    span,
                ))
            }
            _ => {
                // Not fatal: report and carry on with the value.
                self.error_at(
                    ErrorCode::INVALID_ASSIGNMENT_TARGET,
                    "Invalid assignment target.",
                    &equals,
                );
                Some(value)
            }
        }
    }

    /// `conditional → logic_or ( "?" expression ":" conditional )?`
    fn parse_conditional(&mut self) -> Option<Expr> {
        let condition = self.parse_or()?;
        if !self.eat(&TokenKind::Question) {
            return Some(condition);
        }

        let then_branch = self.parse_expression()?;
        self.expect(
            &TokenKind::Colon,
            "Expect ':' after then branch of conditional expression.",
        )?;
        let else_branch = self.parse_conditional()?;

        let span = condition.span.to(else_branch.span);
        Some(self.make_expr(
            ExprKind::Ternary {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        ))
    }

    /// `logic_or → logic_and ( "or" logic_and )*`
    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = self.logical(left, LogicalOp::Or, right);
        }
        Some(left)
    }

    /// `logic_and → equality ( "and" equality )*`
    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_equality()?;
            left = self.logical(left, LogicalOp::And, right);
        }
        Some(left)
    }

    fn logical(&mut self, left: Expr, op: LogicalOp, right: Expr) -> Expr {
        let span = left.span.to(right.span);
        self.make_expr(
            ExprKind::Logical {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        )
    }

    /// `equality → comparison ( ( "!=" | "==" ) comparison )*`
    fn parse_equality(&mut self) -> Option<Expr> {
        self.parse_binary_chain(Self::parse_comparison, |kind| match kind {
            TokenKind::EqEq => Some(BinOp::Eq),
            TokenKind::BangEq => Some(BinOp::NotEq),
            _ => None,
        })
    }

    /// `comparison → term ( ( ">" | ">=" | "<" | "<=" ) term )*`
    fn parse_comparison(&mut self) -> Option<Expr> {
        self.parse_binary_chain(Self::parse_term, |kind| match kind {
            TokenKind::Greater => Some(BinOp::Greater),
            TokenKind::GreaterEq => Some(BinOp::GreaterEq),
            TokenKind::Less => Some(BinOp::Less),
            TokenKind::LessEq => Some(BinOp::LessEq),
            _ => None,
        })
    }

    /// `term → factor ( ( "-" | "+" ) factor )*`
    fn parse_term(&mut self) -> Option<Expr> {
        self.parse_binary_chain(Self::parse_factor, |kind| match kind {
            TokenKind::Minus => Some(BinOp::Sub),
            TokenKind::Plus => Some(BinOp::Add),
            _ => None,
        })
    }

    /// `factor → unary ( ( "/" | "*" ) unary )*`
    fn parse_factor(&mut self) -> Option<Expr> {
        self.parse_binary_chain(Self::parse_unary, |kind| match kind {
            TokenKind::Slash => Some(BinOp::Div),
            TokenKind::Star => Some(BinOp::Mul),
            _ => None,
        })
    }

    /// One left-associative binary level: `operand ( op operand )*`.
    fn parse_binary_chain(
        &mut self,
        operand: fn(&mut Self) -> Option<Expr>,
        match_op: fn(&TokenKind) -> Option<BinOp>,
    ) -> Option<Expr> {
        let mut left = operand(self)?;
        while let Some(op) = match_op(self.peek_kind()) {
            let op_span = self.advance().span;
            let right = operand(self)?;
            let span = left.span.to(right.span);
            left = self.make_expr(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    op_span,
                    right: Box::new(right),
                },
                span,
            );
        }
        Some(left)
    }

    /// `unary → ( "!" | "-" ) unary | call`
    fn parse_unary(&mut self) -> Option<Expr> {
        ensure_sufficient_stack(|| {
            let op = match self.peek_kind() {
                TokenKind::Bang => UnaryOp::Not,
                TokenKind::Minus => UnaryOp::Neg,
                _ => return self.parse_call(),
            };
            let op_span = self.advance().span;
            let operand = self.parse_unary()?;
            let span = op_span.to(operand.span);
            Some(self.make_expr(
                ExprKind::Unary {
                    op,
                    op_span,
                    operand: Box::new(operand),
                },
                span,
            ))
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Calls & Primaries
    // ══════════════════════════════════════════════════════════════════════════

    /// `call → primary ( "(" arguments? ")" )*`
    fn parse_call(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        while self.eat(&TokenKind::LParen) {
            expr = self.finish_call(expr)?;
        }
        Some(expr)
    }

    /// Argument list after `(`, through the closing `)`.
    fn finish_call(&mut self, callee: Expr) -> Option<Expr> {
        let mut args = Vec::new();
        if !self.check_exact(&TokenKind::RParen) {
            loop {
                if args.len() == MAX_ARGUMENTS {
                    self.error_at_current(
                        ErrorCode::TOO_MANY_ARGUMENTS,
                        format!("Can't have more than {MAX_ARGUMENTS} arguments."),
                    );
                }
                args.push(self.parse_expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self
            .expect(&TokenKind::RParen, "Expect ')' after arguments.")?
            .span;

        let span = callee.span.to(paren);
        Some(self.make_expr(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
                paren,
            },
            span,
        ))
    }

    /// `primary → NUMBER | STRING | "true" | "false" | "nil" | IDENT | "(" expression ")"`
    fn parse_primary(&mut self) -> Option<Expr> {
        if let Some(literal) = self.peek().literal() {
            let span = self.advance().span;
            return Some(self.make_expr(ExprKind::Literal(literal), span));
        }

        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(self.make_expr(ExprKind::Variable(Ident::new(name, span)), span))
            }
            TokenKind::LParen => {
                let start = self.advance().span;
                let inner = self.parse_expression()?;
                let end = self
                    .expect(&TokenKind::RParen, "Expect ')' after expression.")?
                    .span;
                Some(self.make_expr(ExprKind::Grouping(Box::new(inner)), start.to(end)))
            }
            _ => {
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "Expect expression.");
                None
            }
        }
    }
}
