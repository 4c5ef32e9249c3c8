//! Token types for the Lox lexer.
//!
//! Defines [`TokenKind`] covering every lexeme in Lox and [`Token`], which
//! pairs a kind with its source text and [`Span`].

use rlox_types::ast::Literal;
use rlox_types::Span;
use std::fmt;

/// The 16 reserved words of Lox.
///
/// `super` and `this` are reserved even though the core language has no
/// expression that uses them.
pub const ALL_KEYWORDS: &[&str] = &[
    "and", "class", "else", "false", "for", "fun", "if", "nil", "or", "print", "return",
    "super", "this", "true", "var", "while",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source text. Empty for [`TokenKind::Eof`].
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    /// The literal value this token denotes, if any.
    pub fn literal(&self) -> Option<Literal> {
        match &self.kind {
            TokenKind::NumberLit(n) => Some(Literal::Number(*n)),
            TokenKind::StringLit(s) => Some(Literal::String(s.clone())),
            TokenKind::True => Some(Literal::Bool(true)),
            TokenKind::False => Some(Literal::Bool(false)),
            TokenKind::Nil => Some(Literal::Nil),
            _ => None,
        }
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in the Lox language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// Numeric literal: `42`, `3.14`
    NumberLit(f64),
    /// String literal, without its quotes: `"hello"`
    StringLit(String),
    /// User-defined identifier: `counter`, `make_adder`
    Identifier(String),

    // ── Keywords ─────────────────────────────────────────────

    And,
    Class,
    Else,
    False,
    For,
    Fun,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    // ── Operators ────────────────────────────────────────────

    Plus,
    Minus,
    Star,
    Slash,
    /// `!`
    Bang,
    BangEq,
    Eq,
    EqEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Question,
    Colon,

    // ── Punctuation ──────────────────────────────────────────

    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,

    // ── Special ──────────────────────────────────────────────

    Eof,
}

impl TokenKind {
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "and" => TokenKind::And,
            "class" => TokenKind::Class,
            "else" => TokenKind::Else,
            "false" => TokenKind::False,
            "for" => TokenKind::For,
            "fun" => TokenKind::Fun,
            "if" => TokenKind::If,
            "nil" => TokenKind::Nil,
            "or" => TokenKind::Or,
            "print" => TokenKind::Print,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "this" => TokenKind::This,
            "true" => TokenKind::True,
            "var" => TokenKind::Var,
            "while" => TokenKind::While,
            _ => return None,
        })
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::And
                | TokenKind::Class
                | TokenKind::Else
                | TokenKind::False
                | TokenKind::For
                | TokenKind::Fun
                | TokenKind::If
                | TokenKind::Nil
                | TokenKind::Or
                | TokenKind::Print
                | TokenKind::Return
                | TokenKind::Super
                | TokenKind::This
                | TokenKind::True
                | TokenKind::Var
                | TokenKind::While
        )
    }

    /// Keywords that begin a declaration or statement. The parser resumes
    /// in front of one of these after an error.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::NumberLit(n) => write!(f, "{n}"),
            TokenKind::StringLit(s) => write!(f, "\"{s}\""),
            TokenKind::Identifier(s) => f.write_str(s),
            TokenKind::And => f.write_str("and"),
            TokenKind::Class => f.write_str("class"),
            TokenKind::Else => f.write_str("else"),
            TokenKind::False => f.write_str("false"),
            TokenKind::For => f.write_str("for"),
            TokenKind::Fun => f.write_str("fun"),
            TokenKind::If => f.write_str("if"),
            TokenKind::Nil => f.write_str("nil"),
            TokenKind::Or => f.write_str("or"),
            TokenKind::Print => f.write_str("print"),
            TokenKind::Return => f.write_str("return"),
            TokenKind::Super => f.write_str("super"),
            TokenKind::This => f.write_str("this"),
            TokenKind::True => f.write_str("true"),
            TokenKind::Var => f.write_str("var"),
            TokenKind::While => f.write_str("while"),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::Bang => f.write_str("!"),
            TokenKind::BangEq => f.write_str("!="),
            TokenKind::Eq => f.write_str("="),
            TokenKind::EqEq => f.write_str("=="),
            TokenKind::Less => f.write_str("<"),
            TokenKind::LessEq => f.write_str("<="),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::GreaterEq => f.write_str(">="),
            TokenKind::Question => f.write_str("?"),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_keywords_count() {
        assert_eq!(ALL_KEYWORDS.len(), 16);
    }

    #[test]
    fn test_from_keyword_recognises_all() {
        for &kw in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(kw);
            assert!(kind.is_some(), "from_keyword should recognise '{kw}'");
            assert!(kind.as_ref().is_some_and(TokenKind::is_keyword));
        }
    }

    #[test]
    fn test_keyword_display_round_trips() {
        for &kw in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(kw).unwrap();
            assert_eq!(kind.to_string(), kw);
        }
    }

    #[test]
    fn test_non_keywords() {
        for s in ["Print", "function", "let", "classy", "_var", ""] {
            assert_eq!(TokenKind::from_keyword(s), None, "'{s}'");
        }
    }

    #[test]
    fn test_statement_starters() {
        assert!(TokenKind::Fun.starts_statement());
        assert!(TokenKind::Return.starts_statement());
        assert!(!TokenKind::Else.starts_statement());
        assert!(!TokenKind::Semicolon.starts_statement());
    }

    #[test]
    fn test_literal_values() {
        let span = Span::at(1, 1);
        let num = Token::new(TokenKind::NumberLit(2.5), "2.5", span);
        assert_eq!(num.literal(), Some(Literal::Number(2.5)));
        let s = Token::new(TokenKind::StringLit("hi".into()), "\"hi\"", span);
        assert_eq!(s.literal(), Some(Literal::String("hi".into())));
        assert_eq!(
            Token::new(TokenKind::Nil, "nil", span).literal(),
            Some(Literal::Nil)
        );
        assert_eq!(Token::new(TokenKind::Plus, "+", span).literal(), None);
    }
}
