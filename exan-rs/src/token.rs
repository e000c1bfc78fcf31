//! Terminal tokens produced by the scanner.

use std::fmt;
use std::sync::Arc;

use crate::error::TokenInfo;
use crate::syntax::function::Function;
use crate::value::DataType;

// ── Position ──────────────────────────────────────────────────────────────────

/// 1-based source position, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

// ── Keyword ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    If,
    Else,
}

impl Keyword {
    pub fn from_text(s: &str) -> Option<Self> {
        match s {
            "if" => Some(Keyword::If),
            "else" => Some(Keyword::Else),
            _ => None,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Else => "else",
        }
    }
}

// ── Delimiter ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Assign,
    Lt,
    Gt,
    Bang,
    EqEq,
    NotEq,
    Le,
    Ge,
    AndAnd,
    OrOr,
}

/// Characters that may appear in a delimiter, including `&` and `|`, which
/// are only valid doubled.
pub const DELIMITER_CHARS: &[char] = &[
    '+', '-', '*', '/', '%', '(', ')', '{', '}', ',', ';', '=', '<', '>', '!', '&', '|',
];

impl Delimiter {
    /// Look up a one-character delimiter.
    pub fn single(s: &str) -> Option<Self> {
        Some(match s {
            "+" => Delimiter::Plus,
            "-" => Delimiter::Minus,
            "*" => Delimiter::Star,
            "/" => Delimiter::Slash,
            "%" => Delimiter::Percent,
            "(" => Delimiter::LParen,
            ")" => Delimiter::RParen,
            "{" => Delimiter::LBrace,
            "}" => Delimiter::RBrace,
            "," => Delimiter::Comma,
            ";" => Delimiter::Semicolon,
            "=" => Delimiter::Assign,
            "<" => Delimiter::Lt,
            ">" => Delimiter::Gt,
            "!" => Delimiter::Bang,
            _ => return None,
        })
    }

    /// Look up a two-character delimiter.
    pub fn double(s: &str) -> Option<Self> {
        Some(match s {
            "==" => Delimiter::EqEq,
            "!=" => Delimiter::NotEq,
            "<=" => Delimiter::Le,
            ">=" => Delimiter::Ge,
            "&&" => Delimiter::AndAnd,
            "||" => Delimiter::OrOr,
            _ => return None,
        })
    }

    pub fn text(self) -> &'static str {
        match self {
            Delimiter::Plus => "+",
            Delimiter::Minus => "-",
            Delimiter::Star => "*",
            Delimiter::Slash => "/",
            Delimiter::Percent => "%",
            Delimiter::LParen => "(",
            Delimiter::RParen => ")",
            Delimiter::LBrace => "{",
            Delimiter::RBrace => "}",
            Delimiter::Comma => ",",
            Delimiter::Semicolon => ";",
            Delimiter::Assign => "=",
            Delimiter::Lt => "<",
            Delimiter::Gt => ">",
            Delimiter::Bang => "!",
            Delimiter::EqEq => "==",
            Delimiter::NotEq => "!=",
            Delimiter::Le => "<=",
            Delimiter::Ge => ">=",
            Delimiter::AndAnd => "&&",
            Delimiter::OrOr => "||",
        }
    }

    /// Operator delimiters are tracked on the engine's operator-token stack.
    pub fn is_operator(self) -> bool {
        !matches!(
            self,
            Delimiter::LParen
                | Delimiter::RParen
                | Delimiter::LBrace
                | Delimiter::RBrace
                | Delimiter::Comma
                | Delimiter::Semicolon
        )
    }
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum TokenKind {
    Keyword(Keyword),
    Delimiter(Delimiter),
    /// A call target, bound to its definition when scanned.
    Function(Arc<dyn Function>),
    /// A literal, interned in the script's value pool.
    Constant { data_type: DataType, index: usize },
    /// A variable reference.  `to_be_assigned` marks the left-hand side of
    /// an `=`, which may be unresolved when evaluation reaches it.
    Variable { to_be_assigned: bool },
}

impl fmt::Debug for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(k) => write!(f, "Keyword({k:?})"),
            TokenKind::Delimiter(d) => write!(f, "Delimiter({d:?})"),
            TokenKind::Function(func) => write!(f, "Function({})", func.signature()),
            TokenKind::Constant { data_type, index } => {
                write!(f, "Constant({data_type}, #{index})")
            }
            TokenKind::Variable { to_be_assigned } => {
                write!(f, "Variable(to_be_assigned: {to_be_assigned})")
            }
        }
    }
}

impl PartialEq for TokenKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TokenKind::Keyword(a), TokenKind::Keyword(b)) => a == b,
            (TokenKind::Delimiter(a), TokenKind::Delimiter(b)) => a == b,
            (TokenKind::Function(a), TokenKind::Function(b)) => {
                Arc::ptr_eq(a, b) || a.signature() == b.signature()
            }
            (
                TokenKind::Constant { data_type: ta, index: ia },
                TokenKind::Constant { data_type: tb, index: ib },
            ) => ta == tb && ia == ib,
            (
                TokenKind::Variable { to_be_assigned: a },
                TokenKind::Variable { to_be_assigned: b },
            ) => a == b,
            _ => false,
        }
    }
}

/// A scanned terminal with its source text and position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: Position) -> Self {
        Token {
            kind,
            text: text.into(),
            pos,
        }
    }

    pub fn delimiter(&self) -> Option<Delimiter> {
        match self.kind {
            TokenKind::Delimiter(d) => Some(d),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, TokenKind::Variable { .. })
    }

    pub fn info(&self) -> TokenInfo {
        TokenInfo {
            text: self.text.clone(),
            line: self.pos.line,
            column: self.pos.column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' at {}", self.text, self.pos)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
