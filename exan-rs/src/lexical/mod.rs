//! Lexical analysis.
//!
//! [`Scanner`] runs the table-driven DFA in [`dfa`] over each source line
//! and produces a [`Script`]: the token sequence together with the pool its
//! constants were interned into.

pub mod dfa;
pub mod scanner;

pub use scanner::Scanner;

use crate::error::Result;
use crate::pool::ValuePool;
use crate::syntax::function::FunctionRegistry;
use crate::token::{Delimiter, Token, TokenKind};
use crate::value::Value;

/// Scanned form of a source text, ready for evaluation.
#[derive(Debug, Clone)]
pub struct Script {
    pub tokens: Vec<Token>,
    pub pool: ValuePool,
}

impl Script {
    /// Value of a constant token.
    pub fn constant(&self, token: &Token) -> Option<&Value> {
        match token.kind {
            TokenKind::Constant { index, .. } => self.pool.resolve(index),
            _ => None,
        }
    }
}

/// Scan `text` with the given custom and built-in function tables.
pub fn scan(text: &str, functions: &FunctionRegistry, builtins: &FunctionRegistry) -> Result<Script> {
    Scanner::new(functions, builtins).scan(text)
}

/// Scan `text` as a single, optionally negated, literal.
pub(crate) fn scan_literal(text: &str) -> Option<Value> {
    let none = FunctionRegistry::new();
    let script = scan(text, &none, &none).ok()?;
    match script.tokens.as_slice() {
        [lit] => script.constant(lit).cloned(),
        [minus, lit] if minus.delimiter() == Some(Delimiter::Minus) => {
            script.constant(lit)?.arith_neg()
        }
        _ => None,
    }
}
