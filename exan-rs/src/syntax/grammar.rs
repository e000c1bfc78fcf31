//! Grammar symbols and the LL(1) production table.
//!
//! ```text
//! STATEMENT   -> IF_STMT | ; | EXPR STMT_END
//! STMT_END    -> ; | ε
//! IF_STMT     -> if ( EXPR ) #IF_CONDITION BLOCK ELSE_PART
//! BLOCK       -> { #NEW_CONTEXT STATEMENTS #END_CONTEXT }
//! STATEMENTS  -> STATEMENT STATEMENTS | ε
//! ELSE_PART   -> else #ELSE_CONDITION ELSE_BODY #END_IF | #END_IF
//! ELSE_BODY   -> BLOCK | #NEW_CONTEXT IF_STMT #END_CONTEXT
//! EXPR        -> OR ASSIGN_TAIL
//! ASSIGN_TAIL -> = EXPR @= | ε
//! OR          -> AND OR_TAIL        OR_TAIL  -> || AND @|| OR_TAIL | ε
//! AND         -> EQ AND_TAIL        AND_TAIL -> && EQ @&& AND_TAIL | ε
//! EQ          -> REL EQ_TAIL        EQ_TAIL  -> (== | !=) REL @op EQ_TAIL | ε
//! REL         -> ADD REL_TAIL       REL_TAIL -> (< | <= | > | >=) ADD @op REL_TAIL | ε
//! ADD         -> MUL ADD_TAIL       ADD_TAIL -> (+ | -) MUL @op ADD_TAIL | ε
//! MUL         -> UNARY MUL_TAIL     MUL_TAIL -> (* | / | %) UNARY @op MUL_TAIL | ε
//! UNARY       -> - UNARY @neg | ! UNARY @not | PRIMARY
//! PRIMARY     -> constant | variable | ( EXPR ) | function ( ARGS ) @call
//! ARGS        -> EXPR ARG_TAIL | ε
//! ARG_TAIL    -> , EXPR ARG_TAIL | ε
//! ```
//!
//! Each nonterminal has at most one production per lookahead class plus an
//! optional fallback taken on any other lookahead, including the end of
//! input.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use super::operator::Operator;
use crate::token::{Delimiter, Keyword, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nonterminal {
    Statement,
    StmtEnd,
    IfStmt,
    Block,
    Statements,
    ElsePart,
    ElseBody,
    Expr,
    AssignTail,
    Or,
    OrTail,
    And,
    AndTail,
    Eq,
    EqTail,
    Rel,
    RelTail,
    Add,
    AddTail,
    Mul,
    MulTail,
    Unary,
    Primary,
    Args,
    ArgTail,
}

/// The class a token is matched by.  Keywords and delimiters match by
/// exact text; the others match any token of their kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalClass {
    Keyword(Keyword),
    Delimiter(Delimiter),
    Constant,
    Variable,
    Function,
}

impl TerminalClass {
    pub fn of(token: &Token) -> Self {
        match &token.kind {
            TokenKind::Keyword(k) => TerminalClass::Keyword(*k),
            TokenKind::Delimiter(d) => TerminalClass::Delimiter(*d),
            TokenKind::Constant { .. } => TerminalClass::Constant,
            TokenKind::Variable { .. } => TerminalClass::Variable,
            TokenKind::Function(_) => TerminalClass::Function,
        }
    }

    pub fn matches(self, token: &Token) -> bool {
        TerminalClass::of(token) == self
    }
}

impl fmt::Display for TerminalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalClass::Keyword(k) => write!(f, "'{}'", k.text()),
            TerminalClass::Delimiter(d) => write!(f, "'{}'", d.text()),
            TerminalClass::Constant => f.write_str("a constant"),
            TerminalClass::Variable => f.write_str("a variable"),
            TerminalClass::Function => f.write_str("a function"),
        }
    }
}

/// Control actions that drive conditional branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    IfCondition,
    ElseCondition,
    NewContext,
    EndContext,
    EndIf,
}

/// Execution actions: apply an operator, or call the pending function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Operator(Operator),
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Nonterminal(Nonterminal),
    Terminal(TerminalClass),
    Action(Action),
    Control(Control),
}

pub type Production = &'static [Symbol];

pub const START: Nonterminal = Nonterminal::Statement;

// ── Symbol shorthands ─────────────────────────────────────────────────────────

use Nonterminal as N;

const fn nt(n: Nonterminal) -> Symbol {
    Symbol::Nonterminal(n)
}

const fn delim(d: Delimiter) -> Symbol {
    Symbol::Terminal(TerminalClass::Delimiter(d))
}

const fn kw(k: Keyword) -> Symbol {
    Symbol::Terminal(TerminalClass::Keyword(k))
}

const fn op(o: Operator) -> Symbol {
    Symbol::Action(Action::Operator(o))
}

const fn ctl(c: Control) -> Symbol {
    Symbol::Control(c)
}

/// A `'static` production built from the shorthands above.
macro_rules! prod {
    ($($sym:expr),* $(,)?) => {{
        const P: Production = &[$($sym),*];
        P
    }};
}

const EMPTY: Production = &[];

const FIRST_EXPR: [TerminalClass; 6] = [
    TerminalClass::Constant,
    TerminalClass::Variable,
    TerminalClass::Function,
    TerminalClass::Delimiter(Delimiter::LParen),
    TerminalClass::Delimiter(Delimiter::Minus),
    TerminalClass::Delimiter(Delimiter::Bang),
];

// ── Grammar ───────────────────────────────────────────────────────────────────

/// The fixed production table.
#[derive(Debug)]
pub struct Grammar {
    on: HashMap<(Nonterminal, TerminalClass), Production>,
    otherwise: HashMap<Nonterminal, Production>,
}

static STANDARD: LazyLock<Grammar> = LazyLock::new(Grammar::build);

impl Grammar {
    pub fn standard() -> &'static Grammar {
        &STANDARD
    }

    /// Production for `nt` given the current token, or `None` at the end of
    /// input.
    pub fn production(&self, nt: Nonterminal, lookahead: Option<&Token>) -> Option<Production> {
        lookahead
            .and_then(|token| self.on.get(&(nt, TerminalClass::of(token))))
            .or_else(|| self.otherwise.get(&nt))
            .copied()
    }

    fn rule(&mut self, nt: Nonterminal, on: TerminalClass, production: Production) {
        let previous = self.on.insert((nt, on), production);
        debug_assert!(previous.is_none(), "{nt:?} has two productions on {on}");
    }

    fn rules(&mut self, nt: Nonterminal, on: &[TerminalClass], production: Production) {
        for &class in on {
            self.rule(nt, class, production);
        }
    }

    fn fallback(&mut self, nt: Nonterminal, production: Production) {
        self.otherwise.insert(nt, production);
    }

    /// A binary precedence level: `LEVEL -> NEXT TAIL`, and
    /// `TAIL -> op NEXT @op TAIL | ε` for each operator.
    fn level(&mut self, level: N, body: Production, tail: N, ops: &[(Delimiter, Production)]) {
        self.rules(level, &FIRST_EXPR, body);
        for &(d, production) in ops {
            self.rule(tail, TerminalClass::Delimiter(d), production);
        }
        self.fallback(tail, EMPTY);
    }

    fn build() -> Grammar {
        use Delimiter as D;

        let mut g = Grammar {
            on: HashMap::new(),
            otherwise: HashMap::new(),
        };
        let if_kw = TerminalClass::Keyword(Keyword::If);
        let else_kw = TerminalClass::Keyword(Keyword::Else);
        let semi = TerminalClass::Delimiter(D::Semicolon);
        let lbrace = TerminalClass::Delimiter(D::LBrace);

        // Statements
        g.rule(N::Statement, if_kw, prod![nt(N::IfStmt)]);
        g.rule(N::Statement, semi, prod![delim(D::Semicolon)]);
        g.rules(N::Statement, &FIRST_EXPR, prod![nt(N::Expr), nt(N::StmtEnd)]);

        g.rule(N::StmtEnd, semi, prod![delim(D::Semicolon)]);
        g.fallback(N::StmtEnd, EMPTY);

        g.rule(
            N::IfStmt,
            if_kw,
            prod![
                kw(Keyword::If),
                delim(D::LParen),
                nt(N::Expr),
                delim(D::RParen),
                ctl(Control::IfCondition),
                nt(N::Block),
                nt(N::ElsePart),
            ],
        );
        g.rule(
            N::Block,
            lbrace,
            prod![
                delim(D::LBrace),
                ctl(Control::NewContext),
                nt(N::Statements),
                ctl(Control::EndContext),
                delim(D::RBrace),
            ],
        );

        const STATEMENTS: Production = &[nt(N::Statement), nt(N::Statements)];
        g.rule(N::Statements, if_kw, STATEMENTS);
        g.rule(N::Statements, semi, STATEMENTS);
        g.rules(N::Statements, &FIRST_EXPR, STATEMENTS);
        g.fallback(N::Statements, EMPTY);

        g.rule(
            N::ElsePart,
            else_kw,
            prod![
                kw(Keyword::Else),
                ctl(Control::ElseCondition),
                nt(N::ElseBody),
                ctl(Control::EndIf),
            ],
        );
        g.fallback(N::ElsePart, prod![ctl(Control::EndIf)]);

        g.rule(N::ElseBody, lbrace, prod![nt(N::Block)]);
        g.rule(
            N::ElseBody,
            if_kw,
            prod![
                ctl(Control::NewContext),
                nt(N::IfStmt),
                ctl(Control::EndContext),
            ],
        );

        // Expressions
        g.rules(N::Expr, &FIRST_EXPR, prod![nt(N::Or), nt(N::AssignTail)]);
        g.rule(
            N::AssignTail,
            TerminalClass::Delimiter(D::Assign),
            prod![delim(D::Assign), nt(N::Expr), op(Operator::Assign)],
        );
        g.fallback(N::AssignTail, EMPTY);

        g.level(
            N::Or,
            prod![nt(N::And), nt(N::OrTail)],
            N::OrTail,
            &[(D::OrOr, prod![delim(D::OrOr), nt(N::And), op(Operator::Or), nt(N::OrTail)])],
        );
        g.level(
            N::And,
            prod![nt(N::Eq), nt(N::AndTail)],
            N::AndTail,
            &[(D::AndAnd, prod![delim(D::AndAnd), nt(N::Eq), op(Operator::And), nt(N::AndTail)])],
        );
        g.level(
            N::Eq,
            prod![nt(N::Rel), nt(N::EqTail)],
            N::EqTail,
            &[
                (D::EqEq, prod![delim(D::EqEq), nt(N::Rel), op(Operator::Eq), nt(N::EqTail)]),
                (D::NotEq, prod![delim(D::NotEq), nt(N::Rel), op(Operator::Ne), nt(N::EqTail)]),
            ],
        );
        g.level(
            N::Rel,
            prod![nt(N::Add), nt(N::RelTail)],
            N::RelTail,
            &[
                (D::Lt, prod![delim(D::Lt), nt(N::Add), op(Operator::Lt), nt(N::RelTail)]),
                (D::Le, prod![delim(D::Le), nt(N::Add), op(Operator::Le), nt(N::RelTail)]),
                (D::Gt, prod![delim(D::Gt), nt(N::Add), op(Operator::Gt), nt(N::RelTail)]),
                (D::Ge, prod![delim(D::Ge), nt(N::Add), op(Operator::Ge), nt(N::RelTail)]),
            ],
        );
        g.level(
            N::Add,
            prod![nt(N::Mul), nt(N::AddTail)],
            N::AddTail,
            &[
                (D::Plus, prod![delim(D::Plus), nt(N::Mul), op(Operator::Add), nt(N::AddTail)]),
                (D::Minus, prod![delim(D::Minus), nt(N::Mul), op(Operator::Sub), nt(N::AddTail)]),
            ],
        );
        g.level(
            N::Mul,
            prod![nt(N::Unary), nt(N::MulTail)],
            N::MulTail,
            &[
                (D::Star, prod![delim(D::Star), nt(N::Unary), op(Operator::Mul), nt(N::MulTail)]),
                (D::Slash, prod![delim(D::Slash), nt(N::Unary), op(Operator::Div), nt(N::MulTail)]),
                (D::Percent, prod![delim(D::Percent), nt(N::Unary), op(Operator::Rem), nt(N::MulTail)]),
            ],
        );

        g.rule(
            N::Unary,
            TerminalClass::Delimiter(D::Minus),
            prod![delim(D::Minus), nt(N::Unary), op(Operator::Neg)],
        );
        g.rule(
            N::Unary,
            TerminalClass::Delimiter(D::Bang),
            prod![delim(D::Bang), nt(N::Unary), op(Operator::Not)],
        );
        g.rules(N::Unary, &FIRST_EXPR[..4], prod![nt(N::Primary)]);

        g.rule(
            N::Primary,
            TerminalClass::Constant,
            prod![Symbol::Terminal(TerminalClass::Constant)],
        );
        g.rule(
            N::Primary,
            TerminalClass::Variable,
            prod![Symbol::Terminal(TerminalClass::Variable)],
        );
        g.rule(
            N::Primary,
            TerminalClass::Delimiter(D::LParen),
            prod![delim(D::LParen), nt(N::Expr), delim(D::RParen)],
        );
        g.rule(
            N::Primary,
            TerminalClass::Function,
            prod![
                Symbol::Terminal(TerminalClass::Function),
                delim(D::LParen),
                nt(N::Args),
                delim(D::RParen),
                Symbol::Action(Action::Call),
            ],
        );

        g.rules(N::Args, &FIRST_EXPR, prod![nt(N::Expr), nt(N::ArgTail)]);
        g.fallback(N::Args, EMPTY);
        g.rule(
            N::ArgTail,
            TerminalClass::Delimiter(D::Comma),
            prod![delim(D::Comma), nt(N::Expr), nt(N::ArgTail)],
        );
        g.fallback(N::ArgTail, EMPTY);

        g
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
