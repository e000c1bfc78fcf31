//! The parse-and-execute engine.
//!
//! Parsing and evaluation happen in a single pass over the token sequence,
//! with no intermediate tree.  Each sentence (one `STATEMENT`) is driven by
//! a predictive syntax stack; terminals push onto the semantic, operator and
//! call stacks as they are matched, and action symbols consume those stacks
//! as they are popped.  Branch contexts and the condition stack persist
//! across the symbols of an `if`/`else` construct.
//!
//! Both arms of an `if`/`else` are parsed and executed.  Only the arm whose
//! condition holds keeps its variable writes and produced values; the other
//! is rolled back when its block closes, but anything it ran (including
//! failures) has already happened.

use tracing::{debug, trace};

use super::context::ContextArena;
use super::grammar::{self, Action, Control, Grammar, Nonterminal, Symbol, TerminalClass};
use super::operator::{operand_types, Operator, OperatorError};
use crate::config::EvalConfig;
use crate::error::{Error, Result};
use crate::lexical::Script;
use crate::token::{Token, TokenKind};
use crate::value::{DataType, Value};
use crate::var::VariableTable;

/// Outcome of evaluating a script.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Value of the last statement that produced one.
    pub value: Option<Value>,
    /// The caller's variable table after every effective write.
    pub variables: VariableTable,
}

/// An entry on the semantic stack.
#[derive(Debug, Clone)]
enum Operand<'s> {
    Constant(&'s Value),
    /// A variable reference, with its value if it had one when matched.
    Variable { token: &'s Token, value: Option<Value> },
    Runtime(Value),
}

impl Operand<'_> {
    fn resolve(self) -> Result<Value> {
        match self {
            Operand::Constant(v) => Ok(v.clone()),
            Operand::Runtime(v) | Operand::Variable { value: Some(v), .. } => Ok(v),
            Operand::Variable { token, value: None } => Err(Error::VariableNotInitialized {
                name: token.text.clone(),
                line: token.pos.line,
                column: token.pos.column,
            }),
        }
    }

    fn data_type(&self) -> DataType {
        match self {
            Operand::Constant(v) => v.data_type(),
            Operand::Runtime(v) | Operand::Variable { value: Some(v), .. } => v.data_type(),
            Operand::Variable { value: None, .. } => DataType::Any,
        }
    }
}

/// Evaluate `script` against `variables`.
pub fn evaluate(script: &Script, variables: VariableTable, config: &EvalConfig) -> Result<Evaluation> {
    Engine::new(script, variables, config).run()
}

pub struct Engine<'s> {
    script: &'s Script,
    config: &'s EvalConfig,
    grammar: &'static Grammar,
    contexts: ContextArena,

    syntax: Vec<Symbol>,
    semantic: Vec<Operand<'s>>,
    operators: Vec<&'s Token>,
    calls: Vec<&'s Token>,
    call_baselines: Vec<usize>,
    conditions: Vec<bool>,

    /// Index of the current token.
    pos: usize,
    /// Most recently matched token.
    last: Option<&'s Token>,
}

impl<'s> Engine<'s> {
    pub fn new(script: &'s Script, variables: VariableTable, config: &'s EvalConfig) -> Self {
        Engine {
            script,
            config,
            grammar: Grammar::standard(),
            contexts: ContextArena::new(variables),
            syntax: Vec::new(),
            semantic: Vec::new(),
            operators: Vec::new(),
            calls: Vec::new(),
            call_baselines: Vec::new(),
            conditions: Vec::new(),
            pos: 0,
            last: None,
        }
    }

    pub fn run(mut self) -> Result<Evaluation> {
        let mut value = None;
        while self.pos < self.script.tokens.len() {
            let start = self.pos;
            match self.sentence() {
                Ok(Some(v)) => value = Some(v),
                Ok(None) => {}
                Err(e) => return Err(self.in_branches(e)),
            }
            debug!(from = start, to = self.pos, "sentence done");
        }
        Ok(Evaluation {
            value,
            variables: self.contexts.into_variables(),
        })
    }

    /// Parse and execute one statement, returning its value.
    fn sentence(&mut self) -> Result<Option<Value>> {
        self.syntax.clear();
        self.semantic.clear();
        self.operators.clear();
        self.calls.clear();
        self.call_baselines.clear();
        self.syntax.push(Symbol::Nonterminal(grammar::START));

        while let Some(symbol) = self.syntax.pop() {
            trace!(?symbol, pos = self.pos, "pop");
            match symbol {
                Symbol::Nonterminal(nt) => self.expand(nt)?,
                Symbol::Terminal(class) => self.shift(class)?,
                Symbol::Action(action) => self.execute(action)?,
                Symbol::Control(control) => self.control(control)?,
            }
        }

        self.semantic.pop().map(Operand::resolve).transpose()
    }

    fn current(&self) -> Option<&'s Token> {
        self.script.tokens.get(self.pos)
    }

    fn expand(&mut self, nt: Nonterminal) -> Result<()> {
        let lookahead = self.current();
        let production = match self.grammar.production(nt, lookahead) {
            Some(p) => p,
            None => {
                return Err(match lookahead {
                    Some(token) => Error::syntax(
                        format!("unexpected '{}'", token.text),
                        Some(token.info()),
                    ),
                    None => self.unterminated(),
                })
            }
        };
        self.guard(self.syntax.len() + production.len(), "syntax stack")?;
        self.syntax.extend(production.iter().rev());
        Ok(())
    }

    /// Match the current token against a terminal and push what it carries.
    fn shift(&mut self, class: TerminalClass) -> Result<()> {
        let Some(token) = self.current() else {
            return Err(self.unterminated());
        };
        if !class.matches(token) {
            return Err(Error::syntax(
                format!("expected {class}, found '{}'", token.text),
                Some(token.info()),
            ));
        }

        match &token.kind {
            TokenKind::Constant { .. } => {
                let value = self.script.constant(token).ok_or_else(|| {
                    Error::syntax("constant missing from pool", Some(token.info()))
                })?;
                self.push(Operand::Constant(value))?;
            }
            TokenKind::Variable { .. } => {
                let value = self.contexts.lookup(&token.text).cloned();
                self.push(Operand::Variable { token, value })?;
            }
            TokenKind::Delimiter(d) if d.is_operator() => self.operators.push(token),
            TokenKind::Function(_) => {
                self.calls.push(token);
                self.call_baselines.push(self.semantic.len());
            }
            TokenKind::Delimiter(_) | TokenKind::Keyword(_) => {}
        }

        self.last = Some(token);
        self.pos += 1;
        Ok(())
    }

    fn push(&mut self, operand: Operand<'s>) -> Result<()> {
        self.guard(self.semantic.len() + 1, "semantic stack")?;
        self.semantic.push(operand);
        Ok(())
    }

    fn guard(&self, height: usize, resource: &'static str) -> Result<()> {
        if height > self.config.max_depth {
            return Err(Error::ResourceExhausted {
                resource,
                limit: self.config.max_depth,
            });
        }
        Ok(())
    }

    /// Pop the top `n` semantic entries, in the order they were pushed.
    fn pop_operands(&mut self, n: usize) -> Result<Vec<Operand<'s>>> {
        let at = self
            .semantic
            .len()
            .checked_sub(n)
            .ok_or_else(|| Error::syntax("missing operand", self.last.map(Token::info)))?;
        Ok(self.semantic.split_off(at))
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    fn execute(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Operator(op) => self.apply(op),
            Action::Call => self.call(),
        }
    }

    fn apply(&mut self, op: Operator) -> Result<()> {
        let token = self
            .operators
            .pop()
            .ok_or_else(|| Error::syntax(format!("no token for operator {op}"), None))?;
        let mut operands = self.pop_operands(op.arity())?;

        if op == Operator::Assign {
            let rhs = operands.pop().map(Operand::resolve).transpose()?;
            let target = operands.pop();
            return match (target, rhs) {
                (Some(Operand::Variable { token: var, .. }), Some(value)) => {
                    self.contexts.assign(&var.text, value.clone());
                    self.push(Operand::Runtime(value))
                }
                (target, rhs) => Err(Error::ArgumentsMismatch {
                    args: target
                        .iter()
                        .map(Operand::data_type)
                        .chain(rhs.iter().map(Value::data_type))
                        .collect(),
                    signature: op.signature(),
                    token: Some(token.info()),
                }),
            };
        }

        let values = operands
            .into_iter()
            .map(Operand::resolve)
            .collect::<Result<Vec<_>>>()?;
        let result = op.apply(&values, self.config).map_err(|e| match e {
            OperatorError::Mismatch => Error::ArgumentsMismatch {
                args: operand_types(&values),
                signature: op.signature(),
                token: Some(token.info()),
            },
            OperatorError::Arithmetic(message) => Error::Arithmetic {
                message,
                line: token.pos.line,
                column: token.pos.column,
            },
        })?;
        self.push(Operand::Runtime(result))
    }

    fn call(&mut self) -> Result<()> {
        let (token, baseline) = match (self.calls.pop(), self.call_baselines.pop()) {
            (Some(t), Some(b)) => (t, b),
            _ => return Err(Error::syntax("no pending function call", None)),
        };
        let TokenKind::Function(func) = &token.kind else {
            return Err(Error::syntax("not a function", Some(token.info())));
        };

        let n = self.semantic.len().saturating_sub(baseline);
        let args = self
            .pop_operands(n)?
            .into_iter()
            .map(Operand::resolve)
            .collect::<Result<Vec<_>>>()?;
        let types = operand_types(&args);
        if !func.params().accepts(&types) {
            return Err(Error::ArgumentsMismatch {
                args: types,
                signature: func.signature(),
                token: Some(token.info()),
            });
        }
        let result = func
            .call(&args, self.config)
            .map_err(|message| Error::FunctionFailed {
                function: func.name().to_owned(),
                message,
                token: Some(token.info()),
            })?;
        self.push(Operand::Runtime(result))
    }

    // ── Branching ─────────────────────────────────────────────────────────────

    fn control(&mut self, control: Control) -> Result<()> {
        match control {
            Control::IfCondition => {
                let operand = self
                    .semantic
                    .pop()
                    .ok_or_else(|| Error::syntax("missing condition", self.last.map(Token::info)))?;
                let value = operand.resolve()?;
                let Some(cond) = value.as_bool() else {
                    return Err(Error::TypeMismatch {
                        expected: DataType::Boolean,
                        found: value.data_type(),
                        token: self.last.map(Token::info),
                    });
                };
                self.guard(self.conditions.len() + 1, "condition stack")?;
                self.conditions.push(cond);
            }
            Control::ElseCondition => {
                if let Some(top) = self.conditions.last_mut() {
                    *top = !*top;
                }
            }
            Control::NewContext => {
                let effective = self.conditions.last().copied().unwrap_or(true);
                self.guard(self.contexts.depth() + 1, "context depth")?;
                self.contexts.push(
                    effective,
                    self.semantic.len(),
                    self.last.map(|t| t.pos),
                );
                debug!(depth = self.contexts.depth(), effective, "branch opened");
            }
            Control::EndContext => {
                if let Some((effective, baseline)) = self.contexts.close() {
                    if !effective {
                        self.semantic.truncate(baseline);
                    }
                    debug!(depth = self.contexts.depth(), effective, "branch closed");
                }
            }
            Control::EndIf => {
                self.conditions.pop();
            }
        }
        Ok(())
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    fn unterminated(&self) -> Error {
        Error::syntax(
            "sentence is not properly terminated",
            self.last.map(Token::info),
        )
    }

    /// Attach every open branch to `err`, innermost first.
    fn in_branches(&self, err: Error) -> Error {
        self.contexts
            .open_branches()
            .fold(err, |source, at| Error::InBranch {
                line: at.line,
                column: at.column,
                source: Box::new(source),
            })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
