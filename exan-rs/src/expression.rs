//! The `Expression` façade: source text, variables, custom functions and
//! settings, with the scanned script cached between evaluations.

use std::collections::BTreeSet;
use std::io::{self, Read};
use std::sync::Arc;

use tracing::debug;

use crate::config::EvalConfig;
use crate::error::Result;
use crate::lexical::{self, Script};
use crate::syntax::builtins;
use crate::syntax::engine;
use crate::syntax::function::{Function, FunctionRegistry};
use crate::token::{Token, TokenKind};
use crate::value::Value;
use crate::var::VariableTable;

/// A script plus everything needed to evaluate it.
///
/// Function names decide how identifiers are scanned, so changing the
/// source or the custom functions drops the cached tokens.  Changing
/// variables or settings does not.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    variables: VariableTable,
    functions: FunctionRegistry,
    builtins: Arc<FunctionRegistry>,
    config: EvalConfig,
    script: Option<Script>,
    final_result: Option<Value>,
}

impl Default for Expression {
    fn default() -> Self {
        Expression {
            source: String::new(),
            variables: VariableTable::new(),
            functions: FunctionRegistry::new(),
            builtins: builtins::standard(),
            config: EvalConfig::default(),
            script: None,
            final_result: None,
        }
    }
}

impl Expression {
    pub fn new(source: impl Into<String>) -> Self {
        Expression {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Read the whole source from `reader`.
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Ok(Self::new(source))
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.script = None;
        self.final_result = None;
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    // ── Tokens ────────────────────────────────────────────────────────────────

    fn scan(&self) -> Result<Script> {
        let script = lexical::scan(&self.source, &self.functions, &self.builtins)?;
        debug!(tokens = script.tokens.len(), "source scanned");
        Ok(script)
    }

    fn compile(&mut self) -> Result<&Script> {
        let script = match self.script.take() {
            Some(s) => s,
            None => self.scan()?,
        };
        Ok(self.script.insert(script))
    }

    /// The scanned tokens, scanning the source if needed.
    pub fn tokens(&mut self) -> Result<&[Token]> {
        Ok(&self.compile()?.tokens)
    }

    /// Every variable name the script mentions.
    pub fn variable_names(&mut self) -> Result<BTreeSet<String>> {
        Ok(self
            .tokens()?
            .iter()
            .filter(|t| t.is_variable())
            .map(|t| t.text.clone())
            .collect())
    }

    /// Variables the script reads somewhere other than as an assignment
    /// target; these are the ones a caller is expected to supply.
    pub fn input_variable_names(&mut self) -> Result<BTreeSet<String>> {
        Ok(self
            .tokens()?
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Variable { to_be_assigned: false }))
            .map(|t| t.text.clone())
            .collect())
    }

    pub fn clear_tokens(&mut self) {
        self.script = None;
    }

    // ── Variables ─────────────────────────────────────────────────────────────

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.set(name, value);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    pub fn remove_variable(&mut self, name: &str) -> bool {
        self.variables.unset(name)
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    // ── Functions ─────────────────────────────────────────────────────────────

    /// Register a custom function.  It shadows any built-in of the same
    /// name.
    pub fn add_function(&mut self, func: impl Function + 'static) {
        self.functions.register(func);
        self.script = None;
    }

    /// A custom function by name.
    pub fn function(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn remove_function(&mut self, name: &str) -> Option<Arc<dyn Function>> {
        let removed = self.functions.remove(name);
        if removed.is_some() {
            self.script = None;
        }
        removed
    }

    pub fn clear_functions(&mut self) {
        self.functions.clear();
        self.script = None;
    }

    // ── Settings ──────────────────────────────────────────────────────────────

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EvalConfig) {
        self.config = config;
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    /// Evaluate the script against the current variables.
    ///
    /// On success the variable table is replaced by the evaluated one and the
    /// script's value is returned.  On failure the variables are left as they
    /// were.
    pub fn evaluate(&mut self) -> Result<Option<Value>> {
        let script = match self.script.take() {
            Some(s) => s,
            None => self.scan()?,
        };
        let outcome = engine::evaluate(&script, self.variables.clone(), &self.config);
        self.script = Some(script);

        let evaluation = outcome?;
        self.variables = evaluation.variables;
        self.final_result = evaluation.value.clone();
        Ok(evaluation.value)
    }

    /// Value of the last successful evaluation.
    pub fn final_result(&self) -> Option<&Value> {
        self.final_result.as_ref()
    }

    /// Reset to an empty expression, keeping the settings.
    pub fn clear(&mut self) {
        self.source.clear();
        self.script = None;
        self.final_result = None;
        self.variables.clear();
        self.functions.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
