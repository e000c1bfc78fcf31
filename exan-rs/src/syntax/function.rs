//! Callable functions and the registries scripts resolve them from.
//!
//! A function declares its parameters as [`Params`]; the engine validates
//! every call against that declaration before invoking the body, so a body
//! may index its arguments freely.  Bodies report failures as plain
//! strings, which the engine wraps with the call's position.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::EvalConfig;
use crate::value::{DataType, Value};

/// Declared parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    /// Exactly these types, in order.
    Fixed(Vec<DataType>),
    /// Any number of arguments, all of this type.
    Variadic(DataType),
}

impl Params {
    /// Fixed argument count, or `None` for variadic functions.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Params::Fixed(types) => Some(types.len()),
            Params::Variadic(_) => None,
        }
    }

    /// `true` if arguments of these types satisfy the declaration.
    pub fn accepts(&self, args: &[DataType]) -> bool {
        match self {
            Params::Fixed(types) => {
                types.len() == args.len()
                    && types.iter().zip(args).all(|(want, &got)| want.accepts(got))
            }
            Params::Variadic(want) => args.iter().all(|&got| want.accepts(got)),
        }
    }

    /// `name(T1,T2)` or `name(T...)`.
    pub fn signature(&self, name: &str) -> String {
        match self {
            Params::Fixed(types) => {
                let list: Vec<&str> = types.iter().map(|t| t.name()).collect();
                format!("{name}({})", list.join(","))
            }
            Params::Variadic(t) => format!("{name}({t}...)"),
        }
    }
}

/// A function callable from scripts.
pub trait Function: Send + Sync {
    fn name(&self) -> &str;

    fn params(&self) -> &Params;

    /// Run the body.  Arguments have already been checked against
    /// [`Function::params`].
    fn call(&self, args: &[Value], config: &EvalConfig) -> Result<Value, String>;

    fn arity(&self) -> Option<usize> {
        self.params().arity()
    }

    fn signature(&self) -> String {
        self.params().signature(self.name())
    }
}

type Body = dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync;

/// A function backed by a host closure.
pub struct NativeFunction {
    name: String,
    params: Params,
    body: Box<Body>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, params: Params, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        NativeFunction {
            name: name.into(),
            params,
            body: Box::new(body),
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.signature())
    }
}

impl Function for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> &Params {
        &self.params
    }

    fn call(&self, args: &[Value], _config: &EvalConfig) -> Result<Value, String> {
        (self.body)(args)
    }
}

// ── FunctionRegistry ──────────────────────────────────────────────────────────

/// Name → function table.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    funcs: HashMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func` under its own name, returning any definition it
    /// replaced.
    pub fn register(&mut self, func: impl Function + 'static) -> Option<Arc<dyn Function>> {
        self.register_arc(Arc::new(func))
    }

    pub fn register_arc(&mut self, func: Arc<dyn Function>) -> Option<Arc<dyn Function>> {
        self.funcs.insert(func.name().to_owned(), func)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.funcs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Function>> {
        self.funcs.remove(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.funcs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn clear(&mut self) {
        self.funcs.clear();
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
