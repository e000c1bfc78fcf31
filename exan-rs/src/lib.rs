//! An embeddable expression language.
//!
//! Scripts are short sequences of expressions, assignments and `if`/`else`
//! blocks evaluated top to bottom against a caller-supplied variable table
//! and function table.  The value of the last statement is the result.
//!
//! ```text
//! source ──► lexical::Scanner ──► Script (tokens + constant pool)
//!                                   │
//!              VariableTable ──►  syntax::Engine ──► Evaluation
//!                                   │                (value + variables)
//!              EvalConfig ──────────┘
//! ```
//!
//! Most callers go through [`Expression`]:
//!
//! ```
//! use exan::{Expression, Value};
//!
//! let mut e = Expression::new("if (n > 2) { size = \"big\" } else { size = \"small\" }");
//! e.set_variable("n", 5);
//! assert_eq!(e.evaluate().unwrap(), Some(Value::from("big")));
//! assert_eq!(e.variable("size"), Some(&Value::from("big")));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod expression;
pub mod lexical;
pub mod pool;
pub mod syntax;
pub mod token;
pub mod value;
pub mod var;

pub use config::{EvalConfig, Rounding};
pub use error::{Error, Result};
pub use expression::Expression;
pub use syntax::{Evaluation, Function, FunctionRegistry, NativeFunction, Params};
pub use value::{DataType, HostValue, Value};
pub use var::VariableTable;

/// Evaluate `source` with no variables and default settings.
pub fn eval(source: &str) -> Result<Option<Value>> {
    Expression::new(source).evaluate()
}
