//! Syntax-directed evaluation.
//!
//! # Architecture
//!
//! ```text
//! Script ──► Engine::run()
//!              │
//!              ├─ grammar      production table, looked up per nonterminal
//!              ├─ operator     operator actions
//!              ├─ function     function actions (custom + builtins)
//!              └─ context      branch scopes over the caller's variables
//! ```

pub mod builtins;
pub mod context;
pub mod engine;
pub mod function;
pub mod grammar;
pub mod operator;

pub use engine::{evaluate, Engine, Evaluation};
pub use function::{Function, FunctionRegistry, NativeFunction, Params};
pub use operator::Operator;
