//! Scoped variable contexts for conditional branches.
//!
//! Contexts live in an arena and refer to their parent by index.  The root
//! holds the caller's variables and is never popped; each branch body gets a
//! context on top of it that only records its own writes.  Lookups fall
//! through to the parent chain.

use std::collections::HashMap;

use crate::token::Position;
use crate::value::Value;
use crate::var::VariableTable;

#[derive(Debug)]
pub struct Context {
    parent: Option<usize>,
    vars: HashMap<String, Value>,
    /// Whether this branch's writes and values survive it.
    pub effective: bool,
    /// Semantic-stack height when the branch opened.
    pub baseline: usize,
    pub opened_at: Option<Position>,
}

impl Context {
    /// Writes made while this context was on top.
    pub fn into_writes(self) -> HashMap<String, Value> {
        self.vars
    }
}

#[derive(Debug)]
pub struct ContextArena {
    contexts: Vec<Context>,
}

impl ContextArena {
    pub fn new(root: VariableTable) -> Self {
        ContextArena {
            contexts: vec![Context {
                parent: None,
                vars: root.into(),
                effective: true,
                baseline: 0,
                opened_at: None,
            }],
        }
    }

    /// Number of contexts, including the root.
    pub fn depth(&self) -> usize {
        self.contexts.len()
    }

    fn top_index(&self) -> usize {
        self.contexts.len() - 1
    }

    pub fn push(&mut self, effective: bool, baseline: usize, opened_at: Option<Position>) {
        let parent = Some(self.top_index());
        self.contexts.push(Context {
            parent,
            vars: HashMap::new(),
            effective,
            baseline,
            opened_at,
        });
    }

    /// Pop the innermost branch context.  The root is never popped.
    pub fn pop(&mut self) -> Option<Context> {
        if self.contexts.len() > 1 {
            self.contexts.pop()
        } else {
            None
        }
    }

    /// Pop the innermost branch and fold it into its parent if it was
    /// effective.  Returns the popped context's baseline and effectiveness.
    pub fn close(&mut self) -> Option<(bool, usize)> {
        let ctx = self.pop()?;
        let result = (ctx.effective, ctx.baseline);
        if ctx.effective {
            let top = self.top_index();
            self.contexts[top].vars.extend(ctx.into_writes());
        }
        Some(result)
    }

    /// Current value of `name`, searching from the innermost context out.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut at = Some(self.top_index());
        while let Some(i) = at {
            let ctx = &self.contexts[i];
            if let Some(v) = ctx.vars.get(name) {
                return Some(v);
            }
            at = ctx.parent;
        }
        None
    }

    /// Write `name` into the innermost context.
    pub fn assign(&mut self, name: &str, value: Value) {
        let top = self.top_index();
        self.contexts[top].vars.insert(name.to_owned(), value);
    }

    /// Opening positions of the open branches, innermost first.
    pub fn open_branches(&self) -> impl Iterator<Item = Position> + '_ {
        self.contexts.iter().rev().filter_map(|c| c.opened_at)
    }

    /// The root context's variables.
    pub fn into_variables(mut self) -> VariableTable {
        self.contexts.truncate(1);
        match self.contexts.pop() {
            Some(root) => VariableTable::from(root.vars),
            None => VariableTable::new(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
