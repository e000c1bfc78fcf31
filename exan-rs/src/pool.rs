//! Constant pool.
//!
//! The scanner interns every literal it recognises and stores the returned
//! index in the constant token; the engine resolves the index back to a
//! value.  Equal literals of the same type share one slot.

use std::collections::HashMap;

use crate::value::{DataType, Value};

#[derive(Debug, Clone, Default)]
pub struct ValuePool {
    values: Vec<Value>,
    slots: HashMap<(DataType, String), usize>,
}

impl ValuePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `value`, returning its stable index.
    pub fn intern(&mut self, value: Value) -> usize {
        let key = (value.data_type(), value.to_string());
        if let Some(&index) = self.slots.get(&key) {
            return index;
        }
        let index = self.values.len();
        self.values.push(value);
        self.slots.insert(key, index);
        index
    }

    pub fn resolve(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
