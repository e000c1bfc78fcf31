//! Variable table exchanged with the caller.
//!
//! The caller fills a table before evaluation; the engine seeds its root
//! context from it and hands the (possibly mutated) table back afterwards.

use std::collections::hash_map;
use std::collections::HashMap;

use crate::value::Value;

/// Name → value store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableTable {
    vars: HashMap<String, Value>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Remove a variable.  Returns `true` if it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Copy every entry of `other` into `self`, overwriting existing names.
    pub fn merge(&mut self, other: VariableTable) {
        self.vars.extend(other.vars);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    /// Entries sorted by name, for stable output.
    pub fn sorted(&self) -> Vec<(&String, &Value)> {
        let mut entries: Vec<_> = self.vars.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl From<HashMap<String, Value>> for VariableTable {
    fn from(vars: HashMap<String, Value>) -> Self {
        VariableTable { vars }
    }
}

impl From<VariableTable> for HashMap<String, Value> {
    fn from(table: VariableTable) -> Self {
        table.vars
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for VariableTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        VariableTable {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl IntoIterator for VariableTable {
    type Item = (String, Value);
    type IntoIter = hash_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.into_iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut vars = VariableTable::new();
        vars.set("rate", 3);
        assert_eq!(vars.get("rate"), Some(&Value::from(3)));
    }

    #[test]
    fn overwrite_changes_type() {
        let mut vars = VariableTable::new();
        vars.set("x", "old");
        vars.set("x", true);
        assert_eq!(vars.get("x"), Some(&Value::from(true)));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn unset() {
        let mut vars = VariableTable::new();
        vars.set("gone", 1);
        assert!(vars.unset("gone"));
        assert_eq!(vars.get("gone"), None);
        assert!(!vars.unset("gone"));
    }

    #[test]
    fn merge_overwrites() {
        let mut base: VariableTable = [("a", 1), ("b", 2)].into_iter().collect();
        let overlay: VariableTable = [("b", 20), ("c", 30)].into_iter().collect();
        base.merge(overlay);
        assert_eq!(base.get("a"), Some(&Value::from(1)));
        assert_eq!(base.get("b"), Some(&Value::from(20)));
        assert_eq!(base.get("c"), Some(&Value::from(30)));
    }

    #[test]
    fn sorted_by_name() {
        let vars: VariableTable = [("b", 1), ("a", 2), ("c", 3)].into_iter().collect();
        let names: Vec<&str> = vars.sorted().into_iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn contains_and_clear() {
        let mut vars = VariableTable::new();
        vars.set("present", 'y');
        assert!(vars.contains("present"));
        vars.clear();
        assert!(vars.is_empty());
    }
}
