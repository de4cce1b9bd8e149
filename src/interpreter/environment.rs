//! Runtime environment for variable scopes.
//!
//! Scopes live in an arena and point at their parent by index. Blocks only
//! nest, so the innermost scope is always the last one in the arena.

use std::collections::HashMap;

use crate::value::Value;

#[derive(Debug, Default)]
struct Scope {
    values: HashMap<String, Value>,
    parent: Option<usize>,
}

/// A chain of variable scopes, rooted at the global scope.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
    current: usize,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            current: 0,
        }
    }

    /// Define a variable in the current scope, shadowing any outer binding.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.scopes[self.current].values.insert(name.into(), value);
    }

    /// Get a variable's value, searching outward through parent scopes.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.resolve(name)?;
        self.scopes[index].values.get(name)
    }

    /// Assign to an existing variable in the nearest scope that defines it.
    /// Returns false if no scope defines the name.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.resolve(name) {
            Some(index) => {
                self.scopes[index].values.insert(name.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Enter a child scope of the current one.
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope {
            values: HashMap::new(),
            parent: Some(self.current),
        });
        self.current = self.scopes.len() - 1;
    }

    /// Leave the current scope, dropping its bindings. The global scope stays.
    pub fn pop_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.scopes.truncate(self.current);
            self.current = parent;
        }
    }

    /// Number of scopes between the current one and the globals, inclusive.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut index = self.current;
        while let Some(parent) = self.scopes[index].parent {
            depth += 1;
            index = parent;
        }
        depth
    }

    fn resolve(&self, name: &str) -> Option<usize> {
        let mut index = Some(self.current);
        while let Some(i) = index {
            if self.scopes[i].values.contains_key(name) {
                return Some(i);
            }
            index = self.scopes[i].parent;
        }
        None
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
