//! Lexical environments
//!
//! A chain of binding maps. Functions capture the environment active at
//! their definition; calls chain a fresh child onto it.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::value::Value;

/// One scope's bindings plus a parent link.
pub struct Environment {
    bindings: RwLock<FxHashMap<String, Value>>,
    parent: Option<Arc<Environment>>,
}

impl Environment {
    /// Create a root (global) environment.
    pub fn global() -> Arc<Self> {
        Arc::new(Self {
            bindings: RwLock::new(FxHashMap::default()),
            parent: None,
        })
    }

    /// Create a child environment chained to `parent`.
    pub fn child(parent: &Arc<Environment>) -> Arc<Self> {
        Arc::new(Self {
            bindings: RwLock::new(FxHashMap::default()),
            parent: Some(parent.clone()),
        })
    }

    /// The parent scope, if any.
    pub fn parent(&self) -> Option<&Arc<Environment>> {
        self.parent.as_ref()
    }

    /// Create or overwrite a binding in this scope.
    pub fn declare(&self, name: impl Into<String>, value: Value) {
        self.bindings.write().insert(name.into(), value);
    }

    /// Resolve a name through the chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.read().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    /// Is the name bound anywhere in the chain?
    pub fn has(&self, name: &str) -> bool {
        self.bindings.read().contains_key(name) || self.parent.as_ref().is_some_and(|p| p.has(name))
    }

    /// Is the name bound in this scope itself?
    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.read().contains_key(name)
    }

    /// Assign to an existing binding in the chain. Returns false when the
    /// name is unbound anywhere, so the caller can decide between creating
    /// an implicit global and throwing a strict-mode `ReferenceError`.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if self.bindings.read().contains_key(name) {
            self.bindings.write().insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }

    /// Copy this scope's own bindings into `out`, skipping names already
    /// present (inner scopes shadow outer ones).
    pub fn collect_into(&self, out: &mut FxHashMap<String, Value>) {
        for (name, value) in self.bindings.read().iter() {
            out.entry(name.clone()).or_insert_with(|| value.clone());
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("bindings", &self.bindings.read().len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_chain() {
        let global = Environment::global();
        global.declare("x", Value::number(1.0));
        let child = Environment::child(&global);
        assert_eq!(child.lookup("x"), Some(Value::number(1.0)));
        assert_eq!(child.lookup("y"), None);
    }

    #[test]
    fn test_shadowing() {
        let global = Environment::global();
        global.declare("x", Value::number(1.0));
        let child = Environment::child(&global);
        child.declare("x", Value::number(2.0));
        assert_eq!(child.lookup("x"), Some(Value::number(2.0)));
        assert_eq!(global.lookup("x"), Some(Value::number(1.0)));
    }

    #[test]
    fn test_assign_targets_defining_scope() {
        let global = Environment::global();
        global.declare("x", Value::number(1.0));
        let child = Environment::child(&global);
        assert!(child.assign("x", Value::number(5.0)));
        assert_eq!(global.lookup("x"), Some(Value::number(5.0)));
        assert!(!child.has_own("x"));
        assert!(!child.assign("missing", Value::undefined()));
    }
}
