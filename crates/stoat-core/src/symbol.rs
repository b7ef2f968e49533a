//! Unique symbol values
//!
//! Symbols compare by identity. Each gets a process-wide unique id; the
//! description is carried for rendering only.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// A JavaScript symbol.
#[derive(Clone, Debug)]
pub struct JsSymbol {
    id: u64,
    description: Option<Arc<str>>,
}

impl JsSymbol {
    /// Create a fresh symbol, unequal to every existing one.
    pub fn new(description: Option<&str>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: description.map(Arc::from),
        }
    }

    /// The symbol's description, if it has one.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The symbol's unique id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JsSymbol {}

impl std::hash::Hash for JsSymbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for JsSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_are_unique() {
        let a = JsSymbol::new(Some("x"));
        let b = JsSymbol::new(Some("x"));
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_symbol_display() {
        assert_eq!(JsSymbol::new(Some("tag")).to_string(), "Symbol(tag)");
        assert_eq!(JsSymbol::new(None).to_string(), "Symbol()");
    }
}
