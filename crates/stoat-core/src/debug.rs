//! Debug stepping support
//!
//! The evaluator notifies subscribed hooks synchronously before each
//! statement; observers may ask the engine for a point-in-time snapshot of
//! the call-expression stack and visible bindings. Snapshots are built
//! fresh from live state and never retained by the engine.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use stoat_ast::{Expression, Statement};

use crate::value::Value;

/// A per-statement step observer.
pub type StepHook = Arc<dyn Fn(&Statement) + Send + Sync>;

/// An immutable point-in-time record of execution state.
#[derive(Clone, Debug)]
pub struct DebugSnapshot {
    /// The statement about to execute
    pub statement: Statement,
    /// Rendered call expressions active at this point, outermost first
    pub call_stack: Vec<String>,
    /// Bindings visible in the current function scope chain (global excluded)
    pub locals: FxHashMap<String, Value>,
    /// Global bindings
    pub globals: FxHashMap<String, Value>,
}

/// Render a call expression as `callee(arg, …)` for the snapshot call
/// stack: identifier callees and arguments by name, everything else as
/// `null` / `anonymous function`.
pub fn render_call_expression(callee: &Expression, args: &[Expression]) -> String {
    let Expression::Identifier(name) = callee else {
        return "anonymous function".to_string();
    };
    let rendered: Vec<&str> = args
        .iter()
        .map(|arg| match arg {
            Expression::Identifier(n) => n.as_str(),
            _ => "null",
        })
        .collect();
    format!("{}({})", name, rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_identifier_call() {
        let callee = Expression::Identifier("f".to_string());
        let args = vec![
            Expression::Identifier("a".to_string()),
            Expression::Number(1.0),
            Expression::Identifier("b".to_string()),
        ];
        assert_eq!(render_call_expression(&callee, &args), "f(a, null, b)");
    }

    #[test]
    fn test_render_non_identifier_call() {
        let callee = Expression::Number(1.0);
        assert_eq!(render_call_expression(&callee, &[]), "anonymous function");
    }
}
