//! Execution driver
//!
//! [`Engine`] owns one realm and runs scripts against it. Global
//! declarations accumulate across `execute` calls, so a host can feed a
//! session one script at a time. Parse failures and uncaught thrown values
//! surface as [`EngineError`]; engine-invariant failures are reported
//! separately and never masquerade as script errors.

use std::sync::Arc;

use stoat_ast::Statement;

use crate::debug::DebugSnapshot;
use crate::error::{EngineError, VmError};
use crate::function::NativeFn;
use crate::interpreter::Interpreter;
use crate::object::JsObject;
use crate::value::Value;

/// Engine tuning knobs.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Nested call depth after which calls fail with a stack overflow.
    ///
    /// Each nested script call costs several kilobytes of native stack in
    /// the evaluator, so the default must trip well before a 2 MiB thread
    /// stack runs out.
    pub max_call_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 128,
        }
    }
}

/// A JavaScript execution engine holding one realm.
pub struct Engine {
    interpreter: Arc<Interpreter>,
}

impl Engine {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            interpreter: Arc::new(Interpreter::new(config.max_call_depth)),
        }
    }

    /// Parse and run `source` against the accumulated realm state,
    /// returning the value of the last expression statement.
    pub fn execute(&self, source: &str) -> Result<Value, EngineError> {
        let program = stoat_parser::parse(source)?;
        match self.interpreter.execute_program(&program) {
            Ok(value) => Ok(value),
            Err(VmError::InternalError(message)) => Err(EngineError::Invariant(message)),
            Err(error) => {
                let message = error.to_string();
                let value = self.interpreter.error_value(&error);
                Err(EngineError::Script { value, message })
            }
        }
    }

    /// The realm's global object.
    pub fn global(&self) -> &Arc<JsObject> {
        self.interpreter.global()
    }

    /// The interpreter backing this engine, for hosts that drive the
    /// object model directly.
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Install a host function on the global object under `name`.
    pub fn register_native(&self, name: &str, length: u32, body: NativeFn) {
        let function = self.interpreter.create_native_function(name, length, body);
        self.global()
            .define_data(name, Value::object(function.clone()));
        self.interpreter
            .global_env()
            .declare(name, Value::object(function));
    }

    /// Subscribe an observer invoked synchronously before each statement
    /// with a fresh snapshot of execution state.
    pub fn on_step(&self, callback: impl Fn(&DebugSnapshot) + Send + Sync + 'static) {
        // The hook lives inside the interpreter, so a strong capture here
        // would keep the interpreter (and its object graph) alive forever.
        let interpreter = Arc::downgrade(&self.interpreter);
        self.interpreter.add_step_hook(Arc::new(move |statement| {
            if let Some(interpreter) = interpreter.upgrade() {
                let snapshot = interpreter.snapshot(statement);
                callback(&snapshot);
            }
        }));
    }

    /// Build a snapshot for `statement`, or `None` when no statement is at
    /// hand.
    pub fn debug_information(&self, statement: Option<&Statement>) -> Option<DebugSnapshot> {
        statement.map(|s| self.interpreter.snapshot(s))
    }

    /// Statements executed since the engine was created.
    pub fn statement_count(&self) -> u64 {
        self.interpreter.statement_count()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globals_accumulate_across_execute_calls() {
        let engine = Engine::new();
        engine.execute("var base = 40;").unwrap();
        let value = engine.execute("base + 2;").unwrap();
        assert_eq!(value.as_number(), Some(42.0));
    }

    #[test]
    fn parse_failures_surface_as_parse_errors() {
        let engine = Engine::new();
        let err = engine.execute("var = ;").unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }

    #[test]
    fn uncaught_throws_carry_the_thrown_value() {
        let engine = Engine::new();
        let err = engine.execute("throw 'boom';").unwrap_err();
        match err {
            EngineError::Script { value, .. } => assert_eq!(value.as_str(), Some("boom")),
            other => panic!("expected script error, got {other:?}"),
        }
    }

    #[test]
    fn registered_natives_are_callable_from_script() {
        let engine = Engine::new();
        engine.register_native(
            "double",
            1,
            Arc::new(|_, _, args| {
                let n = args.first().cloned().unwrap_or_default().to_number()?;
                Ok(Value::number(n * 2.0))
            }),
        );
        let value = engine.execute("double(21);").unwrap();
        assert_eq!(value.as_number(), Some(42.0));
    }

    #[test]
    fn step_snapshots_expose_locals_and_call_stack() {
        use parking_lot::Mutex;

        let engine = Engine::new();
        let inside: Arc<Mutex<Vec<DebugSnapshot>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = inside.clone();
        engine.on_step(move |snapshot| {
            if !snapshot.call_stack.is_empty() {
                sink.lock().push(snapshot.clone());
            }
        });
        engine
            .execute("function f(x) { var y = x + 1; return y; } var one = 1; f(one);")
            .unwrap();

        let snapshots = inside.lock();
        assert!(!snapshots.is_empty());
        let last = snapshots.last().unwrap();
        assert_eq!(last.call_stack, vec!["f(one)".to_string()]);
        assert_eq!(last.locals.get("x"), Some(&Value::number(1.0)));
    }

    #[test]
    fn step_subscription_does_not_pin_the_interpreter() {
        let engine = Engine::new();
        engine.on_step(|_| {});
        let weak = Arc::downgrade(&engine.interpreter);
        drop(engine);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn statement_count_spans_executions() {
        let engine = Engine::new();
        engine.execute("var a = 1;").unwrap();
        engine.execute("a = a + 1; a;").unwrap();
        assert_eq!(engine.statement_count(), 3);
    }
}
