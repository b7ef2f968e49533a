//! # Stoat Core
//!
//! Object model, evaluator, and execution driver for the Stoat JavaScript
//! engine.
//!
//! ## Design Principles
//!
//! - **Spec-shaped objects**: every object is a bag of completed property
//!   descriptors plus a prototype link; the internal-method family does all
//!   property work
//! - **Ambient strictness**: strict mode is a property of the executing
//!   code, threaded into each operation, never read off the target object
//! - **Thread-safe sharing**: objects are `Arc`-shared with interior
//!   mutability; execution itself is single-threaded and cooperative
//! - **Observable execution**: per-statement step hooks and on-demand
//!   debug snapshots, with no cost when unused

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod debug;
pub mod engine;
pub mod environment;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod object;
pub mod property;
pub mod symbol;
pub mod value;

pub use debug::{DebugSnapshot, StepHook};
pub use engine::{Engine, EngineConfig};
pub use environment::Environment;
pub use error::{EngineError, ThrownValue, VmError, VmResult};
pub use function::{FunctionData, FunctionKind, NativeFn, ScriptFunction};
pub use interpreter::Interpreter;
pub use object::JsObject;
pub use property::{PropertyAttributes, PropertyDescriptor, PropertyKey};
pub use symbol::JsSymbol;
pub use value::Value;
