//! Engine error types
//!
//! Two disjoint failure classes exist. Language-level failures (a script
//! throws, or an internal algorithm raises a spec-mandated error) travel as
//! `VmError` through every internal-method call and are catchable by script.
//! Host-invariant failures surface as `EngineError` at the driver boundary
//! and never become script-visible thrown values.

use crate::value::Value;
use thiserror::Error;

/// Language-level execution errors.
#[derive(Debug, Error)]
pub enum VmError {
    /// Type error (e.g., calling a non-function)
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Reference error (undefined variable)
    #[error("ReferenceError: {0}")]
    ReferenceError(String),

    /// Range error
    #[error("RangeError: {0}")]
    RangeError(String),

    /// Syntax error surfaced at runtime
    #[error("SyntaxError: {0}")]
    SyntaxError(String),

    /// Internal error (engine limits, `SetFunctionName` double set)
    #[error("InternalError: {0}")]
    InternalError(String),

    /// Call depth limit exceeded
    #[error("RangeError: Maximum call stack size exceeded")]
    StackOverflow,

    /// Thrown JS exception
    #[error("Uncaught exception: {0}")]
    Exception(Box<ThrownValue>),
}

/// A thrown JavaScript value.
#[derive(Debug)]
pub struct ThrownValue {
    /// The thrown value
    pub value: Value,
    /// String rendering, for diagnostics
    pub message: String,
}

impl std::fmt::Display for ThrownValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl VmError {
    /// Create a type error
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a reference error
    pub fn reference_error(msg: impl Into<String>) -> Self {
        Self::ReferenceError(msg.into())
    }

    /// Create a range error
    pub fn range_error(msg: impl Into<String>) -> Self {
        Self::RangeError(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Create an exception from a thrown JS value
    pub fn exception(value: Value) -> Self {
        let message = value.to_display_string();
        Self::Exception(Box::new(ThrownValue { value, message }))
    }

    /// The error-constructor name this failure corresponds to.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::TypeError(_) => "TypeError",
            Self::ReferenceError(_) => "ReferenceError",
            Self::RangeError(_) | Self::StackOverflow => "RangeError",
            Self::SyntaxError(_) => "SyntaxError",
            Self::InternalError(_) => "InternalError",
            Self::Exception(_) => "Error",
        }
    }
}

/// Result type for VM operations.
pub type VmResult<T> = std::result::Result<T, VmError>;

/// Failures surfaced by the [`Engine`](crate::engine::Engine) driver.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The source text did not parse
    #[error(transparent)]
    Parse(#[from] stoat_parser::ParseError),

    /// A language value was thrown and not caught
    #[error("{message}")]
    Script {
        /// The thrown value
        value: Value,
        /// Rendered diagnostic message
        message: String,
    },

    /// An engine invariant failed; the embedding is mis-configured or the
    /// engine itself is buggy, not the script
    #[error("engine invariant violation: {0}")]
    Invariant(String),
}
