//! JavaScript values
//!
//! An enum representation: heap data (strings, objects) is behind `Arc`, so
//! values are cheap to clone and `Send + Sync`. Objects compare by reference
//! identity, numbers by IEEE semantics.

use std::sync::Arc;

use crate::error::{VmError, VmResult};
use crate::object::JsObject;
use crate::symbol::JsSymbol;

/// A JavaScript language value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// IEEE 754 double
    Number(f64),
    /// Immutable string
    String(Arc<str>),
    /// Unique symbol
    Symbol(JsSymbol),
    /// Shared object reference
    Object(Arc<JsObject>),
}

impl Value {
    /// The `undefined` value
    pub fn undefined() -> Self {
        Self::Undefined
    }

    /// The `null` value
    pub fn null() -> Self {
        Self::Null
    }

    /// Create a boolean value
    pub fn boolean(b: bool) -> Self {
        Self::Boolean(b)
    }

    /// Create a number value
    pub fn number(n: f64) -> Self {
        Self::Number(n)
    }

    /// Create a string value
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::String(s.into())
    }

    /// Create an object value
    pub fn object(o: Arc<JsObject>) -> Self {
        Self::Object(o)
    }

    /// Is this `undefined`?
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Is this `null`?
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Is this `undefined` or `null`?
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Is this an object?
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Is this a callable object?
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Object(o) if o.is_function())
    }

    /// The object reference, if this is an object.
    pub fn as_object(&self) -> Option<&Arc<JsObject>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The numeric payload, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// `typeof` result for this value.
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "object",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Object(o) => {
                if o.is_function() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    /// ToBoolean.
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Symbol(_) | Self::Object(_) => true,
        }
    }

    /// ToNumber for primitives. Objects must go through the interpreter's
    /// ToPrimitive first; passing one here is a type error, as is a symbol.
    pub fn to_number(&self) -> VmResult<f64> {
        match self {
            Self::Undefined => Ok(f64::NAN),
            Self::Null => Ok(0.0),
            Self::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Self::Number(n) => Ok(*n),
            Self::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Ok(0.0)
                } else if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
                    Ok(u64::from_str_radix(hex, 16)
                        .map(|v| v as f64)
                        .unwrap_or(f64::NAN))
                } else {
                    Ok(trimmed.parse::<f64>().unwrap_or(f64::NAN))
                }
            }
            Self::Symbol(_) => Err(VmError::type_error("Cannot convert a Symbol value to a number")),
            Self::Object(_) => Err(VmError::type_error("Cannot convert an object to a number directly")),
        }
    }

    /// ToString for primitives; objects render as `[object Class]` without
    /// consulting `toString` (the interpreter's ToPrimitive handles that).
    pub fn to_js_string(&self) -> VmResult<Arc<str>> {
        match self {
            Self::Undefined => Ok("undefined".into()),
            Self::Null => Ok("null".into()),
            Self::Boolean(b) => Ok(if *b { "true" } else { "false" }.into()),
            Self::Number(n) => Ok(number_to_string(*n).into()),
            Self::String(s) => Ok(s.clone()),
            Self::Symbol(_) => Err(VmError::type_error("Cannot convert a Symbol value to a string")),
            Self::Object(o) => Ok(format!("[object {}]", o.class_name()).into()),
        }
    }

    /// Infallible rendering for diagnostics (symbols and objects included).
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Symbol(s) => s.to_string(),
            other => other
                .to_js_string()
                .map(|s| s.to_string())
                .unwrap_or_else(|_| format!("{other:?}")),
        }
    }

    /// Strict equality (`===`): no coercion, NaN unequal to itself,
    /// objects by reference.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// SameValue: like strict equality but NaN equals NaN and `+0`/`-0`
    /// are distinguished. Used by the descriptor-reconciliation rules.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b && a.is_sign_positive() == b.is_sign_positive()
                }
            }
            _ => self.strict_equals(other),
        }
    }
}

/// Equality for tests and map storage: SameValueZero (NaN equals NaN,
/// signed zeros equal).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self.strict_equals(other),
        }
    }
}

/// Render a number the way JS does: integral values without a fraction,
/// shortest round-trip representation otherwise.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    // `as i64` saturates at the type bounds, so integrals at or above 2^63
    // go to ryu instead.
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return format!("{}", n as i64);
    }
    let mut buffer = ryu::Buffer::new();
    buffer.format(n).to_string()
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<Arc<JsObject>> for Value {
    fn from(o: Arc<JsObject>) -> Self {
        Self::Object(o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.to_boolean());
        assert!(!Value::Null.to_boolean());
        assert!(!Value::number(0.0).to_boolean());
        assert!(!Value::number(f64::NAN).to_boolean());
        assert!(!Value::string("").to_boolean());
        assert!(Value::number(-1.0).to_boolean());
        assert!(Value::string("x").to_boolean());
    }

    #[test]
    fn test_number_rendering() {
        assert_eq!(number_to_string(42.0), "42");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(2.5), "2.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_number_rendering_beyond_i64() {
        // Integrals past i64::MAX must not saturate to 9223372036854775807.
        assert_eq!(number_to_string(1e19), "1e19");
        assert_eq!(number_to_string(9.007199254740992e15), "9007199254740992");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(Value::string("  12 ").to_number().unwrap(), 12.0);
        assert_eq!(Value::string("").to_number().unwrap(), 0.0);
        assert_eq!(Value::string("0x10").to_number().unwrap(), 16.0);
        assert!(Value::string("12abc").to_number().unwrap().is_nan());
    }

    #[test]
    fn test_strict_equals_nan() {
        let nan = Value::number(f64::NAN);
        assert!(!nan.strict_equals(&nan));
        assert!(nan.same_value(&nan));
    }

    #[test]
    fn test_same_value_zeros() {
        assert!(!Value::number(0.0).same_value(&Value::number(-0.0)));
        assert!(Value::number(0.0).strict_equals(&Value::number(-0.0)));
    }

    #[test]
    fn test_symbol_to_number_is_type_error() {
        let sym = Value::Symbol(crate::symbol::JsSymbol::new(Some("s")));
        assert!(matches!(sym.to_number(), Err(VmError::TypeError(_))));
    }
}
