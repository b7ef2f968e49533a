//! Callable objects
//!
//! One call protocol, two implementations: native host functions and
//! script-defined functions with a captured scope. The spec-mandated
//! `prototype`/`length`/`name` properties live in dedicated slots that the
//! own-property primitives in `object.rs` intercept, so they stay
//! indistinguishable from mapped properties under lookup, enumeration,
//! deletion, and redefinition.

use parking_lot::RwLock;
use std::sync::Arc;

use stoat_ast::Statement;

use crate::environment::Environment;
use crate::error::{VmError, VmResult};
use crate::interpreter::Interpreter;
use crate::object::{JsObject, PROTOTYPE_CHAIN_LIMIT};
use crate::property::{PropertyAttributes, PropertyDescriptor, PropertyKey};
use crate::value::Value;

/// Host-provided function body.
pub type NativeFn =
    Arc<dyn Fn(&Interpreter, &Value, &[Value]) -> VmResult<Value> + Send + Sync>;

/// The two callable implementations.
#[derive(Clone)]
pub enum FunctionKind {
    /// Fixed host procedure
    Native(NativeFn),
    /// Captured statement body plus closure scope
    Script(Arc<ScriptFunction>),
}

/// A script-defined function body with its captured definition environment.
pub struct ScriptFunction {
    /// Formal parameter names, in order
    pub params: Vec<String>,
    /// Body statements
    pub body: Vec<Statement>,
    /// Lexical environment active where the function was defined
    pub scope: Arc<Environment>,
}

/// The three specially-stored own properties of a function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SpecialSlot {
    Prototype,
    Length,
    Name,
}

/// Which special slot, if any, a key addresses.
pub(crate) fn special_key(key: &PropertyKey) -> Option<SpecialSlot> {
    match key {
        PropertyKey::String(s) => match &**s {
            "prototype" => Some(SpecialSlot::Prototype),
            "length" => Some(SpecialSlot::Length),
            "name" => Some(SpecialSlot::Name),
            _ => None,
        },
        _ => None,
    }
}

/// Callable payload of a [`JsObject`]. Kind, parameters, scope, and
/// strictness are fixed at creation; only the special slots mutate.
pub struct FunctionData {
    kind: FunctionKind,
    strict: bool,
    prototype_slot: RwLock<Option<PropertyDescriptor>>,
    length_slot: RwLock<Option<PropertyDescriptor>>,
    name_slot: RwLock<Option<PropertyDescriptor>>,
}

impl FunctionData {
    /// Create a native function payload.
    pub fn native(f: NativeFn) -> Self {
        Self {
            kind: FunctionKind::Native(f),
            strict: false,
            prototype_slot: RwLock::new(None),
            length_slot: RwLock::new(None),
            name_slot: RwLock::new(None),
        }
    }

    /// Create a script function payload.
    pub fn script(function: ScriptFunction, strict: bool) -> Self {
        Self {
            kind: FunctionKind::Script(Arc::new(function)),
            strict,
            prototype_slot: RwLock::new(None),
            length_slot: RwLock::new(None),
            name_slot: RwLock::new(None),
        }
    }

    /// The callable implementation.
    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    /// Strictness flag, fixed at creation.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Formal parameters of a script function (empty for natives).
    pub fn formal_parameters(&self) -> &[String] {
        match &self.kind {
            FunctionKind::Script(f) => &f.params,
            FunctionKind::Native(_) => &[],
        }
    }

    /// Install the `length` property.
    pub fn set_length(&self, length: u32) {
        *self.length_slot.write() = Some(
            PropertyDescriptor::data_with_attrs(
                Value::number(length as f64),
                PropertyAttributes {
                    writable: false,
                    enumerable: false,
                    configurable: true,
                },
            )
            .complete(),
        );
    }

    /// Install the `.prototype` property (constructor linkage).
    pub fn set_prototype_property(&self, prototype: Value) {
        *self.prototype_slot.write() = Some(
            PropertyDescriptor::data_with_attrs(
                prototype,
                PropertyAttributes {
                    writable: true,
                    enumerable: false,
                    configurable: false,
                },
            )
            .complete(),
        );
    }

    /// The function's name, if one has been set.
    pub fn name(&self) -> Option<Arc<str>> {
        self.name_slot
            .read()
            .as_ref()
            .and_then(|d| d.value.as_ref())
            .and_then(|v| v.as_str().map(Arc::from))
    }

    /// SetFunctionName: set `name` once. A second set is an internal error
    /// when `throw_if_exists` is requested and a no-op otherwise. Symbol
    /// keys with a description render as `[<description>]`.
    pub fn set_function_name(&self, key: &PropertyKey, throw_if_exists: bool) -> VmResult<()> {
        let mut slot = self.name_slot.write();
        if slot.is_some() {
            if throw_if_exists {
                return Err(VmError::internal("cannot set name"));
            }
            return Ok(());
        }
        let rendered = match key {
            PropertyKey::Symbol(s) => match s.description() {
                Some(d) if !d.is_empty() => format!("[{d}]"),
                _ => String::new(),
            },
            other => other.to_string(),
        };
        *slot = Some(
            PropertyDescriptor::data_with_attrs(
                Value::string(rendered),
                PropertyAttributes {
                    writable: false,
                    enumerable: false,
                    configurable: true,
                },
            )
            .complete(),
        );
        Ok(())
    }

    pub(crate) fn slot(&self, slot: SpecialSlot) -> Option<PropertyDescriptor> {
        self.slot_lock(slot).read().clone()
    }

    pub(crate) fn set_slot(&self, slot: SpecialSlot, desc: PropertyDescriptor) {
        *self.slot_lock(slot).write() = Some(desc);
    }

    pub(crate) fn clear_slot(&self, slot: SpecialSlot) {
        *self.slot_lock(slot).write() = None;
    }

    /// Present special slots, in `prototype`, `length`, `name` order.
    pub(crate) fn special_keys(&self) -> Vec<PropertyKey> {
        let mut keys = Vec::new();
        if self.prototype_slot.read().is_some() {
            keys.push(PropertyKey::string("prototype"));
        }
        if self.length_slot.read().is_some() {
            keys.push(PropertyKey::string("length"));
        }
        if self.name_slot.read().is_some() {
            keys.push(PropertyKey::string("name"));
        }
        keys
    }

    fn slot_lock(&self, slot: SpecialSlot) -> &RwLock<Option<PropertyDescriptor>> {
        match slot {
            SpecialSlot::Prototype => &self.prototype_slot,
            SpecialSlot::Length => &self.length_slot,
            SpecialSlot::Name => &self.name_slot,
        }
    }
}

impl JsObject {
    /// `[[HasInstance]]`, the `instanceof` algorithm. `self_value` must be
    /// this function as a language value (the `Get` receiver).
    ///
    /// The walk follows the internal prototype links of `v`, comparing each
    /// by reference identity against this function's resolved `.prototype`
    /// property, and is bounded so cyclic chains terminate.
    pub fn has_instance(
        &self,
        interp: &Interpreter,
        self_value: &Value,
        v: &Value,
    ) -> VmResult<bool> {
        let Some(target) = v.as_object() else {
            return Ok(false);
        };

        let prototype = self.get(&PropertyKey::string("prototype"), self_value, interp)?;
        let Some(prototype) = prototype.as_object() else {
            return Err(VmError::type_error(format!(
                "Function has non-object prototype '{}' in instanceof check",
                prototype.to_display_string()
            )));
        };

        let mut current = target.prototype();
        for _ in 0..PROTOTYPE_CHAIN_LIMIT {
            let Some(object) = current else {
                return Ok(false);
            };
            if Arc::ptr_eq(&object, prototype) {
                return Ok(true);
            }
            current = object.prototype();
        }
        Err(VmError::internal("prototype chain too long or cyclic"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::JsSymbol;

    fn noop_native() -> FunctionData {
        FunctionData::native(Arc::new(|_, _, _| Ok(Value::undefined())))
    }

    #[test]
    fn test_set_function_name_once() {
        let data = noop_native();
        data.set_function_name(&PropertyKey::string("foo"), false)
            .unwrap();
        assert_eq!(data.name().as_deref(), Some("foo"));

        // Second plain set is a no-op.
        data.set_function_name(&PropertyKey::string("bar"), false)
            .unwrap();
        assert_eq!(data.name().as_deref(), Some("foo"));

        // Forced second set is an internal error; the name is unchanged.
        let err = data
            .set_function_name(&PropertyKey::string("bar"), true)
            .unwrap_err();
        assert!(matches!(err, VmError::InternalError(_)));
        assert_eq!(data.name().as_deref(), Some("foo"));
    }

    #[test]
    fn test_symbol_names_render_bracketed() {
        let data = noop_native();
        data.set_function_name(&PropertyKey::symbol(JsSymbol::new(Some("tag"))), false)
            .unwrap();
        assert_eq!(data.name().as_deref(), Some("[tag]"));

        let anonymous = noop_native();
        anonymous
            .set_function_name(&PropertyKey::symbol(JsSymbol::new(None)), false)
            .unwrap();
        assert_eq!(anonymous.name().as_deref(), Some(""));
    }

    #[test]
    fn test_special_slots_act_like_own_properties() {
        let function = JsObject::function(None, noop_native());
        let data = function.function_data().unwrap();
        data.set_length(2);
        data.set_function_name(&PropertyKey::string("f"), false)
            .unwrap();

        let length_key = PropertyKey::string("length");
        assert!(function.has_own_property(&length_key));
        let desc = function.get_own_property(&length_key).unwrap();
        assert_eq!(desc.value_or_undefined(), Value::number(2.0));
        assert!(!desc.writable() && !desc.enumerable() && desc.configurable());

        // Deletion goes through the normal configurability rules.
        assert!(function.remove_own_property(&length_key));
        assert!(!function.has_own_property(&length_key));

        // Enumeration lists the remaining special slot.
        assert_eq!(
            function.own_property_keys(),
            vec![PropertyKey::string("name")]
        );
    }

    #[test]
    fn test_special_slot_redefinition_respects_rules() {
        let function = JsObject::function(None, noop_native());
        let data = function.function_data().unwrap();
        data.set_length(1);

        // length is non-writable but configurable: value change via
        // define_own_property is allowed.
        let mut redefine = PropertyDescriptor::default();
        redefine.value = Some(Value::number(5.0));
        assert!(function.define_own_property(PropertyKey::string("length"), redefine));
        let desc = function
            .get_own_property(&PropertyKey::string("length"))
            .unwrap();
        assert_eq!(desc.value_or_undefined(), Value::number(5.0));

        // Plain assignment to the non-writable slot is rejected silently in
        // sloppy mode (exercised at the interpreter level).
    }
}
