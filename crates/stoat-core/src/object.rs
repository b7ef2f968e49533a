//! JavaScript objects
//!
//! An object owns an insertion-ordered map from property key to completed
//! descriptor, a prototype link, and an extensibility flag. All internal
//! methods of the spec's `[[Get]]`/`[[Set]]`/`[[DefineOwnProperty]]` family
//! live here; callable objects additionally carry [`FunctionData`] whose
//! special `prototype`/`length`/`name` slots are intercepted by the
//! own-property primitives so generic algorithms cannot tell them apart
//! from ordinary properties.

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{VmError, VmResult};
use crate::function::FunctionData;
use crate::interpreter::Interpreter;
use crate::property::{PropertyDescriptor, PropertyKey};
use crate::value::Value;

/// Upper bound on prototype-chain walks. Author-created cycles terminate
/// with an internal error instead of looping forever.
pub const PROTOTYPE_CHAIN_LIMIT: usize = 10_000;

type PropertyMap = IndexMap<PropertyKey, PropertyDescriptor, FxBuildHasher>;

/// A JavaScript object.
///
/// Shared by reference (`Arc`); interior mutability via `RwLock`.
pub struct JsObject {
    /// Own-property storage, insertion-ordered
    properties: RwLock<PropertyMap>,
    /// Prototype link (`null` for the root prototype)
    prototype: RwLock<Option<Arc<JsObject>>>,
    /// Once false, stays false
    extensible: AtomicBool,
    /// Class tag for `[object Class]` style rendering
    class_name: &'static str,
    /// Present on callable objects, fixed at creation
    function: Option<FunctionData>,
}

impl JsObject {
    /// Create a plain object with the given prototype.
    pub fn new(prototype: Option<Arc<JsObject>>) -> Arc<Self> {
        Self::with_class(prototype, "Object")
    }

    /// Create an object with an explicit class tag.
    pub fn with_class(prototype: Option<Arc<JsObject>>, class_name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            properties: RwLock::new(PropertyMap::default()),
            prototype: RwLock::new(prototype),
            extensible: AtomicBool::new(true),
            class_name,
            function: None,
        })
    }

    /// Create a callable object.
    pub fn function(prototype: Option<Arc<JsObject>>, data: FunctionData) -> Arc<Self> {
        Arc::new(Self {
            properties: RwLock::new(PropertyMap::default()),
            prototype: RwLock::new(prototype),
            extensible: AtomicBool::new(true),
            class_name: "Function",
            function: Some(data),
        })
    }

    /// Class tag.
    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    /// Is this object callable?
    pub fn is_function(&self) -> bool {
        self.function.is_some()
    }

    /// Callable payload, when present.
    pub fn function_data(&self) -> Option<&FunctionData> {
        self.function.as_ref()
    }

    /// Prototype link.
    pub fn prototype(&self) -> Option<Arc<JsObject>> {
        self.prototype.read().clone()
    }

    /// Replace the prototype link.
    pub fn set_prototype(&self, prototype: Option<Arc<JsObject>>) {
        *self.prototype.write() = prototype;
    }

    /// May new own properties still be added?
    pub fn is_extensible(&self) -> bool {
        self.extensible.load(Ordering::Relaxed)
    }

    /// Make the object non-extensible. One-way.
    pub fn prevent_extensions(&self) {
        self.extensible.store(false, Ordering::Relaxed);
    }

    // ------------------------------------------------------------------
    // Own-property primitives
    //
    // Every generic algorithm below goes through these, so function
    // special slots stay indistinguishable from mapped properties.
    // ------------------------------------------------------------------

    /// Fetch the own descriptor for `key`, if present.
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        if let Some(data) = &self.function
            && let Some(slot) = crate::function::special_key(key)
        {
            return data.slot(slot);
        }
        self.properties.read().get(key).cloned()
    }

    /// Install or replace the own descriptor for `key` without validation.
    /// Callers are expected to hand in completed descriptors.
    pub fn set_own_property(&self, key: PropertyKey, desc: PropertyDescriptor) {
        if let Some(data) = &self.function
            && let Some(slot) = crate::function::special_key(&key)
        {
            data.set_slot(slot, desc);
            return;
        }
        self.properties.write().insert(key, desc);
    }

    /// Does an own property for `key` exist?
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        if let Some(data) = &self.function
            && let Some(slot) = crate::function::special_key(key)
        {
            return data.slot(slot).is_some();
        }
        self.properties.read().contains_key(key)
    }

    /// Delete the own property for `key`.
    ///
    /// Returns false only when a non-configurable own property blocks the
    /// deletion; deleting an absent key is a successful no-op, so calling
    /// this twice is idempotent.
    pub fn remove_own_property(&self, key: &PropertyKey) -> bool {
        match self.get_own_property(key) {
            None => true,
            Some(desc) if !desc.configurable() => false,
            Some(_) => {
                if let Some(data) = &self.function
                    && let Some(slot) = crate::function::special_key(key)
                {
                    data.clear_slot(slot);
                } else {
                    self.properties.write().shift_remove(key);
                }
                true
            }
        }
    }

    /// All own keys in spec enumeration order: integer indices ascending,
    /// then string keys in insertion order, then symbol keys in insertion
    /// order. Function special slots come first, the way their dedicated
    /// storage was populated. Recomputed from live state on each call.
    pub fn own_property_keys(&self) -> Vec<PropertyKey> {
        let mut keys = Vec::new();
        if let Some(data) = &self.function {
            keys.extend(data.special_keys());
        }

        let properties = self.properties.read();
        let mut indices: Vec<u32> = Vec::new();
        let mut strings = Vec::new();
        let mut symbols = Vec::new();
        for key in properties.keys() {
            match key {
                PropertyKey::Index(i) => indices.push(*i),
                PropertyKey::String(_) => strings.push(key.clone()),
                PropertyKey::Symbol(_) => symbols.push(key.clone()),
            }
        }
        indices.sort_unstable();
        keys.extend(indices.into_iter().map(PropertyKey::Index));
        keys.extend(strings);
        keys.extend(symbols);
        keys
    }

    // ------------------------------------------------------------------
    // Internal methods
    // ------------------------------------------------------------------

    /// `[[Get]]`: own property, else the prototype chain, else `undefined`.
    /// Accessor getters run with `receiver` as `this`. On function objects,
    /// resolving `caller` to a strict function is a type error.
    pub fn get(&self, key: &PropertyKey, receiver: &Value, interp: &Interpreter) -> VmResult<Value> {
        let value = self.get_internal(key, receiver, interp)?;

        if self.function.is_some()
            && key.is_string("caller")
            && let Value::Object(o) = &value
            && let Some(data) = o.function_data()
            && data.is_strict()
        {
            return Err(VmError::type_error(
                "'caller' may not be accessed on strict mode functions",
            ));
        }

        Ok(value)
    }

    fn get_internal(
        &self,
        key: &PropertyKey,
        receiver: &Value,
        interp: &Interpreter,
    ) -> VmResult<Value> {
        let Some(desc) = self.find_descriptor(key)? else {
            return Ok(Value::undefined());
        };
        if desc.is_data() {
            return Ok(desc.value_or_undefined());
        }
        match &desc.get {
            Some(getter) if !getter.is_undefined() => {
                interp.call_function(getter, receiver.clone(), &[])
            }
            _ => Ok(Value::undefined()),
        }
    }

    /// Walk the prototype chain for the nearest descriptor, bounded.
    fn find_descriptor(&self, key: &PropertyKey) -> VmResult<Option<PropertyDescriptor>> {
        if let Some(own) = self.get_own_property(key) {
            return Ok(Some(own));
        }
        let mut current = self.prototype();
        for _ in 0..PROTOTYPE_CHAIN_LIMIT {
            let Some(object) = current else {
                return Ok(None);
            };
            if let Some(desc) = object.get_own_property(key) {
                return Ok(Some(desc));
            }
            current = object.prototype();
        }
        Err(VmError::internal("prototype chain too long or cyclic"))
    }

    /// `[[Set]]`: update an own writable data property, invoke the nearest
    /// setter, or create a new own data property. Failures (non-writable,
    /// setter-less accessor, non-extensible receiver, inherited
    /// non-writable data property) throw in strict contexts and are silent
    /// no-ops otherwise. Strictness comes from the call site, never from
    /// the target object.
    pub fn set(
        &self,
        key: PropertyKey,
        value: Value,
        receiver: &Value,
        strict: bool,
        interp: &Interpreter,
    ) -> VmResult<()> {
        let existing = self.find_descriptor(&key)?;

        match existing {
            Some(desc) if desc.is_accessor() => match &desc.set {
                Some(setter) if !setter.is_undefined() => {
                    interp.call_function(setter, receiver.clone(), &[value])?;
                    Ok(())
                }
                _ => reject(strict, || {
                    format!("Cannot set property '{key}' which has only a getter")
                }),
            },
            Some(desc) => {
                if !desc.writable() {
                    // Covers both an own non-writable property and an
                    // inherited one blocking creation on the receiver.
                    return reject(strict, || {
                        format!("Cannot assign to read only property '{key}'")
                    });
                }
                if self.has_own_property(&key) {
                    let updated = PropertyDescriptor {
                        value: Some(value),
                        ..desc
                    };
                    self.set_own_property(key, updated);
                    Ok(())
                } else {
                    self.create_data_property(key, value, strict)
                }
            }
            None => self.create_data_property(key, value, strict),
        }
    }

    fn create_data_property(&self, key: PropertyKey, value: Value, strict: bool) -> VmResult<()> {
        if !self.is_extensible() {
            return reject(strict, || {
                format!("Cannot add property '{key}', object is not extensible")
            });
        }
        self.set_own_property(key, PropertyDescriptor::data(value));
        Ok(())
    }

    /// `[[DefineOwnProperty]]`: the ValidateAndApplyPropertyDescriptor
    /// algorithm. Returns false when the definition is rejected.
    pub fn define_own_property(&self, key: PropertyKey, desc: PropertyDescriptor) -> bool {
        let Some(current) = self.get_own_property(&key) else {
            if !self.is_extensible() {
                return false;
            }
            self.set_own_property(key, desc.complete());
            return true;
        };

        if desc.is_empty() {
            return true;
        }

        if !current.configurable() {
            if desc.configurable == Some(true) {
                return false;
            }
            if let Some(enumerable) = desc.enumerable
                && enumerable != current.enumerable()
            {
                return false;
            }
            let switches_shape = (desc.is_accessor() && current.is_data())
                || (desc.has_data_fields() && current.is_accessor());
            if switches_shape {
                return false;
            }
            if current.is_data() && !current.writable() {
                if desc.writable == Some(true) {
                    return false;
                }
                if let Some(value) = &desc.value
                    && !value.same_value(&current.value_or_undefined())
                {
                    return false;
                }
            }
            if current.is_accessor() {
                if let Some(get) = &desc.get
                    && !same_accessor(get, &current.get)
                {
                    return false;
                }
                if let Some(set) = &desc.set
                    && !same_accessor(set, &current.set)
                {
                    return false;
                }
            }
        }

        let merged = if desc.is_accessor() && current.is_data() {
            // Data -> accessor: replace wholesale, keeping unspecified
            // enumerable/configurable from the current descriptor.
            PropertyDescriptor {
                value: None,
                writable: None,
                get: desc.get.clone(),
                set: desc.set.clone(),
                enumerable: Some(desc.enumerable.unwrap_or(current.enumerable())),
                configurable: Some(desc.configurable.unwrap_or(current.configurable())),
            }
        } else if desc.has_data_fields() && current.is_accessor() {
            // Accessor -> data: likewise.
            PropertyDescriptor {
                value: Some(desc.value_or_undefined()),
                writable: Some(desc.writable()),
                get: None,
                set: None,
                enumerable: Some(desc.enumerable.unwrap_or(current.enumerable())),
                configurable: Some(desc.configurable.unwrap_or(current.configurable())),
            }
        } else {
            PropertyDescriptor {
                value: desc.value.clone().or(current.value),
                writable: desc.writable.or(current.writable),
                get: desc.get.clone().or(current.get),
                set: desc.set.clone().or(current.set),
                enumerable: desc.enumerable.or(current.enumerable),
                configurable: desc.configurable.or(current.configurable),
            }
        };
        self.set_own_property(key, merged.complete());
        true
    }

    /// `[[HasProperty]]`: own or inherited.
    pub fn has_property(&self, key: &PropertyKey) -> VmResult<bool> {
        Ok(self.find_descriptor(key)?.is_some())
    }

    /// Convenience for bootstrap and built-ins: define a data property,
    /// ignoring rejection.
    pub fn define_data(&self, key: impl Into<PropertyKey>, value: Value) {
        self.define_own_property(key.into(), PropertyDescriptor::data(value));
    }
}

/// Accessor comparison for the reconciliation rules: absent compares equal
/// to `undefined`.
fn same_accessor(requested: &Value, current: &Option<Value>) -> bool {
    match current {
        Some(existing) => requested.same_value(existing),
        None => requested.is_undefined(),
    }
}

/// Strict contexts throw a `TypeError`; sloppy contexts swallow the failure.
fn reject(strict: bool, message: impl FnOnce() -> String) -> VmResult<()> {
    if strict {
        Err(VmError::type_error(message()))
    } else {
        Ok(())
    }
}

impl std::fmt::Debug for JsObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsObject")
            .field("class", &self.class_name)
            .field("properties", &self.properties.read().len())
            .field("callable", &self.function.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyAttributes;

    #[test]
    fn test_define_then_get_own() {
        let obj = JsObject::new(None);
        assert!(obj.define_own_property(
            PropertyKey::string("foo"),
            PropertyDescriptor::data(Value::number(42.0)),
        ));
        let desc = obj.get_own_property(&PropertyKey::string("foo")).unwrap();
        assert_eq!(desc.value_or_undefined(), Value::number(42.0));
        assert!(desc.writable() && desc.enumerable() && desc.configurable());
    }

    #[test]
    fn test_non_extensible_blocks_new_keys() {
        let obj = JsObject::new(None);
        obj.define_data("a", Value::number(1.0));
        obj.prevent_extensions();
        assert!(!obj.define_own_property(
            PropertyKey::string("b"),
            PropertyDescriptor::data(Value::number(2.0)),
        ));
        // Existing keys can still be redefined.
        assert!(obj.define_own_property(
            PropertyKey::string("a"),
            PropertyDescriptor::data(Value::number(3.0)),
        ));
    }

    #[test]
    fn test_non_configurable_rejects_reshaping() {
        let obj = JsObject::new(None);
        obj.define_own_property(
            PropertyKey::string("x"),
            PropertyDescriptor::data_with_attrs(Value::number(1.0), PropertyAttributes::frozen()),
        );

        // configurable: false -> true
        let mut requested = PropertyDescriptor::default();
        requested.configurable = Some(true);
        assert!(!obj.define_own_property(PropertyKey::string("x"), requested));

        // data -> accessor
        let accessor = PropertyDescriptor::accessor(Some(Value::undefined()), None);
        assert!(!obj.define_own_property(PropertyKey::string("x"), accessor));

        // value change on non-writable
        let mut value_change = PropertyDescriptor::default();
        value_change.value = Some(Value::number(2.0));
        assert!(!obj.define_own_property(PropertyKey::string("x"), value_change));

        // same value is fine
        let mut same = PropertyDescriptor::default();
        same.value = Some(Value::number(1.0));
        assert!(obj.define_own_property(PropertyKey::string("x"), same));
    }

    #[test]
    fn test_writable_narrowing_is_one_way() {
        let obj = JsObject::new(None);
        obj.define_own_property(
            PropertyKey::string("x"),
            PropertyDescriptor::data_with_attrs(
                Value::number(1.0),
                PropertyAttributes {
                    writable: true,
                    enumerable: true,
                    configurable: false,
                },
            ),
        );

        // Narrowing writable true -> false on a non-configurable property
        // is allowed...
        let mut narrow = PropertyDescriptor::default();
        narrow.writable = Some(false);
        assert!(obj.define_own_property(PropertyKey::string("x"), narrow));

        // ...but not back.
        let mut widen = PropertyDescriptor::default();
        widen.writable = Some(true);
        assert!(!obj.define_own_property(PropertyKey::string("x"), widen));
    }

    #[test]
    fn test_remove_own_property_idempotent() {
        let obj = JsObject::new(None);
        obj.define_data("x", Value::number(1.0));
        assert!(obj.remove_own_property(&PropertyKey::string("x")));
        // Twice on an absent key: success both times, no state change.
        assert!(obj.remove_own_property(&PropertyKey::string("x")));
        assert!(obj.remove_own_property(&PropertyKey::string("x")));
        assert!(!obj.has_own_property(&PropertyKey::string("x")));
    }

    #[test]
    fn test_remove_non_configurable_fails() {
        let obj = JsObject::new(None);
        obj.define_own_property(
            PropertyKey::string("x"),
            PropertyDescriptor::data_with_attrs(Value::number(1.0), PropertyAttributes::frozen()),
        );
        assert!(!obj.remove_own_property(&PropertyKey::string("x")));
        assert!(obj.has_own_property(&PropertyKey::string("x")));
    }

    #[test]
    fn test_own_key_enumeration_order() {
        let obj = JsObject::new(None);
        obj.define_data("b", Value::number(1.0));
        obj.define_data(1u32, Value::number(2.0));
        obj.define_data("a", Value::number(3.0));
        assert_eq!(
            obj.own_property_keys(),
            vec![
                PropertyKey::Index(1),
                PropertyKey::string("b"),
                PropertyKey::string("a"),
            ]
        );
    }

    #[test]
    fn test_index_keys_sort_ascending() {
        let obj = JsObject::new(None);
        obj.define_data(9u32, Value::number(1.0));
        obj.define_data(2u32, Value::number(2.0));
        obj.define_data("z", Value::number(3.0));
        obj.define_data(5u32, Value::number(4.0));
        assert_eq!(
            obj.own_property_keys(),
            vec![
                PropertyKey::Index(2),
                PropertyKey::Index(5),
                PropertyKey::Index(9),
                PropertyKey::string("z"),
            ]
        );
    }

    #[test]
    fn test_string_index_keys_normalize() {
        let obj = JsObject::new(None);
        obj.define_data("3", Value::number(1.0));
        assert!(obj.has_own_property(&PropertyKey::Index(3)));
    }
}
