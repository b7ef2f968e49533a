//! Object and function model behavior exercised through the public API.

use std::sync::Arc;

use stoat_core::{
    FunctionData, Interpreter, JsObject, JsSymbol, PropertyAttributes, PropertyDescriptor,
    PropertyKey, Value, VmError,
};

fn interp() -> Interpreter {
    Interpreter::new(64)
}

fn noop_function(interp: &Interpreter) -> Arc<JsObject> {
    interp.create_native_function("noop", 0, Arc::new(|_, _, _| Ok(Value::undefined())))
}

#[test]
fn descriptor_shapes_are_mutually_exclusive() {
    let data = PropertyDescriptor::data(Value::number(1.0));
    assert!(data.is_data() && !data.is_accessor());

    let accessor = PropertyDescriptor::accessor(Some(Value::undefined()), None);
    assert!(accessor.is_accessor() && !accessor.is_data());

    // An empty descriptor is data-shaped; exactly one shape always holds.
    let empty = PropertyDescriptor::default();
    assert!(empty.is_data() != empty.is_accessor());
}

#[test]
fn non_extensible_objects_reject_new_definitions() {
    let object = JsObject::new(None);
    object.define_data("present", Value::number(1.0));
    object.prevent_extensions();

    assert!(!object.define_own_property(
        PropertyKey::string("fresh"),
        PropertyDescriptor::data(Value::number(2.0)),
    ));
    // Redefining an existing own property is still allowed.
    assert!(object.define_own_property(
        PropertyKey::string("present"),
        PropertyDescriptor::data(Value::number(3.0)),
    ));
}

#[test]
fn define_then_get_round_trips() {
    let interp = interp();
    let object = JsObject::new(None);
    let receiver = Value::object(object.clone());

    assert!(object.define_own_property(
        PropertyKey::string("x"),
        PropertyDescriptor::data(Value::string("v")),
    ));
    let got = object
        .get(&PropertyKey::string("x"), &receiver, &interp)
        .unwrap();
    assert_eq!(got.as_str(), Some("v"));
}

#[test]
fn remove_own_property_is_idempotent_on_absent_keys() {
    let object = JsObject::new(None);
    assert!(object.remove_own_property(&PropertyKey::string("ghost")));
    assert!(object.remove_own_property(&PropertyKey::string("ghost")));
    assert!(object.own_property_keys().is_empty());
}

#[test]
fn remove_own_property_refuses_non_configurable_entries() {
    let object = JsObject::new(None);
    object.define_own_property(
        PropertyKey::string("pinned"),
        PropertyDescriptor::data_with_attrs(Value::number(1.0), PropertyAttributes::frozen()),
    );
    assert!(!object.remove_own_property(&PropertyKey::string("pinned")));
    assert!(object.has_own_property(&PropertyKey::string("pinned")));
}

#[test]
fn inherited_non_writable_data_property_blocks_creation() {
    let interp = interp();
    let proto = JsObject::new(None);
    proto.define_own_property(
        PropertyKey::string("x"),
        PropertyDescriptor::data_with_attrs(
            Value::number(5.0),
            PropertyAttributes {
                writable: false,
                enumerable: true,
                configurable: true,
            },
        ),
    );
    let object = JsObject::new(Some(proto.clone()));
    let receiver = Value::object(object.clone());

    // Sloppy write is a silent no-op.
    object
        .set(
            PropertyKey::string("x"),
            Value::number(10.0),
            &receiver,
            false,
            &interp,
        )
        .unwrap();
    assert!(!object.has_own_property(&PropertyKey::string("x")));

    // Strict write is a type error.
    let err = object
        .set(
            PropertyKey::string("x"),
            Value::number(10.0),
            &receiver,
            true,
            &interp,
        )
        .unwrap_err();
    assert!(matches!(err, VmError::TypeError(_)));

    // The prototype's value never moved.
    let inherited = proto
        .get(&PropertyKey::string("x"), &Value::object(proto.clone()), &interp)
        .unwrap();
    assert_eq!(inherited.as_number(), Some(5.0));
}

#[test]
fn strict_function_caller_access_is_poisoned() {
    let interp = interp();

    let strict = interp
        .create_native_function("s", 0, Arc::new(|_, _, _| Ok(Value::undefined())));
    // Native functions are not strict; borrow a strict script function.
    let program = stoat_parser::parse("'use strict'; function f() {} f;").unwrap();
    let strict_fn = interp.execute_program(&program).unwrap();

    let holder = noop_function(&interp);
    holder.define_data("caller", strict_fn);
    let receiver = Value::object(holder.clone());
    let err = holder
        .get(&PropertyKey::string("caller"), &receiver, &interp)
        .unwrap_err();
    assert!(matches!(err, VmError::TypeError(_)));

    // A non-strict caller value reads back normally.
    let sloppy_holder = noop_function(&interp);
    sloppy_holder.define_data("caller", Value::object(strict));
    let receiver = Value::object(sloppy_holder.clone());
    let value = sloppy_holder
        .get(&PropertyKey::string("caller"), &receiver, &interp)
        .unwrap();
    assert!(value.is_callable());
}

#[test]
fn function_name_sets_once_and_survives_forced_retry() {
    let data = FunctionData::native(Arc::new(|_, _, _| Ok(Value::undefined())));
    data.set_function_name(&PropertyKey::string("foo"), false)
        .unwrap();

    let err = data
        .set_function_name(&PropertyKey::string("bar"), true)
        .unwrap_err();
    assert!(matches!(err, VmError::InternalError(_)));
    assert_eq!(data.name().as_deref(), Some("foo"));
}

#[test]
fn symbol_keyed_function_names_render_bracketed() {
    let data = FunctionData::native(Arc::new(|_, _, _| Ok(Value::undefined())));
    let key = PropertyKey::symbol(JsSymbol::new(Some("iterator")));
    data.set_function_name(&key, false).unwrap();
    assert_eq!(data.name().as_deref(), Some("[iterator]"));
}

#[test]
fn has_instance_matches_the_resolved_prototype() {
    let interp = interp();
    let constructor = noop_function(&interp);
    let prototype = JsObject::new(None);
    constructor
        .function_data()
        .unwrap()
        .set_prototype_property(Value::object(prototype.clone()));
    let constructor_value = Value::object(constructor.clone());

    let instance = Value::object(JsObject::new(Some(prototype)));
    assert!(
        constructor
            .has_instance(&interp, &constructor_value, &instance)
            .unwrap()
    );

    let stranger = Value::object(JsObject::new(Some(JsObject::new(None))));
    assert!(
        !constructor
            .has_instance(&interp, &constructor_value, &stranger)
            .unwrap()
    );
    // Primitives are never instances.
    assert!(
        !constructor
            .has_instance(&interp, &constructor_value, &Value::number(1.0))
            .unwrap()
    );
}

#[test]
fn has_instance_rejects_non_object_prototype() {
    let interp = interp();
    let constructor = noop_function(&interp);
    constructor
        .function_data()
        .unwrap()
        .set_prototype_property(Value::number(1.0));
    let constructor_value = Value::object(constructor.clone());

    let candidate = Value::object(JsObject::new(None));
    let err = constructor
        .has_instance(&interp, &constructor_value, &candidate)
        .unwrap_err();
    assert!(matches!(err, VmError::TypeError(_)));
}

#[test]
fn has_instance_terminates_on_cyclic_chains() {
    let interp = interp();
    let constructor = noop_function(&interp);
    constructor
        .function_data()
        .unwrap()
        .set_prototype_property(Value::object(JsObject::new(None)));
    let constructor_value = Value::object(constructor.clone());

    let a = JsObject::new(None);
    let b = JsObject::new(Some(a.clone()));
    a.set_prototype(Some(b.clone()));
    let cyclic = Value::object(JsObject::new(Some(b)));

    let err = constructor
        .has_instance(&interp, &constructor_value, &cyclic)
        .unwrap_err();
    assert!(matches!(err, VmError::InternalError(_)));
}

#[test]
fn own_keys_order_integer_then_insertion_then_symbols() {
    let object = JsObject::new(None);
    object.define_data("b", Value::number(0.0));
    object.define_data(1u32, Value::number(0.0));
    object.define_data("a", Value::number(0.0));

    let keys = object.own_property_keys();
    assert_eq!(
        keys,
        vec![
            PropertyKey::index(1),
            PropertyKey::string("b"),
            PropertyKey::string("a"),
        ]
    );

    let sym = JsSymbol::new(Some("tag"));
    object.define_data(PropertyKey::symbol(sym.clone()), Value::number(0.0));
    object.define_data(0u32, Value::number(0.0));

    let keys = object.own_property_keys();
    assert_eq!(
        keys,
        vec![
            PropertyKey::index(0),
            PropertyKey::index(1),
            PropertyKey::string("b"),
            PropertyKey::string("a"),
            PropertyKey::symbol(sym),
        ]
    );
}

#[test]
fn function_special_slots_enumerate_like_own_properties() {
    let interp = interp();
    let function = noop_function(&interp);
    let keys = function.own_property_keys();
    assert!(keys.contains(&PropertyKey::string("length")));
    assert!(keys.contains(&PropertyKey::string("name")));

    // Deleting `name` works like deleting an ordinary configurable property.
    assert!(function.remove_own_property(&PropertyKey::string("name")));
    assert!(!function.has_own_property(&PropertyKey::string("name")));
}

#[test]
fn define_own_property_enforces_non_configurable_rules() {
    let object = JsObject::new(None);
    object.define_own_property(
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

    // Raising configurable back to true is rejected.
    let mut flip = PropertyDescriptor::data(Value::number(1.0));
    flip.configurable = Some(true);
    assert!(!object.define_own_property(PropertyKey::string("x"), flip));

    // Shape switch on a non-configurable property is rejected.
    assert!(!object.define_own_property(
        PropertyKey::string("x"),
        PropertyDescriptor::accessor(Some(Value::undefined()), None),
    ));

    // Narrowing writable from true to false is allowed once...
    let narrow = PropertyDescriptor {
        writable: Some(false),
        ..Default::default()
    };
    assert!(object.define_own_property(PropertyKey::string("x"), narrow));

    // ...after which changing the value is rejected.
    assert!(!object.define_own_property(
        PropertyKey::string("x"),
        PropertyDescriptor {
            value: Some(Value::number(2.0)),
            ..Default::default()
        },
    ));
    // Restating the same value is fine.
    assert!(object.define_own_property(
        PropertyKey::string("x"),
        PropertyDescriptor {
            value: Some(Value::number(1.0)),
            ..Default::default()
        },
    ));
}

#[test]
fn accessor_properties_run_their_getters_and_setters() {
    let interp = interp();
    let backing = JsObject::new(None);
    backing.define_data("cell", Value::number(0.0));

    let store = backing.clone();
    let getter = interp.create_native_function(
        "get",
        0,
        Arc::new(move |i, _, _| {
            store.get(&PropertyKey::string("cell"), &Value::undefined(), i)
        }),
    );
    let store = backing.clone();
    let setter = interp.create_native_function(
        "set",
        1,
        Arc::new(move |_, _, args| {
            store.define_data("cell", args.first().cloned().unwrap_or_default());
            Ok(Value::undefined())
        }),
    );

    let object = JsObject::new(None);
    object.define_own_property(
        PropertyKey::string("x"),
        PropertyDescriptor::accessor(Some(Value::object(getter)), Some(Value::object(setter))),
    );
    let receiver = Value::object(object.clone());

    object
        .set(
            PropertyKey::string("x"),
            Value::number(7.0),
            &receiver,
            true,
            &interp,
        )
        .unwrap();
    let got = object
        .get(&PropertyKey::string("x"), &receiver, &interp)
        .unwrap();
    assert_eq!(got.as_number(), Some(7.0));
}

#[test]
fn setter_less_accessors_reject_strict_writes_only() {
    let interp = interp();
    let object = JsObject::new(None);
    object.define_own_property(
        PropertyKey::string("x"),
        PropertyDescriptor::accessor(Some(Value::undefined()), None),
    );
    let receiver = Value::object(object.clone());

    object
        .set(
            PropertyKey::string("x"),
            Value::number(1.0),
            &receiver,
            false,
            &interp,
        )
        .unwrap();
    let err = object
        .set(
            PropertyKey::string("x"),
            Value::number(1.0),
            &receiver,
            true,
            &interp,
        )
        .unwrap_err();
    assert!(matches!(err, VmError::TypeError(_)));
}
