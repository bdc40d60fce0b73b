use crate::core::{
    JSObjectDataPtr, PropertyKey, Realm, Value, array_length, call, create_data_property_or_throw, has_property, is_callable,
    object_get, to_length_value, to_object, to_string,
};
use crate::error::JSError;
use crate::{raise_range_error, raise_type_error};
use std::rc::Rc;

pub fn initialize_array_module(realm: &Realm) -> Result<(), JSError> {
    let array_ctor = realm.new_function("Array", 1, |realm, _this, args| array_construct(realm, args));
    let Value::Object(ctor) = &array_ctor else {
        return Err(raise_type_error!("Array constructor is not an object"));
    };

    let array_proto = realm.array_prototype();
    realm.define_hidden(ctor, "prototype", Value::Object(array_proto.clone()));
    realm.define_hidden(array_proto, "constructor", array_ctor.clone());

    realm.define_builtin(ctor, "isArray", 1, |_realm, _this, args| {
        Ok(Value::Boolean(args.first().is_some_and(is_array)))
    });

    for (method, length) in [("map", 1), ("join", 1), ("toString", 0)] {
        realm.define_builtin(array_proto, method, length, move |realm, this, args| {
            handle_array_method(realm, method, this, args)
        });
    }

    realm.define_hidden(realm.global(), "Array", array_ctor);
    Ok(())
}

pub fn is_array(val: &Value) -> bool {
    match val {
        Value::Object(obj) => obj.borrow().is_array(),
        _ => false,
    }
}

pub fn get_array_length(obj: &JSObjectDataPtr) -> Option<u32> {
    if obj.borrow().is_array() { Some(array_length(obj)) } else { None }
}

/// `Array(len)` or `Array(...items)`
fn array_construct(realm: &Realm, args: &[Value]) -> Result<Value, JSError> {
    if let [Value::Number(len)] = args {
        if *len < 0.0 || len.fract() != 0.0 || *len > u32::MAX as f64 {
            return Err(raise_range_error!("Invalid array length"));
        }
        let arr = realm.new_array();
        crate::core::object_set(realm, &arr, "length", Value::Number(*len))?;
        return Ok(Value::Object(arr));
    }
    Ok(Value::Object(realm.array_from_values(args)?))
}

pub fn handle_array_method(realm: &Realm, method: &str, this: &Value, args: &[Value]) -> Result<Value, JSError> {
    match method {
        "map" => {
            let callback = args.first().cloned().unwrap_or(Value::Undefined);
            let this_arg = args.get(1).cloned().unwrap_or(Value::Undefined);
            array_map(realm, this, &callback, &this_arg)
        }
        "join" | "toString" => {
            let separator = match args.first() {
                Some(sep) if method == "join" && !sep.is_undefined() => to_string(realm, sep)?,
                _ => vec![b',' as u16],
            };
            array_join(realm, this, &separator)
        }
        _ => Err(raise_type_error!(format!("Array.prototype.{method} is not implemented"))),
    }
}

/// Array.prototype.map
///
/// Each element is read with [[HasProperty]] / [[Get]] on the source, so
/// an own element always wins over an inherited accessor at the same index.
/// Results are stored with CreateDataPropertyOrThrow: an inherited setter on
/// `%Array.prototype%` is never consulted while filling the new array.
pub fn array_map(realm: &Realm, this: &Value, callback: &Value, this_arg: &Value) -> Result<Value, JSError> {
    let obj = to_object(realm, this)?;
    let len = to_length_value(realm, &object_get(realm, &obj, "length")?)?;
    if !is_callable(callback) {
        return Err(raise_type_error!(format!("{callback} is not a function")));
    }
    if len > u32::MAX as u64 {
        return Err(raise_range_error!("Invalid array length"));
    }

    let result = realm.new_array();
    crate::core::object_set(realm, &result, "length", Value::Number(len as f64))?;

    let source = Value::Object(obj.clone());
    for k in 0..len {
        let key = PropertyKey::from(k.to_string());
        if !has_property(&obj, &key) {
            continue;
        }
        let k_value = object_get(realm, &obj, key.clone())?;
        let mapped = call(realm, callback, this_arg, &[k_value, Value::Number(k as f64), source.clone()])?;
        create_data_property_or_throw(realm, &result, key, mapped)?;
    }
    log::debug!("array_map: mapped {len} slots");
    Ok(Value::Object(result))
}

/// Array.prototype.join. An array reached again while its own join is
/// still running contributes the empty string.
fn array_join(realm: &Realm, this: &Value, separator: &[u16]) -> Result<Value, JSError> {
    let obj = to_object(realm, this)?;
    if realm.join_stack().borrow().iter().any(|seen| Rc::ptr_eq(seen, &obj)) {
        log::debug!("array_join: cycle detected, joining as empty");
        return Ok(Value::String(Vec::new()));
    }
    realm.join_stack().borrow_mut().push(obj.clone());
    let joined = join_elements(realm, &obj, separator);
    realm.join_stack().borrow_mut().pop();
    joined
}

fn join_elements(realm: &Realm, obj: &JSObjectDataPtr, separator: &[u16]) -> Result<Value, JSError> {
    let len = to_length_value(realm, &object_get(realm, obj, "length")?)?;
    let mut out: Vec<u16> = Vec::new();
    for k in 0..len {
        if k > 0 {
            out.extend_from_slice(separator);
        }
        let element = object_get(realm, obj, k.to_string())?;
        if !matches!(element, Value::Undefined | Value::Null) {
            out.extend(to_string(realm, &element)?);
        }
    }
    Ok(Value::String(out))
}
