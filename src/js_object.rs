use crate::core::{
    JSObjectDataPtr, PropertyDescriptor, Realm, Value, define_property_or_throw, get_own_property, get_prototype_of, own_property_keys,
    to_object, to_property_key,
};
use crate::error::JSError;
use crate::{raise_type_error, unicode::utf8_to_utf16};

pub fn initialize_object_module(realm: &Realm) -> Result<(), JSError> {
    // 1. Create Object constructor
    let object_ctor = realm.new_function("Object", 1, |realm, _this, args| match args.first() {
        None | Some(Value::Undefined) | Some(Value::Null) => Ok(Value::Object(realm.new_object())),
        Some(v) => Ok(Value::Object(to_object(realm, v)?)),
    });
    let Value::Object(ctor) = &object_ctor else {
        return Err(raise_type_error!("Object constructor is not an object"));
    };

    // 2. Link prototype and constructor; neither link is enumerable
    let object_proto = realm.object_prototype();
    realm.define_hidden(ctor, "prototype", Value::Object(object_proto.clone()));
    realm.define_hidden(object_proto, "constructor", object_ctor.clone());

    // 3. Register static methods
    let static_methods = [("defineProperty", 3), ("getOwnPropertyDescriptor", 2), ("getPrototypeOf", 1), ("keys", 1)];
    for (method, length) in static_methods {
        realm.define_builtin(ctor, method, length, move |realm, _this, args| {
            handle_object_method(realm, method, args)
        });
    }

    // 4. Register prototype methods
    let proto_methods = [("hasOwnProperty", 1), ("toString", 0), ("valueOf", 0)];
    for (method, length) in proto_methods {
        realm.define_builtin(object_proto, method, length, move |realm, this, args| {
            handle_object_prototype_method(realm, method, this, args)
        });
    }

    realm.define_hidden(realm.global(), "Object", object_ctor);
    Ok(())
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

pub fn handle_object_method(realm: &Realm, method: &str, args: &[Value]) -> Result<Value, JSError> {
    match method {
        "defineProperty" => object_define_property(realm, &arg(args, 0), &arg(args, 1), &arg(args, 2)),
        "getOwnPropertyDescriptor" => object_get_own_property_descriptor(realm, &arg(args, 0), &arg(args, 1)),
        "getPrototypeOf" => {
            let obj = to_object(realm, &arg(args, 0))?;
            Ok(get_prototype_of(&obj).map(Value::Object).unwrap_or(Value::Null))
        }
        "keys" => {
            let obj = to_object(realm, &arg(args, 0))?;
            let keys: Vec<Value> = own_property_keys(&obj)
                .into_iter()
                .filter(|k| get_own_property(&obj, k).is_some_and(|p| p.enumerable()))
                .map(|k| Value::String(k.to_utf16()))
                .collect();
            Ok(Value::Object(realm.array_from_values(&keys)?))
        }
        _ => Err(raise_type_error!(format!("Object.{method} is not implemented"))),
    }
}

fn handle_object_prototype_method(realm: &Realm, method: &str, this: &Value, args: &[Value]) -> Result<Value, JSError> {
    match method {
        "hasOwnProperty" => {
            let key = to_property_key(realm, &arg(args, 0))?;
            let obj = to_object(realm, this)?;
            Ok(Value::Boolean(get_own_property(&obj, &key).is_some()))
        }
        "toString" => {
            let tag = match this {
                Value::Undefined => "Undefined",
                Value::Null => "Null",
                other => {
                    let obj = to_object(realm, other)?;
                    let class = obj.borrow().class;
                    class.tag()
                }
            };
            Ok(Value::String(utf8_to_utf16(&format!("[object {tag}]"))))
        }
        "valueOf" => Ok(Value::Object(to_object(realm, this)?)),
        _ => Err(raise_type_error!(format!("Object.prototype.{method} is not implemented"))),
    }
}

/// Object.defineProperty(O, P, Attributes)
pub fn object_define_property(realm: &Realm, target: &Value, key: &Value, attributes: &Value) -> Result<Value, JSError> {
    let Value::Object(obj) = target else {
        return Err(raise_type_error!("Object.defineProperty called on non-object"));
    };
    let key = to_property_key(realm, key)?;
    let desc = PropertyDescriptor::from_object(realm, attributes)?;
    log::debug!(
        "Object.defineProperty: key={key} accessor={} enumerable={:?}",
        desc.is_accessor_descriptor(),
        desc.enumerable
    );
    define_property_or_throw(realm, obj, &key, &desc)?;
    Ok(target.clone())
}

/// Object.getOwnPropertyDescriptor(O, P)
pub fn object_get_own_property_descriptor(realm: &Realm, target: &Value, key: &Value) -> Result<Value, JSError> {
    let obj: JSObjectDataPtr = to_object(realm, target)?;
    let key = to_property_key(realm, key)?;
    match get_own_property(&obj, &key) {
        Some(prop) => PropertyDescriptor::from_property(&prop).to_object(realm),
        None => Ok(Value::Undefined),
    }
}
