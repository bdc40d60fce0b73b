use crate::core::{
    JSObjectDataPtr, NativeFunction, ObjectClass, Property, PropertyKey, Value, call, create_data_property_or_throw, get_v,
    new_object_with_proto, object_get,
};
use crate::error::JSError;
use std::cell::RefCell;
use std::rc::Rc;

/// An independent set of intrinsics plus a global object.
///
/// Nothing is shared between realms, so mutating `%Array.prototype%` in one
/// realm is invisible to every other realm.
pub struct Realm {
    global: JSObjectDataPtr,
    object_prototype: JSObjectDataPtr,
    function_prototype: JSObjectDataPtr,
    array_prototype: JSObjectDataPtr,
    // Arrays whose `join` is currently running, innermost last.
    join_stack: RefCell<Vec<JSObjectDataPtr>>,
}

impl Realm {
    pub fn new() -> Result<Self, JSError> {
        let object_prototype = new_object_with_proto(None, ObjectClass::Ordinary);
        let function_prototype = new_object_with_proto(Some(&object_prototype), ObjectClass::Function);
        // %Array.prototype% is itself an array exotic object
        let array_prototype = new_object_with_proto(Some(&object_prototype), ObjectClass::Array);
        array_prototype.borrow_mut().properties.insert(
            "length".into(),
            Property::Data {
                value: Value::Number(0.0),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
        let global = new_object_with_proto(Some(&object_prototype), ObjectClass::Ordinary);

        let realm = Realm {
            global,
            object_prototype,
            function_prototype,
            array_prototype,
            join_stack: RefCell::new(Vec::new()),
        };
        // Function.prototype is callable and returns undefined
        realm.function_prototype.borrow_mut().callable = Some(NativeFunction {
            name: String::new(),
            func: Rc::new(|_realm: &Realm, _this: &Value, _args: &[Value]| -> Result<Value, JSError> { Ok(Value::Undefined) }),
        });

        crate::js_object::initialize_object_module(&realm)?;
        crate::js_array::initialize_array_module(&realm)?;
        crate::js_json::initialize_json(&realm)?;
        log::debug!("Realm::new: intrinsics installed");
        Ok(realm)
    }

    pub fn global(&self) -> &JSObjectDataPtr {
        &self.global
    }

    pub fn object_prototype(&self) -> &JSObjectDataPtr {
        &self.object_prototype
    }

    pub fn function_prototype(&self) -> &JSObjectDataPtr {
        &self.function_prototype
    }

    pub fn array_prototype(&self) -> &JSObjectDataPtr {
        &self.array_prototype
    }

    pub(crate) fn join_stack(&self) -> &RefCell<Vec<JSObjectDataPtr>> {
        &self.join_stack
    }

    /// A fresh ordinary object inheriting from `%Object.prototype%`.
    pub fn new_object(&self) -> JSObjectDataPtr {
        new_object_with_proto(Some(&self.object_prototype), ObjectClass::Ordinary)
    }

    /// ArrayCreate(0)
    pub fn new_array(&self) -> JSObjectDataPtr {
        let arr = new_object_with_proto(Some(&self.array_prototype), ObjectClass::Array);
        arr.borrow_mut().properties.insert(
            "length".into(),
            Property::Data {
                value: Value::Number(0.0),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
        arr
    }

    /// CreateArrayFromList
    pub fn array_from_values(&self, values: &[Value]) -> Result<JSObjectDataPtr, JSError> {
        let arr = self.new_array();
        for (i, value) in values.iter().enumerate() {
            create_data_property_or_throw(self, &arr, i, value.clone())?;
        }
        Ok(arr)
    }

    /// Wrap a Rust closure as a function object with `name` and `length`.
    pub fn new_function<F>(&self, name: &str, length: u32, func: F) -> Value
    where
        F: Fn(&Realm, &Value, &[Value]) -> Result<Value, JSError> + 'static,
    {
        let obj = new_object_with_proto(Some(&self.function_prototype), ObjectClass::Function);
        {
            let mut b = obj.borrow_mut();
            b.callable = Some(NativeFunction {
                name: name.to_string(),
                func: Rc::new(func),
            });
            for (key, value) in [("length", Value::Number(length as f64)), ("name", Value::from(name))] {
                b.properties.insert(
                    key.into(),
                    Property::Data {
                        value,
                        writable: false,
                        enumerable: false,
                        configurable: true,
                    },
                );
            }
        }
        Value::Object(obj)
    }

    /// Install a builtin method: writable, configurable, not enumerable.
    pub(crate) fn define_builtin<F>(&self, target: &JSObjectDataPtr, name: &str, length: u32, func: F)
    where
        F: Fn(&Realm, &Value, &[Value]) -> Result<Value, JSError> + 'static,
    {
        let method = self.new_function(name, length, func);
        self.define_hidden(target, name, method);
    }

    pub(crate) fn define_hidden(&self, target: &JSObjectDataPtr, name: &str, value: Value) {
        target.borrow_mut().properties.insert(
            PropertyKey::from(name),
            Property::Data {
                value,
                writable: true,
                enumerable: false,
                configurable: true,
            },
        );
    }

    pub fn global_get(&self, name: &str) -> Result<Value, JSError> {
        object_get(self, &self.global, name)
    }

    /// `this_value[method](...args)`
    pub fn invoke(&self, this_value: &Value, method: &str, args: &[Value]) -> Result<Value, JSError> {
        let func = get_v(self, this_value, method)?;
        call(self, &func, this_value, args)
    }
}

impl Drop for Realm {
    // Constructors and prototypes reference each other; clearing the
    // intrinsic tables breaks those Rc cycles.
    fn drop(&mut self) {
        for obj in [&self.global, &self.object_prototype, &self.function_prototype, &self.array_prototype] {
            if let Ok(mut b) = obj.try_borrow_mut() {
                b.properties.clear();
                b.callable = None;
            }
        }
    }
}
