use crate::core::number::{number_to_string, string_to_number, to_length, to_uint32};
use crate::core::{PropertyDescriptor, PropertyKey, Realm};
use crate::unicode::{utf8_to_utf16, utf16_to_display, utf16_to_utf8};
use crate::{JSError, raise_range_error, raise_type_error};
use std::cell::RefCell;
use std::rc::Rc;

pub type JSObjectDataPtr = Rc<RefCell<JSObjectData>>;

/// Signature of every native function: `(realm, this, arguments)`.
pub type NativeFn = Rc<dyn Fn(&Realm, &Value, &[Value]) -> Result<Value, JSError>>;

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(Vec<u16>),
    Object(JSObjectDataPtr),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_object(&self) -> Option<&JSObjectDataPtr> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn to_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => !(n.is_nan() || *n == 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(utf8_to_utf16(s))
    }
}

impl From<JSObjectDataPtr> for Value {
    fn from(obj: JSObjectDataPtr) -> Self {
        Value::Object(obj)
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{:?}", utf16_to_display(s)),
            Value::Object(obj) => write!(f, "{} {:p}", obj.borrow().class.tag(), Rc::as_ptr(obj)),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", utf16_to_display(s)),
            Value::Object(obj) => {
                let obj = obj.borrow();
                match &obj.callable {
                    Some(native) => write!(f, "function {}() {{ [native code] }}", native.name),
                    None => write!(f, "[object {}]", obj.class.tag()),
                }
            }
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectClass {
    Ordinary,
    Array,
    Function,
    Error,
}

impl ObjectClass {
    /// The builtin tag reported by `Object.prototype.toString`.
    pub fn tag(&self) -> &'static str {
        match self {
            ObjectClass::Ordinary => "Object",
            ObjectClass::Array => "Array",
            ObjectClass::Function => "Function",
            ObjectClass::Error => "Error",
        }
    }
}

#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub func: NativeFn,
}

/// An own property slot.
#[derive(Clone, Debug)]
pub enum Property {
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<Value>,
        set: Option<Value>,
        enumerable: bool,
        configurable: bool,
    },
}

impl Property {
    pub fn data(value: Value) -> Self {
        Property::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    pub fn enumerable(&self) -> bool {
        match self {
            Property::Data { enumerable, .. } | Property::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn configurable(&self) -> bool {
        match self {
            Property::Data { configurable, .. } | Property::Accessor { configurable, .. } => *configurable,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self, Property::Accessor { .. })
    }
}

#[derive(Clone)]
pub struct JSObjectData {
    pub properties: indexmap::IndexMap<PropertyKey, Property>,
    pub prototype: Option<JSObjectDataPtr>,
    // Whether new own properties can be added to this object. Default true.
    pub extensible: bool,
    pub class: ObjectClass,
    /// Native behavior for function objects
    pub callable: Option<NativeFunction>,
}

impl Default for JSObjectData {
    fn default() -> Self {
        JSObjectData::new()
    }
}

impl JSObjectData {
    pub fn new() -> Self {
        JSObjectData {
            properties: indexmap::IndexMap::new(),
            prototype: None,
            extensible: true,
            class: ObjectClass::Ordinary,
            callable: None,
        }
    }

    pub fn contains_key(&self, key: &PropertyKey) -> bool {
        self.properties.contains_key(key)
    }

    pub fn is_array(&self) -> bool {
        self.class == ObjectClass::Array
    }
}

#[inline]
pub fn new_js_object_data() -> JSObjectDataPtr {
    Rc::new(RefCell::new(JSObjectData::new()))
}

pub fn new_object_with_proto(proto: Option<&JSObjectDataPtr>, class: ObjectClass) -> JSObjectDataPtr {
    let obj = new_js_object_data();
    {
        let mut b = obj.borrow_mut();
        b.prototype = proto.cloned();
        b.class = class;
    }
    obj
}

pub fn get_own_property(obj: &JSObjectDataPtr, key: &PropertyKey) -> Option<Property> {
    obj.borrow().properties.get(key).cloned()
}

pub fn get_prototype_of(obj: &JSObjectDataPtr) -> Option<JSObjectDataPtr> {
    obj.borrow().prototype.clone()
}

pub fn is_callable(val: &Value) -> bool {
    match val {
        Value::Object(obj) => obj.borrow().callable.is_some(),
        _ => false,
    }
}

/// Call(F, V, argumentsList)
pub fn call(realm: &Realm, func: &Value, this: &Value, args: &[Value]) -> Result<Value, JSError> {
    // Clone the callable out so no borrow is held while native code runs.
    let native = match func {
        Value::Object(obj) => obj.borrow().callable.clone(),
        _ => None,
    };
    match native {
        Some(native) => (native.func)(realm, this, args),
        None => Err(raise_type_error!(format!("{func} is not a function"))),
    }
}

/// [[HasProperty]]: own or inherited.
pub fn has_property(obj: &JSObjectDataPtr, key: &PropertyKey) -> bool {
    let mut current = Some(obj.clone());
    while let Some(cur) = current {
        if cur.borrow().contains_key(key) {
            return true;
        }
        current = get_prototype_of(&cur);
    }
    false
}

/// [[Get]] with an explicit receiver, which getters observe as `this`.
pub fn object_get_with_receiver(realm: &Realm, obj: &JSObjectDataPtr, key: &PropertyKey, receiver: &Value) -> Result<Value, JSError> {
    let mut current = Some(obj.clone());
    while let Some(cur) = current {
        if let Some(prop) = get_own_property(&cur, key) {
            return match prop {
                Property::Data { value, .. } => Ok(value),
                Property::Accessor { get: Some(getter), .. } => call(realm, &getter, receiver, &[]),
                Property::Accessor { get: None, .. } => Ok(Value::Undefined),
            };
        }
        current = get_prototype_of(&cur);
    }
    Ok(Value::Undefined)
}

pub fn object_get(realm: &Realm, obj: &JSObjectDataPtr, key: impl Into<PropertyKey>) -> Result<Value, JSError> {
    object_get_with_receiver(realm, obj, &key.into(), &Value::Object(obj.clone()))
}

/// GetV: property lookup on any value, boxing primitives first.
pub fn get_v(realm: &Realm, val: &Value, key: impl Into<PropertyKey>) -> Result<Value, JSError> {
    let obj = to_object(realm, val)?;
    object_get_with_receiver(realm, &obj, &key.into(), val)
}

/// OrdinarySet. Returns `Ok(false)` when the assignment is rejected.
pub fn object_set_with_receiver(
    realm: &Realm,
    obj: &JSObjectDataPtr,
    key: &PropertyKey,
    value: Value,
    receiver: &Value,
) -> Result<bool, JSError> {
    let mut found = None;
    let mut current = Some(obj.clone());
    while let Some(cur) = current {
        if let Some(prop) = get_own_property(&cur, key) {
            found = Some(prop);
            break;
        }
        current = get_prototype_of(&cur);
    }

    match found {
        Some(Property::Accessor { set, .. }) => match set {
            Some(setter) => {
                log::debug!("object_set: invoking setter for key={key}");
                call(realm, &setter, receiver, &[value])?;
                Ok(true)
            }
            None => Ok(false),
        },
        Some(Property::Data { writable: false, .. }) => Ok(false),
        Some(Property::Data { .. }) | None => {
            let Value::Object(receiver) = receiver else {
                return Ok(false);
            };
            match get_own_property(receiver, key) {
                Some(Property::Accessor { .. }) => Ok(false),
                Some(Property::Data { writable: false, .. }) => Ok(false),
                Some(Property::Data { .. }) => {
                    let desc = PropertyDescriptor {
                        value: Some(value),
                        ..PropertyDescriptor::default()
                    };
                    define_own_property(realm, receiver, key, &desc)
                }
                None => create_data_property(realm, receiver, key, value),
            }
        }
    }
}

/// Strict-mode assignment `obj[key] = value`: a rejected write throws.
pub fn object_set(realm: &Realm, obj: &JSObjectDataPtr, key: impl Into<PropertyKey>, value: Value) -> Result<(), JSError> {
    let key = key.into();
    if !object_set_with_receiver(realm, obj, &key, value, &Value::Object(obj.clone()))? {
        return Err(raise_type_error!(format!("Cannot assign to read only property '{key}'")));
    }
    Ok(())
}

fn same_optional_value(a: &Option<Value>, b: &Option<Value>) -> bool {
    same_value(a.as_ref().unwrap_or(&Value::Undefined), b.as_ref().unwrap_or(&Value::Undefined))
}

/// ValidateAndApplyPropertyDescriptor for ordinary objects.
fn ordinary_define_own_property(obj: &JSObjectDataPtr, key: &PropertyKey, desc: &PropertyDescriptor) -> bool {
    let current = get_own_property(obj, key);
    let mut b = obj.borrow_mut();

    let Some(current) = current else {
        if !b.extensible {
            return false;
        }
        let prop = if desc.is_accessor_descriptor() {
            Property::Accessor {
                get: desc.get.clone().filter(|g| !g.is_undefined()),
                set: desc.set.clone().filter(|s| !s.is_undefined()),
                enumerable: desc.enumerable.unwrap_or(false),
                configurable: desc.configurable.unwrap_or(false),
            }
        } else {
            Property::Data {
                value: desc.value.clone().unwrap_or(Value::Undefined),
                writable: desc.writable.unwrap_or(false),
                enumerable: desc.enumerable.unwrap_or(false),
                configurable: desc.configurable.unwrap_or(false),
            }
        };
        b.properties.insert(key.clone(), prop);
        return true;
    };

    if !current.configurable() {
        if desc.configurable == Some(true) {
            return false;
        }
        if let Some(enumerable) = desc.enumerable
            && enumerable != current.enumerable()
        {
            return false;
        }
        if !desc.is_generic_descriptor() && desc.is_accessor_descriptor() != current.is_accessor() {
            return false;
        }
        match &current {
            Property::Accessor { get, set, .. } => {
                if desc.get.is_some() && !same_optional_value(&desc.get, get) {
                    return false;
                }
                if desc.set.is_some() && !same_optional_value(&desc.set, set) {
                    return false;
                }
            }
            Property::Data { value, writable: false, .. } => {
                if desc.writable == Some(true) {
                    return false;
                }
                if let Some(new_value) = &desc.value
                    && !same_value(new_value, value)
                {
                    return false;
                }
            }
            Property::Data { .. } => {}
        }
    }

    let enumerable = desc.enumerable.unwrap_or(current.enumerable());
    let configurable = desc.configurable.unwrap_or(current.configurable());
    let updated = match current {
        Property::Data { value, writable, .. } if !desc.is_accessor_descriptor() => Property::Data {
            value: desc.value.clone().unwrap_or(value),
            writable: desc.writable.unwrap_or(writable),
            enumerable,
            configurable,
        },
        Property::Data { .. } => Property::Accessor {
            get: desc.get.clone().filter(|g| !g.is_undefined()),
            set: desc.set.clone().filter(|s| !s.is_undefined()),
            enumerable,
            configurable,
        },
        Property::Accessor { get, set, .. } if !desc.is_data_descriptor() => Property::Accessor {
            get: match &desc.get {
                Some(g) => Some(g.clone()).filter(|g| !g.is_undefined()),
                None => get,
            },
            set: match &desc.set {
                Some(s) => Some(s.clone()).filter(|s| !s.is_undefined()),
                None => set,
            },
            enumerable,
            configurable,
        },
        Property::Accessor { .. } => Property::Data {
            value: desc.value.clone().unwrap_or(Value::Undefined),
            writable: desc.writable.unwrap_or(false),
            enumerable,
            configurable,
        },
    };
    b.properties.insert(key.clone(), updated);
    true
}

pub(crate) fn array_length(obj: &JSObjectDataPtr) -> u32 {
    match get_own_property(obj, &"length".into()) {
        Some(Property::Data {
            value: Value::Number(n), ..
        }) => n as u32,
        _ => 0,
    }
}

fn array_length_writable(obj: &JSObjectDataPtr) -> bool {
    matches!(get_own_property(obj, &"length".into()), Some(Property::Data { writable: true, .. }))
}

fn set_array_length_slot(obj: &JSObjectDataPtr, len: u32) {
    if let Some(Property::Data { value, .. }) = obj.borrow_mut().properties.get_mut(&PropertyKey::from("length")) {
        *value = Value::Number(len as f64);
    }
}

/// ArraySetLength: shrinking deletes trailing indices, stopping at the
/// first non-configurable one.
fn array_set_length(realm: &Realm, obj: &JSObjectDataPtr, desc: &PropertyDescriptor) -> Result<bool, JSError> {
    let Some(len_value) = &desc.value else {
        return Ok(ordinary_define_own_property(obj, &"length".into(), desc));
    };
    let number = to_number(realm, len_value)?;
    let new_len = to_uint32(number);
    if new_len as f64 != number {
        return Err(raise_range_error!("Invalid array length"));
    }

    let old_len = array_length(obj);
    let mut new_desc = desc.clone();
    new_desc.value = Some(Value::Number(new_len as f64));
    if new_len >= old_len {
        return Ok(ordinary_define_own_property(obj, &"length".into(), &new_desc));
    }
    if !array_length_writable(obj) {
        return Ok(false);
    }

    // Defer a requested writable:false until the deletions are done.
    let make_read_only = new_desc.writable == Some(false);
    new_desc.writable = Some(true);
    if !ordinary_define_own_property(obj, &"length".into(), &new_desc) {
        return Ok(false);
    }

    let mut doomed: Vec<u32> = obj
        .borrow()
        .properties
        .keys()
        .filter_map(|k| k.as_array_index())
        .filter(|&i| i >= new_len)
        .collect();
    doomed.sort_unstable_by(|a, b| b.cmp(a));
    for index in doomed {
        if !delete_property(obj, &index.into()) {
            set_array_length_slot(obj, index + 1);
            if make_read_only {
                ordinary_define_own_property(obj, &"length".into(), &PropertyDescriptor::with_writable(false));
            }
            return Ok(false);
        }
    }
    log::debug!("array_set_length: truncated from {old_len} to {new_len}");
    if make_read_only {
        ordinary_define_own_property(obj, &"length".into(), &PropertyDescriptor::with_writable(false));
    }
    Ok(true)
}

/// [[DefineOwnProperty]], including the array exotic rules for `length`
/// and index keys.
pub fn define_own_property(realm: &Realm, obj: &JSObjectDataPtr, key: &PropertyKey, desc: &PropertyDescriptor) -> Result<bool, JSError> {
    if !obj.borrow().is_array() {
        return Ok(ordinary_define_own_property(obj, key, desc));
    }
    if key.as_str() == Some("length") {
        return array_set_length(realm, obj, desc);
    }
    if let Some(index) = key.as_array_index() {
        let old_len = array_length(obj);
        if index >= old_len && !array_length_writable(obj) {
            return Ok(false);
        }
        if !ordinary_define_own_property(obj, key, desc) {
            return Ok(false);
        }
        if index >= old_len {
            log::debug!("define_own_property: array length grows to {}", index + 1);
            set_array_length_slot(obj, index + 1);
        }
        return Ok(true);
    }
    Ok(ordinary_define_own_property(obj, key, desc))
}

pub fn define_property_or_throw(realm: &Realm, obj: &JSObjectDataPtr, key: &PropertyKey, desc: &PropertyDescriptor) -> Result<(), JSError> {
    if !define_own_property(realm, obj, key, desc)? {
        return Err(raise_type_error!(format!("Cannot redefine property: {key}")));
    }
    Ok(())
}

pub fn create_data_property(realm: &Realm, obj: &JSObjectDataPtr, key: &PropertyKey, value: Value) -> Result<bool, JSError> {
    define_own_property(realm, obj, key, &PropertyDescriptor::new_data(value, true, true, true))
}

/// CreateDataPropertyOrThrow: defines an own property, never consulting
/// setters anywhere on the prototype chain.
pub fn create_data_property_or_throw(realm: &Realm, obj: &JSObjectDataPtr, key: impl Into<PropertyKey>, value: Value) -> Result<(), JSError> {
    let key = key.into();
    if !create_data_property(realm, obj, &key, value)? {
        return Err(raise_type_error!(format!("Cannot define property {key}, object is not extensible")));
    }
    Ok(())
}

/// [[Delete]]. Returns false for non-configurable properties.
pub fn delete_property(obj: &JSObjectDataPtr, key: &PropertyKey) -> bool {
    let mut b = obj.borrow_mut();
    match b.properties.get(key) {
        None => true,
        Some(prop) if !prop.configurable() => false,
        Some(_) => {
            b.properties.shift_remove(key);
            true
        }
    }
}

/// [[OwnPropertyKeys]]: array indices ascending, then string keys in
/// insertion order.
pub fn own_property_keys(obj: &JSObjectDataPtr) -> Vec<PropertyKey> {
    let mut indices: Vec<(u32, PropertyKey)> = Vec::new();
    let mut string_keys: Vec<PropertyKey> = Vec::new();
    for k in obj.borrow().properties.keys() {
        match k.as_array_index() {
            Some(index) => indices.push((index, k.clone())),
            None => string_keys.push(k.clone()),
        }
    }
    indices.sort_by_key(|(index, _)| *index);
    let mut out: Vec<PropertyKey> = indices.into_iter().map(|(_, k)| k).collect();
    out.extend(string_keys);
    out
}

/// Keys visited by `for (key in obj)`: enumerable string keys of the object
/// and its prototypes, each reported once. A shadowing own key hides an
/// inherited one even when the own key is not enumerable.
pub fn for_in_keys(obj: &JSObjectDataPtr) -> Vec<PropertyKey> {
    let mut visited: std::collections::HashSet<PropertyKey> = std::collections::HashSet::new();
    let mut out = Vec::new();
    let mut current = Some(obj.clone());
    while let Some(cur) = current {
        for key in own_property_keys(&cur) {
            if !visited.insert(key.clone()) {
                continue;
            }
            if let Some(prop) = get_own_property(&cur, &key)
                && prop.enumerable()
            {
                out.push(key);
            }
        }
        current = get_prototype_of(&cur);
    }
    out
}

/// SameValue
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_nan() && y.is_nan() {
                return true;
            }
            x == y && x.is_sign_negative() == y.is_sign_negative()
        }
        _ => is_strictly_equal(a, b),
    }
}

/// IsStrictlyEqual (`===`)
pub fn is_strictly_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// OrdinaryToPrimitive, trying `valueOf` then `toString` for a number hint
/// and the reverse for a string hint.
fn to_primitive(realm: &Realm, obj: &JSObjectDataPtr, prefer_string: bool) -> Result<Value, JSError> {
    let order = if prefer_string { ["toString", "valueOf"] } else { ["valueOf", "toString"] };
    for name in order {
        let method = object_get(realm, obj, name)?;
        if is_callable(&method) {
            let result = call(realm, &method, &Value::Object(obj.clone()), &[])?;
            if !matches!(result, Value::Object(_)) {
                return Ok(result);
            }
        }
    }
    Err(raise_type_error!("Cannot convert object to primitive value"))
}

pub fn to_number(realm: &Realm, val: &Value) -> Result<f64, JSError> {
    match val {
        Value::Undefined => Ok(f64::NAN),
        Value::Null => Ok(0.0),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => Ok(*n),
        Value::String(s) => Ok(string_to_number(&utf16_to_utf8(s))),
        Value::Object(obj) => {
            let prim = to_primitive(realm, obj, false)?;
            to_number(realm, &prim)
        }
    }
}

pub fn to_string(realm: &Realm, val: &Value) -> Result<Vec<u16>, JSError> {
    match val {
        Value::Undefined => Ok(utf8_to_utf16("undefined")),
        Value::Null => Ok(utf8_to_utf16("null")),
        Value::Boolean(b) => Ok(utf8_to_utf16(if *b { "true" } else { "false" })),
        Value::Number(n) => Ok(utf8_to_utf16(&number_to_string(*n))),
        Value::String(s) => Ok(s.clone()),
        Value::Object(obj) => {
            let prim = to_primitive(realm, obj, true)?;
            to_string(realm, &prim)
        }
    }
}

pub fn to_property_key(realm: &Realm, val: &Value) -> Result<PropertyKey, JSError> {
    Ok(PropertyKey::from_utf16(&to_string(realm, val)?))
}

pub fn to_length_value(realm: &Realm, val: &Value) -> Result<u64, JSError> {
    Ok(to_length(to_number(realm, val)?))
}

/// ToObject. Strings box into an object exposing read-only indices and
/// `length`; other primitives box into a plain object.
pub fn to_object(realm: &Realm, val: &Value) -> Result<JSObjectDataPtr, JSError> {
    match val {
        Value::Undefined | Value::Null => Err(raise_type_error!(format!("Cannot convert {val} to object"))),
        Value::Object(obj) => Ok(obj.clone()),
        Value::String(s) => {
            let obj = realm.new_object();
            {
                let mut b = obj.borrow_mut();
                for (i, unit) in s.iter().enumerate() {
                    b.properties.insert(
                        i.into(),
                        Property::Data {
                            value: Value::String(vec![*unit]),
                            writable: false,
                            enumerable: true,
                            configurable: false,
                        },
                    );
                }
                b.properties.insert(
                    "length".into(),
                    Property::Data {
                        value: Value::Number(s.len() as f64),
                        writable: false,
                        enumerable: false,
                        configurable: false,
                    },
                );
            }
            Ok(obj)
        }
        Value::Boolean(_) | Value::Number(_) => Ok(realm.new_object()),
    }
}
