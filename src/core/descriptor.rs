use crate::core::{Property, PropertyKey, Realm, Value, create_data_property_or_throw, has_property, is_callable, object_get};
use crate::{JSError, raise_type_error};

/// A Rust representation of a property descriptor used by the engine.
/// Supports both data descriptors (`value` + `writable`) and accessor descriptors (`get`/`set`).
/// Fields are optional to support "partial" descriptors (as accepted by DefineProperty).
#[derive(Clone, Debug, Default)]
pub struct PropertyDescriptor {
    // Data fields
    pub value: Option<Value>,
    pub writable: Option<bool>,
    // Accessor fields; `Some(Value::Undefined)` means explicitly undefined
    pub get: Option<Value>,
    pub set: Option<Value>,
    // Common flags
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// Construct a full data descriptor from explicit values
    pub fn new_data(value: Value, writable: bool, enumerable: bool, configurable: bool) -> Self {
        PropertyDescriptor {
            value: Some(value),
            writable: Some(writable),
            get: None,
            set: None,
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    /// Construct an accessor descriptor
    pub fn new_accessor(get: Option<Value>, set: Option<Value>, enumerable: bool, configurable: bool) -> Self {
        PropertyDescriptor {
            value: None,
            writable: None,
            get: Some(get.unwrap_or(Value::Undefined)),
            set: Some(set.unwrap_or(Value::Undefined)),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    pub(crate) fn with_writable(writable: bool) -> Self {
        PropertyDescriptor {
            writable: Some(writable),
            ..PropertyDescriptor::default()
        }
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_accessor_descriptor() && !self.is_data_descriptor()
    }

    /// Complete descriptor for an existing own property slot.
    pub fn from_property(prop: &Property) -> Self {
        match prop {
            Property::Data {
                value,
                writable,
                enumerable,
                configurable,
            } => PropertyDescriptor::new_data(value.clone(), *writable, *enumerable, *configurable),
            Property::Accessor {
                get,
                set,
                enumerable,
                configurable,
            } => PropertyDescriptor::new_accessor(get.clone(), set.clone(), *enumerable, *configurable),
        }
    }

    /// ToPropertyDescriptor: read the descriptor fields off a JS object,
    /// honoring inherited fields and getters.
    pub fn from_object(realm: &Realm, obj: &Value) -> Result<Self, JSError> {
        let Value::Object(obj) = obj else {
            return Err(raise_type_error!(format!("Property description must be an object: {obj}")));
        };

        let mut desc = PropertyDescriptor::default();
        let field = |name: &str| -> Result<Option<Value>, JSError> {
            if has_property(obj, &PropertyKey::from(name)) {
                Ok(Some(object_get(realm, obj, name)?))
            } else {
                Ok(None)
            }
        };

        desc.enumerable = field("enumerable")?.map(|v| v.to_truthy());
        desc.configurable = field("configurable")?.map(|v| v.to_truthy());
        desc.value = field("value")?;
        desc.writable = field("writable")?.map(|v| v.to_truthy());
        desc.get = field("get")?;
        desc.set = field("set")?;

        if let Some(getter) = &desc.get
            && !getter.is_undefined()
            && !is_callable(getter)
        {
            return Err(raise_type_error!(format!("Getter must be a function: {getter}")));
        }
        if let Some(setter) = &desc.set
            && !setter.is_undefined()
            && !is_callable(setter)
        {
            return Err(raise_type_error!(format!("Setter must be a function: {setter}")));
        }
        if desc.is_accessor_descriptor() && desc.is_data_descriptor() {
            return Err(raise_type_error!(
                "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute"
            ));
        }
        Ok(desc)
    }

    /// FromPropertyDescriptor: produce a JS object representing this descriptor.
    pub fn to_object(&self, realm: &Realm) -> Result<Value, JSError> {
        let obj = realm.new_object();
        let fields = [
            ("value", self.value.clone()),
            ("writable", self.writable.map(Value::Boolean)),
            ("get", self.get.clone()),
            ("set", self.set.clone()),
            ("enumerable", self.enumerable.map(Value::Boolean)),
            ("configurable", self.configurable.map(Value::Boolean)),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                create_data_property_or_throw(realm, &obj, name, value)?;
            }
        }
        Ok(Value::Object(obj))
    }
}
