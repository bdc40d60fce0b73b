pub(crate) mod core;
pub(crate) mod error;
pub mod harness;
pub(crate) mod js_array;
pub(crate) mod js_json;
pub(crate) mod js_object;
pub(crate) mod unicode;

pub use crate::core::{
    JSObjectData, JSObjectDataPtr, MAX_ARRAY_INDEX, NativeFn, NativeFunction, ObjectClass, Property, PropertyDescriptor, PropertyKey,
    Realm, Value, call, create_data_property, create_data_property_or_throw, define_own_property, define_property_or_throw,
    delete_property, for_in_keys, get_own_property, get_prototype_of, get_v, has_property, is_callable, is_strictly_equal,
    new_js_object_data, new_object_with_proto, number_to_string, object_get, object_get_with_receiver, object_set, object_set_with_receiver,
    own_property_keys, same_value, to_length_value, to_number, to_object, to_property_key, to_string,
};
pub use crate::error::{JSError, JSErrorData, JSErrorKind};
pub use crate::js_array::{array_map, get_array_length, is_array};
pub use crate::js_json::{json_parse, json_stringify};
pub use crate::js_object::{object_define_property, object_get_own_property_descriptor};
pub use crate::unicode::{utf8_to_utf16, utf16_to_display, utf16_to_utf8};
