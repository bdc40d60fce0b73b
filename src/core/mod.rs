mod descriptor;
pub(crate) mod number;
mod property_key;
mod realm;
mod value;

pub use descriptor::PropertyDescriptor;
pub use number::number_to_string;
pub use property_key::{MAX_ARRAY_INDEX, PropertyKey};
pub use realm::Realm;
pub use value::{
    JSObjectData, JSObjectDataPtr, NativeFn, NativeFunction, ObjectClass, Property, Value, call, create_data_property,
    create_data_property_or_throw, define_own_property, define_property_or_throw, delete_property, for_in_keys, get_own_property,
    get_prototype_of, get_v, has_property, is_callable, is_strictly_equal, new_js_object_data, new_object_with_proto, object_get,
    object_get_with_receiver, object_set, object_set_with_receiver, own_property_keys, same_value, to_length_value, to_number, to_object,
    to_property_key, to_string,
};
pub(crate) use value::array_length;
