use crate::core::{
    JSObjectDataPtr, PropertyKey, Realm, Value, call, create_data_property, create_data_property_or_throw, delete_property,
    get_own_property, is_callable, object_get, own_property_keys, to_length_value, to_string,
};
use crate::error::JSError;
use crate::js_array::is_array;
use crate::unicode::{utf8_to_utf16, utf16_to_display, utf16_to_utf8};
use crate::{raise_range_error, raise_syntax_error, raise_type_error};
use std::rc::Rc;

/// Nesting limit for arrays and objects, both when parsing and stringifying.
const MAX_NESTING_DEPTH: usize = 512;

pub fn initialize_json(realm: &Realm) -> Result<(), JSError> {
    let json_obj = realm.new_object();

    for (method, length) in [("parse", 2), ("stringify", 3)] {
        realm.define_builtin(&json_obj, method, length, move |realm, _this, args| handle_json_method(realm, method, args));
    }

    realm.define_hidden(realm.global(), "JSON", Value::Object(json_obj));
    Ok(())
}

pub fn handle_json_method(realm: &Realm, method: &str, args: &[Value]) -> Result<Value, JSError> {
    match method {
        "parse" => {
            let text = to_string(realm, args.first().unwrap_or(&Value::Undefined))?;
            let value = json_parse(realm, &text)?;
            match args.get(1) {
                Some(reviver) if is_callable(reviver) => apply_reviver(realm, value, reviver),
                _ => Ok(value),
            }
        }
        "stringify" => match json_stringify(realm, args.first().unwrap_or(&Value::Undefined))? {
            Some(json_str) => {
                log::debug!("JSON.stringify produced: {}", json_str);
                Ok(Value::String(utf8_to_utf16(&json_str)))
            }
            None => Ok(Value::Undefined),
        },
        _ => Err(raise_type_error!(format!("JSON.{method} is not implemented"))),
    }
}

/// Parse `text` with the strict JSON grammar. Every grammar violation is a
/// SyntaxError.
pub fn json_parse(realm: &Realm, text: &[u16]) -> Result<Value, JSError> {
    let mut parser = JsonParser { realm, src: text, pos: 0 };
    let result = parser.parse_text();
    if let Err(e) = &result {
        log::debug!("json_parse: rejected {:?}: {}", utf16_to_display(text), e);
    }
    result
}

struct JsonParser<'a> {
    realm: &'a Realm,
    src: &'a [u16],
    pos: usize,
}

impl JsonParser<'_> {
    fn peek(&self) -> Option<u16> {
        self.src.get(self.pos).copied()
    }

    fn error_here(&self) -> JSError {
        match self.peek() {
            None => raise_syntax_error!("Unexpected end of JSON input"),
            Some(unit) => raise_syntax_error!(format!(
                "Unexpected token '{}' in JSON at position {}",
                utf16_to_display(&[unit]),
                self.pos
            )),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(0x09 | 0x0A | 0x0D | 0x20) = self.peek() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, unit: u8) -> Result<(), JSError> {
        if self.peek() == Some(unit as u16) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error_here())
        }
    }

    fn parse_text(&mut self) -> Result<Value, JSError> {
        self.skip_whitespace();
        let value = self.parse_value(0)?;
        self.skip_whitespace();
        if self.pos < self.src.len() {
            return Err(self.error_here());
        }
        Ok(value)
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, JSError> {
        match self.peek() {
            Some(0x7B) => self.parse_object(depth + 1),
            Some(0x5B) => self.parse_array(depth + 1),
            Some(0x22) => Ok(Value::String(self.parse_string()?)),
            Some(0x2D | 0x30..=0x39) => self.parse_number(),
            Some(0x74) => self.parse_literal("true", Value::Boolean(true)),
            Some(0x66) => self.parse_literal("false", Value::Boolean(false)),
            Some(0x6E) => self.parse_literal("null", Value::Null),
            _ => Err(self.error_here()),
        }
    }

    fn parse_literal(&mut self, word: &str, value: Value) -> Result<Value, JSError> {
        for b in word.bytes() {
            self.expect(b)?;
        }
        Ok(value)
    }

    fn check_depth(&self, depth: usize) -> Result<(), JSError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(raise_range_error!("Maximum JSON nesting depth exceeded"));
        }
        Ok(())
    }

    fn parse_object(&mut self, depth: usize) -> Result<Value, JSError> {
        self.check_depth(depth)?;
        self.expect(b'{')?;
        let obj = self.realm.new_object();
        self.skip_whitespace();
        if self.peek() == Some(0x7D) {
            self.pos += 1;
            return Ok(Value::Object(obj));
        }
        loop {
            self.skip_whitespace();
            if self.peek() != Some(0x22) {
                return Err(self.error_here());
            }
            let key = PropertyKey::from_utf16(&self.parse_string()?);
            self.skip_whitespace();
            self.expect(b':')?;
            self.skip_whitespace();
            let value = self.parse_value(depth)?;
            // Duplicate keys: the last occurrence wins
            create_data_property_or_throw(self.realm, &obj, key, value)?;
            self.skip_whitespace();
            match self.peek() {
                Some(0x2C) => self.pos += 1,
                Some(0x7D) => {
                    self.pos += 1;
                    return Ok(Value::Object(obj));
                }
                _ => return Err(self.error_here()),
            }
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Value, JSError> {
        self.check_depth(depth)?;
        self.expect(b'[')?;
        let mut elements = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(0x5D) {
            self.pos += 1;
            return Ok(Value::Object(self.realm.new_array()));
        }
        loop {
            self.skip_whitespace();
            elements.push(self.parse_value(depth)?);
            self.skip_whitespace();
            match self.peek() {
                Some(0x2C) => self.pos += 1,
                Some(0x5D) => {
                    self.pos += 1;
                    return Ok(Value::Object(self.realm.array_from_values(&elements)?));
                }
                _ => return Err(self.error_here()),
            }
        }
    }

    fn parse_string(&mut self) -> Result<Vec<u16>, JSError> {
        self.expect(b'"')?;
        let mut out = Vec::new();
        loop {
            let Some(unit) = self.peek() else {
                return Err(raise_syntax_error!("Unterminated string in JSON"));
            };
            match unit {
                0x22 => {
                    self.pos += 1;
                    return Ok(out);
                }
                0x5C => {
                    self.pos += 1;
                    out.push(self.parse_escape()?);
                }
                0x00..=0x1F => {
                    return Err(raise_syntax_error!(format!(
                        "Bad control character in string literal in JSON at position {}",
                        self.pos
                    )));
                }
                _ => {
                    // Lone surrogates pass through untouched
                    out.push(unit);
                    self.pos += 1;
                }
            }
        }
    }

    fn parse_escape(&mut self) -> Result<u16, JSError> {
        let Some(unit) = self.peek() else {
            return Err(self.error_here());
        };
        let decoded = match unit {
            0x22 | 0x5C | 0x2F => unit,
            0x62 => 0x08,
            0x66 => 0x0C,
            0x6E => 0x0A,
            0x72 => 0x0D,
            0x74 => 0x09,
            0x75 => {
                self.pos += 1;
                let mut code: u16 = 0;
                for _ in 0..4 {
                    let digit = self
                        .peek()
                        .and_then(|u| char::from_u32(u as u32))
                        .and_then(|c| c.to_digit(16))
                        .ok_or_else(|| {
                            raise_syntax_error!(format!("Bad Unicode escape in JSON at position {}", self.pos))
                        })?;
                    code = code * 16 + digit as u16;
                    self.pos += 1;
                }
                return Ok(code);
            }
            _ => {
                return Err(raise_syntax_error!(format!(
                    "Bad escaped character '\\{}' in JSON at position {}",
                    utf16_to_display(&[unit]),
                    self.pos - 1
                )));
            }
        };
        self.pos += 1;
        Ok(decoded)
    }

    fn is_digit(unit: Option<u16>) -> bool {
        matches!(unit, Some(0x30..=0x39))
    }

    fn consume_digits(&mut self) -> Result<(), JSError> {
        if !Self::is_digit(self.peek()) {
            return Err(self.error_here());
        }
        while Self::is_digit(self.peek()) {
            self.pos += 1;
        }
        Ok(())
    }

    /// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
    fn parse_number(&mut self) -> Result<Value, JSError> {
        let start = self.pos;
        if self.peek() == Some(0x2D) {
            self.pos += 1;
        }
        match self.peek() {
            Some(0x30) => {
                self.pos += 1;
                // "08", "06" and "0x3" all stop here
                if Self::is_digit(self.peek()) {
                    return Err(raise_syntax_error!(format!(
                        "Leading zeros are not allowed in JSON numbers at position {}",
                        self.pos - 1
                    )));
                }
            }
            Some(0x31..=0x39) => self.consume_digits()?,
            _ => return Err(self.error_here()),
        }
        if self.peek() == Some(0x2E) {
            self.pos += 1;
            self.consume_digits()?;
        }
        if let Some(0x45 | 0x65) = self.peek() {
            self.pos += 1;
            if let Some(0x2B | 0x2D) = self.peek() {
                self.pos += 1;
            }
            self.consume_digits()?;
        }
        let lexeme = utf16_to_utf8(&self.src[start..self.pos]);
        lexeme
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| raise_syntax_error!(format!("Invalid number '{lexeme}' in JSON")))
    }
}

fn apply_reviver(realm: &Realm, value: Value, reviver: &Value) -> Result<Value, JSError> {
    let root = realm.new_object();
    create_data_property_or_throw(realm, &root, "", value)?;
    internalize_json_property(realm, &root, PropertyKey::from(""), reviver)
}

/// InternalizeJSONProperty: walk bottom-up, letting the reviver replace or
/// (by returning undefined) delete each property.
fn internalize_json_property(realm: &Realm, holder: &JSObjectDataPtr, name: PropertyKey, reviver: &Value) -> Result<Value, JSError> {
    let value = object_get(realm, holder, name.clone())?;
    if let Value::Object(obj) = &value {
        let keys: Vec<PropertyKey> = if is_array(&value) {
            let len = to_length_value(realm, &object_get(realm, obj, "length")?)?;
            (0..len).map(|i| PropertyKey::from(i.to_string())).collect()
        } else {
            own_property_keys(obj)
                .into_iter()
                .filter(|k| get_own_property(obj, k).is_some_and(|p| p.enumerable()))
                .collect()
        };
        for key in keys {
            let new_element = internalize_json_property(realm, obj, key.clone(), reviver)?;
            if new_element.is_undefined() {
                delete_property(obj, &key);
            } else {
                create_data_property(realm, obj, &key, new_element)?;
            }
        }
    }
    let name_value = Value::String(name.to_utf16());
    call(realm, reviver, &Value::Object(holder.clone()), &[name_value, value])
}

/// JSON.stringify without replacer or indentation. `None` stands for an
/// undefined result.
pub fn json_stringify(realm: &Realm, value: &Value) -> Result<Option<String>, JSError> {
    let mut stack = Vec::new();
    match js_value_to_json_value(realm, value, &mut stack)? {
        Some(json_value) => serde_json::to_string(&json_value)
            .map(Some)
            .map_err(|e| raise_type_error!(format!("JSON.stringify failed: {e}"))),
        None => Ok(None),
    }
}

fn js_value_to_json_value(realm: &Realm, js_value: &Value, stack: &mut Vec<JSObjectDataPtr>) -> Result<Option<serde_json::Value>, JSError> {
    let mut js_value = js_value.clone();
    if let Value::Object(obj) = &js_value {
        let to_json = object_get(realm, obj, "toJSON")?;
        if is_callable(&to_json) {
            js_value = call(realm, &to_json, &js_value, &[])?;
        }
    }

    match &js_value {
        Value::Undefined => Ok(None),
        Value::Null => Ok(Some(serde_json::Value::Null)),
        Value::Boolean(b) => Ok(Some(serde_json::Value::Bool(*b))),
        Value::Number(n) => {
            if !n.is_finite() {
                Ok(Some(serde_json::Value::Null))
            } else if *n == n.trunc() && n.abs() < 9_007_199_254_740_992.0 {
                // Integer
                Ok(Some(serde_json::Value::Number(serde_json::Number::from(*n as i64))))
            } else {
                Ok(serde_json::Number::from_f64(*n).map(serde_json::Value::Number))
            }
        }
        Value::String(s) => Ok(Some(serde_json::Value::String(utf16_to_utf8(s)))),
        Value::Object(obj) => {
            if is_callable(&js_value) {
                return Ok(None);
            }
            if stack.iter().any(|seen| Rc::ptr_eq(seen, obj)) {
                return Err(raise_type_error!("Converting circular structure to JSON"));
            }
            if stack.len() >= MAX_NESTING_DEPTH {
                return Err(raise_range_error!("Maximum JSON nesting depth exceeded"));
            }
            stack.push(obj.clone());
            let result = if is_array(&js_value) {
                let len = to_length_value(realm, &object_get(realm, obj, "length")?)?;
                let mut arr = Vec::new();
                for i in 0..len {
                    let element = object_get(realm, obj, i.to_string())?;
                    // Undefined and functions in arrays become null
                    arr.push(js_value_to_json_value(realm, &element, stack)?.unwrap_or(serde_json::Value::Null));
                }
                serde_json::Value::Array(arr)
            } else {
                let mut map = serde_json::Map::new();
                for key in own_property_keys(obj) {
                    if !get_own_property(obj, &key).is_some_and(|p| p.enumerable()) {
                        continue;
                    }
                    let value = object_get(realm, obj, key.clone())?;
                    if let Some(json_val) = js_value_to_json_value(realm, &value, stack)? {
                        map.insert(utf16_to_utf8(&key.to_utf16()), json_val);
                    }
                }
                serde_json::Value::Object(map)
            };
            stack.pop();
            Ok(Some(result))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JSErrorKind;

    fn parse(text: &str) -> Result<Value, JSError> {
        let realm = Realm::new()?;
        json_parse(&realm, &utf8_to_utf16(text))
    }

    #[test]
    fn leading_zero_is_reported_at_the_zero() {
        let err = parse("[1, 007]").unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }));
        assert!(err.message().contains("position 4"), "{}", err.message());
    }

    #[test]
    fn bad_escape_names_the_character() {
        let err = parse(r#""\a""#).unwrap_err();
        assert!(err.message().contains("'\\a'"), "{}", err.message());
    }

    #[test]
    fn empty_input_is_unexpected_end() {
        let err = parse("  ").unwrap_err();
        assert_eq!(err.message(), "Unexpected end of JSON input");
    }

    #[test]
    fn nesting_limit_is_a_range_error() {
        let text = "[".repeat(MAX_NESTING_DEPTH + 1) + &"]".repeat(MAX_NESTING_DEPTH + 1);
        let err = parse(&text).unwrap_err();
        assert!(matches!(err.kind(), JSErrorKind::RangeError { .. }));
    }
}
