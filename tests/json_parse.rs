use js_conformance::{
    JSErrorKind, PropertyKey, Realm, Value, call, is_strictly_equal, json_parse, object_get, own_property_keys, utf8_to_utf16,
};

// Initialize logger for this integration test binary so `RUST_LOG` is honored.
// Using `ctor` ensures initialization runs before tests start.
#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn parse(realm: &Realm, text: &str) -> Result<Value, js_conformance::JSError> {
    json_parse(realm, &utf8_to_utf16(text))
}

fn number(v: &Value) -> f64 {
    match v {
        Value::Number(n) => *n,
        other => panic!("Expected number, got {:?}", other),
    }
}

#[test]
fn test_rejects_malformed_literals_with_syntax_error() {
    let realm = Realm::new().unwrap();
    for text in [r#""\a""#, "1.", ".8", "2.3e+", "0.3E+", "08", "06", "0x3"] {
        match parse(&realm, text) {
            Err(err) => match err.kind() {
                JSErrorKind::SyntaxError { .. } => (),
                _ => panic!("Expected SyntaxError for {text}, got {:?}", err),
            },
            Ok(v) => panic!("Expected {text} to be rejected, got {:?}", v),
        }
    }
}

#[test]
fn test_rejects_other_grammar_violations() {
    let realm = Realm::new().unwrap();
    for text in ["", "-", "+1", "1e", "01.5", "-01", "[1,]", "{\"a\":1,}", "{a:1}", "'x'", "tru", "nul", "1 2", "\"\t\"", "NaN", "\u{a0}1"] {
        let err = parse(&realm, text).expect_err(text);
        assert!(err.is_syntax_error(), "{text}: {err}");
    }
}

#[test]
fn test_accepts_single_zero_and_other_boundaries() {
    let realm = Realm::new().unwrap();
    assert_eq!(number(&parse(&realm, "0").unwrap()), 0.0);
    assert_eq!(number(&parse(&realm, "0.5").unwrap()), 0.5);
    assert_eq!(number(&parse(&realm, "1e5").unwrap()), 100000.0);
    assert_eq!(number(&parse(&realm, "1E-2").unwrap()), 0.01);
    assert_eq!(number(&parse(&realm, " \t\r\n10 ").unwrap()), 10.0);

    let neg_zero = number(&parse(&realm, "-0").unwrap());
    assert_eq!(neg_zero, 0.0);
    assert!(neg_zero.is_sign_negative());
}

#[test]
fn test_parses_literals() {
    let realm = Realm::new().unwrap();
    assert!(matches!(parse(&realm, "true").unwrap(), Value::Boolean(true)));
    assert!(matches!(parse(&realm, "false").unwrap(), Value::Boolean(false)));
    assert!(matches!(parse(&realm, "null").unwrap(), Value::Null));
}

#[test]
fn test_parses_nested_structures() {
    let realm = Realm::new().unwrap();
    let result = parse(&realm, r#"{"a": [1, {"b": "x"}], "c": null}"#).unwrap();
    let Value::Object(obj) = &result else {
        panic!("Expected object, got {:?}", result);
    };
    let a = object_get(&realm, obj, "a").unwrap();
    assert!(js_conformance::is_array(&a));
    let a = a.as_object().unwrap();
    assert_eq!(number(&object_get(&realm, a, "length").unwrap()), 2.0);
    assert_eq!(number(&object_get(&realm, a, "0").unwrap()), 1.0);
    let inner = object_get(&realm, a, "1").unwrap();
    let b = object_get(&realm, inner.as_object().unwrap(), "b").unwrap();
    assert!(is_strictly_equal(&b, &Value::from("x")));
    assert!(matches!(object_get(&realm, obj, "c").unwrap(), Value::Null));
}

#[test]
fn test_duplicate_keys_last_wins_and_proto_is_own() {
    let realm = Realm::new().unwrap();
    let result = parse(&realm, r#"{"k": 1, "k": 2, "__proto__": 3}"#).unwrap();
    let obj = result.as_object().unwrap();
    assert_eq!(number(&object_get(&realm, obj, "k").unwrap()), 2.0);
    assert_eq!(number(&object_get(&realm, obj, "__proto__").unwrap()), 3.0);
    assert!(std::rc::Rc::ptr_eq(
        obj.borrow().prototype.as_ref().unwrap(),
        realm.object_prototype()
    ));
}

#[test]
fn test_string_escapes() {
    let realm = Realm::new().unwrap();
    let result = parse(&realm, r#""a\"\\\/\b\f\n\r\tA""#).unwrap();
    assert!(is_strictly_equal(&result, &Value::from("a\"\\/\u{8}\u{c}\n\r\tA")));

    // A lone surrogate survives as a single code unit
    match parse(&realm, r#""\ud800""#).unwrap() {
        Value::String(units) => assert_eq!(units, vec![0xD800]),
        other => panic!("Expected string, got {:?}", other),
    }

    let err = parse(&realm, r#""\u12G4""#).unwrap_err();
    assert!(err.is_syntax_error());
}

#[test]
fn test_lone_surrogate_keys_stay_distinct() {
    let realm = Realm::new().unwrap();
    let result = parse(&realm, r#"{"\ud800": 1, "\ud801": 2, "😀": 3}"#).unwrap();
    let obj = result.as_object().unwrap();
    let keys: Vec<Vec<u16>> = own_property_keys(obj).iter().map(PropertyKey::to_utf16).collect();
    assert_eq!(keys, vec![vec![0xD800], vec![0xD801], vec![0xD83D, 0xDE00]]);

    // A well-formed pair decodes to an ordinary string key
    assert_eq!(number(&object_get(&realm, obj, "\u{1F600}").unwrap()), 3.0);
    assert_eq!(number(&object_get(&realm, obj, PropertyKey::from_utf16(&[0xD801])).unwrap()), 2.0);

    // Object.keys hands the raw code units back to script
    let object_ctor = realm.global_get("Object").unwrap();
    let listed = realm.invoke(&object_ctor, "keys", &[result.clone()]).unwrap();
    match object_get(&realm, listed.as_object().unwrap(), "0").unwrap() {
        Value::String(units) => assert_eq!(units, vec![0xD800]),
        other => panic!("Expected string, got {:?}", other),
    }
}

#[test]
fn test_reviver_transforms_and_deletes() {
    let realm = Realm::new().unwrap();
    let reviver = realm.new_function("reviver", 2, |_realm, _this, args| {
        let key = args.first().cloned().unwrap_or(Value::Undefined);
        let value = args.get(1).cloned().unwrap_or(Value::Undefined);
        if is_strictly_equal(&key, &Value::from("drop")) {
            return Ok(Value::Undefined);
        }
        match value {
            Value::Number(n) => Ok(Value::Number(n * 10.0)),
            other => Ok(other),
        }
    });
    let json = realm.global_get("JSON").unwrap();
    let parse_fn = object_get(&realm, json.as_object().unwrap(), "parse").unwrap();
    let text = Value::from(r#"{"keep": 1, "drop": 2, "list": [3]}"#);
    let result = call(&realm, &parse_fn, &json, &[text, reviver]).unwrap();
    let obj = result.as_object().unwrap();

    assert_eq!(number(&object_get(&realm, obj, "keep").unwrap()), 10.0);
    assert!(!obj.borrow().contains_key(&"drop".into()));
    let list = object_get(&realm, obj, "list").unwrap();
    assert_eq!(number(&object_get(&realm, list.as_object().unwrap(), "0").unwrap()), 30.0);
}

#[test]
fn test_global_json_parse_coerces_argument_to_string() {
    let realm = Realm::new().unwrap();
    let json = realm.global_get("JSON").unwrap();
    let result = realm.invoke(&json, "parse", &[Value::Number(42.0)]).unwrap();
    assert_eq!(number(&result), 42.0);

    // undefined stringifies to "undefined", which is not JSON
    let err = realm.invoke(&json, "parse", &[]).unwrap_err();
    assert!(err.is_syntax_error());
}
