use js_conformance::harness::{
    Check, CheckFailure, INVALID_JSON_CORPUS, Outcome, PrototypeSnapshot, Suite, VALID_JSON_CORPUS, check_invalid_json,
    check_map_ignores_inherited_accessor, check_valid_json, fail,
};
use js_conformance::{
    Realm, Value, call, create_data_property_or_throw, get_array_length, get_own_property, object_get, object_set, raise_type_error,
};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

#[test]
fn test_builtin_suite_passes() {
    let suite = Suite::builtin();
    assert_eq!(suite.len(), INVALID_JSON_CORPUS.len() + VALID_JSON_CORPUS.len() + 1);
    let report = suite.run();
    assert!(report.is_success(), "{report}");
    assert_eq!(report.passed(), suite.len());
}

#[test]
fn test_invalid_json_check_flags_accepted_input() {
    let realm = Realm::new().unwrap();
    match check_invalid_json(&realm, "0") {
        Err(CheckFailure::Failed { message }) => {
            assert_eq!(message, "should have thrown SyntaxError for JSON.parse on 0")
        }
        other => panic!("Expected a check failure, got {:?}", other),
    }
    check_valid_json(&realm, "0").unwrap();
}

#[test]
fn test_invalid_json_check_flags_wrong_error_kind() {
    let realm = Realm::new().unwrap();
    let json = realm.global_get("JSON").unwrap();
    let broken = realm.new_function("parse", 1, |_realm, _this, _args| Err(raise_type_error!("boom")));
    object_set(&realm, json.as_object().unwrap(), "parse", broken).unwrap();

    match check_invalid_json(&realm, "08") {
        Err(CheckFailure::Failed { message }) => assert_eq!(message, "Expected SyntaxError, but got TypeError: boom"),
        other => panic!("Expected a check failure, got {:?}", other),
    }
}

#[test]
fn test_map_check_restores_array_prototype() {
    let realm = Realm::new().unwrap();
    check_map_ignores_inherited_accessor(&realm).unwrap();
    assert!(get_own_property(realm.array_prototype(), &"0".into()).is_none());
    assert_eq!(get_array_length(realm.array_prototype()), Some(0));

    // Same realm, same outcome
    check_map_ignores_inherited_accessor(&realm).unwrap();
    assert!(object_get(&realm, &realm.new_array(), "0").unwrap().is_undefined());
}

fn replace_array_map<F>(realm: &Realm, store: F)
where
    F: Fn(&Realm, &Value, &Value, u32, Value) -> Result<(), js_conformance::JSError> + 'static,
{
    // `map` stand-in: maps every element of `this` with the callback and
    // hands each result to `store(realm, result, this, index, value)`.
    let replacement = realm.new_function("map", 1, move |realm, this, args| {
        let source = this.as_object().cloned().unwrap();
        let callback = args.first().cloned().unwrap_or(Value::Undefined);
        let res = Value::Object(realm.new_array());
        for k in 0..get_array_length(&source).unwrap() {
            let element = object_get(realm, &source, k)?;
            let mapped = call(realm, &callback, &Value::Undefined, &[element, Value::Number(k as f64), this.clone()])?;
            store(realm, &res, this, k, mapped)?;
        }
        Ok(res)
    });
    object_set(realm, realm.array_prototype(), "map", replacement).unwrap();
}

fn expect_failure(result: Result<(), CheckFailure>, expected: &str) {
    match result {
        Err(CheckFailure::Failed { message }) => assert_eq!(message, expected),
        other => panic!("Expected a check failure, got {:?}", other),
    }
}

#[test]
fn test_map_check_flags_assignment_through_inherited_setter() {
    let realm = Realm::new().unwrap();
    replace_array_map(&realm, |realm, res, _source, k, value| object_set(realm, res.as_object().unwrap(), k, value));

    // res[0] was swallowed by the setter, so for-in reaches the inherited getter
    expect_failure(check_map_ignores_inherited_accessor(&realm), "map res[0] does not have right value");
    assert!(get_own_property(realm.array_prototype(), &"0".into()).is_none());
}

#[test]
fn test_map_check_flags_short_result() {
    let realm = Realm::new().unwrap();
    replace_array_map(&realm, |realm, res, _source, k, value| {
        if k < 2 {
            create_data_property_or_throw(realm, res.as_object().unwrap(), k, value)?;
        }
        Ok(())
    });
    expect_failure(check_map_ignores_inherited_accessor(&realm), "map result array is not of right length");
}

#[test]
fn test_map_check_flags_setter_calls_even_with_correct_values() {
    let realm = Realm::new().unwrap();
    replace_array_map(&realm, |realm, res, _source, k, value| {
        // Assign into a scratch array first, then define the real element
        object_set(realm, &realm.new_array(), k, value.clone())?;
        create_data_property_or_throw(realm, res.as_object().unwrap(), k, value)
    });
    expect_failure(
        check_map_ignores_inherited_accessor(&realm),
        "map invoked the inherited setter for '0' 1 time(s)",
    );
}

#[test]
fn test_snapshot_restores_on_failure_path() {
    let realm = Realm::new().unwrap();
    let result = (|| -> Result<(), CheckFailure> {
        let _snapshot = PrototypeSnapshot::capture(realm.array_prototype());
        object_set(&realm, realm.array_prototype(), "extra", Value::Number(1.0))?;
        fail("deliberate")
    })();
    assert!(matches!(result, Err(CheckFailure::Failed { .. })));
    assert!(get_own_property(realm.array_prototype(), &"extra".into()).is_none());
}

#[test]
fn test_snapshot_explicit_restore() {
    let realm = Realm::new().unwrap();
    let snapshot = PrototypeSnapshot::capture(realm.object_prototype());
    realm.object_prototype().borrow_mut().extensible = false;
    snapshot.restore();
    assert!(realm.object_prototype().borrow().extensible);
}

#[test]
fn test_suite_continues_after_failure() {
    let mut suite = Suite::new();
    suite
        .add(Check::new("always fails", |_realm| fail("nope")))
        .add(Check::new("engine error", |realm| {
            let undefined = realm.global_get("Missing")?;
            js_conformance::call(realm, &undefined, &Value::Undefined, &[])?;
            Ok(())
        }))
        .add_invalid_json("1.");
    let report = suite.run();

    assert_eq!(report.passed(), 1);
    assert_eq!(report.failed(), 2);
    assert!(!report.is_success());
    assert_eq!(report.outcomes()[0].1, Outcome::Failed("nope".to_string()));
    match &report.outcomes()[1].1 {
        Outcome::Failed(message) => assert!(message.starts_with("unexpected engine error: TypeError"), "{message}"),
        other => panic!("Expected failure, got {:?}", other),
    }
    assert_eq!(report.outcomes()[2].1, Outcome::Passed);

    let text = report.to_string();
    assert!(text.contains("FAIL always fails: nope"));
    assert!(text.contains("PASS JSON.parse rejects 1."));
    assert!(text.ends_with("1 passed, 2 failed"));
}

#[test]
fn test_checks_do_not_leak_between_realms() {
    let mut suite = Suite::new();
    suite.add(Check::new("mutates Array.prototype", |realm| {
        object_set(realm, realm.array_prototype(), "leak", Value::Boolean(true))?;
        Ok(())
    }));
    suite.add(Check::new("sees pristine Array.prototype", |realm| {
        if get_own_property(realm.array_prototype(), &"leak".into()).is_some() {
            return fail("Array.prototype.leak survived into a new realm");
        }
        Ok(())
    }));
    assert!(suite.run().is_success());
}

#[test]
fn test_filter_and_json_report() {
    let suite = Suite::builtin().filter("rejects 0");
    let names: Vec<&str> = suite.names().collect();
    assert_eq!(
        names,
        ["JSON.parse rejects 0.3E+", "JSON.parse rejects 08", "JSON.parse rejects 06", "JSON.parse rejects 0x3"]
    );

    let report = suite.run();
    let json = report.to_json();
    assert_eq!(json["passed"], 4);
    assert_eq!(json["failed"], 0);
    assert_eq!(json["checks"][3]["name"], "JSON.parse rejects 0x3");
    assert_eq!(json["checks"][3]["status"], "pass");
}
