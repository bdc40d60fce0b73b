//! Conformance checks against the object core.
//!
//! A check either returns `Ok(())` or a [`CheckFailure`]. Checks run one per
//! fresh [`Realm`], and any mutation of a shared intrinsic inside a check is
//! additionally wrapped in a [`PrototypeSnapshot`] so it cannot outlive the
//! check that made it.

use crate::core::{
    JSObjectDataPtr, Property, PropertyKey, Realm, Value, create_data_property_or_throw, for_in_keys, get_v, is_strictly_equal, object_get,
    to_number, to_string,
};
use crate::error::JSError;
use crate::unicode::{utf8_to_utf16, utf16_to_utf8};
use std::cell::Cell;
use std::rc::Rc;

/// Texts that every conforming `JSON.parse` must reject with a SyntaxError.
pub const INVALID_JSON_CORPUS: &[&str] = &[r#""\a""#, "1.", ".8", "2.3e+", "0.3E+", "08", "06", "0x3"];

/// Texts next to the rejection boundary that must still parse.
pub const VALID_JSON_CORPUS: &[&str] = &["0", "0.5", "-0", "1e5", r#""A""#, "[]", r#"{"a":[1,2]}"#];

#[derive(thiserror::Error, Debug)]
pub enum CheckFailure {
    #[error("{message}")]
    Failed { message: String },

    #[error("unexpected engine error: {0}")]
    Engine(#[from] JSError),
}

/// Abort the current check with `message`.
pub fn fail<T>(message: impl Into<String>) -> Result<T, CheckFailure> {
    Err(CheckFailure::Failed { message: message.into() })
}

/// Saves an object's property table, prototype and extensibility, and puts
/// them back when dropped.
pub struct PrototypeSnapshot {
    target: JSObjectDataPtr,
    saved: Option<(indexmap::IndexMap<PropertyKey, Property>, Option<JSObjectDataPtr>, bool)>,
}

impl PrototypeSnapshot {
    pub fn capture(target: &JSObjectDataPtr) -> Self {
        let saved = {
            let b = target.borrow();
            (b.properties.clone(), b.prototype.clone(), b.extensible)
        };
        PrototypeSnapshot {
            target: target.clone(),
            saved: Some(saved),
        }
    }

    /// Restore now instead of at end of scope.
    pub fn restore(mut self) {
        self.put_back();
    }

    fn put_back(&mut self) {
        if let Some((properties, prototype, extensible)) = self.saved.take() {
            let mut b = self.target.borrow_mut();
            b.properties = properties;
            b.prototype = prototype;
            b.extensible = extensible;
            log::debug!("PrototypeSnapshot: restored {:p}", Rc::as_ptr(&self.target));
        }
    }
}

impl Drop for PrototypeSnapshot {
    fn drop(&mut self) {
        self.put_back();
    }
}

fn json_parse_via_global(realm: &Realm, text: &str) -> Result<Value, JSError> {
    let json = realm.global_get("JSON")?;
    realm.invoke(&json, "parse", &[Value::String(utf8_to_utf16(text))])
}

/// `JSON.parse(text)` must throw a SyntaxError and must not produce a value.
pub fn check_invalid_json(realm: &Realm, text: &str) -> Result<(), CheckFailure> {
    match json_parse_via_global(realm, text) {
        Ok(_) => fail(format!("should have thrown SyntaxError for JSON.parse on {text}")),
        Err(e) if e.is_syntax_error() => Ok(()),
        Err(e) => fail(format!("Expected SyntaxError, but got {e}")),
    }
}

/// `JSON.parse(text)` must succeed.
pub fn check_valid_json(realm: &Realm, text: &str) -> Result<(), CheckFailure> {
    match json_parse_via_global(realm, text) {
        Ok(_) => Ok(()),
        Err(e) => fail(format!("JSON.parse rejected valid input {text}: {e}")),
    }
}

/// `[1, 2, 3].map(x => x * 2)` must yield `[2, 4, 6]` even when
/// `Array.prototype` carries an enumerable accessor at `"0"`, and the
/// accessor's setter must never fire.
pub fn check_map_ignores_inherited_accessor(realm: &Realm) -> Result<(), CheckFailure> {
    let arr = realm.array_from_values(&[Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)])?;
    let arr_value = Value::Object(arr.clone());

    let _snapshot = PrototypeSnapshot::capture(realm.array_prototype());
    let setter_calls = Rc::new(Cell::new(0_usize));

    let getter = realm.new_function("get", 0, |_realm, _this, _args| Ok(Value::from("hello")));
    let calls = setter_calls.clone();
    let setter = realm.new_function("set", 1, move |realm, _this, args| {
        let x = args.first().cloned().unwrap_or(Value::Undefined);
        log::warn!("setter for '0' called with {}", utf16_to_utf8(&to_string(realm, &x)?));
        calls.set(calls.get() + 1);
        Ok(Value::Undefined)
    });
    let attributes = realm.new_object();
    create_data_property_or_throw(realm, &attributes, "get", getter)?;
    create_data_property_or_throw(realm, &attributes, "set", setter)?;
    create_data_property_or_throw(realm, &attributes, "enumerable", Value::Boolean(true))?;

    let object_ctor = realm.global_get("Object")?;
    realm.invoke(
        &object_ctor,
        "defineProperty",
        &[Value::Object(realm.array_prototype().clone()), Value::from("0"), Value::Object(attributes)],
    )?;

    let double = realm.new_function("", 3, |realm, _this, args| {
        let k_val = args.first().cloned().unwrap_or(Value::Undefined);
        Ok(Value::Number(to_number(realm, &k_val)? * 2.0))
    });
    let res = realm.invoke(&arr_value, "map", &[double])?;
    let Value::Object(res_obj) = &res else {
        return fail(format!("map returned a non-object: {res}"));
    };

    if !is_strictly_equal(&get_v(realm, &res, "length")?, &get_v(realm, &arr_value, "length")?) {
        return fail("map result array is not of right length");
    }

    for key in for_in_keys(res_obj) {
        let actual = object_get(realm, res_obj, key.clone())?;
        let source = object_get(realm, &arr, key.clone())?;
        let expected = Value::Number(2.0 * to_number(realm, &source)?);
        if !is_strictly_equal(&actual, &expected) {
            return fail(format!("map res[{key}] does not have right value"));
        }
    }

    if setter_calls.get() != 0 {
        return fail(format!("map invoked the inherited setter for '0' {} time(s)", setter_calls.get()));
    }
    Ok(())
}

pub type CheckFn = Box<dyn Fn(&Realm) -> Result<(), CheckFailure>>;

pub struct Check {
    name: String,
    run: CheckFn,
}

impl Check {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&Realm) -> Result<(), CheckFailure> + 'static,
    {
        Check {
            name: name.into(),
            run: Box::new(run),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    Failed(String),
}

#[derive(Default)]
pub struct Suite {
    checks: Vec<Check>,
}

impl Suite {
    pub fn new() -> Self {
        Suite::default()
    }

    /// Every rejection case, the accept-side boundary cases and the map
    /// accessor check.
    pub fn builtin() -> Self {
        let mut suite = Suite::new();
        for text in INVALID_JSON_CORPUS {
            suite.add_invalid_json(text);
        }
        for text in VALID_JSON_CORPUS {
            suite.add_valid_json(text);
        }
        suite.add(Check::new("Array.prototype.map ignores inherited index accessor", check_map_ignores_inherited_accessor));
        suite
    }

    pub fn add(&mut self, check: Check) -> &mut Self {
        self.checks.push(check);
        self
    }

    pub fn add_invalid_json(&mut self, text: &str) -> &mut Self {
        let owned = text.to_string();
        self.add(Check::new(format!("JSON.parse rejects {text}"), move |realm| {
            check_invalid_json(realm, &owned)
        }))
    }

    pub fn add_valid_json(&mut self, text: &str) -> &mut Self {
        let owned = text.to_string();
        self.add(Check::new(format!("JSON.parse accepts {text}"), move |realm| {
            check_valid_json(realm, &owned)
        }))
    }

    /// Keep only the checks whose name contains `pattern`.
    pub fn filter(mut self, pattern: &str) -> Self {
        self.checks.retain(|c| c.name.contains(pattern));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(Check::name)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check in its own realm. A failing check is recorded and
    /// the run continues.
    pub fn run(&self) -> Report {
        let mut report = Report::default();
        for check in &self.checks {
            log::info!("running check: {}", check.name);
            let outcome = match Realm::new() {
                Ok(realm) => match (check.run)(&realm) {
                    Ok(()) => Outcome::Passed,
                    Err(e) => Outcome::Failed(e.to_string()),
                },
                Err(e) => Outcome::Failed(format!("realm setup failed: {e}")),
            };
            match &outcome {
                Outcome::Passed => log::info!("passed: {}", check.name),
                Outcome::Failed(message) => log::error!("failed: {}: {}", check.name, message),
            }
            report.outcomes.push((check.name.clone(), outcome));
        }
        report
    }
}

#[derive(Debug, Default)]
pub struct Report {
    outcomes: Vec<(String, Outcome)>,
}

impl Report {
    pub fn outcomes(&self) -> &[(String, Outcome)] {
        &self.outcomes
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == Outcome::Passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn to_json(&self) -> serde_json::Value {
        let checks: Vec<serde_json::Value> = self
            .outcomes
            .iter()
            .map(|(name, outcome)| match outcome {
                Outcome::Passed => serde_json::json!({ "name": name, "status": "pass" }),
                Outcome::Failed(message) => serde_json::json!({ "name": name, "status": "fail", "message": message }),
            })
            .collect();
        serde_json::json!({
            "passed": self.passed(),
            "failed": self.failed(),
            "checks": checks,
        })
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, outcome) in &self.outcomes {
            match outcome {
                Outcome::Passed => writeln!(f, "PASS {name}")?,
                Outcome::Failed(message) => writeln!(f, "FAIL {name}: {message}")?,
            }
        }
        write!(f, "{} passed, {} failed", self.passed(), self.failed())
    }
}
