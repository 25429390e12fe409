//! Child-side result encoder for programs written in Rust.
//!
//! This is the same contract the JavaScript bootstraps in [`crate::runner`]
//! implement: one blank framing line, one invocation, one result line.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use serde_json::{Map, Value};

use super::Outcome;

/// `module` handed to a program.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub id: String,
}

/// `exports` handed to a program.
#[derive(Debug, Clone, Default)]
pub struct Exports(pub Map<String, Value>);

/// `require` handed to a program: a fixed table of preloaded modules.
#[derive(Debug, Clone, Default)]
pub struct Require {
    modules: HashMap<String, Value>,
}

impl Require {
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.modules.insert(name.into(), value);
        self
    }

    pub fn load(&self, name: &str) -> Result<&Value, Thrown> {
        self.modules
            .get(name)
            .ok_or_else(|| Thrown::new(format!("Error: Cannot find module '{name}'")))
    }
}

/// Capability record passed by value into the program.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pub module: Module,
    pub exports: Exports,
    pub require: Require,
}

/// Anything a program threw, already rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thrown(String);

impl Thrown {
    pub fn new(value: impl fmt::Display) -> Self {
        Thrown(value.to_string())
    }

    pub fn message(&self) -> &str {
        &self.0
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if let Some(s) = payload.downcast_ref::<&str>() {
            Thrown((*s).to_string())
        } else if let Some(s) = payload.downcast_ref::<String>() {
            Thrown(s.clone())
        } else {
            Thrown("program panicked".to_string())
        }
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<E: std::error::Error> From<E> for Thrown {
    fn from(err: E) -> Self {
        Thrown::new(err)
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Running,
    Classifying,
    Emitted,
}

fn enter(phase: Phase) {
    log::trace!("encoder phase: {phase:?}");
}

/// Run `program` once and write its outcome to `out`.
///
/// `None` is the no-value result; `Some` always goes through encoding, so an
/// explicit null comes out as `["ok",null]`. A value that fails to serialize
/// is reported as a bare `["err"]`. Panics are caught like a throw.
pub fn run_program<W, T, F>(out: &mut W, bindings: Bindings, program: F) -> std::io::Result<Outcome>
where
    W: Write,
    T: Serialize,
    F: FnOnce(Bindings) -> Result<Option<T>, Thrown>,
{
    out.write_all(b"\n")?;

    enter(Phase::Running);
    let returned = panic::catch_unwind(AssertUnwindSafe(|| program(bindings)))
        .unwrap_or_else(|payload| Err(Thrown::from_panic(payload)));

    enter(Phase::Classifying);
    let outcome = match returned {
        Ok(None) => Outcome::NoValue,
        Ok(Some(value)) => match serde_json::to_value(&value) {
            Ok(v) => Outcome::Value(v),
            Err(e) => {
                log::debug!("result is not representable: {e}");
                Outcome::Unrepresentable
            }
        },
        Err(thrown) => Outcome::Thrown(thrown.0),
    };

    out.write_all(outcome.encode_line().as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()?;
    enter(Phase::Emitted);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::extract_result;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn emit<T, F>(program: F) -> (String, Outcome)
    where
        T: Serialize,
        F: FnOnce(Bindings) -> Result<Option<T>, Thrown>,
    {
        let mut buf = Vec::new();
        let outcome = run_program(&mut buf, Bindings::default(), program).unwrap();
        (String::from_utf8(buf).unwrap(), outcome)
    }

    #[test]
    fn value_is_encoded() {
        let (text, outcome) = emit(|_| Ok(Some(2 + 2)));
        assert_eq!(text, "\n[\"ok\",4]\n");
        assert_eq!(outcome, Outcome::Value(json!(4)));
    }

    #[test]
    fn no_value_skips_encoding() {
        let (text, _) = emit(|_| Ok(None::<i32>));
        assert_eq!(text, "\n[\"ok\"]\n");
    }

    #[test]
    fn explicit_null_goes_through_encoding() {
        let (text, _) = emit(|_| Ok(Some(Value::Null)));
        assert_eq!(text, "\n[\"ok\",null]\n");
        let (text, _) = emit(|_| Ok(Some(None::<i32>)));
        assert_eq!(text, "\n[\"ok\",null]\n");
    }

    #[test]
    fn unserializable_value_degrades_to_bare_err() {
        let mut map = BTreeMap::new();
        map.insert((1, 2), "tuple keys are not JSON object keys");
        let (text, outcome) = emit(move |_| Ok(Some(map)));
        assert_eq!(text, "\n[\"err\"]\n");
        assert_eq!(outcome, Outcome::Unrepresentable);
    }

    #[test]
    fn thrown_values_are_rendered_as_text() {
        let (text, _) = emit(|_| Err::<Option<i32>, _>(Thrown::new("Error: boom")));
        assert_eq!(text, "\n[\"err\",\"Error: boom\"]\n");

        let (text, _) = emit(|_| Err::<Option<i32>, _>(Thrown::new(42)));
        assert_eq!(text, "\n[\"err\",\"42\"]\n");
    }

    #[test]
    fn std_errors_convert_with_question_mark() {
        let (_, outcome) = emit(|_| {
            let n: i32 = "nope".parse()?;
            Ok(Some(n))
        });
        assert_eq!(outcome, Outcome::Thrown("invalid digit found in string".into()));
    }

    #[test]
    fn panics_are_caught() {
        let (text, outcome) = emit(|_| -> Result<Option<i32>, Thrown> { panic!("boom") });
        assert_eq!(outcome, Outcome::Thrown("boom".into()));
        assert!(text.starts_with('\n'));
    }

    #[test]
    fn bindings_reach_the_program() {
        let bindings = Bindings {
            require: Require::default().with("answer", json!(42)),
            ..Bindings::default()
        };
        let mut buf = Vec::new();
        let outcome = run_program(&mut buf, bindings, |b| {
            let v = b.require.load("answer")?.clone();
            Ok(Some(v))
        })
        .unwrap();
        assert_eq!(outcome, Outcome::Value(json!(42)));

        let mut buf = Vec::new();
        let outcome = run_program(&mut buf, Bindings::default(), |b| {
            b.require.load("fs").map(|v| Some(v.clone()))
        })
        .unwrap();
        assert_eq!(outcome, Outcome::Thrown("Error: Cannot find module 'fs'".into()));
    }

    #[test]
    fn output_round_trips_through_the_host_reader() {
        let (text, outcome) = emit(|_| Ok(Some(json!({"a": [1, "two", null]}))));
        assert_eq!(extract_result(&text).unwrap(), outcome);
    }
}
