//! The Rust encoder and the host reader agree on every outcome shape.

use std::collections::HashMap;

use execjs::protocol::encoder::{run_program, Bindings, Thrown};
use execjs::protocol::{extract_result, Outcome};
use serde::Serialize;
use serde_json::{json, Value};

fn roundtrip<T, F>(program: F) -> (String, Outcome)
where
    T: Serialize,
    F: FnOnce(Bindings) -> Result<Option<T>, Thrown>,
{
    let mut stdout = b"diagnostics printed while loading\n".to_vec();
    run_program(&mut stdout, Bindings::default(), program).unwrap();
    let text = String::from_utf8(stdout).unwrap();
    let outcome = extract_result(&text).unwrap();
    (text, outcome)
}

#[test]
fn framing_line_precedes_every_result() {
    let cases: Vec<String> = vec![
        roundtrip(|_| Ok(Some(1))).0,
        roundtrip(|_| Ok(None::<i32>)).0,
        roundtrip(|_| Err::<Option<i32>, _>(Thrown::new("x"))).0,
    ];
    for text in cases {
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3, "{text:?}");
        assert_eq!(lines[1], "");
    }
}

#[test]
fn documented_examples() {
    assert_eq!(roundtrip(|_| Ok(Some(2 + 2))).1, Outcome::Value(json!(4)));
    assert_eq!(roundtrip(|_| Ok(None::<Value>)).1, Outcome::NoValue);
    assert_eq!(
        roundtrip(|_| Err::<Option<i32>, _>(Thrown::new("Error: boom"))).1,
        Outcome::Thrown("Error: boom".into())
    );
    assert_eq!(roundtrip(|_| Ok(Some(Value::Null))).1, Outcome::Value(Value::Null));

    let mut unencodable = HashMap::new();
    unencodable.insert(vec![1u8], 1);
    let (text, outcome) = roundtrip(move |_| Ok(Some(unencodable)));
    assert_eq!(outcome, Outcome::Unrepresentable);
    assert!(text.ends_with("\n[\"err\"]\n"));
}

#[test]
fn rerunning_yields_the_same_outcome() {
    let program =
        |_: Bindings| -> Result<Option<Value>, Thrown> { Ok(Some(json!({"k": [1.5, "s", false]}))) };
    assert_eq!(roundtrip(program).1, roundtrip(program).1);
}
