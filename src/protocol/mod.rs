//! Wire format shared by the child bootstrap and the host.
//!
//! The child writes a blank framing line followed by exactly one JSON array:
//!
//! ```text
//! ["ok"]          success, no value
//! ["ok", value]   success with a JSON value (null included)
//! ["err"]         success, but the value could not be encoded
//! ["err", "msg"]  the program threw; msg is the thrown value as text
//! ```

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

pub mod encoder;

const OK: &str = "ok";
const ERR: &str = "err";

/// Outcome of one evaluation, exactly as carried by the wire line.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// `["ok"]`: returned without a value (undefined, not null).
    NoValue,
    /// `["ok", v]`
    Value(Value),
    /// `["err"]`: returned a value that JSON cannot represent.
    Unrepresentable,
    /// `["err", msg]`
    Thrown(String),
}

impl Outcome {
    /// JSON text of the wire line, without the trailing newline.
    pub fn encode_line(&self) -> String {
        // Every variant holds an already-encodable payload.
        serde_json::to_string(self).unwrap_or_else(|_| format!("[\"{ERR}\"]"))
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Outcome::NoValue => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(OK)?;
                seq.end()
            }
            Outcome::Value(v) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(OK)?;
                seq.serialize_element(v)?;
                seq.end()
            }
            Outcome::Unrepresentable => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(ERR)?;
                seq.end()
            }
            Outcome::Thrown(msg) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(ERR)?;
                seq.serialize_element(msg)?;
                seq.end()
            }
        }
    }
}

/// Parse one wire line. Only the four documented shapes are accepted.
pub fn decode_line(line: &str) -> Result<Outcome> {
    let parsed: Value =
        serde_json::from_str(line).map_err(|e| Error::Protocol(format!("{line:?}: {e}")))?;
    let Value::Array(mut items) = parsed else {
        return Err(Error::Protocol(format!("{line:?}: not an array")));
    };
    if items.is_empty() || items.len() > 2 {
        return Err(Error::Protocol(format!(
            "{line:?}: expected 1 or 2 elements, got {}",
            items.len()
        )));
    }
    let payload = if items.len() == 2 { items.pop() } else { None };
    let tag = match items.pop() {
        Some(Value::String(tag)) => tag,
        _ => return Err(Error::Protocol(format!("{line:?}: tag is not a string"))),
    };

    match (tag.as_str(), payload) {
        (OK, None) => Ok(Outcome::NoValue),
        (OK, Some(v)) => Ok(Outcome::Value(v)),
        (ERR, None) => Ok(Outcome::Unrepresentable),
        (ERR, Some(Value::String(msg))) => Ok(Outcome::Thrown(msg)),
        (ERR, Some(other)) => Err(Error::Protocol(format!(
            "{line:?}: error message is not a string: {other}"
        ))),
        (other, _) => Err(Error::Protocol(format!("{line:?}: unknown tag {other:?}"))),
    }
}

/// Pull the outcome out of everything the child wrote to stdout.
///
/// The result is the last line. The line before it is normally the blank
/// framing line, but a program that left a partial line on stdout swallows
/// the frame; that output is ignored like any other.
pub fn extract_result(stdout: &str) -> Result<Outcome> {
    let normalized = stdout.replace("\r\n", "\n").replace('\r', "\n");
    let body = normalized.strip_suffix('\n').unwrap_or(&normalized);

    let mut lines = body.rsplit('\n');
    let result = lines.next().unwrap_or_default();
    if result.is_empty() {
        return Err(Error::Protocol("runtime produced no result line".into()));
    }
    match lines.next() {
        Some("") => {}
        Some(partial) => log::debug!("no framing line, program left {partial:?} unterminated"),
        None => log::debug!("no framing line before the result"),
    }

    let noise = lines.map(str::len).sum::<usize>();
    if noise > 0 {
        log::debug!("ignoring {noise} bytes printed before the result frame");
    }
    decode_line(result)
}
