//! Loose scalar encodings shared by several remote records.

use serde::{Deserialize, de::IgnoredAny};
use serde_json::{Number, Value};

/// Boolean-ish flag as the remote service sends it: `true`, `1`, or `"1"`.
///
/// Anything other than a true boolean or a non-zero integer (numeric strings
/// included) decodes as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "FlagRepr")]
pub struct Flag(pub bool);

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<FlagRepr> for Flag {
    fn from(value: FlagRepr) -> Self {
        match value {
            FlagRepr::Bool(flag) => Flag(flag),
            FlagRepr::Int(number) => Flag(number != 0),
            FlagRepr::Text(text) => Flag(text.trim().parse::<i64>().is_ok_and(|n| n != 0)),
        }
    }
}

impl From<Flag> for bool {
    fn from(value: Flag) -> Self {
        value.0
    }
}

/// Free-text field that may arrive as a string, a number or a boolean.
///
/// Numbers and booleans keep their JSON spelling; `null` and nested values
/// read as empty text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "TextRepr")]
pub struct Text(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum TextRepr {
    Text(String),
    Number(Number),
    Bool(bool),
    Other(IgnoredAny),
}

impl From<TextRepr> for Text {
    fn from(value: TextRepr) -> Self {
        match value {
            TextRepr::Text(text) => Text(text),
            TextRepr::Number(number) => Text(number.to_string()),
            TextRepr::Bool(flag) => Text(flag.to_string()),
            TextRepr::Other(_) => Text::default(),
        }
    }
}

impl From<Text> for String {
    fn from(value: Text) -> Self {
        value.0
    }
}

/// Best-effort integer read used for counters the remote may omit or garble.
pub fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}
