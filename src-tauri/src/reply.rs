//! JSON replies for failures the UI shows inline rather than as errors.

use std::fmt::Display;

use serde::Serialize;
use serde_json::{json, Map, Value};

/// `{ "ok": true, <field>: value }` on success, `{ "ok": false, "error" }`
/// otherwise.
pub fn inline<T: Serialize, E: Display>(field: &str, result: Result<T, E>) -> Value {
    let value = match result {
        Ok(value) => value,
        Err(err) => return failure(err),
    };
    match serde_json::to_value(value) {
        Ok(value) => {
            let mut reply = Map::new();
            reply.insert("ok".to_string(), Value::Bool(true));
            reply.insert(field.to_string(), value);
            Value::Object(reply)
        }
        Err(err) => failure(err),
    }
}

pub fn failure(err: impl Display) -> Value {
    json!({ "ok": false, "error": err.to_string() })
}
