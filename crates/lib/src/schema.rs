//! Structural validation of adapter payloads.
//!
//! `validate(payload, operation)` checks a JSON value against the shape an operation expects
//! before anything is deserialized or acted upon. Checks are structural only: required keys,
//! JSON types, and non-empty identifiers.

use serde_json::Value;
use std::fmt;

/// Which payload shape to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Outbound command passed to `send`: `{ to: { id }, object: { type, content, name? } }`.
    Send,
    /// Normalized inbound event handed to `listen` consumers.
    Event,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Send => f.write_str("send"),
            Operation::Event => f.write_str("event"),
        }
    }
}

/// A payload failed validation. `path` is the dotted location of the first problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation}: {path} {reason}")]
pub struct ValidationError {
    pub operation: String,
    pub path: String,
    pub reason: String,
}

impl ValidationError {
    fn new(operation: Operation, path: &str, reason: &str) -> Self {
        Self {
            operation: operation.to_string(),
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub fn validate(payload: &Value, operation: Operation) -> Result<(), ValidationError> {
    match operation {
        Operation::Send => validate_send(payload),
        Operation::Event => validate_event(payload),
    }
}

fn validate_send(payload: &Value) -> Result<(), ValidationError> {
    let op = Operation::Send;
    if !payload.is_object() {
        return Err(ValidationError::new(op, "$", "must be an object"));
    }
    let to = require_object(payload, "to", op)?;
    require_non_empty_str(to, "id", "to.id", op)?;
    let object = require_object(payload, "object", op)?;
    require_non_empty_str(object, "type", "object.type", op)?;
    match object.get("content") {
        Some(Value::String(_)) => {}
        Some(_) => return Err(ValidationError::new(op, "object.content", "must be a string")),
        None => return Err(ValidationError::new(op, "object.content", "is required")),
    }
    match object.get("name") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => return Err(ValidationError::new(op, "object.name", "must be a string")),
    }
    Ok(())
}

fn validate_event(payload: &Value) -> Result<(), ValidationError> {
    let op = Operation::Event;
    if !payload.is_object() {
        return Err(ValidationError::new(op, "$", "must be an object"));
    }
    require_non_empty_str(payload, "correlationKey", "correlationKey", op)?;
    require_non_empty_str(payload, "requestType", "requestType", op)?;
    require_object(payload, "application", op)?;
    require_object(payload, "user", op)?;
    require_object(payload, "slots", op)?;
    match payload.get("intentName") {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(ValidationError::new(op, "intentName", "must be a string")),
    }
}

fn require_object<'a>(
    parent: &'a Value,
    key: &str,
    op: Operation,
) -> Result<&'a Value, ValidationError> {
    match parent.get(key) {
        Some(v) if v.is_object() => Ok(v),
        Some(_) => Err(ValidationError::new(op, key, "must be an object")),
        None => Err(ValidationError::new(op, key, "is required")),
    }
}

fn require_non_empty_str(
    parent: &Value,
    key: &str,
    path: &str,
    op: Operation,
) -> Result<(), ValidationError> {
    match parent.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(()),
        Some(Value::String(_)) => Err(ValidationError::new(op, path, "must not be empty")),
        Some(_) => Err(ValidationError::new(op, path, "must be a string")),
        None => Err(ValidationError::new(op, path, "is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn send_accepts_minimal_note() {
        let p = json!({ "to": { "id": "k1" }, "object": { "type": "Note", "content": "" } });
        assert!(validate(&p, Operation::Send).is_ok());
    }

    #[test]
    fn send_accepts_other_types_structurally() {
        // content type policy belongs to the formatter, not the schema
        let p = json!({ "to": { "id": "k1" }, "object": { "type": "Image", "content": "x" } });
        assert!(validate(&p, Operation::Send).is_ok());
    }

    #[test]
    fn send_rejects_missing_recipient() {
        let p = json!({ "object": { "type": "Note", "content": "hi" } });
        let err = validate(&p, Operation::Send).unwrap_err();
        assert_eq!(err.path, "to");
    }

    #[test]
    fn send_rejects_empty_recipient_id() {
        let p = json!({ "to": { "id": "  " }, "object": { "type": "Note", "content": "hi" } });
        let err = validate(&p, Operation::Send).unwrap_err();
        assert_eq!(err.path, "to.id");
        assert_eq!(err.reason, "must not be empty");
    }

    #[test]
    fn send_rejects_non_string_content_and_name() {
        let p = json!({ "to": { "id": "k" }, "object": { "type": "Note", "content": 3 } });
        assert_eq!(validate(&p, Operation::Send).unwrap_err().path, "object.content");
        let p = json!({ "to": { "id": "k" }, "object": { "type": "Note", "content": "a", "name": 1 } });
        assert_eq!(validate(&p, Operation::Send).unwrap_err().path, "object.name");
    }

    #[test]
    fn event_requires_objects_for_application_user_slots() {
        let good = json!({
            "application": { "id": "a" },
            "requestType": "LaunchRequest",
            "intentName": "LaunchRequest",
            "slots": {},
            "user": { "id": "u" },
            "correlationKey": "k"
        });
        assert!(validate(&good, Operation::Event).is_ok());

        let mut bad = good.clone();
        bad["user"] = json!("u");
        let err = validate(&bad, Operation::Event).unwrap_err();
        assert_eq!(err.path, "user");
        assert_eq!(err.to_string(), "event: user must be an object");
    }
}
