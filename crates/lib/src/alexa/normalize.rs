//! Inbound normalization: platform request -> `InboundEvent`.

use crate::activity::InboundEvent;
use crate::alexa::protocol::RequestEnvelope;
use crate::error::AdapterError;
use serde_json::Value;

const INTENT_REQUEST: &str = "IntentRequest";

/// Parse a raw webhook body as JSON.
pub fn parse_body(bytes: &[u8]) -> Result<Value, AdapterError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Build an event from a parsed request body with a freshly generated correlation key.
///
/// `request.type` and `session.{application,user}` are required. Missing intent name or slots
/// are not errors: the name is left absent and slots default to an empty map.
pub fn normalize(body: &Value) -> Result<InboundEvent, AdapterError> {
    let envelope = RequestEnvelope::deserialize_from(body)?;
    let request_type = envelope.request.typ;
    let (intent_name, slots) = match envelope.request.intent {
        Some(intent) => (intent.name, intent.slots.unwrap_or_default()),
        None => (None, Default::default()),
    };
    let intent_name = if request_type == INTENT_REQUEST {
        intent_name
    } else {
        Some(request_type.clone())
    };
    Ok(InboundEvent {
        application: envelope.session.application,
        intent_name,
        request_type,
        slots,
        user: envelope.session.user,
        correlation_key: uuid::Uuid::new_v4().to_string(),
    })
}

impl RequestEnvelope {
    fn deserialize_from(body: &Value) -> Result<Self, AdapterError> {
        <RequestEnvelope as serde::Deserialize>::deserialize(body)
            .map_err(|e| AdapterError::Normalization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(request: Value) -> Value {
        json!({
            "request": request,
            "session": { "application": { "id": "a" }, "user": { "id": "u" } }
        })
    }

    #[test]
    fn intent_request_uses_intent_name() {
        let ev = normalize(&body(json!({
            "type": "IntentRequest",
            "intent": { "name": "Hello", "slots": {} }
        })))
        .unwrap();
        assert_eq!(ev.request_type, "IntentRequest");
        assert_eq!(ev.intent_name.as_deref(), Some("Hello"));
        assert!(ev.slots.is_empty());
        assert_eq!(ev.application, json!({ "id": "a" }));
        assert_eq!(ev.user, json!({ "id": "u" }));
        assert!(!ev.correlation_key.is_empty());
    }

    #[test]
    fn other_request_types_name_themselves() {
        for typ in ["LaunchRequest", "SessionEndedRequest", "CanFulfillIntentRequest"] {
            let ev = normalize(&body(json!({ "type": typ }))).unwrap();
            assert_eq!(ev.intent_name.as_deref(), Some(typ));
        }
    }

    #[test]
    fn non_intent_request_ignores_stray_intent_name() {
        let ev = normalize(&body(json!({ "type": "LaunchRequest", "intent": { "name": "X" } }))).unwrap();
        assert_eq!(ev.intent_name.as_deref(), Some("LaunchRequest"));
    }

    #[test]
    fn intent_request_without_name_leaves_it_absent() {
        let ev = normalize(&body(json!({ "type": "IntentRequest" }))).unwrap();
        assert_eq!(ev.intent_name, None);
        let ev = normalize(&body(json!({ "type": "IntentRequest", "intent": {} }))).unwrap();
        assert_eq!(ev.intent_name, None);
    }

    #[test]
    fn slots_are_carried_through() {
        let ev = normalize(&body(json!({
            "type": "IntentRequest",
            "intent": { "name": "Weather", "slots": { "city": { "name": "city", "value": "Oslo" } } }
        })))
        .unwrap();
        assert_eq!(ev.slots["city"]["value"], "Oslo");
    }

    #[test]
    fn correlation_keys_are_fresh() {
        let b = body(json!({ "type": "LaunchRequest" }));
        let a = normalize(&b).unwrap();
        let c = normalize(&b).unwrap();
        assert_ne!(a.correlation_key, c.correlation_key);
    }

    #[test]
    fn missing_request_type_or_session_is_a_normalization_error() {
        let err = normalize(&json!({ "request": {}, "session": { "application": {}, "user": {} } }))
            .unwrap_err();
        assert!(matches!(err, AdapterError::Normalization(_)));
        let err = normalize(&json!({ "request": { "type": "LaunchRequest" } })).unwrap_err();
        assert!(matches!(err, AdapterError::Normalization(_)));
    }

    #[test]
    fn parse_body_rejects_non_json() {
        assert!(matches!(parse_body(b"not json"), Err(AdapterError::Parse(_))));
        assert!(parse_body(br#"{"a":1}"#).is_ok());
    }
}
