//! Normalized message types exchanged between the adapter and its consumer.
//!
//! Inbound: one `InboundEvent` per platform request. Outbound: an `OutboundCommand` addressed
//! to the event's correlation key; `send` answers with a `SendReceipt`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A platform request reduced to the fields a consumer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    /// Platform application descriptor (e.g. `{ "applicationId": ... }`).
    pub application: Value,
    /// Intent name for `IntentRequest`, otherwise the request type itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_name: Option<String>,
    pub request_type: String,
    #[serde(default)]
    pub slots: Map<String, Value>,
    pub user: Value,
    /// Address replies to this key (`to.id` of the outbound command).
    pub correlation_key: String,
}

/// Content type of an outbound object. Only `Note` is deliverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    Note,
    Other(String),
}

impl From<String> for ContentType {
    fn from(s: String) -> Self {
        if s == "Note" {
            ContentType::Note
        } else {
            ContentType::Other(s)
        }
    }
}

impl From<ContentType> for String {
    fn from(t: ContentType) -> Self {
        match t {
            ContentType::Note => "Note".to_string(),
            ContentType::Other(s) => s,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Note => f.write_str("Note"),
            ContentType::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentObject {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub content: String,
    /// Card title; empty when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Reply to a previously emitted `InboundEvent`: `{ to: { id }, object: { type, content, name? } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundCommand {
    pub to: Recipient,
    pub object: ContentObject,
}

impl OutboundCommand {
    /// A `Note` addressed to `correlation_key`.
    pub fn note(correlation_key: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            to: Recipient {
                id: correlation_key.into(),
            },
            object: ContentObject {
                content_type: ContentType::Note,
                content: content.into(),
                name: None,
            },
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.object.name = Some(title.into());
        self
    }
}

/// Result of a successful `send`: `{ "type": "sent", "serviceID": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(rename = "serviceID")]
    pub service_id: String,
}

impl SendReceipt {
    pub fn sent(service_id: impl Into<String>) -> Self {
        Self {
            typ: "sent".to_string(),
            service_id: service_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_type_parses_note_and_others() {
        let cmd: OutboundCommand = serde_json::from_value(json!({
            "to": { "id": "k" },
            "object": { "type": "Image", "content": "x" }
        }))
        .unwrap();
        assert_eq!(cmd.object.content_type, ContentType::Other("Image".to_string()));
        let cmd: OutboundCommand = serde_json::from_value(json!({
            "to": { "id": "k" },
            "object": { "type": "Note", "content": "x", "name": "T" }
        }))
        .unwrap();
        assert_eq!(cmd.object.content_type, ContentType::Note);
        assert_eq!(cmd.object.name.as_deref(), Some("T"));
    }

    #[test]
    fn note_builder_serializes_to_wire_shape() {
        let v = serde_json::to_value(OutboundCommand::note("k1", "hello").with_title("Hi")).unwrap();
        assert_eq!(
            v,
            json!({ "to": { "id": "k1" }, "object": { "type": "Note", "content": "hello", "name": "Hi" } })
        );
    }

    #[test]
    fn receipt_wire_shape() {
        let v = serde_json::to_value(SendReceipt::sent("alexa")).unwrap();
        assert_eq!(v, json!({ "type": "sent", "serviceID": "alexa" }));
    }

    #[test]
    fn event_omits_absent_intent_name() {
        let ev = InboundEvent {
            application: json!({}),
            intent_name: None,
            request_type: "IntentRequest".to_string(),
            slots: Map::new(),
            user: json!({}),
            correlation_key: "k".to_string(),
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert!(v.get("intentName").is_none());
        assert_eq!(v["correlationKey"], "k");
    }
}
