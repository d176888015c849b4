//! Request and response payloads exchanged with the voice platform.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Webhook body: `{ "request": { "type", "intent"? }, "session": { "application", "user" } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    pub request: RequestBody,
    pub session: SessionBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestBody {
    #[serde(rename = "type")]
    pub typ: String,
    /// Present for `IntentRequest`.
    #[serde(default)]
    pub intent: Option<Intent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Intent {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slots: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionBody {
    pub application: Value,
    pub user: Value,
}

/// Spoken part of the response. Wire: `{ "type": "PlainText", "text" }` or `{ "type": "SSML", "ssml" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    PlainText { text: String },
    #[serde(rename = "SSML")]
    Ssml { ssml: String },
}

/// Visual card shown in the companion app. Wire: `{ "type": "Simple", "title", "content" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Card {
    Simple { title: String, content: String },
}

/// Response body returned to the platform for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformResponse {
    pub output_speech: OutputSpeech,
    pub card: Card,
    pub should_end_session: bool,
}
