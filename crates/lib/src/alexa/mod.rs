//! Voice platform (Alexa-style) wire format.
//!
//! `normalize` turns an intent request into an [`InboundEvent`](crate::activity::InboundEvent);
//! `format` turns an outbound command into the speech/card response the platform expects.

mod format;
mod normalize;
mod protocol;

pub use format::{classify_speech, format_response};
pub use normalize::{normalize, parse_body};
pub use protocol::{Card, Intent, OutputSpeech, PlatformResponse, RequestBody, RequestEnvelope, SessionBody};
