//! Outbound formatting: `OutboundCommand` -> `PlatformResponse`.

use crate::activity::{ContentType, OutboundCommand};
use crate::alexa::protocol::{Card, OutputSpeech, PlatformResponse};
use crate::error::AdapterError;

const SSML_OPEN: &str = "<speak>";
const SSML_CLOSE: &str = "</speak>";

/// SSML when the trimmed content is wrapped in `<speak>...</speak>`, plain text otherwise.
/// Either way the raw content is carried unchanged.
pub fn classify_speech(content: &str) -> OutputSpeech {
    let trimmed = content.trim();
    if trimmed.starts_with(SSML_OPEN) && trimmed.ends_with(SSML_CLOSE) {
        OutputSpeech::Ssml {
            ssml: content.to_string(),
        }
    } else {
        OutputSpeech::PlainText {
            text: content.to_string(),
        }
    }
}

/// Build the platform response for a command. Only `Note` content is accepted.
/// Sessions always end: the adapter models single-turn interactions.
pub fn format_response(command: &OutboundCommand) -> Result<PlatformResponse, AdapterError> {
    if command.object.content_type != ContentType::Note {
        return Err(AdapterError::UnsupportedContentType(
            command.object.content_type.to_string(),
        ));
    }
    let content = &command.object.content;
    Ok(PlatformResponse {
        output_speech: classify_speech(content),
        card: Card::Simple {
            title: command.object.name.clone().unwrap_or_default(),
            content: content.clone(),
        },
        should_end_session: true,
    })
}
