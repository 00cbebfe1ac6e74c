//! Wire-format detection
//!
//! Stored transcripts are JSON arrays of provider messages. The format is
//! inferred from message structure alone, never from file location.

use baton_llm::ProviderKind;
use serde_json::Value;

/// Anthropic content block types
const ANTHROPIC_BLOCKS: [&str; 4] = ["text", "tool_use", "tool_result", "thinking"];

/// OpenAI typed content part types
const OPENAI_PARTS: [&str; 2] = ["input_text", "output_text"];

/// Infer the wire format of a stored transcript
///
/// Messages are inspected in order and the first decisive one wins. Invalid
/// JSON, an empty list, or a shape that matches nothing gives `Unknown`.
pub fn detect_format(data: &[u8]) -> ProviderKind {
    let Ok(Value::Array(messages)) = serde_json::from_slice::<Value>(data) else {
        return ProviderKind::Unknown;
    };

    messages
        .iter()
        .find_map(detect_message)
        .unwrap_or(ProviderKind::Unknown)
}

fn detect_message(message: &Value) -> Option<ProviderKind> {
    let object = message.as_object()?;

    if object.get("parts").is_some_and(Value::is_array) {
        return Some(ProviderKind::Gemini);
    }

    match object.get("content") {
        Some(Value::Array(blocks)) => blocks.iter().find_map(detect_block),
        Some(Value::String(_)) => Some(ProviderKind::OpenAiCompatible),
        _ if object.contains_key("tool_calls") || object.contains_key("tool_call_id") => {
            Some(ProviderKind::OpenAiCompatible)
        }
        _ => None,
    }
}

fn detect_block(block: &Value) -> Option<ProviderKind> {
    let kind = block.get("type")?.as_str()?;
    if ANTHROPIC_BLOCKS.contains(&kind) {
        Some(ProviderKind::Anthropic)
    } else if OPENAI_PARTS.contains(&kind) {
        Some(ProviderKind::OpenAi)
    } else {
        None
    }
}

/// Whether a transcript stored as `detected` can be continued with `configured`
///
/// `OpenAiCompatible` data is readable by Anthropic models but not the
/// other way around.
pub fn is_compatible(detected: ProviderKind, configured: ProviderKind) -> bool {
    use ProviderKind::*;

    detected == configured
        || detected == Unknown
        || matches!(
            (detected, configured),
            (OpenAi, OpenAiCompatible) | (OpenAiCompatible, OpenAi) | (OpenAiCompatible, Anthropic)
        )
}
