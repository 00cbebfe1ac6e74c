//! Conversion between provider wire formats
//!
//! Every format decodes into canonical [`Turn`]s and encodes back out of
//! them. Role mapping per format:
//!
//! | canonical | openai / compatible | anthropic | gemini     |
//! |-----------|---------------------|-----------|------------|
//! | system    | system              | system    | system     |
//! | user      | user                | user      | user       |
//! | assistant | assistant           | assistant | model      |
//! | tool      | tool (one per call) | user (only `tool_result` blocks) | function |

use super::format::detect_format;
use baton_llm::{MessageRole, Part, ProviderKind, Turn};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::warn;

/// Re-encode a stored transcript for another provider
///
/// Never fails: undecodable input converts to an empty transcript.
pub fn convert_messages(data: &[u8], from: ProviderKind, to: ProviderKind) -> Vec<u8> {
    let turns = decode_messages(data, from);
    let encoded = encode_messages(&turns, to);
    serde_json::to_vec_pretty(&encoded).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to serialize converted transcript");
        b"[]".to_vec()
    })
}

/// Decode a stored transcript into canonical turns
///
/// `Unknown` falls back to structural detection.
pub fn decode_messages(data: &[u8], format: ProviderKind) -> Vec<Turn> {
    let messages = match serde_json::from_slice::<Value>(data) {
        Ok(Value::Array(messages)) => messages,
        Ok(_) => {
            warn!(format = %format, "Transcript is not a message list; starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(format = %format, error = %e, "Transcript is not valid JSON; starting empty");
            return Vec::new();
        }
    };
    if messages.is_empty() {
        return Vec::new();
    }

    let format = match format {
        ProviderKind::Unknown => detect_format(data),
        known => known,
    };

    match format {
        ProviderKind::OpenAi | ProviderKind::OpenAiCompatible => decode_chat(&messages),
        ProviderKind::Anthropic => decode_anthropic(&messages),
        ProviderKind::Gemini => decode_gemini(&messages),
        ProviderKind::Unknown => {
            warn!(messages = messages.len(), "Unrecognised transcript format; starting empty");
            Vec::new()
        }
    }
}

/// Encode canonical turns in a provider's wire format
///
/// `Unknown` encodes as chat-completions messages.
pub fn encode_messages(turns: &[Turn], format: ProviderKind) -> Value {
    let mut dropped = 0usize;
    let messages = match format {
        ProviderKind::OpenAi => encode_openai(turns, &mut dropped),
        ProviderKind::OpenAiCompatible | ProviderKind::Unknown => encode_compatible(turns),
        ProviderKind::Anthropic => encode_anthropic(turns),
        ProviderKind::Gemini => encode_gemini(turns),
    };
    if dropped > 0 {
        warn!(dropped, format = %format, "Dropped parts with no equivalent in target format");
    }
    Value::Array(messages)
}

// ---------------------------------------------------------------------------
// OpenAI and chat-completions
// ---------------------------------------------------------------------------

fn encode_tool_calls(parts: &[Part]) -> Vec<Value> {
    parts
        .iter()
        .filter_map(|p| match p {
            Part::ToolCall {
                id,
                name,
                arguments,
            } => Some(json!({
                "id": id,
                "type": "function",
                "function": {"name": name, "arguments": arguments.to_string()},
            })),
            _ => None,
        })
        .collect()
}

fn encode_tool_messages(turn: &Turn, content: impl Fn(&str) -> Value) -> Vec<Value> {
    turn.parts
        .iter()
        .filter_map(|p| match p {
            Part::ToolResult {
                call_id,
                name,
                content: text,
                ..
            } => Some(json!({
                "role": "tool",
                "tool_call_id": call_id,
                "name": name,
                "content": content(text),
            })),
            _ => None,
        })
        .collect()
}

fn encode_openai(turns: &[Turn], dropped: &mut usize) -> Vec<Value> {
    let mut messages = Vec::with_capacity(turns.len());
    for turn in turns {
        if turn.role == MessageRole::Tool {
            messages.extend(encode_tool_messages(turn, |text| {
                json!([{"type": "input_text", "text": text}])
            }));
            continue;
        }

        let part_type = if turn.role == MessageRole::Assistant {
            "output_text"
        } else {
            "input_text"
        };
        let mut content = Vec::new();
        for part in &turn.parts {
            match part {
                Part::Text { text } => content.push(json!({"type": part_type, "text": text})),
                Part::Thinking { .. } => *dropped += 1,
                _ => {}
            }
        }

        let mut message = Map::new();
        message.insert("role".into(), json!(turn.role.as_str()));
        message.insert("content".into(), Value::Array(content));
        let calls = encode_tool_calls(&turn.parts);
        if !calls.is_empty() {
            message.insert("tool_calls".into(), Value::Array(calls));
        }
        messages.push(Value::Object(message));
    }
    messages
}

fn encode_compatible(turns: &[Turn]) -> Vec<Value> {
    let mut messages = Vec::with_capacity(turns.len());
    for turn in turns {
        if turn.role == MessageRole::Tool {
            messages.extend(encode_tool_messages(turn, |text| json!(text)));
            continue;
        }

        let mut message = Map::new();
        message.insert("role".into(), json!(turn.role.as_str()));
        let calls = encode_tool_calls(&turn.parts);
        let text = turn.text();
        let content = if text.is_empty() && !calls.is_empty() {
            Value::Null
        } else {
            json!(text)
        };
        message.insert("content".into(), content);

        let thinking = thinking_text(turn);
        if !thinking.is_empty() {
            message.insert("reasoning_content".into(), json!(thinking));
        }
        if !calls.is_empty() {
            message.insert("tool_calls".into(), Value::Array(calls));
        }
        messages.push(Value::Object(message));
    }
    messages
}

fn decode_chat(messages: &[Value]) -> Vec<Turn> {
    let mut turns: Vec<Turn> = Vec::with_capacity(messages.len());
    let mut call_names = HashMap::new();

    for message in messages {
        let Some(role) = parse_role(message, &[]) else {
            continue;
        };

        let text = match message.get("content") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(blocks)) => blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        };

        if role == MessageRole::Tool {
            let call_id = str_field(message, "tool_call_id");
            let name = message
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| call_names.get(&call_id).cloned())
                .unwrap_or_default();
            let part = Part::tool_result(call_id, name, text, false);
            push_tool_result(&mut turns, part);
            continue;
        }

        let mut parts = Vec::new();
        if let Some(thinking) = message.get("reasoning_content").and_then(Value::as_str) {
            if !thinking.is_empty() {
                parts.push(Part::Thinking {
                    text: thinking.to_string(),
                });
            }
        }
        if !text.is_empty() {
            parts.push(Part::text(text));
        }
        if let Some(calls) = message.get("tool_calls").and_then(Value::as_array) {
            for call in calls {
                let id = str_field(call, "id");
                let function = call.get("function").unwrap_or(&Value::Null);
                let name = str_field(function, "name");
                let arguments = match function.get("arguments") {
                    Some(Value::String(raw)) => {
                        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
                    }
                    Some(other) => other.clone(),
                    None => json!({}),
                };
                call_names.insert(id.clone(), name.clone());
                parts.push(Part::ToolCall {
                    id,
                    name,
                    arguments,
                });
            }
        }
        turns.push(Turn::new(role, parts));
    }
    turns
}

// ---------------------------------------------------------------------------
// Anthropic
// ---------------------------------------------------------------------------

fn encode_anthropic(turns: &[Turn]) -> Vec<Value> {
    turns
        .iter()
        .map(|turn| {
            let role = match turn.role {
                MessageRole::Tool => "user",
                other => other.as_str(),
            };
            let blocks: Vec<Value> = turn
                .parts
                .iter()
                .map(|part| match part {
                    Part::Text { text } => json!({"type": "text", "text": text}),
                    Part::Thinking { text } => json!({"type": "thinking", "thinking": text}),
                    Part::ToolCall {
                        id,
                        name,
                        arguments,
                    } => json!({"type": "tool_use", "id": id, "name": name, "input": arguments}),
                    Part::ToolResult {
                        call_id,
                        content,
                        is_error,
                        ..
                    } => json!({
                        "type": "tool_result",
                        "tool_use_id": call_id,
                        "content": content,
                        "is_error": is_error,
                    }),
                })
                .collect();
            json!({"role": role, "content": blocks})
        })
        .collect()
}

fn decode_anthropic(messages: &[Value]) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(messages.len());
    let mut call_names = HashMap::new();

    for message in messages {
        let Some(mut role) = parse_role(message, &[]) else {
            continue;
        };

        let blocks = match message.get("content") {
            Some(Value::Array(blocks)) => blocks.clone(),
            Some(Value::String(text)) => vec![json!({"type": "text", "text": text})],
            _ => Vec::new(),
        };

        let mut parts = Vec::with_capacity(blocks.len());
        for block in &blocks {
            match block.get("type").and_then(Value::as_str) {
                Some("text") => parts.push(Part::text(str_field(block, "text"))),
                Some("thinking") => parts.push(Part::Thinking {
                    text: str_field(block, "thinking"),
                }),
                Some("tool_use") => {
                    let id = str_field(block, "id");
                    let name = str_field(block, "name");
                    call_names.insert(id.clone(), name.clone());
                    parts.push(Part::ToolCall {
                        id,
                        name,
                        arguments: block.get("input").cloned().unwrap_or_else(|| json!({})),
                    });
                }
                Some("tool_result") => {
                    let call_id = str_field(block, "tool_use_id");
                    let name = call_names.get(&call_id).cloned().unwrap_or_default();
                    let content = match block.get("content") {
                        Some(Value::String(s)) => s.clone(),
                        Some(Value::Array(items)) => items
                            .iter()
                            .filter_map(|i| i.get("text").and_then(Value::as_str))
                            .collect::<Vec<_>>()
                            .join("\n"),
                        _ => String::new(),
                    };
                    let is_error = block
                        .get("is_error")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    parts.push(Part::tool_result(call_id, name, content, is_error));
                }
                _ => {}
            }
        }

        let only_results = !parts.is_empty()
            && parts.iter().all(|p| matches!(p, Part::ToolResult { .. }));
        if role == MessageRole::User && only_results {
            role = MessageRole::Tool;
        }
        turns.push(Turn::new(role, parts));
    }
    turns
}

// ---------------------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------------------

fn encode_gemini(turns: &[Turn]) -> Vec<Value> {
    turns
        .iter()
        .map(|turn| {
            let role = match turn.role {
                MessageRole::Assistant => "model",
                MessageRole::Tool => "function",
                other => other.as_str(),
            };
            let parts: Vec<Value> = turn
                .parts
                .iter()
                .map(|part| match part {
                    Part::Text { text } => json!({"text": text}),
                    Part::Thinking { text } => json!({"text": text, "thought": true}),
                    Part::ToolCall {
                        id,
                        name,
                        arguments,
                    } => json!({"functionCall": {"id": id, "name": name, "args": arguments}}),
                    Part::ToolResult {
                        call_id,
                        name,
                        content,
                        is_error,
                    } => json!({"functionResponse": {
                        "id": call_id,
                        "name": name,
                        "response": {"content": content, "is_error": is_error},
                    }}),
                })
                .collect();
            json!({"role": role, "parts": parts})
        })
        .collect()
}

const GEMINI_ROLES: &[(&str, MessageRole)] = &[
    ("model", MessageRole::Assistant),
    ("function", MessageRole::Tool),
];

fn decode_gemini(messages: &[Value]) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(messages.len());
    // Calls awaiting a response, in order; Gemini may omit ids.
    let mut pending: Vec<(String, String)> = Vec::new();
    let mut synthesized = 0usize;

    for message in messages {
        let Some(role) = parse_role(message, GEMINI_ROLES) else {
            continue;
        };

        let Some(items) = message.get("parts").and_then(Value::as_array) else {
            turns.push(Turn::new(role, Vec::new()));
            continue;
        };

        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            if let Some(call) = item.get("functionCall") {
                let name = str_field(call, "name");
                let id = match call.get("id").and_then(Value::as_str) {
                    Some(id) => id.to_string(),
                    None => {
                        synthesized += 1;
                        format!("call_{synthesized}")
                    }
                };
                pending.push((id.clone(), name.clone()));
                parts.push(Part::ToolCall {
                    id,
                    name,
                    arguments: call.get("args").cloned().unwrap_or_else(|| json!({})),
                });
            } else if let Some(response) = item.get("functionResponse") {
                let name = str_field(response, "name");
                let call_id = match response.get("id").and_then(Value::as_str) {
                    Some(id) => {
                        pending.retain(|(pending_id, _)| pending_id != id);
                        id.to_string()
                    }
                    None => match pending.iter().position(|(_, n)| *n == name) {
                        Some(index) => pending.remove(index).0,
                        None => {
                            synthesized += 1;
                            format!("call_{synthesized}")
                        }
                    },
                };
                let body = response.get("response").unwrap_or(&Value::Null);
                let content = match body.get("content") {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => body.to_string(),
                };
                let is_error = body
                    .get("is_error")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                parts.push(Part::tool_result(call_id, name, content, is_error));
            } else if let Some(text) = item.get("text").and_then(Value::as_str) {
                let thought = item
                    .get("thought")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if thought {
                    parts.push(Part::Thinking {
                        text: text.to_string(),
                    });
                } else {
                    parts.push(Part::text(text));
                }
            }
        }
        turns.push(Turn::new(role, parts));
    }
    turns
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_role(message: &Value, aliases: &[(&str, MessageRole)]) -> Option<MessageRole> {
    let raw = message.get("role").and_then(Value::as_str).unwrap_or("user");
    if let Some((_, role)) = aliases.iter().find(|(alias, _)| *alias == raw) {
        return Some(*role);
    }
    match raw {
        "system" | "developer" => Some(MessageRole::System),
        "user" => Some(MessageRole::User),
        "assistant" => Some(MessageRole::Assistant),
        "tool" => Some(MessageRole::Tool),
        other => {
            warn!(role = other, "Skipping message with unknown role");
            None
        }
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn thinking_text(turn: &Turn) -> String {
    turn.parts
        .iter()
        .filter_map(|p| match p {
            Part::Thinking { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_tool_result(turns: &mut Vec<Turn>, part: Part) {
    match turns.last_mut() {
        Some(last) if last.role == MessageRole::Tool => last.parts.push(part),
        _ => turns.push(Turn::tool_results(vec![part])),
    }
}
