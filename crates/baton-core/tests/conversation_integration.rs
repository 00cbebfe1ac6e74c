//! Conversation Format Integration Tests
//!
//! Detection and conversion across every provider pair

use baton_core::conversation::{convert_messages, decode_messages, detect_format, encode_messages};
use baton_llm::{MessageRole, Part, ProviderKind, ToolCall, Turn};
use serde_json::json;

fn transcript() -> Vec<Turn> {
    vec![
        Turn::user("What's the weather in Oslo?"),
        Turn::assistant_with_calls(
            None,
            vec![ToolCall::new("call_1", "weather", json!({"city": "Oslo"}))],
        ),
        Turn::tool_results(vec![Part::tool_result("call_1", "weather", "sunny", false)]),
        Turn::assistant("It is sunny in Oslo."),
    ]
}

fn roles(turns: &[Turn]) -> Vec<MessageRole> {
    turns.iter().map(|t| t.role).collect()
}

fn encoded(provider: ProviderKind) -> Vec<u8> {
    serde_json::to_vec(&encode_messages(&transcript(), provider)).unwrap()
}

#[test]
fn test_detect_round_trips_every_provider() {
    for provider in ProviderKind::ALL {
        assert_eq!(
            detect_format(&encoded(provider)),
            provider,
            "detection of {provider}"
        );
    }
}

#[test]
fn test_double_conversion_preserves_turns() {
    for from in ProviderKind::ALL {
        let original = encoded(from);
        let canonical = decode_messages(&original, from);
        assert_eq!(canonical.len(), 4, "decode of {from}");

        for to in ProviderKind::ALL {
            let there = convert_messages(&original, from, to);
            let back = convert_messages(&there, to, from);
            let decoded = decode_messages(&back, from);

            assert_eq!(decoded.len(), canonical.len(), "{from} -> {to} -> {from}");
            assert_eq!(roles(&decoded), roles(&canonical), "{from} -> {to} -> {from}");
        }
    }
}

#[test]
fn test_conversion_keeps_tool_call_ids() {
    let anthropic = encoded(ProviderKind::Anthropic);
    let openai = convert_messages(&anthropic, ProviderKind::Anthropic, ProviderKind::OpenAi);
    let turns = decode_messages(&openai, ProviderKind::OpenAi);

    let calls = turns[1].tool_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "call_1");
    assert_eq!(calls[0].arguments, json!({"city": "Oslo"}));
    assert_eq!(turns[3].text(), "It is sunny in Oslo.");
}
