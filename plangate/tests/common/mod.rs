#![allow(dead_code)]

use serde_json::{json, Value};

use plangate::config::ProviderConfig;
use plangate::credentials::Secret;

pub fn provider_config(model: &str, base_url: String) -> ProviderConfig {
    ProviderConfig {
        model: model.to_string(),
        base_url,
        max_tokens: None,
    }
}

pub fn secret(value: &str) -> Secret {
    Secret::new(value).expect("non-blank test secret")
}

/// A complete OpenAI `chat.completion` body.
pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}

pub fn anthropic_body(text: &str) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "claude-test",
        "content": [
            { "type": "text", "text": text }
        ],
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 1, "output_tokens": 1 }
    })
}

pub fn gemini_body(text: &str) -> Value {
    json!({
        "candidates": [
            {
                "content": {
                    "role": "model",
                    "parts": [ { "text": text } ]
                },
                "finishReason": "STOP"
            }
        ]
    })
}

pub fn vendor_error_body(message: &str, error_type: &str) -> Value {
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "param": Value::Null,
            "code": error_type
        }
    })
}
