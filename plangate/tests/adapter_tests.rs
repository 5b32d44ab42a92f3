mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use plangate::llm::{
    AdapterError, AnthropicAdapter, GeminiAdapter, MessageShape, OpenAiAdapter, PromptPayload,
    ProviderAdapter,
};

use common::{
    anthropic_body, completion_body, gemini_body, provider_config, secret, vendor_error_body,
};

fn role_payload() -> PromptPayload {
    PromptPayload::build(MessageShape::RoleMessages, "You are a planner.", "todo app")
}

// ── OpenAI ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_openai_sends_system_and_user_messages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-openai"))
        .and(body_partial_json(json!({
            "model": "gpt-test",
            "messages": [
                { "role": "system", "content": "You are a planner." },
                { "role": "user", "content": "todo app" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("[]")))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new(
        reqwest::Client::new(),
        &provider_config("gpt-test", server.uri()),
    );

    let text = adapter
        .invoke(&role_payload(), &secret("sk-openai"))
        .await
        .unwrap();

    assert_eq!(text, "[]");
}

#[tokio::test]
async fn test_openai_missing_choices_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "chatcmpl-test" })))
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new(
        reqwest::Client::new(),
        &provider_config("gpt-test", server.uri()),
    );

    let err = adapter
        .invoke(&role_payload(), &secret("sk-openai"))
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::InvalidResponse(_)), "got: {err:?}");
    assert!(err.to_string().starts_with("invalid response structure"));
}

#[tokio::test]
async fn test_openai_empty_content_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("   ")))
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new(
        reqwest::Client::new(),
        &provider_config("gpt-test", server.uri()),
    );

    let err = adapter
        .invoke(&role_payload(), &secret("sk-openai"))
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::InvalidResponse(_)), "got: {err:?}");
}

#[tokio::test]
async fn test_openai_invalid_key_is_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(vendor_error_body(
            "Incorrect API key provided",
            "invalid_api_key",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new(
        reqwest::Client::new(),
        &provider_config("gpt-test", server.uri()),
    );

    let err = adapter
        .invoke(&role_payload(), &secret("sk-wrong"))
        .await
        .unwrap_err();

    match err {
        AdapterError::Authentication(message) => {
            assert_eq!(message, "Incorrect API key provided")
        }
        other => panic!("Expected authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_server_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new(
        reqwest::Client::new(),
        &provider_config("gpt-test", server.uri()),
    );

    let err = adapter
        .invoke(&role_payload(), &secret("sk-openai"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("upstream exploded"), "got: {err}");
}

#[tokio::test]
async fn test_openai_non_json_error_keeps_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway from proxy"))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new(
        reqwest::Client::new(),
        &provider_config("gpt-test", server.uri()),
    );

    let err = adapter
        .invoke(&role_payload(), &secret("sk-openai"))
        .await
        .unwrap_err();

    match err {
        AdapterError::Status { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "Bad gateway from proxy");
        }
        other => panic!("Expected status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_bad_request_mentioning_api_key_is_not_authentication() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(vendor_error_body(
            "Your api key organization does not support this model",
            "invalid_request_error",
        )))
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new(
        reqwest::Client::new(),
        &provider_config("gpt-test", server.uri()),
    );

    let err = adapter
        .invoke(&role_payload(), &secret("sk-openai"))
        .await
        .unwrap_err();

    match err {
        AdapterError::Status { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("does not support this model"));
        }
        other => panic!("Expected status error, got: {other:?}"),
    }
}

// ── Anthropic ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_anthropic_sends_system_field_and_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "sk-ant"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-test",
            "max_tokens": 4096,
            "system": "You are a planner.",
            "messages": [{ "role": "user", "content": "todo app" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_body("fn main() {}")))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = AnthropicAdapter::new(
        reqwest::Client::new(),
        &provider_config("claude-test", server.uri()),
    );

    let text = adapter
        .invoke(&role_payload(), &secret("sk-ant"))
        .await
        .unwrap();

    assert_eq!(text, "fn main() {}");
}

#[tokio::test]
async fn test_anthropic_error_status_carries_vendor_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": { "type": "overloaded_error", "message": "Overloaded" }
        })))
        .mount(&server)
        .await;

    let adapter = AnthropicAdapter::new(
        reqwest::Client::new(),
        &provider_config("claude-test", server.uri()),
    );

    let err = adapter
        .invoke(&role_payload(), &secret("sk-ant"))
        .await
        .unwrap_err();

    match err {
        AdapterError::Status { status, message } => {
            assert_eq!(status, 529);
            assert_eq!(message, "Overloaded");
        }
        other => panic!("Expected status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_anthropic_without_text_block_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "tool_use", "id": "tool_1", "name": "noop", "input": {} }]
        })))
        .mount(&server)
        .await;

    let adapter = AnthropicAdapter::new(
        reqwest::Client::new(),
        &provider_config("claude-test", server.uri()),
    );

    let err = adapter
        .invoke(&role_payload(), &secret("sk-ant"))
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::InvalidResponse(_)), "got: {err:?}");
}

// ── Gemini ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_gemini_sends_concatenated_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", "gm-key"))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": "You are a planner.\n\ntodo app" }]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("print('hi')")))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = GeminiAdapter::new(
        reqwest::Client::new(),
        &provider_config("gemini-test", server.uri()),
    );
    assert_eq!(adapter.message_shape(), MessageShape::Concatenated);

    let payload = PromptPayload::build(adapter.message_shape(), "You are a planner.", "todo app");
    let text = adapter.invoke(&payload, &secret("gm-key")).await.unwrap();

    assert_eq!(text, "print('hi')");
}

#[tokio::test]
async fn test_gemini_blocked_prompt_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let adapter = GeminiAdapter::new(
        reqwest::Client::new(),
        &provider_config("gemini-test", server.uri()),
    );

    let payload = PromptPayload::build(MessageShape::Concatenated, "sys", "user");
    let err = adapter.invoke(&payload, &secret("gm-key")).await.unwrap_err();

    assert!(err.to_string().contains("SAFETY"), "got: {err}");
}

#[tokio::test]
async fn test_gemini_forbidden_is_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let adapter = GeminiAdapter::new(
        reqwest::Client::new(),
        &provider_config("gemini-test", server.uri()),
    );

    let payload = PromptPayload::build(MessageShape::Concatenated, "sys", "user");
    let err = adapter.invoke(&payload, &secret("bad")).await.unwrap_err();

    match err {
        AdapterError::Authentication(message) => assert_eq!(message, "API key not valid"),
        other => panic!("Expected authentication error, got: {other:?}"),
    }
}
