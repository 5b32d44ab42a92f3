use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use plangate::credentials::{CredentialCache, CredentialGate, RemoteCredentialGate};
use plangate::error::PlangateError;
use plangate::llm::Provider;

fn gate(server: &MockServer, token: Option<&str>) -> RemoteCredentialGate {
    RemoteCredentialGate::new(
        reqwest::Client::new(),
        format!("{}/api/keys", server.uri()),
        token.map(str::to_string),
    )
}

#[tokio::test]
async fn test_remote_gate_reads_keys_with_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/keys"))
        .and(header("authorization", "Bearer service-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "openai": "sk-openai",
            "anthropic": "",
            "gemini": "gm-key"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = gate(&server, Some("service-token"))
        .get_credentials()
        .await
        .unwrap();

    assert_eq!(
        credentials.get(Provider::OpenAi).map(|s| s.expose()),
        Some("sk-openai")
    );
    assert!(!credentials.contains(Provider::Anthropic));
    assert_eq!(
        credentials.providers(),
        vec![Provider::OpenAi, Provider::Gemini]
    );
}

#[tokio::test]
async fn test_remote_gate_error_status_is_config_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/keys"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = gate(&server, None).get_credentials().await.unwrap_err();

    match err {
        PlangateError::Config(message) => assert_eq!(message, "Key service returned HTTP 503"),
        other => panic!("Expected config error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_remote_gate_malformed_body_is_config_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/keys"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = gate(&server, None).get_credentials().await.unwrap_err();

    assert!(matches!(err, PlangateError::Config(_)), "got: {err:?}");
}

#[tokio::test]
async fn test_cache_calls_key_service_once_for_concurrent_callers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/keys"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "openai": "sk-openai" }))
                .set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(CredentialCache::new(Arc::new(gate(&server, None))));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get().await })
        })
        .collect();

    for handle in handles {
        let credentials = handle.await.unwrap().unwrap();
        assert!(credentials.contains(Provider::OpenAi));
    }

    // Served from the cache, the mock's expect(1) still holds.
    cache.get().await.unwrap();
    assert_eq!(cache.fetch_count(), 1);
}

#[tokio::test]
async fn test_cache_keeps_failed_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/keys"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let cache = CredentialCache::new(Arc::new(gate(&server, None)));

    assert!(cache.get().await.is_err());
    assert!(cache.get().await.is_err());
    assert_eq!(cache.fetch_count(), 1);
    assert!(!cache.is_ready());
}
