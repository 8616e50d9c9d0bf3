// Unit tests for the OpenAI driver

use crate::OpenAILlmDriver;
use babylog_core::llm_drivers::{
    DriverRegistry, LlmCallConfig, LlmDriver, LlmRequest, ProviderConfig, ProviderType,
    ResponseFormat,
};
use babylog_core::LlmError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> LlmRequest {
    LlmRequest::new(
        "User Input: \"poo\"",
        ResponseFormat::new("activity_log_entries", json!({"type": "object"})),
    )
}

fn driver_for(server: &MockServer) -> OpenAILlmDriver {
    OpenAILlmDriver::with_base_url("test-key", format!("{}/v1/chat/completions", server.uri()))
}

#[test]
fn test_driver_debug_redacts_key() {
    let driver = OpenAILlmDriver::new("sk-secret");
    let debug = format!("{:?}", driver);
    assert!(debug.contains("OpenAILlmDriver"));
    assert!(!debug.contains("sk-secret"));
}

#[test]
fn test_from_config_uses_base_url() {
    let config = ProviderConfig::new(ProviderType::OpenAI)
        .with_api_key("test-key")
        .with_base_url("https://custom.api.com/v1/chat/completions");
    let driver = OpenAILlmDriver::from_config(&config).unwrap();
    assert_eq!(driver.api_url(), "https://custom.api.com/v1/chat/completions");
}

#[test]
fn test_register_driver() {
    let mut registry = DriverRegistry::new();
    crate::register_driver(&mut registry);
    assert!(registry.supports(ProviderType::OpenAI));
    assert!(!registry.supports(ProviderType::Gemini));
}

#[tokio::test]
async fn test_generate_sends_schema_and_reads_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "stream": false,
            "temperature": 0.0,
            "messages": [{"role": "user", "content": "User Input: \"poo\""}],
            "response_format": {
                "type": "json_schema",
                "json_schema": {"name": "activity_log_entries", "strict": false}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{
                "message": {"role": "assistant", "content": "{\"activities\": []}"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = LlmCallConfig::new("gpt-4o-mini").with_temperature(0.0);
    let response = driver_for(&server).generate(request(), &config).await.unwrap();

    assert_eq!(response.text, "{\"activities\": []}");
    assert_eq!(response.metadata.total_tokens, Some(15));
    assert_eq!(response.metadata.finish_reason.as_deref(), Some("stop"));
    assert_eq!(
        response.metadata.model.as_deref(),
        Some("gpt-4o-mini-2024-07-18")
    );
}

#[tokio::test]
async fn test_generate_null_content_is_empty_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        })))
        .mount(&server)
        .await;

    let response = driver_for(&server)
        .generate(request(), &LlmCallConfig::new("gpt-4o-mini"))
        .await
        .unwrap();
    assert_eq!(response.text, "");
}

#[tokio::test]
async fn test_generate_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = driver_for(&server)
        .generate(request(), &LlmCallConfig::new("gpt-4o-mini"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Response(ref msg) if msg.contains("429") && msg.contains("rate limited")));
}

#[tokio::test]
async fn test_generate_refusal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": null, "refusal": "I can't help"}}]
        })))
        .mount(&server)
        .await;

    let err = driver_for(&server)
        .generate(request(), &LlmCallConfig::new("gpt-4o-mini"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Response(_)));
}

#[tokio::test]
async fn test_generate_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"choices": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = ProviderConfig::new(ProviderType::OpenAI)
        .with_api_key("test-key")
        .with_base_url(format!("{}/v1/chat/completions", server.uri()))
        .with_timeout(Duration::from_millis(50));
    let driver = OpenAILlmDriver::from_config(&config).unwrap();

    let err = driver
        .generate(request(), &LlmCallConfig::new("gpt-4o-mini"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Http(ref msg) if msg.contains("timed out")));
}
