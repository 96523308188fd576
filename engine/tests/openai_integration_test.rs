//! Integration tests for the OpenAI-compatible provider
//!
//! Runs the provider against a wiremock server standing in for the
//! `/chat/completions` endpoint.

use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use skillforge_engine::config::LLMConfig;
use skillforge_engine::llm::openai::OpenAIProvider;
use skillforge_engine::llm::{LLMError, LLMProvider, Message, ToolCall};
use skillforge_engine::tools::ToolDispatcher;

fn config_for(server: &MockServer) -> LLMConfig {
    LLMConfig {
        base_url: server.uri(),
        model: "glm-4.6".to_string(),
        ..LLMConfig::default()
    }
}

#[tokio::test]
async fn test_plain_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "glm-4.6",
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hi!"},
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAIProvider::new(config_for(&server), "test-key");
    let reply = provider
        .generate(&[Message::user("hello")], &[])
        .await
        .unwrap();

    assert_eq!(reply.text(), "Hi!");
    assert!(!reply.has_tool_calls());
    assert_eq!(provider.model(), "glm-4.6");
}

#[tokio::test]
async fn test_tools_are_advertised_and_calls_parsed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "tool_choice": "auto",
            "tools": [
                {"type": "function", "function": {"name": "list_skills_catalog"}},
                {"type": "function", "function": {"name": "get_skill_content"}},
                {"type": "function", "function": {"name": "execute_python_code"}}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "get_skill_content",
                            "arguments": "{\"name\":\"pptx\"}"
                        }
                    }]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAIProvider::new(config_for(&server), "test-key");
    let reply = provider
        .generate(&[Message::user("slides")], &ToolDispatcher::schemas())
        .await
        .unwrap();

    assert_eq!(
        reply.tool_calls,
        vec![ToolCall::new("call_abc", "get_skill_content", "{\"name\":\"pptx\"}")]
    );
}

#[tokio::test]
async fn test_tool_history_round_trips_on_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "user", "content": "go"},
                {"role": "assistant", "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "list_skills_catalog", "arguments": "{}"}
                }]},
                {"role": "tool", "tool_call_id": "call_1", "content": "{\"skills\":[]}"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "No skills."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let history = vec![
        Message::user("go"),
        Message::assistant_tool_calls(
            None,
            vec![ToolCall::new("call_1", "list_skills_catalog", "{}")],
        ),
        Message::tool_result("{\"skills\":[]}", "call_1"),
    ];

    let provider = OpenAIProvider::new(config_for(&server), "test-key");
    let reply = provider.generate(&history, &[]).await.unwrap();
    assert_eq!(reply.text(), "No skills.");
}

#[tokio::test]
async fn test_error_status_mapping() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer bad-key"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer busy-key"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer odd-key"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad tools"))
        .mount(&server)
        .await;

    let messages = [Message::user("hi")];

    let unauthorized = OpenAIProvider::new(config_for(&server), "bad-key")
        .generate(&messages, &[])
        .await;
    assert!(matches!(unauthorized, Err(LLMError::AuthenticationFailed(_))));

    let limited = OpenAIProvider::new(config_for(&server), "busy-key")
        .generate(&messages, &[])
        .await;
    assert!(matches!(limited, Err(LLMError::RateLimitExceeded)));

    let invalid = OpenAIProvider::new(config_for(&server), "odd-key")
        .generate(&messages, &[])
        .await;
    match invalid {
        Err(LLMError::InvalidRequest(text)) => assert!(text.contains("bad tools")),
        other => panic!("expected InvalidRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_body_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let result = OpenAIProvider::new(config_for(&server), "k")
        .generate(&[Message::user("hi")], &[])
        .await;
    assert!(matches!(result, Err(LLMError::ParseError(_))));
}

#[tokio::test]
async fn test_empty_choices_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let result = OpenAIProvider::new(config_for(&server), "k")
        .generate(&[Message::user("hi")], &[])
        .await;
    assert!(matches!(result, Err(LLMError::ParseError(_))));
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({"choices": []})),
        )
        .mount(&server)
        .await;

    let config = LLMConfig {
        request_timeout_secs: 1,
        ..config_for(&server)
    };
    let result = OpenAIProvider::new(config, "k")
        .generate(&[Message::user("hi")], &[])
        .await;
    assert!(matches!(result, Err(LLMError::Timeout)));
}

#[test]
fn test_missing_api_key_env() {
    let config = LLMConfig {
        api_key_env: "SKILLFORGE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
        ..LLMConfig::default()
    };
    let result = OpenAIProvider::from_env(config);
    assert!(matches!(result, Err(LLMError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn test_health_check_lists_models() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAIProvider::new(config_for(&server), "test-key");
    assert!(provider.check_health().await);
}

#[tokio::test]
async fn test_health_check_fails_on_rejection_or_missing_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(!OpenAIProvider::new(config_for(&server), "bad").check_health().await);
    assert!(!OpenAIProvider::new(config_for(&server), "").check_health().await);
}
