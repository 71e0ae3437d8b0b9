use llm::{ChatClient, ChatConfig, GenerationError, Generator};
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "llama-3.1-8b-instruct",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn client_for(server: &MockServer) -> ChatClient {
    let config = ChatConfig::default()
        .with_base_url(format!("{}/v1", server.uri()))
        .with_api_key("test-key");
    ChatClient::new(config).unwrap()
}

#[tokio::test]
async fn generate_returns_trimmed_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(bearer_token("test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama-3.1-8b-instruct",
            "max_tokens": 20,
            "messages": [
                {"role": "system"},
                {"role": "user", "content": "Fire + Water"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  💨Steam\n".into())))
        .expect(1)
        .mount(&server)
        .await;

    let text = client_for(&server).generate("Fire + Water").await.unwrap();
    assert_eq!(text, "💨Steam");
}

#[tokio::test]
async fn server_error_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
        .mount(&server)
        .await;

    let err = client_for(&server).generate("Fire + Water").await.unwrap_err();
    match err {
        GenerationError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "model loading");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn null_or_blank_content_is_empty_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(serde_json::Value::Null)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("   ".into())))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.generate("Fire + Water").await;
    assert!(matches!(first, Err(GenerationError::EmptyCompletion(_))));
    let second = client.generate("Fire + Water").await;
    assert!(matches!(second, Err(GenerationError::EmptyCompletion(_))));
}

#[tokio::test]
async fn malformed_body_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server).generate("Fire + Water").await.unwrap_err();
    assert!(matches!(err, GenerationError::Network(_)));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let config = ChatConfig::default()
        .with_base_url("http://127.0.0.1:1/v1")
        .with_timeout(2);
    let client = ChatClient::new(config).unwrap();
    let err = client.generate("Fire + Water").await.unwrap_err();
    assert!(matches!(err, GenerationError::Network(_)));
}
