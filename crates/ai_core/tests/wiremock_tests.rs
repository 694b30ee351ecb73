//! Integration tests for the chat backends using WireMock
//!
//! These tests mock each vendor's HTTP API to verify request shapes, retry
//! behaviour and history bookkeeping without a real backend.

use ai_core::{
    GeminiChatModel, InferenceConfig, InferenceError, LanguageModel, LlmProvider,
    MistralChatModel, OllamaChatModel, OpenAiChatModel,
};
use domain::{ConversationHistory, MessageRole};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

// =============================================================================
// Test Helpers
// =============================================================================

fn config_for_mock(provider: LlmProvider, base_url: &str) -> InferenceConfig {
    InferenceConfig {
        provider,
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url.to_string()),
        timeout_ms: 5_000,
        max_retries: 3,
        retry_base_delay_ms: 1,
        ..Default::default()
    }
}

fn history() -> ConversationHistory {
    ConversationHistory::new("You are a test assistant", 10).unwrap()
}

fn completion_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

// =============================================================================
// OpenAI
// =============================================================================

mod openai {
    use super::*;

    #[tokio::test]
    async fn converse_appends_both_turns() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "You are a test assistant"},
                    {"role": "user", "content": "Hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_response("Hi there!")))
            .expect(1)
            .mount(&server)
            .await;

        let model =
            OpenAiChatModel::openai(config_for_mock(LlmProvider::OpenAi, &server.uri())).unwrap();
        let mut history = history();

        let reply = model.converse(&mut history, "Hello").await.unwrap();

        assert_eq!(reply, "Hi there!");
        assert_eq!(history.len(), 3);
        assert_eq!(history.messages()[1].role(), MessageRole::User);
        assert_eq!(history.messages()[2].content(), "Hi there!");
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_response("Recovered")))
            .expect(1)
            .mount(&server)
            .await;

        let model =
            OpenAiChatModel::openai(config_for_mock(LlmProvider::OpenAi, &server.uri())).unwrap();
        let mut history = history();

        let reply = model.converse(&mut history, "Hello").await.unwrap();
        assert_eq!(reply, "Recovered");
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit reached for gpt-4"}
            })))
            .expect(3)
            .mount(&server)
            .await;

        let model =
            OpenAiChatModel::openai(config_for_mock(LlmProvider::OpenAi, &server.uri())).unwrap();
        let mut history = history();

        let err = model.converse(&mut history, "Hello").await.unwrap_err();
        assert!(matches!(err, InferenceError::RateLimited(ref m) if m == "Rate limit reached for gpt-4"));
    }

    #[tokio::test]
    async fn rejection_is_terminal_and_keeps_user_turn() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model =
            OpenAiChatModel::openai(config_for_mock(LlmProvider::OpenAi, &server.uri())).unwrap();
        let mut history = history();

        let err = model.converse(&mut history, "Hello").await.unwrap_err();

        assert!(matches!(
            err,
            InferenceError::Rejected { status: 401, ref message } if message == "Incorrect API key provided"
        ));
        // no rollback: the user turn stays, no assistant turn is added
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().role(), MessageRole::User);
        assert_eq!(history.last().unwrap().content(), "Hello");
    }

    #[tokio::test]
    async fn malformed_json_is_terminal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .expect(1)
            .mount(&server)
            .await;

        let model =
            OpenAiChatModel::openai(config_for_mock(LlmProvider::OpenAi, &server.uri())).unwrap();
        let mut history = history();

        let err = model.converse(&mut history, "Hello").await.unwrap_err();
        match err {
            InferenceError::InvalidResponse(message) => {
                assert!(message.contains("openai"));
                assert!(message.contains("{not json"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_choices_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .expect(1)
            .mount(&server)
            .await;

        let model =
            OpenAiChatModel::openai(config_for_mock(LlmProvider::OpenAi, &server.uri())).unwrap();

        let err = model.converse(&mut history(), "Hello").await.unwrap_err();
        assert!(matches!(err, InferenceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn empty_message_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_response("unused")))
            .expect(0)
            .mount(&server)
            .await;

        let model =
            OpenAiChatModel::openai(config_for_mock(LlmProvider::OpenAi, &server.uri())).unwrap();
        let mut history = history();

        let err = model.converse(&mut history, "   ").await.unwrap_err();
        assert!(matches!(err, InferenceError::Validation(_)));
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn slow_backend_times_out_and_retries() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_response("late"))
                    .set_delay(std::time::Duration::from_millis(500)),
            )
            .expect(2)
            .mount(&server)
            .await;

        let config = InferenceConfig {
            timeout_ms: 50,
            max_retries: 2,
            ..config_for_mock(LlmProvider::OpenAi, &server.uri())
        };
        let model = OpenAiChatModel::openai(config).unwrap();

        let err = model.converse(&mut history(), "Hello").await.unwrap_err();
        assert!(matches!(err, InferenceError::Timeout(_)));
    }

    #[tokio::test]
    async fn long_conversation_is_trimmed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_response("ok")))
            .mount(&server)
            .await;

        let model =
            OpenAiChatModel::openai(config_for_mock(LlmProvider::OpenAi, &server.uri())).unwrap();
        let mut history = ConversationHistory::new("system", 2).unwrap();

        for i in 0..6 {
            model.converse(&mut history, &format!("turn {i}")).await.unwrap();
        }

        assert_eq!(history.len(), history.capacity());
        assert_eq!(history.system_prompt(), "system");
        assert_eq!(history.messages()[1].content(), "turn 4");
    }
}

// =============================================================================
// Mistral
// =============================================================================

mod mistral {
    use super::*;

    #[tokio::test]
    async fn sends_safe_prompt_flag() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "mistral-small-latest",
                "safe_prompt": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_response("Bonjour")))
            .expect(1)
            .mount(&server)
            .await;

        let config = InferenceConfig {
            safe_prompt: true,
            ..config_for_mock(LlmProvider::Mistral, &server.uri())
        };
        let model = MistralChatModel::mistral(config).unwrap();

        let reply = model.converse(&mut history(), "Salut").await.unwrap();
        assert_eq!(reply, "Bonjour");
    }

    #[test]
    fn missing_api_key_is_configuration_error() {
        let config = InferenceConfig {
            api_key: None,
            ..config_for_mock(LlmProvider::Mistral, "http://127.0.0.1:1")
        };
        assert!(matches!(
            MistralChatModel::mistral(config),
            Err(InferenceError::Configuration(_))
        ));
    }
}

// =============================================================================
// Gemini
// =============================================================================

mod gemini {
    use super::*;

    #[tokio::test]
    async fn key_travels_in_query_and_roles_are_mapped() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "system_instruction": {"parts": [{"text": "You are a test assistant"}]},
                "contents": [{"role": "user", "parts": [{"text": "Hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Hey!"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model =
            GeminiChatModel::gemini(config_for_mock(LlmProvider::Gemini, &server.uri())).unwrap();
        let mut history = history();

        let reply = model.converse(&mut history, "Hello").await.unwrap();
        assert_eq!(reply, "Hey!");
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn google_error_message_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model =
            GeminiChatModel::gemini(config_for_mock(LlmProvider::Gemini, &server.uri())).unwrap();

        let err = model.converse(&mut history(), "Hello").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Request rejected (400): API key not valid. Please pass a valid API key."
        );
    }
}

// =============================================================================
// Ollama
// =============================================================================

mod ollama {
    use super::*;

    #[tokio::test]
    async fn generate_with_inst_prompt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3",
                "stream": false,
                "prompt": "<s>[INST] <<SYS>>\nYou are a test assistant\n<</SYS>>\n\n\n[INST] Hello [/INST]\n"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3",
                "response": "Hello from llama",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = InferenceConfig {
            api_key: None,
            ..config_for_mock(LlmProvider::Ollama, &server.uri())
        };
        let model = OllamaChatModel::ollama(config).unwrap();

        let reply = model.converse(&mut history(), "Hello").await.unwrap();
        assert_eq!(reply, "Hello from llama");
    }

    #[tokio::test]
    async fn unreachable_server_is_connection_failure() {
        let config = InferenceConfig {
            api_key: None,
            max_retries: 2,
            ..config_for_mock(LlmProvider::Ollama, "http://127.0.0.1:1")
        };
        let model = OllamaChatModel::ollama(config).unwrap();

        let err = model.converse(&mut history(), "Hello").await.unwrap_err();
        assert!(matches!(err, InferenceError::ConnectionFailed(_)));
    }
}

// =============================================================================
// Transport failures
// =============================================================================

mod transport {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use super::*;

    /// Server that reads each request and closes the socket without answering
    async fn hang_up_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connections);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                drop(socket);
            }
        });

        (url, connections)
    }

    #[tokio::test]
    async fn dropped_connection_is_retried() {
        let (url, connections) = hang_up_server().await;
        let model = OpenAiChatModel::openai(config_for_mock(LlmProvider::OpenAi, &url)).unwrap();
        let mut history = history();

        let err = model.converse(&mut history, "Hello").await.unwrap_err();

        assert!(matches!(err, InferenceError::ConnectionFailed(_)));
        assert_eq!(connections.load(Ordering::SeqCst), 3);
        assert_eq!(history.len(), 2);
    }
}
