use std::sync::{Arc, Mutex};

use agent_core::{AgentError, GenerationOptions, LlmProvider, Message};
use agent_runtime::{GeminiConfig, GeminiProvider};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Captured {
    paths: Arc<Mutex<Vec<String>>>,
    keys: Arc<Mutex<Vec<String>>>,
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn provider(base_url: String) -> GeminiProvider {
    let mut config = GeminiConfig::new("test-key");
    config.base_url = base_url;
    GeminiProvider::from_config(config).unwrap()
}

#[tokio::test]
async fn generate_content_returns_function_calls() {
    let captured = Captured::default();
    let router = Router::new()
        .route(
            "/v1beta/models/{call}",
            post(
                |State(c): State<Captured>,
                 Path(call): Path<String>,
                 headers: HeaderMap,
                 Json(body): Json<Value>| async move {
                    c.paths.lock().unwrap().push(call);
                    c.keys.lock().unwrap().push(
                        headers
                            .get("x-goog-api-key")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string(),
                    );
                    assert_eq!(body["contents"][0]["parts"][0]["text"], "Patient p-7");
                    Json(json!({
                        "candidates": [{
                            "content": {"role": "model", "parts": [
                                {"functionCall": {"name": "fetch_history", "args": {"patient_id": "p-7"}}}
                            ]},
                            "finishReason": "STOP"
                        }]
                    }))
                },
            ),
        )
        .with_state(captured.clone());

    let gemini = provider(serve(router).await);
    let completion = gemini
        .complete(
            &[Message::system("sys"), Message::user("Patient p-7")],
            &GenerationOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(completion.tool_calls.len(), 1);
    assert_eq!(completion.tool_calls[0].name, "fetch_history");
    assert_eq!(completion.tool_calls[0].str_arg("patient_id"), Some("p-7"));
    assert_eq!(
        *captured.paths.lock().unwrap(),
        vec!["gemini-2.0-flash:generateContent"]
    );
    assert_eq!(*captured.keys.lock().unwrap(), vec!["test-key"]);
}

#[tokio::test]
async fn status_codes_map_to_error_kinds() {
    let router = Router::new()
        .route(
            "/v1beta/models/{call}",
            post(|Path(call): Path<String>| async move {
                if call.starts_with("busy") {
                    (StatusCode::TOO_MANY_REQUESTS, "quota")
                } else if call.starts_with("down") {
                    (StatusCode::SERVICE_UNAVAILABLE, "overloaded")
                } else {
                    (StatusCode::FORBIDDEN, "bad key")
                }
            }),
        );
    let gemini = provider(serve(router).await);
    let messages = [Message::user("hi")];

    let busy = gemini
        .complete(&messages, &GenerationOptions::for_model("busy"))
        .await
        .unwrap_err();
    assert!(matches!(busy, AgentError::RateLimited(_)));
    assert!(busy.is_retryable());

    let down = gemini
        .complete(&messages, &GenerationOptions::for_model("down"))
        .await
        .unwrap_err();
    assert!(matches!(down, AgentError::ProviderUnavailable(_)));

    let denied = gemini
        .complete(&messages, &GenerationOptions::for_model("other"))
        .await
        .unwrap_err();
    assert!(matches!(denied, AgentError::Auth(_)));
    assert!(!denied.is_retryable());
}

#[tokio::test]
async fn list_models_strips_prefix() {
    let router = Router::new().route(
        "/v1beta/models",
        get(|| async {
            Json(json!({"models": [
                {"name": "models/gemini-2.0-flash", "displayName": "Gemini 2.0 Flash", "inputTokenLimit": 1_048_576}
            ]}))
        }),
    );
    let gemini = provider(serve(router).await);

    let models = gemini.list_models().await.unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].id, "gemini-2.0-flash");
    assert_eq!(models[0].name, "Gemini 2.0 Flash");
    assert!(gemini.health_check().await.unwrap());
}
