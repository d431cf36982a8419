//! HTTP API v1: the chat page's backend.
//!
//! Endpoints:
//!
//! - `POST  /v1/chat`:        Submit a message, get the reply (`null` after `/clear`)
//! - `GET   /v1/transcript`:  Visible chat log
//! - `GET   /v1/status`:      Model state, status label, settings, file count
//! - `GET   /v1/settings`:    Current generation settings and their ranges
//! - `PATCH /v1/settings`:    Change temperature and/or max tokens
//! - `POST  /v1/reset`:       Clear the conversation

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use confidant_assistant::{DEFAULT_SENDER, SessionStatus, SettingsUpdate, TranscriptEntry};
use confidant_core::provider::{
    GenerationConfig, MAX_MAX_TOKENS, MAX_TEMPERATURE, MIN_MAX_TOKENS, MIN_TEMPERATURE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::SharedState;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/transcript", get(transcript_handler))
        .route("/status", get(status_handler))
        .route("/settings", get(get_settings_handler).patch(update_settings_handler))
        .route("/reset", post(reset_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    /// Display name for the transcript (defaults to "User").
    #[serde(default)]
    sender: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub entries: Vec<TranscriptEntry>,
    pub count: usize,
}

#[derive(Serialize, Deserialize)]
pub struct SettingsResponse {
    pub temperature: f32,
    pub max_tokens: u32,
    pub temperature_range: [f32; 2],
    pub max_tokens_range: [u32; 2],
}

impl From<GenerationConfig> for SettingsResponse {
    fn from(settings: GenerationConfig) -> Self {
        Self {
            temperature: settings.temperature(),
            max_tokens: settings.max_tokens(),
            temperature_range: [MIN_TEMPERATURE, MAX_TEMPERATURE],
            max_tokens_range: [MIN_MAX_TOKENS, MAX_MAX_TOKENS],
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(bad_request("message must not be empty"));
    }
    let sender = payload
        .sender
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SENDER);

    debug!(message_len = message.len(), sender, "v1/chat request");
    let response = state.session.handle_message(message, sender).await;
    Ok(Json(ChatResponse { response }))
}

async fn transcript_handler(State(state): State<SharedState>) -> Json<TranscriptResponse> {
    let entries = state.session.transcript();
    Json(TranscriptResponse {
        count: entries.len(),
        entries,
    })
}

async fn status_handler(State(state): State<SharedState>) -> Json<SessionStatus> {
    Json(state.session.status())
}

async fn get_settings_handler(State(state): State<SharedState>) -> Json<SettingsResponse> {
    Json(state.session.settings().into())
}

async fn update_settings_handler(
    State(state): State<SharedState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsResponse>, ApiError> {
    match state.session.update_settings(update) {
        Ok(settings) => {
            info!(
                temperature = settings.temperature(),
                max_tokens = settings.max_tokens(),
                "Settings updated"
            );
            Ok(Json(settings.into()))
        }
        Err(e) => Err(bad_request(e.to_string())),
    }
}

async fn reset_handler(State(state): State<SharedState>) -> Json<ResetResponse> {
    state.session.reset();
    Json(ResetResponse {
        success: true,
        message: "Conversation cleared".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    async fn chat(app: &Router, message: &str) -> Option<String> {
        let req = json_request("POST", "/chat", serde_json::json!({ "message": message }));
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json::<ChatResponse>(response).await.response
    }

    #[tokio::test]
    async fn chat_answers_commands() {
        let app = v1_router(test_state());

        let reply = chat(&app, "/projects").await.unwrap();
        assert!(reply.contains("Current Projects"));

        let reply = chat(&app, "/file notes.txt").await.unwrap();
        assert_eq!(reply, "gateway notes");
    }

    #[tokio::test]
    async fn chat_before_load_asks_for_load() {
        let app = v1_router(test_state());
        let reply = chat(&app, "Hello").await.unwrap();
        assert!(reply.contains("/load"));
    }

    #[tokio::test]
    async fn chat_after_load_uses_model() {
        let state = test_state();
        let app = v1_router(state.clone());

        let reply = chat(&app, "/load").await.unwrap();
        assert!(reply.starts_with("🔄"));
        state.session.model().settled().await;

        assert_eq!(chat(&app, "Hello").await.as_deref(), Some("Hello from the model"));
        assert_eq!(state.session.history().len(), 2);
    }

    #[tokio::test]
    async fn clear_returns_null_response() {
        let app = v1_router(test_state());
        assert_eq!(chat(&app, "/clear").await, None);
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let app = v1_router(test_state());
        let req = json_request("POST", "/chat", serde_json::json!({ "message": "   " }));
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn transcript_tracks_messages_with_sender_name() {
        let app = v1_router(test_state());

        let req = json_request(
            "POST",
            "/chat",
            serde_json::json!({ "message": "/background", "sender": "Vamshi" }),
        );
        app.clone().oneshot(req).await.unwrap();

        let response = app.oneshot(get("/transcript")).await.unwrap();
        let transcript: TranscriptResponse = body_json(response).await;
        assert_eq!(transcript.count, 3);
        assert!(transcript.entries[0].content.starts_with("👋 Welcome"));
        assert_eq!(transcript.entries[1].name, "Vamshi");
        assert!(transcript.entries[2].content.starts_with("📚"));
    }

    #[tokio::test]
    async fn status_reports_unloaded_model() {
        let app = v1_router(test_state());
        let response = app.oneshot(get("/status")).await.unwrap();
        let status: serde_json::Value = body_json(response).await;

        assert_eq!(status["state"], "unloaded");
        assert_eq!(status["label"], "⚪ Model not loaded");
        assert_eq!(status["max_tokens"], 512);
        assert_eq!(status["knowledge_files"], 1);
    }

    #[tokio::test]
    async fn settings_roundtrip_and_validation() {
        let app = v1_router(test_state());

        let response = app.clone().oneshot(get("/settings")).await.unwrap();
        let settings: SettingsResponse = body_json(response).await;
        assert_eq!(settings.max_tokens, 512);
        assert_eq!(settings.max_tokens_range, [64, 2048]);

        let req = json_request("PATCH", "/settings", serde_json::json!({ "max_tokens": 1024 }));
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let settings: SettingsResponse = body_json(response).await;
        assert_eq!(settings.max_tokens, 1024);

        let req = json_request("PATCH", "/settings", serde_json::json!({ "temperature": 3.0 }));
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: serde_json::Value = body_json(response).await;
        assert!(error["error"].as_str().unwrap().contains("temperature"));

        let response = app.oneshot(get("/settings")).await.unwrap();
        let settings: SettingsResponse = body_json(response).await;
        assert_eq!(settings.max_tokens, 1024);
    }

    #[tokio::test]
    async fn reset_clears_transcript() {
        let state = test_state();
        let app = v1_router(state.clone());
        chat(&app, "/interests").await;
        assert_eq!(state.session.transcript().len(), 3);

        let req = Request::builder()
            .method("POST")
            .uri("/reset")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        let reset: ResetResponse = body_json(response).await;
        assert!(reset.success);
        assert_eq!(state.session.transcript().len(), 1);
    }
}
