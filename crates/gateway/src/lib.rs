//! HTTP gateway for Confidant.
//!
//! Serves the embedded chat page and a small JSON API over one shared
//! assistant [`Session`]:
//!
//! - `GET  /`:                 chat page (plus `/static/*` assets)
//! - `GET  /health`:           liveness
//! - `/v1/*`:                  chat, transcript, status, settings, reset
//!
//! Built on Axum. Blocking inference never runs on the request path; the
//! session hands it to a worker thread.

pub mod api_v1;
pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{Router, response::Json, routing::get};
use confidant_assistant::{Session, build_session};
use confidant_config::AppConfig;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub session: Arc<Session>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(session: Arc<Session>) -> SharedState {
        Arc::new(Self { session })
    }
}

/// Build the full router: frontend, health and the v1 API.
///
/// Layers applied:
/// - CORS limited to localhost origins
/// - Request body size limit (64 KiB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            is_local_origin(origin)
        }))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn is_local_origin(origin: &HeaderValue) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let host = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
        .unwrap_or("");
    let host = host.split(':').next().unwrap_or("");
    matches!(host, "localhost" | "127.0.0.1")
}

/// Start the gateway HTTP server.
///
/// Builds the session once (knowledge scan, model loader) and serves until
/// the process is stopped. With `load_model`, the AI engine starts loading
/// right away instead of waiting for `/load`.
pub async fn start(config: AppConfig, load_model: bool) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let session = Arc::new(build_session(&config)?);
    if load_model {
        session.start_model_load();
    }

    let app = build_router(GatewayState::new(session));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use confidant_assistant::ModelHandle;
    use confidant_core::error::ProviderError;
    use confidant_core::knowledge::{KnowledgeFiles, KnowledgeStore, PersonalKnowledge};
    use confidant_core::provider::{
        GenerationConfig, ModelLoader, SamplingParams, TextGenerator,
    };

    pub struct FixedGenerator;

    impl TextGenerator for FixedGenerator {
        fn generate(&self, _: &str, _: &SamplingParams) -> Result<String, ProviderError> {
            Ok("Hello from the model".into())
        }
    }

    pub struct InstantLoader;

    impl ModelLoader for InstantLoader {
        fn describe(&self) -> String {
            "instant test model".into()
        }

        fn load(&self) -> Result<Arc<dyn TextGenerator>, ProviderError> {
            let generator: Arc<dyn TextGenerator> = Arc::new(FixedGenerator);
            Ok(generator)
        }
    }

    pub fn test_state() -> SharedState {
        let knowledge = KnowledgeStore::new(
            PersonalKnowledge::vamshi(),
            KnowledgeFiles::from_entries([("notes.txt", "gateway notes")]),
        );
        let session = Session::new(
            Arc::new(knowledge),
            Arc::new(ModelHandle::new(Arc::new(InstantLoader))),
            GenerationConfig::default(),
            8,
        );
        GatewayState::new(Arc::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_support::test_state());

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = build_router(test_support::test_state());
        let message = "x".repeat(MAX_BODY_BYTES + 1);
        let body = serde_json::json!({ "message": message }).to_string();

        let req = Request::builder()
            .method("POST")
            .uri("/v1/chat")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn cors_allows_localhost_only() {
        let app = build_router(test_support::test_state());
        let req = Request::builder()
            .uri("/health")
            .header("origin", "http://localhost:5006")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:5006"
        );

        let req = Request::builder()
            .uri("/health")
            .header("origin", "http://evil.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[test]
    fn local_origin_matching() {
        assert!(is_local_origin(&HeaderValue::from_static("http://127.0.0.1:5006")));
        assert!(is_local_origin(&HeaderValue::from_static("http://localhost")));
        assert!(!is_local_origin(&HeaderValue::from_static("http://localhost.evil.com")));
        assert!(!is_local_origin(&HeaderValue::from_static("null")));
    }
}
