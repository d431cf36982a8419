//! End-to-end tests for the Confidant assistant.
//!
//! These drive the same session the binary builds, through the HTTP API and
//! directly, with a scripted model in place of the GGUF weights.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use confidant_assistant::{ModelHandle, ModelStatus, Session, build_session};
use confidant_config::AppConfig;
use confidant_core::error::ProviderError;
use confidant_core::knowledge::{KnowledgeFiles, KnowledgeStore, PersonalKnowledge};
use confidant_core::provider::{GenerationConfig, ModelLoader, SamplingParams, TextGenerator};
use confidant_gateway::{GatewayState, build_router};
use http_body_util::BodyExt;
use tower::ServiceExt;

// ── Scripted model ───────────────────────────────────────────────────────

/// Answers `Assistant: answer N` and remembers every prompt.
struct ScriptedModel {
    prompts: std::sync::Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new() -> Self {
        Self {
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl TextGenerator for ScriptedModel {
    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String, ProviderError> {
        assert_eq!(params.top_k, 40);
        assert_eq!(params.stop, vec!["User:".to_string(), "Assistant:".to_string()]);
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        Ok(format!("Assistant: answer {}", prompts.len() - 1))
    }
}

struct ScriptedLoader {
    model: Arc<ScriptedModel>,
    loads: AtomicUsize,
}

impl ModelLoader for ScriptedLoader {
    fn describe(&self) -> String {
        "scripted e2e model".into()
    }

    fn load(&self) -> Result<Arc<dyn TextGenerator>, ProviderError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let model: Arc<dyn TextGenerator> = self.model.clone();
        Ok(model)
    }
}

fn scripted_session(files: KnowledgeFiles) -> (Arc<Session>, Arc<ScriptedModel>) {
    let model = Arc::new(ScriptedModel::new());
    let loader = Arc::new(ScriptedLoader {
        model: model.clone(),
        loads: AtomicUsize::new(0),
    });
    let session = Session::new(
        Arc::new(KnowledgeStore::new(PersonalKnowledge::vamshi(), files)),
        Arc::new(ModelHandle::new(loader)),
        GenerationConfig::default(),
        8,
    );
    (Arc::new(session), model)
}

async fn post_chat(app: &Router, message: &str) -> serde_json::Value {
    let req = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "message": message }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn get_json(app: &Router, uri: &str) -> serde_json::Value {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_web_chat_full_lifecycle() {
    let (session, model) = scripted_session(KnowledgeFiles::from_entries([("notes.txt", "n")]));
    let app = build_router(GatewayState::new(session.clone()));

    // Page is served
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::OK);

    // Commands work before the engine exists
    let reply = post_chat(&app, "/interests").await;
    assert!(reply["response"].as_str().unwrap().contains("Classical Music"));

    // Conversation asks for /load
    let reply = post_chat(&app, "Hello").await;
    assert!(reply["response"].as_str().unwrap().contains("/load"));
    assert_eq!(model.calls(), 0);

    // Load
    let reply = post_chat(&app, "/load").await;
    assert_eq!(reply["response"], "🔄 Starting AI engine initialization...");
    assert_eq!(session.model().settled().await, ModelStatus::Ready);
    let status = get_json(&app, "/v1/status").await;
    assert_eq!(status["label"], "🟢 AI Engine Ready");

    // Chat
    let reply = post_chat(&app, "Hello").await;
    assert_eq!(reply["response"], "answer 0");
    assert!(model.last_prompt().ends_with("User: Hello\nAssistant: "));

    let reply = post_chat(&app, "And now?").await;
    assert_eq!(reply["response"], "answer 1");
    assert!(
        model
            .last_prompt()
            .contains("[CONVERSATION HISTORY]\nUser: Hello\nAssistant: answer 0\n[INSTRUCTION]")
    );

    // Transcript: welcome, 5 exchanges, loading and ready panels
    let transcript = get_json(&app, "/v1/transcript").await;
    let entries = transcript["entries"].as_array().unwrap();
    assert!(entries[0]["content"].as_str().unwrap().starts_with("👋 Welcome"));
    assert!(
        entries
            .iter()
            .any(|e| e["content"].as_str().unwrap().contains("is Ready!"))
    );
    assert_eq!(transcript["count"], 13);

    // Clear
    let reply = post_chat(&app, "/clear").await;
    assert!(reply["response"].is_null());
    assert!(session.history().is_empty());
    assert_eq!(get_json(&app, "/v1/transcript").await["count"], 1);
    assert_eq!(session.model().status(), ModelStatus::Ready);
}

#[tokio::test]
async fn e2e_history_window_keeps_latest_eight_turns() {
    let (session, model) = scripted_session(KnowledgeFiles::default());
    session.start_model_load();
    session.model().settled().await;

    for i in 0..5 {
        session.handle_message(&format!("q{i}"), "User").await;
    }
    session.handle_message("final", "User").await;

    let prompt = model.last_prompt();
    assert!(!prompt.contains("User: q0\n"));
    assert!(prompt.contains("User: q1\nAssistant: answer 1\n"));
    assert!(prompt.contains("User: q4\nAssistant: answer 4\n[INSTRUCTION]"));
    assert!(prompt.ends_with("User: final\nAssistant: "));
    assert_eq!(session.history().len(), 12);
}

#[tokio::test]
async fn e2e_knowledge_folder_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let knowledge_dir = dir.path().join("personal_knowledge");
    std::fs::create_dir(&knowledge_dir).unwrap();
    std::fs::write(knowledge_dir.join("notes.txt"), "Met Ada about quantum kernels.").unwrap();
    std::fs::write(knowledge_dir.join("reading.txt"), "x".repeat(2500)).unwrap();
    std::fs::write(knowledge_dir.join("photo.jpg"), [0u8, 1, 2]).unwrap();

    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "[generation]\ntemperature = 1.0\nmax_tokens = 256\n\n[knowledge]\ndirectory = {:?}\n",
            knowledge_dir.display().to_string()
        ),
    )
    .unwrap();

    let config = AppConfig::load_from(&config_path).unwrap();
    let session = build_session(&config).unwrap();
    assert_eq!(session.settings().temperature(), 1.0);
    assert_eq!(session.settings().max_tokens(), 256);

    let files = session.handle_message("/files", "User").await.unwrap();
    assert!(files.contains("• notes.txt\n• reading.txt"));
    assert!(!files.contains("photo.jpg"));

    let notes = session.handle_message("/file notes.txt", "User").await.unwrap();
    assert_eq!(notes, "Met Ada about quantum kernels.");

    let reading = session.handle_message("/file reading.txt", "User").await.unwrap();
    assert_eq!(reading.len(), 2003);
    assert!(reading.ends_with("..."));

    let missing = session.handle_message("/file missing.txt", "User").await.unwrap();
    assert!(missing.contains("/files"));
}

#[cfg(not(feature = "local"))]
#[tokio::test]
async fn e2e_engine_without_local_feature_fails_and_can_retry() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.knowledge.directory = dir.path().join("none");

    let session = build_session(&config).unwrap();
    let reply = session.handle_message("/load", "User").await.unwrap();
    assert_eq!(reply, "🔄 Starting AI engine initialization...");

    let status = session.model().settled().await;
    assert!(matches!(&status, ModelStatus::Failed(reason) if reason.contains("--features local")));
    assert!(session.status_label().starts_with("🔴 Error: "));

    // Still answers commands, still refuses conversation
    assert!(session.handle_message("/prefs", "User").await.unwrap().contains("Swiss Alps"));
    assert!(session.handle_message("Hi", "User").await.unwrap().contains("/load"));

    // Retry is allowed from Failed
    let reply = session.handle_message("/load", "User").await.unwrap();
    assert_eq!(reply, "🔄 Starting AI engine initialization...");
}
