//! HTTP API server.
//!
//! `POST /ask` runs the question pipeline; `GET /` and `GET /health` report liveness.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
pub struct AppState {
    pub orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tuberag doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let app = router(Arc::new(AppState { orchestrator }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("tuberag API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    /// YouTube URL or bare video ID
    #[serde(alias = "video_url_or_id")]
    video_url: String,
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    /// Resolved video ID.
    video_url: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        message: "tuberag API is running",
    })
}

async fn ask(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };

    if req.question.trim().is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "question must not be empty");
    }

    match state.orchestrator.ask(&req.video_url, &req.question).await {
        Ok(outcome) => Json(AskResponse {
            answer: outcome.answer,
            video_url: outcome.video_id.to_string(),
        })
        .into_response(),
        Err(e) => {
            warn!("Request failed: {}", e);
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, e.public_detail())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::embedding::tests::KeywordEmbedder;
    use crate::rag::ScriptedModel;
    use crate::transcript::tests::FakeCaptions;
    use crate::transcript::TranscriptService;
    use serde_json::{json, Value};
    use std::net::SocketAddr;

    async fn spawn_server(captions: FakeCaptions, llm: Arc<ScriptedModel>) -> SocketAddr {
        let transcripts = Arc::new(TranscriptService::new(Arc::new(captions), None, 200));
        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            transcripts,
            Arc::new(KeywordEmbedder::default()),
            llm,
            Prompts::default(),
        );
        let app = router(Arc::new(AppState { orchestrator }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn talk() -> FakeCaptions {
        FakeCaptions {
            result: Ok((0..60)
                .map(|i| format!("in part {} we discuss how the borrow checker enforces ownership", i))
                .collect()),
        }
    }

    async fn post_ask(addr: SocketAddr, body: Value) -> (StatusCode, Value) {
        let response = reqwest::Client::new()
            .post(format!("http://{}/ask", addr))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let addr = spawn_server(talk(), Arc::new(ScriptedModel::replying("unused"))).await;

        for path in ["/", "/health"] {
            let body: Value = reqwest::get(format!("http://{}{}", addr, path))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(body["status"], "healthy");
            assert!(body["message"].is_string());
        }
    }

    #[tokio::test]
    async fn test_ask_success() {
        let llm = Arc::new(ScriptedModel::replying("The borrow checker enforces ownership."));
        let addr = spawn_server(talk(), llm.clone()).await;

        let (status, body) = post_ask(
            addr,
            json!({
                "video_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10s",
                "question": "What enforces ownership?"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "The borrow checker enforces ownership.");
        assert_eq!(body["video_url"], "dQw4w9WgXcQ");
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_ask_accepts_locator_alias() {
        let addr = spawn_server(talk(), Arc::new(ScriptedModel::replying("Yes."))).await;
        let (status, body) = post_ask(
            addr,
            json!({ "video_url_or_id": "dQw4w9WgXcQ", "question": "Is ownership covered?" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["video_url"], "dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn test_empty_question_rejected_before_pipeline() {
        let llm = Arc::new(ScriptedModel::replying("unused"));
        let addr = spawn_server(talk(), llm.clone()).await;

        let (status, body) =
            post_ask(addr, json!({ "video_url": "dQw4w9WgXcQ", "question": "" })).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_question_rejected() {
        let llm = Arc::new(ScriptedModel::replying("unused"));
        let addr = spawn_server(talk(), llm.clone()).await;

        let (status, _) =
            post_ask(addr, json!({ "video_url": "dQw4w9WgXcQ", "question": "  \n\t " })).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_field_uses_detail_body() {
        let addr = spawn_server(talk(), Arc::new(ScriptedModel::replying("unused"))).await;
        let (status, body) = post_ask(addr, json!({ "video_url": "dQw4w9WgXcQ" })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_locator_is_bad_request() {
        let addr = spawn_server(talk(), Arc::new(ScriptedModel::replying("unused"))).await;
        let (status, body) = post_ask(
            addr,
            json!({ "video_url": "https://vimeo.com/12345", "question": "Anything?" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("Invalid YouTube URL"));
    }

    #[tokio::test]
    async fn test_missing_transcript_is_not_found() {
        let captions = FakeCaptions {
            result: Err("transcripts are disabled for this video".to_string()),
        };
        let addr = spawn_server(captions, Arc::new(ScriptedModel::replying("unused"))).await;

        let (status, body) =
            post_ask(addr, json!({ "video_url": "dQw4w9WgXcQ", "question": "Anything?" })).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("transcripts are disabled"));
    }

    #[tokio::test]
    async fn test_model_failure_is_generic_server_error() {
        let addr = spawn_server(talk(), Arc::new(ScriptedModel::failing("401 bad key sk-live-123"))).await;

        let (status, body) =
            post_ask(addr, json!({ "video_url": "dQw4w9WgXcQ", "question": "Anything?" })).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(!detail.contains("sk-live"));
        assert!(!detail.contains("401"));
    }
}
