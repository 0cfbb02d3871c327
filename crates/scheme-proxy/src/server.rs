use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use scheme_common::chat::{ChatReply, ChatRequest};
use scheme_common::groq::GroqClient;
use scheme_format::{parse_response, ParsedResponse};

use crate::error::AppError;

#[derive(Clone, Default)]
pub struct AppState {
    /// Absent when `GROQ_API_KEY` was not configured.
    pub groq: Option<Arc<GroqClient>>,
}

pub fn build_router(state: AppState, static_root: &Path) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/format", post(format))
        .route_service("/", ServeFile::new(static_root.join("index.html")))
        .route_service("/selector", ServeFile::new(static_root.join("selector.html")))
        .fallback_service(ServeDir::new(static_root))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Json<ChatReply>, AppError> {
    // Credentials are checked before the body is looked at.
    let groq = state.groq.as_ref().ok_or(AppError::MissingApiKey)?;

    let request: ChatRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;
    if request.messages.is_empty() {
        return Err(AppError::BadRequest(
            "messages must be a non-empty array".to_string(),
        ));
    }

    debug!(
        messages = request.messages.len(),
        max_tokens = request.max_tokens,
        "forwarding chat"
    );
    match groq.complete(request.messages, request.max_tokens).await {
        Ok(content) => Ok(Json(ChatReply { content })),
        Err(e) => {
            let err = AppError::from(e);
            warn!(status = %err.status(), error = %err, "upstream chat failed");
            Err(err)
        }
    }
}

#[derive(Debug, Deserialize)]
struct FormatRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct FormatResponse {
    html: String,
    parsed: ParsedResponse,
}

/// Server-side rendering of a model reply, for clients that do not want to
/// parse it themselves.
async fn format(body: Bytes) -> Result<Json<FormatResponse>, AppError> {
    let request: FormatRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;
    let parsed = parse_response(&request.text);
    Ok(Json(FormatResponse {
        html: parsed.to_html(),
        parsed,
    }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use scheme_common::groq::GroqClientConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn static_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>finder</h1>").unwrap();
        std::fs::write(dir.path().join("selector.html"), "<h1>selector</h1>").unwrap();
        std::fs::write(dir.path().join("app.css"), "body{}").unwrap();
        dir
    }

    async fn fake_groq(reply: (StatusCode, Value)) -> String {
        let app = Router::new().route(
            "/chat/completions",
            post(move |Json(_): Json<Value>| {
                let (status, body) = reply.clone();
                async move { (status, Json(body)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn groq_state(base_url: String) -> AppState {
        let config = GroqClientConfig {
            base_url,
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
            max_error_body_bytes: 1024,
        };
        AppState {
            groq: Some(Arc::new(
                GroqClient::new(config, "test-key".to_string()).unwrap(),
            )),
        }
    }

    async fn call(router: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_key_wins_over_bad_body() {
        let root = static_root();
        let router = build_router(AppState::default(), root.path());
        let (status, body) = call(router, post_json("/api/chat", "not json")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body["error"],
            "GROQ_API_KEY not set. Add it to your environment or .env file."
        );
    }

    #[tokio::test]
    async fn empty_messages_are_rejected() {
        let root = static_root();
        let router = build_router(groq_state("http://127.0.0.1:9".to_string()), root.path());
        let (status, body) = call(router, post_json("/api/chat", r#"{"messages":[]}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"].as_str().unwrap().contains("non-empty"));
    }

    #[tokio::test]
    async fn chat_rejects_malformed_json() {
        let root = static_root();
        let router = build_router(groq_state("http://127.0.0.1:9".to_string()), root.path());
        let (status, body) = call(router, post_json("/api/chat", "{\"messages\": [")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn format_rejects_malformed_json() {
        let root = static_root();
        let router = build_router(AppState::default(), root.path());
        let (status, body) = call(router, post_json("/api/format", r#"{"txt": 1}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn chat_returns_upstream_content() {
        let base = fake_groq((
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": "Namaste"}}]}),
        ))
        .await;
        let root = static_root();
        let router = build_router(groq_state(base), root.path());
        let (status, body) = call(
            router,
            post_json("/api/chat", r#"{"messages":[{"role":"user","content":"hi"}]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"content": "Namaste"}));
    }

    #[tokio::test]
    async fn upstream_error_keeps_status_and_message() {
        let base = fake_groq((
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"message": "Rate limit reached for model"}}),
        ))
        .await;
        let root = static_root();
        let router = build_router(groq_state(base), root.path());
        let (status, body) = call(
            router,
            post_json("/api/chat", r#"{"messages":[{"role":"user","content":"hi"}]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Rate limit reached for model");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        let root = static_root();
        let router = build_router(groq_state("http://127.0.0.1:9".to_string()), root.path());
        let (status, body) = call(
            router,
            post_json("/api/chat", r#"{"messages":[{"role":"user","content":"hi"}]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to reach upstream API"));
    }

    #[tokio::test]
    async fn format_renders_accordion() {
        let root = static_root();
        let router = build_router(AppState::default(), root.path());
        let text = "## 🏛️ **PM-KISAN**\n**Match Score: 90%**\n💰 **Benefits:** ₹6,000";
        let payload = json!({ "text": text }).to_string();
        let (status, body) = call(router, post_json("/api/format", &payload)).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["parsed"]["kind"], "schemes");
        assert!(body["html"].as_str().unwrap().contains("90% Match"));
    }

    #[tokio::test]
    async fn pages_and_assets_are_served() {
        let root = static_root();
        for (uri, expected) in [
            ("/", "<h1>finder</h1>"),
            ("/selector", "<h1>selector</h1>"),
            ("/app.css", "body{}"),
        ] {
            let router = build_router(AppState::default(), root.path());
            let req = Request::get(uri).body(Body::empty()).unwrap();
            let (status, body) = call(router, req).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(String::from_utf8(body).unwrap(), expected);
        }

        let router = build_router(AppState::default(), root.path());
        let req = Request::get("/missing.js").body(Body::empty()).unwrap();
        let (status, _) = call(router, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bundled_pages_are_wired_to_the_api() {
        let web = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../web");
        let router = build_router(AppState::default(), &web);
        let (status, body) = call(router, Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let page = String::from_utf8(body).unwrap();
        assert!(page.contains(r#"class="chat-form""#));
        assert!(page.contains(r#"src="/app.js""#));

        let router = build_router(AppState::default(), &web);
        let (status, body) = call(router, Request::get("/app.js").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let script = String::from_utf8(body).unwrap();
        assert!(script.contains("/api/chat"));
        assert!(script.contains("/api/format"));

        let router = build_router(AppState::default(), &web);
        let req = Request::get("/selector").body(Body::empty()).unwrap();
        let (status, body) = call(router, req).await;
        assert_eq!(status, StatusCode::OK);
        let page = String::from_utf8(body).unwrap();
        assert!(page.contains("Step 1 of 3"));
        for name in ["state", "age", "gender"] {
            assert!(page.contains(&format!(r#"name="{name}""#)), "{name}");
        }
    }
}
