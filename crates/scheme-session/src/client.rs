use std::future::Future;

use reqwest::StatusCode;
use scheme_common::chat::{ChatMessage, ChatReply, ChatRequest, ErrorBody};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The proxy answered with an error body; `message` is shown as-is.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
}

/// Something that can turn a conversation into the next assistant reply.
pub trait ChatBackend {
    fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// Talks to the backend proxy's `POST /api/chat`.
#[derive(Clone)]
pub struct ProxyClient {
    base_url: String,
    http: reqwest::Client,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent("scheme-finder/session")
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

impl ChatBackend for ProxyClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, ClientError> {
        let request = ChatRequest {
            messages: messages.to_vec(),
            max_tokens,
        };
        let resp = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<ChatReply>().await?.content);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("HTTP {status}"));
        warn!(status = status.as_u16(), error = %message, "chat request failed");
        Err(ClientError::Api { status, message })
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use scheme_common::chat::Role;
    use serde_json::json;

    use super::*;

    async fn spawn_proxy(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn posts_history_and_reads_content() {
        let router = Router::new().route(
            "/api/chat",
            post(|Json(req): Json<ChatRequest>| async move {
                assert_eq!(req.max_tokens, 77);
                assert_eq!(req.messages.len(), 2);
                assert_eq!(req.messages[0].role, Role::System);
                Json(json!({ "content": "reply" }))
            }),
        );
        let client = ProxyClient::new(spawn_proxy(router).await).unwrap();

        let reply = client
            .complete(
                &[ChatMessage::system("sys"), ChatMessage::user("hi")],
                77,
            )
            .await
            .unwrap();
        assert_eq!(reply, "reply");
    }

    #[tokio::test]
    async fn error_body_becomes_api_error() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async {
                (
                    AxumStatus::TOO_MANY_REQUESTS,
                    Json(json!({ "error": "Rate limit reached for model" })),
                )
            }),
        );
        let client = ProxyClient::new(spawn_proxy(router).await).unwrap();

        let err = client.complete(&[ChatMessage::user("hi")], 10).await.unwrap_err();
        assert_eq!(err.to_string(), "Rate limit reached for model");
        assert!(matches!(err, ClientError::Api { status, .. } if status == StatusCode::TOO_MANY_REQUESTS));
    }

    #[tokio::test]
    async fn non_json_error_reports_status() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async { (AxumStatus::BAD_GATEWAY, "oops") }),
        );
        let client = ProxyClient::new(spawn_proxy(router).await).unwrap();

        let err = client.complete(&[ChatMessage::user("hi")], 10).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway");
    }
}
