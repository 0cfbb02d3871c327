use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chat::ChatMessage;

/// Sampling temperature sent with every completion request.
pub const TEMPERATURE: f32 = 0.7;

#[derive(Clone, Debug)]
pub struct GroqClientConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_error_body_bytes: usize,
}

impl GroqClientConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("GROQ_BASE_URL")
            .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string());

        let model =
            std::env::var("GROQ_MODEL").unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string());

        let timeout = std::env::var("GROQ_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
            max_error_body_bytes: 8 * 1024,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GroqClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },

    #[error("upstream response is missing choices[0].message.content")]
    MissingContent,
}

/// Chat-completion client for Groq's OpenAI-compatible API.
///
/// Each call is a single attempt: failures are reported to the caller
/// instead of being retried.
#[derive(Clone)]
pub struct GroqClient {
    config: GroqClientConfig,
    api_key: String,
    http: reqwest::Client,
}

impl GroqClient {
    pub fn new(config: GroqClientConfig, api_key: String) -> Result<Self, GroqClientError> {
        let http = reqwest::Client::builder()
            .user_agent("scheme-finder/proxy")
            .build()?;
        Ok(Self {
            config,
            api_key,
            http,
        })
    }

    /// Run one completion and return the generated text.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    ) -> Result<String, GroqClientError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: TEMPERATURE,
            max_tokens,
        };
        let response = self.chat_completions(&request).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(GroqClientError::MissingContent)
    }

    pub async fn chat_completions(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GroqClientError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            "sending chat completion"
        );
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.config.timeout)
            .json(request)
            .send()
            .await?;

        if resp.status().is_success() {
            return Ok(resp.json::<ChatCompletionResponse>().await?);
        }
        Err(Self::to_upstream_error(resp, self.config.max_error_body_bytes).await)
    }

    async fn to_upstream_error(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> GroqClientError {
        let status = resp.status();
        let body = read_limited_text(resp, max_error_body_bytes).await;
        if let Ok(ErrorEnvelope {
            error: ErrorObject {
                message: Some(message),
            },
        }) = serde_json::from_str::<ErrorEnvelope>(&body)
        {
            return GroqClientError::Upstream { status, message };
        }
        GroqClientError::UpstreamBody { status, body }
    }
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorObject,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionMessage {
    pub content: Option<String>,
}
