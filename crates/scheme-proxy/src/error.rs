use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scheme_common::chat::ErrorBody;
use scheme_common::groq::GroqClientError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("GROQ_API_KEY not set. Add it to your environment or .env file.")]
    MissingApiKey,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Upstream(#[from] GroqClientError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Config(_) | Self::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(GroqClientError::Upstream { status, .. })
            | Self::Upstream(GroqClientError::UpstreamBody { status, .. }) => *status,
            Self::Upstream(GroqClientError::Request(_))
            | Self::Upstream(GroqClientError::MissingContent) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Text placed in the `error` field of the response body.
    pub fn public_message(&self) -> String {
        match self {
            Self::Upstream(GroqClientError::Upstream { message, .. }) => message.clone(),
            Self::Upstream(GroqClientError::UpstreamBody { status, .. }) => {
                format!("Upstream API error ({})", status.as_u16())
            }
            Self::Upstream(GroqClientError::Request(e)) => {
                format!("Failed to reach upstream API: {e}")
            }
            Self::Upstream(GroqClientError::MissingContent) => {
                "Upstream API returned an unexpected response shape".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
