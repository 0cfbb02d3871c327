/// What kind of failure the user is looking at, decided from the error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Quota,
    RateLimit,
    Other,
}

pub const QUOTA_MESSAGE: &str =
    "The AI service has reached its usage quota. Please try again later.";
pub const RATE_LIMIT_MESSAGE: &str =
    "Too many requests right now. Please wait a moment and try again.";

impl FailureKind {
    /// Case-insensitive substring match; `quota` wins over `rate`.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("quota") {
            Self::Quota
        } else if lower.contains("rate") {
            Self::RateLimit
        } else {
            Self::Other
        }
    }
}

/// The text shown to the user for a failed request.
pub fn user_message(message: &str) -> String {
    match FailureKind::classify(message) {
        FailureKind::Quota => QUOTA_MESSAGE.to_string(),
        FailureKind::RateLimit => RATE_LIMIT_MESSAGE.to_string(),
        FailureKind::Other if message.trim().is_empty() => {
            "Sorry, something went wrong. Please try again.".to_string()
        }
        FailureKind::Other => format!("Sorry, something went wrong: {message}"),
    }
}
