// Error handling framework

use thiserror::Error;

/// Feed retrieval and parsing errors
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    Request(String),

    #[error("Feed request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Feed parse failed: {0}")]
    Parse(String),
}

/// Outbound notification errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification channel not available")]
    ChannelUnavailable,

    #[error("Chat API request failed: {0}")]
    Request(String),

    #[error("Chat API rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid chat API response: {0}")]
    InvalidResponse(String),
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },
}

/// API response error type for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        ApiError::new("FEED_ERROR", err.to_string())
    }
}

impl From<NotifyError> for ApiError {
    fn from(err: NotifyError) -> Self {
        let code = match err {
            NotifyError::ChannelUnavailable => "CHANNEL_UNAVAILABLE",
            _ => "NOTIFY_ERROR",
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FeedError::Status {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            },
            None => FeedError::Request(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for FeedError {
    fn from(err: quick_xml::Error) -> Self {
        FeedError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Request(err.to_string())
    }
}
