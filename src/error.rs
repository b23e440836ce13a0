use std::io;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid ticket link: {0}")]
    InvalidLinkFormat(String),
    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("issue tracker error: {0}")]
    IssueTracker(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// Failure to read a single ticket. Absorbed by the traversal; only access
/// validation turns it into an [`AppError`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("tracker responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
