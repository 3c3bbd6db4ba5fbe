use reqwest::StatusCode;
use thiserror::Error;

/// Why a chat request produced no reply.
///
/// Every variant is shown to the user as the same fallback message; the
/// detail only reaches the log.
#[derive(Debug, Error)]
pub enum RequestFailure {
    #[error("could not reach the counselor backend: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("counselor backend responded with status {0}")]
    Status(StatusCode),
    #[error("counselor backend sent a malformed body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("request did not complete: {0}")]
    Interrupted(String),
}
