//! Shared error types for the services crate.

use thiserror::Error;

use cicada_core::progression::ProgressError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the grading/auth API client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The service answered with a non-success status.
    #[error("{message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },
    /// Network failure, timeout, or an unreadable response.
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl ApiError {
    /// Text suitable for a user-facing notice.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Errors emitted by `SessionStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionStoreError {
    #[error("no team is signed in")]
    NoSession,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionStoreError),
}

/// Errors emitted by `LevelProgressionController::submit`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    /// Blank answer; nothing was sent.
    #[error("{0}")]
    Validation(String),
    /// The part cannot be submitted right now (locked, completed, or busy).
    #[error(transparent)]
    Logic(ProgressError),
    /// The request failed; the part is submittable again.
    #[error(transparent)]
    Transport(#[from] ApiError),
    /// The level was solved but the unlocked level could not be saved.
    #[error(transparent)]
    Session(#[from] SessionStoreError),
    /// The page was torn down while the submission was in progress.
    #[error("submission cancelled")]
    Cancelled,
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("unknown level {0}")]
    UnknownLevel(u32),
}
