//! Unified error types for karar.
//!
//! Every variant renders with a stable, code-prefixed message so callers and
//! logs can match on the failure class without parsing free text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the karar service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty query).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Extraction failed for a reason not covered by a more specific variant.
    #[error("EXTRACT_FAILED: {0}")]
    ExtractFailed(String),

    /// A rendering session could not be acquired.
    #[error("SESSION_UNAVAILABLE: {0}")]
    SessionUnavailable(String),

    /// The search entry page could not be loaded.
    #[error("NAVIGATION_FAILED: {0}")]
    NavigationFailed(String),

    /// The results table never appeared and no empty-result signal was found.
    #[error("SEARCH_TIMEOUT: {0}")]
    SearchTimeout(String),

    /// The results table appeared but no row could be parsed.
    #[error("UNPARSABLE_RESULTS: {0}")]
    UnparsableResults(String),

    /// Rendering is compiled out or switched off.
    #[error("RENDER_DISABLED")]
    RenderDisabled,

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// No persistent store is attached.
    #[error("CACHE_ERROR: store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::ExtractFailed(msg) => (-32000, msg.clone()),
            Error::SessionUnavailable(msg) => (-32003, msg.clone()),
            Error::NavigationFailed(msg) => (-32004, msg.clone()),
            Error::SearchTimeout(msg) => (-32005, msg.clone()),
            Error::UnparsableResults(msg) => (-32006, msg.clone()),
            Error::RenderDisabled => (-32011, "Render mode is disabled".to_string()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::StoreUnavailable(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
