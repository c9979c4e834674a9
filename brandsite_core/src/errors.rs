//! Error types for the admin core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdminError>;

#[derive(Debug, Error)]
pub enum AdminError {
    /// Unknown site id or unresolvable store location
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed body or missing required fields
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Patch carried none of `globalLinks`, `sites`, `texts`
    #[error("invalid patch: expected at least one of globalLinks, sites, texts")]
    InvalidPatch,

    /// Trigger or probe target answered with an error
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Network call exceeded its budget
    #[error("timeout")]
    Timeout,

    /// Config store unreadable or unwritable
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Settings error
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure classes surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    UpstreamFailure,
    PersistenceFailure,
}

impl AdminError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::NotFound(_) => ErrorKind::NotFound,
            AdminError::InvalidInput(_) | AdminError::InvalidPatch | AdminError::Json(_) => {
                ErrorKind::InvalidInput
            }
            AdminError::Upstream(_) | AdminError::Timeout | AdminError::Http(_) => {
                ErrorKind::UpstreamFailure
            }
            AdminError::Persistence(_) | AdminError::Config(_) | AdminError::Io(_) => {
                ErrorKind::PersistenceFailure
            }
        }
    }

    /// Short message suitable for per-site result rows
    pub fn site_message(&self) -> String {
        match self {
            AdminError::Timeout => "timeout".to_string(),
            AdminError::Http(err) if err.is_timeout() => "timeout".to_string(),
            AdminError::Upstream(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
