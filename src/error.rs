//! Error types for specification execution
//!
//! Building and combining specifications never fails. Errors only arise
//! when a specification is executed against a repository.

use thiserror::Error;

/// Errors that can occur while executing specifications
#[derive(Debug, Error)]
pub enum CriteriaError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Incorrect result size: expected at most {expected}, got {actual}")]
    IncorrectResultSize { expected: usize, actual: usize },
}

impl CriteriaError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CriteriaError>;
