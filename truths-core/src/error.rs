use thiserror::Error;

/// Failures raised by a [`GameStore`](crate::GameStore) implementation.
///
/// These are the only errors the engine lets escape; everything else degrades
/// to a valid view.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Statement not found: {statement_id}")]
    StatementNotFound { statement_id: String },
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },
    #[error("Invalid statements: {reason}")]
    InvalidStatements { reason: String },
    #[error("Store unavailable: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
