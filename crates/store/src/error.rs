use thiserror::Error;

/// Failures surfaced by a [`DocumentStore`](crate::DocumentStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {0} not found")]
    NotFound(String),

    #[error("document {0} already exists")]
    AlreadyExists(String),

    #[error("invalid document path: {0}")]
    InvalidPath(String),

    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("firestore request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("firestore returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("unexpected firestore payload: {0}")]
    Payload(String),

    #[error("store is not configured: {0}")]
    Configuration(String),
}

impl StoreError {
    /// True for errors caused by the caller's request rather than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_) | StoreError::AlreadyExists(_) | StoreError::InvalidPath(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
