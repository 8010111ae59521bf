use std::fmt;

use societas_completion::CompletionError;
use societas_identity::IdentityError;
use societas_store::StoreError;
use tracing::{debug, error};

use crate::ApiError;

/// Client-facing text for provider failures. Provider details stay in the logs.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Upstream service request failed";

#[derive(Debug)]
pub enum ServiceError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(String),
    Upstream(String),
    Storage(StoreError),
    Internal(String),
}

impl ServiceError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::BadRequest(msg)
            | ServiceError::Unauthorized(msg)
            | ServiceError::Forbidden(msg)
            | ServiceError::NotFound(msg)
            | ServiceError::Conflict(msg)
            | ServiceError::TooManyRequests(msg)
            | ServiceError::Upstream(msg)
            | ServiceError::Internal(msg) => f.write_str(msg),
            ServiceError::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Attach an entity name to `NotFound` and `AlreadyExists` store failures.
pub trait StoreResultExt<T> {
    fn or_missing(self, entity: &str) -> Result<T, ServiceError>;
    fn or_duplicate(self, entity: &str) -> Result<T, ServiceError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn or_missing(self, entity: &str) -> Result<T, ServiceError> {
        self.map_err(|err| match err {
            StoreError::NotFound(_) => ServiceError::NotFound(format!("{entity} not found")),
            other => other.into(),
        })
    }

    fn or_duplicate(self, entity: &str) -> Result<T, ServiceError> {
        self.map_err(|err| match err {
            StoreError::AlreadyExists(_) => {
                ServiceError::Conflict(format!("{entity} already exists."))
            }
            other => other.into(),
        })
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound("Resource not found".to_string()),
            StoreError::AlreadyExists(_) => Self::Conflict("Resource already exists".to_string()),
            StoreError::InvalidPath(path) => {
                Self::BadRequest(format!("Invalid identifier in path: {path}"))
            }
            other => Self::Storage(other),
        }
    }
}

impl From<IdentityError> for ServiceError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailExists => {
                Self::Conflict("User with this email already exists".to_string())
            }
            IdentityError::InvalidEmail => Self::BadRequest("Invalid email address".to_string()),
            IdentityError::WeakPassword => Self::BadRequest("Password is too weak".to_string()),
            IdentityError::InvalidCredentials => {
                Self::Unauthorized("Invalid email or password".to_string())
            }
            IdentityError::TooManyAttempts => Self::TooManyRequests(
                "Too many failed attempts. Please try again later.".to_string(),
            ),
            IdentityError::TokenExpired => Self::Unauthorized("Token has expired".to_string()),
            IdentityError::InvalidToken => Self::Unauthorized("Invalid token".to_string()),
            IdentityError::UserNotFound => Self::Unauthorized("User account not found".to_string()),
            IdentityError::UserDisabled => Self::Forbidden("User account is disabled".to_string()),
            IdentityError::NotConfigured => {
                Self::Internal("Identity provider is not configured".to_string())
            }
            IdentityError::Provider(message) => Self::Upstream(message),
            IdentityError::Transport(err) => Self::Upstream(err.to_string()),
        }
    }
}

impl From<CompletionError> for ServiceError {
    fn from(err: CompletionError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::BadRequest(msg) => {
                debug!(%msg, "bad request");
                ApiError::bad_request(msg)
            }
            ServiceError::Unauthorized(msg) => {
                debug!(%msg, "unauthorized");
                ApiError::unauthorized(msg)
            }
            ServiceError::Forbidden(msg) => {
                debug!(%msg, "forbidden");
                ApiError::forbidden(msg)
            }
            ServiceError::NotFound(msg) => {
                debug!(%msg, "not found");
                ApiError::not_found(msg)
            }
            ServiceError::Conflict(msg) => {
                debug!(%msg, "conflict");
                ApiError::conflict(msg)
            }
            ServiceError::TooManyRequests(msg) => {
                debug!(%msg, "rate limited by provider");
                ApiError::too_many_requests(msg)
            }
            ServiceError::Upstream(msg) => {
                error!("Upstream error: {}", msg);
                ApiError::bad_gateway(UPSTREAM_FAILURE_MESSAGE)
            }
            ServiceError::Storage(store_err) => {
                error!("Storage error: {}", store_err);
                ApiError::internal_server_error("Document store operation failed")
            }
            ServiceError::Internal(msg) => {
                error!("Internal error: {}", msg);
                ApiError::internal_server_error(msg)
            }
        }
    }
}
