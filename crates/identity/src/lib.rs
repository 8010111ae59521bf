//! Identity provider abstraction used by the HTTP layer.
//!
//! The server never mints or checks credentials itself: sign-up, sign-in,
//! token refresh and ID-token verification are delegated to an
//! [`IdentityProvider`]. [`FirebaseIdentity`] talks to the Firebase
//! Authentication REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod firebase;

pub use firebase::FirebaseIdentity;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("email is already registered")]
    EmailExists,
    #[error("email address is invalid")]
    InvalidEmail,
    #[error("password is too weak")]
    WeakPassword,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("too many failed attempts, try again later")]
    TooManyAttempts,
    #[error("token has expired")]
    TokenExpired,
    #[error("token is invalid")]
    InvalidToken,
    #[error("user not found")]
    UserNotFound,
    #[error("user account is disabled")]
    UserDisabled,
    #[error("identity provider is not configured")]
    NotConfigured,
    #[error("identity provider rejected the request: {0}")]
    Provider(String),
    #[error("identity request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl IdentityError {
    /// Map a provider error code such as `WEAK_PASSWORD : Password should be at least 6 characters`.
    pub fn from_provider_code(message: &str) -> Self {
        let code = message
            .split(|c: char| c == ':' || c.is_whitespace())
            .next()
            .unwrap_or_default();

        match code {
            "EMAIL_EXISTS" => IdentityError::EmailExists,
            "INVALID_EMAIL" | "MISSING_EMAIL" => IdentityError::InvalidEmail,
            "WEAK_PASSWORD" | "MISSING_PASSWORD" => IdentityError::WeakPassword,
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                IdentityError::InvalidCredentials
            }
            "TOO_MANY_ATTEMPTS_TRY_LATER" => IdentityError::TooManyAttempts,
            "TOKEN_EXPIRED" => IdentityError::TokenExpired,
            "INVALID_ID_TOKEN" | "INVALID_REFRESH_TOKEN" | "MISSING_REFRESH_TOKEN"
            | "INVALID_GRANT_TYPE" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => IdentityError::InvalidToken,
            "USER_NOT_FOUND" => IdentityError::UserNotFound,
            "USER_DISABLED" => IdentityError::UserDisabled,
            _ => IdentityError::Provider(message.to_string()),
        }
    }
}

/// Tokens issued after a successful sign-up or sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySession {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshedTokens {
    pub uid: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: Option<u64>,
}

/// Account details resolved from a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedUser {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError>;

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, IdentityError>;

    /// Resolve the account behind an ID token. Fails for expired or forged tokens.
    async fn verify_token(&self, id_token: &str) -> Result<VerifiedUser, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_codes_map_to_typed_errors() {
        assert!(matches!(
            IdentityError::from_provider_code("EMAIL_EXISTS"),
            IdentityError::EmailExists
        ));
        assert!(matches!(
            IdentityError::from_provider_code(
                "WEAK_PASSWORD : Password should be at least 6 characters"
            ),
            IdentityError::WeakPassword
        ));
        assert!(matches!(
            IdentityError::from_provider_code("INVALID_LOGIN_CREDENTIALS"),
            IdentityError::InvalidCredentials
        ));
        assert!(matches!(
            IdentityError::from_provider_code("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            IdentityError::TooManyAttempts
        ));
        assert!(matches!(
            IdentityError::from_provider_code("INVALID_REFRESH_TOKEN"),
            IdentityError::InvalidToken
        ));
    }

    #[test]
    fn unknown_codes_are_preserved() {
        match IdentityError::from_provider_code("OPERATION_NOT_ALLOWED") {
            IdentityError::Provider(message) => assert_eq!(message, "OPERATION_NOT_ALLOWED"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
