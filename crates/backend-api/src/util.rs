use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::{ApiError, AppState};

pub fn require_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing authorization header"))?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or("");
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(ApiError::unauthorized("invalid authorization scheme"));
    }

    let token = parts.next().unwrap_or("");
    if token.is_empty() {
        return Err(ApiError::unauthorized("missing bearer token"));
    }

    Ok(token.to_string())
}

/// The caller behind a verified bearer ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub uid: String,
    pub email: Option<String>,
}

impl CurrentUser {
    /// Everything under `users/{user_id}` belongs to that user alone.
    pub fn ensure_owner(&self, user_id: &str) -> Result<(), ApiError> {
        if self.uid == user_id {
            Ok(())
        } else {
            tracing::debug!(caller = %self.uid, target = %user_id, "ownership check failed");
            Err(ApiError::forbidden("You do not have access to this user's data"))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = require_bearer(&parts.headers)?;
        let verified = state.authenticate(&token).await?;
        Ok(Self {
            uid: verified.uid,
            email: verified.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    #[test]
    fn require_bearer_extracts_token_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer TOKEN123"));

        let token = require_bearer(&headers).expect("token should be extracted");
        assert_eq!(token, "TOKEN123");
    }

    #[test]
    fn require_bearer_rejects_missing_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));

        let error = require_bearer(&headers).expect_err("should reject missing token");
        assert_eq!(error.status, StatusCode::UNAUTHORIZED);
        assert!(error.message.contains("missing bearer token"));
    }

    #[test]
    fn require_bearer_ignores_legacy_user_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("u1"));

        let error = require_bearer(&headers).expect_err("header alone is not a credential");
        assert_eq!(error.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn ensure_owner_rejects_other_users() {
        let caller = CurrentUser {
            uid: "u1".into(),
            email: None,
        };
        assert!(caller.ensure_owner("u1").is_ok());
        let error = caller.ensure_owner("u2").expect_err("foreign tree");
        assert_eq!(error.status, StatusCode::FORBIDDEN);
    }
}
