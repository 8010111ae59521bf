use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use societas_identity::{IdentityError, IdentityProvider, IdentitySession};
use societas_store::{now_timestamp, DocumentStore};

use super::{json_fields, paths, ServiceError};
use crate::routes::auth::{AuthUser, CredentialsRequest, SessionData, TokenData};

static EMAIL_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

const MIN_PASSWORD_LEN: usize = 6;

/// Presence check shared by sign-up and sign-in. Returns `(email, password)`.
fn require_credentials(req: CredentialsRequest) -> Result<(String, String), ServiceError> {
    let email = req.email.map(|e| e.trim().to_string()).unwrap_or_default();
    let password = req.password.unwrap_or_default();
    match (email.is_empty(), password.is_empty()) {
        (true, true) => Err(ServiceError::bad_request("Email and password are required")),
        (true, false) => Err(ServiceError::bad_request("Email is required")),
        (false, true) => Err(ServiceError::bad_request("Password is required")),
        (false, false) => Ok((email, password)),
    }
}

pub fn validate_sign_up(req: CredentialsRequest) -> Result<(String, String), ServiceError> {
    let (email, password) = require_credentials(req)?;
    let pattern = EMAIL_PATTERN
        .as_ref()
        .ok_or_else(|| ServiceError::internal("Invalid email regex"))?;
    if !pattern.is_match(&email) {
        return Err(ServiceError::bad_request("Invalid email format"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::bad_request(
            "Password must be at least 6 characters long",
        ));
    }
    Ok((email, password))
}

/// Register the account with the identity provider and store its profile.
pub async fn sign_up(
    identity: &dyn IdentityProvider,
    store: &dyn DocumentStore,
    req: CredentialsRequest,
) -> Result<SessionData, ServiceError> {
    let (email, password) = validate_sign_up(req)?;
    let session = identity.sign_up(&email, &password).await?;

    let now = now_timestamp();
    let profile = json!({
        "email": session.email.clone().unwrap_or(email),
        "email_verified": false,
        "created_at": now,
        "updated_at": now,
    });
    store
        .set(&paths::user(&session.uid), json_fields(profile))
        .await?;
    tracing::info!(uid = %session.uid, "account created");

    Ok(session_data(
        session,
        AuthUser {
            email_verified: Some(false),
            created_at: Some(now),
            ..AuthUser::default()
        },
    ))
}

/// Password sign-in. The account needs a stored profile; its login time is stamped.
pub async fn sign_in(
    identity: &dyn IdentityProvider,
    store: &dyn DocumentStore,
    req: CredentialsRequest,
) -> Result<SessionData, ServiceError> {
    let (email, password) = require_credentials(req)?;
    let session = identity.sign_in(&email, &password).await?;

    let path = paths::user(&session.uid);
    let profile = store
        .get(&path)
        .await?
        .ok_or_else(|| ServiceError::unauthorized("User account not found"))?;

    let now = now_timestamp();
    store
        .update(
            &path,
            json_fields(json!({ "last_login_at": now, "updated_at": now })),
        )
        .await?;

    let user = AuthUser {
        email_verified: profile.get("email_verified").and_then(Value::as_bool),
        created_at: profile.get_str("created_at").map(str::to_string),
        last_login_at: Some(now),
        ..AuthUser::default()
    };
    Ok(session_data(session, user))
}

pub async fn refresh(
    identity: &dyn IdentityProvider,
    refresh_token: Option<String>,
) -> Result<TokenData, ServiceError> {
    let refresh_token = refresh_token
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ServiceError::bad_request("Refresh token is required"))?;

    let tokens = identity
        .refresh(&refresh_token)
        .await
        .map_err(|err| match err {
            IdentityError::TokenExpired => ServiceError::unauthorized("Refresh token has expired"),
            IdentityError::NotConfigured => err.into(),
            other => {
                tracing::debug!(error = %other, "refresh rejected");
                ServiceError::unauthorized("Invalid refresh token")
            }
        })?;

    Ok(TokenData {
        token: tokens.id_token,
        refresh_token: tokens.refresh_token,
    })
}

/// Resolve an ID token to the account and its stored profile.
pub async fn verify(
    identity: &dyn IdentityProvider,
    store: &dyn DocumentStore,
    token: Option<String>,
) -> Result<AuthUser, ServiceError> {
    let token = token
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ServiceError::bad_request("Token is required"))?;

    let verified = identity.verify_token(&token).await?;
    let profile = store
        .get(&paths::user(&verified.uid))
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))?;

    Ok(AuthUser {
        uid: verified.uid,
        email: verified.email,
        display_name: verified.display_name,
        email_verified: Some(verified.email_verified),
        created_at: profile.get_str("created_at").map(str::to_string),
        last_login_at: profile.get_str("last_login_at").map(str::to_string),
    })
}

fn session_data(session: IdentitySession, user: AuthUser) -> SessionData {
    SessionData {
        user: AuthUser {
            uid: session.uid,
            email: session.email,
            ..user
        },
        token: session.id_token,
        refresh_token: Some(session.refresh_token).filter(|token| !token.is_empty()),
    }
}
