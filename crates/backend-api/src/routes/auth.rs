use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{services::auth as auth_service, ApiError, AppState, Json};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct VerifyRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// Account details safe to hand back to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub user: AuthUser,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyData {
    pub user: AuthUser,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub success: bool,
    pub message: String,
    pub data: SessionData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub success: bool,
    pub message: String,
    pub data: TokenData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: String,
    pub data: VerifyData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignOutResponse {
    pub success: bool,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 400, description = "Invalid email or password", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse),
        (status = 502, description = "Identity provider failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let data = auth_service::sign_up(state.identity(), state.store(), req).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            success: true,
            message: "User created successfully".to_string(),
            data,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 400, description = "Missing email or password", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials or no profile", body = crate::error::ErrorResponse),
        (status = 429, description = "Too many failed attempts", body = crate::error::ErrorResponse)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let data = auth_service::sign_in(state.identity(), state.store(), req).await?;
    Ok(Json(SessionResponse {
        success: true,
        message: "Sign in successful".to_string(),
        data,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/signout",
    tag = "Auth",
    responses(
        (status = 200, description = "Client should discard its tokens", body = SignOutResponse)
    )
)]
pub async fn sign_out() -> Json<SignOutResponse> {
    Json(SignOutResponse {
        success: true,
        message: "Sign out successful. Please discard your tokens on the client side.".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens refreshed", body = TokenResponse),
        (status = 400, description = "Missing refresh token", body = crate::error::ErrorResponse),
        (status = 401, description = "Refresh token expired or invalid", body = crate::error::ErrorResponse)
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let data = auth_service::refresh(state.identity(), req.refresh_token).await?;
    Ok(Json(TokenResponse {
        success: true,
        message: "Token refreshed successfully".to_string(),
        data,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify",
    tag = "Auth",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Token verified", body = VerifyResponse),
        (status = 400, description = "Missing token", body = crate::error::ErrorResponse),
        (status = 401, description = "Token expired or invalid", body = crate::error::ErrorResponse),
        (status = 404, description = "User profile not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn verify_token(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let user = auth_service::verify(state.identity(), state.store(), req.token).await?;
    Ok(Json(VerifyResponse {
        success: true,
        message: "Token verified successfully".to_string(),
        data: VerifyData { user },
    }))
}
