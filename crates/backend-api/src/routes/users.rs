use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    routes::models::{CreateUserRequest, DeletedResponse, UpdateUserRequest, User},
    services::users as user_service,
    util::CurrentUser,
    ApiError, AppState, Json,
};

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "All user profiles", body = [User]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to list users", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = user_service::list_users(state.store()).await?;
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    security(("bearerAuth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User profile created", body = User),
        (status = 400, description = "Invalid user payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Profile belongs to another user", body = crate::error::ErrorResponse),
        (status = 409, description = "User already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let created = user_service::create_user(state.store(), &user.uid, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(
        ("id" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "User profile", body = User),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let found = user_service::get_user(state.store(), &id).await?;
    Ok(Json(found))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(
        ("id" = String, Path, description = "User identifier")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User profile updated", body = User),
        (status = 400, description = "No updatable fields supplied", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Profile belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    user.ensure_owner(&id)?;
    let updated = user_service::update_user(state.store(), &id, req).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(
        ("id" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "User profile deleted", body = DeletedResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Profile belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    user.ensure_owner(&id)?;
    user_service::delete_user(state.store(), &id).await?;
    Ok(Json(DeletedResponse::new("User deleted successfully")))
}
