use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    routes::models::{Chat, CreateChatRequest, DeletedResponse, UpdateChatRequest},
    services::chats as chat_service,
    util::CurrentUser,
    ApiError, AppState, Json,
};

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/chats",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the chats")
    ),
    responses(
        (status = 200, description = "Chats of the user", body = [Chat]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Chats belong to another user", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_chats(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Chat>>, ApiError> {
    user.ensure_owner(&user_id)?;
    let chats = chat_service::list_chats(state.store(), &user_id).await?;
    Ok(Json(chats))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/chats",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the chat")
    ),
    request_body = CreateChatRequest,
    responses(
        (status = 201, description = "Chat created", body = Chat),
        (status = 400, description = "Missing participants", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Chats belong to another user", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_chat(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
    Json(req): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<Chat>), ApiError> {
    user.ensure_owner(&user_id)?;
    let chat = chat_service::create_chat(state.store(), &user_id, req).await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/chats/with/{agent_id}",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the chats"),
        ("agent_id" = String, Path, description = "Agent taking part in the chat")
    ),
    responses(
        (status = 200, description = "First chat with the agent", body = Chat),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Chats belong to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "No chat found with this agent", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_chat_with_agent(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, agent_id)): Path<(String, String)>,
) -> Result<Json<Chat>, ApiError> {
    user.ensure_owner(&user_id)?;
    let chat = chat_service::find_chat_with(state.store(), &user_id, &agent_id).await?;
    Ok(Json(chat))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/chats/{chat_id}",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the chat"),
        ("chat_id" = String, Path, description = "Chat identifier")
    ),
    responses(
        (status = 200, description = "Chat fetched", body = Chat),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Chat belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Chat not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_chat(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, chat_id)): Path<(String, String)>,
) -> Result<Json<Chat>, ApiError> {
    user.ensure_owner(&user_id)?;
    let chat = chat_service::get_chat(state.store(), &user_id, &chat_id).await?;
    Ok(Json(chat))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}/chats/{chat_id}",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the chat"),
        ("chat_id" = String, Path, description = "Chat identifier")
    ),
    request_body = UpdateChatRequest,
    responses(
        (status = 200, description = "Chat updated", body = Chat),
        (status = 400, description = "No updatable fields supplied", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Chat belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Chat not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_chat(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, chat_id)): Path<(String, String)>,
    Json(req): Json<UpdateChatRequest>,
) -> Result<Json<Chat>, ApiError> {
    user.ensure_owner(&user_id)?;
    let chat = chat_service::update_chat(state.store(), &user_id, &chat_id, req).await?;
    Ok(Json(chat))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/chats/{chat_id}",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the chat"),
        ("chat_id" = String, Path, description = "Chat identifier")
    ),
    responses(
        (status = 200, description = "Chat deleted; its messages are kept", body = DeletedResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Chat belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Chat not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_chat(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, chat_id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse>, ApiError> {
    user.ensure_owner(&user_id)?;
    chat_service::delete_chat(state.store(), &user_id, &chat_id).await?;
    Ok(Json(DeletedResponse::new("Chat deleted successfully")))
}
