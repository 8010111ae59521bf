use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    routes::models::{ChatTurnRequest, ChatTurnResponse, Message},
    services::{conversation, messages as message_service},
    util::CurrentUser,
    ApiError, AppState, Json,
};

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/chats/{chat_id}/messages",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the chat"),
        ("chat_id" = String, Path, description = "Chat identifier")
    ),
    responses(
        (status = 200, description = "Messages ordered by timestamp", body = [Message]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Chat belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Chat not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_messages(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, chat_id)): Path<(String, String)>,
) -> Result<Json<Vec<Message>>, ApiError> {
    user.ensure_owner(&user_id)?;
    let messages = message_service::list_messages(state.store(), &user_id, &chat_id).await?;
    Ok(Json(messages))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/chats/{chat_id}/messages/{message_id}",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the chat"),
        ("chat_id" = String, Path, description = "Chat identifier"),
        ("message_id" = String, Path, description = "Message identifier")
    ),
    responses(
        (status = 200, description = "Message fetched", body = Message),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Chat belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Message not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, chat_id, message_id)): Path<(String, String, String)>,
) -> Result<Json<Message>, ApiError> {
    user.ensure_owner(&user_id)?;
    let message =
        message_service::get_message(state.store(), &user_id, &chat_id, &message_id).await?;
    Ok(Json(message))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/chats/{chat_id}/messages",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the chat"),
        ("chat_id" = String, Path, description = "Chat identifier")
    ),
    request_body = ChatTurnRequest,
    responses(
        (status = 201, description = "Message sent and agent reply stored", body = ChatTurnResponse),
        (status = 400, description = "Missing message or agentId", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Chat belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Chat or agent not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Completion provider failed", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to store the turn", body = crate::error::ErrorResponse)
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, chat_id)): Path<(String, String)>,
    Json(req): Json<ChatTurnRequest>,
) -> Result<(StatusCode, Json<ChatTurnResponse>), ApiError> {
    user.ensure_owner(&user_id)?;
    let ids = conversation::run_chat_turn(&state, &user_id, &chat_id, req).await?;
    Ok((StatusCode::CREATED, Json(ids)))
}
