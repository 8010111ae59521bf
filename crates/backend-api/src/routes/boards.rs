use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    routes::models::{Board, CreateBoardRequest, DeletedResponse, UpdateBoardRequest},
    services::boards as board_service,
    util::CurrentUser,
    ApiError, AppState, Json,
};

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/boards",
    tag = "Boards",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the boards")
    ),
    responses(
        (status = 200, description = "Boards of the user", body = [Board]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Boards belong to another user", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_boards(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Board>>, ApiError> {
    user.ensure_owner(&user_id)?;
    let boards = board_service::list_boards(state.store(), &user_id).await?;
    Ok(Json(boards))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/boards",
    tag = "Boards",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the board")
    ),
    request_body = CreateBoardRequest,
    responses(
        (status = 201, description = "Board created", body = Board),
        (status = 400, description = "Missing board title", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Boards belong to another user", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_board(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
    Json(req): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<Board>), ApiError> {
    user.ensure_owner(&user_id)?;
    let board = board_service::create_board(state.store(), &user_id, req).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/boards/{board_id}",
    tag = "Boards",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the board"),
        ("board_id" = String, Path, description = "Board identifier")
    ),
    responses(
        (status = 200, description = "Board fetched", body = Board),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Board belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Board not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_board(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, board_id)): Path<(String, String)>,
) -> Result<Json<Board>, ApiError> {
    user.ensure_owner(&user_id)?;
    let board = board_service::get_board(state.store(), &user_id, &board_id).await?;
    Ok(Json(board))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}/boards/{board_id}",
    tag = "Boards",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the board"),
        ("board_id" = String, Path, description = "Board identifier")
    ),
    request_body = UpdateBoardRequest,
    responses(
        (status = 200, description = "Board updated", body = Board),
        (status = 400, description = "No updatable fields supplied", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Board belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Board not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_board(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, board_id)): Path<(String, String)>,
    Json(req): Json<UpdateBoardRequest>,
) -> Result<Json<Board>, ApiError> {
    user.ensure_owner(&user_id)?;
    let board = board_service::update_board(state.store(), &user_id, &board_id, req).await?;
    Ok(Json(board))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/boards/{board_id}",
    tag = "Boards",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the board"),
        ("board_id" = String, Path, description = "Board identifier")
    ),
    responses(
        (status = 200, description = "Board deleted", body = DeletedResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Board belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Board not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_board(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, board_id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse>, ApiError> {
    user.ensure_owner(&user_id)?;
    board_service::delete_board(state.store(), &user_id, &board_id).await?;
    Ok(Json(DeletedResponse::new("Board deleted successfully")))
}
