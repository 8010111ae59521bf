use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    routes::models::{CreateTaskRequest, DeletedResponse, Task, UpdateTaskRequest},
    services::tasks as task_service,
    util::CurrentUser,
    ApiError, AppState, Json,
};

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/boards/{board_id}/tasks",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the board"),
        ("board_id" = String, Path, description = "Board identifier")
    ),
    responses(
        (status = 200, description = "Tasks on the board", body = [Task]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Board belongs to another user", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, board_id)): Path<(String, String)>,
) -> Result<Json<Vec<Task>>, ApiError> {
    user.ensure_owner(&user_id)?;
    let tasks = task_service::list_tasks(state.store(), &user_id, &board_id).await?;
    Ok(Json(tasks))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/boards/{board_id}/tasks",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the board"),
        ("board_id" = String, Path, description = "Board identifier")
    ),
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Missing task description", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Board belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Board not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, board_id)): Path<(String, String)>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    user.ensure_owner(&user_id)?;
    let task = task_service::create_task(state.store(), &user_id, &board_id, req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/boards/{board_id}/tasks/{task_id}",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the board"),
        ("board_id" = String, Path, description = "Board identifier"),
        ("task_id" = String, Path, description = "Task identifier")
    ),
    responses(
        (status = 200, description = "Task fetched", body = Task),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Board belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Task not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, board_id, task_id)): Path<(String, String, String)>,
) -> Result<Json<Task>, ApiError> {
    user.ensure_owner(&user_id)?;
    let task = task_service::get_task(state.store(), &user_id, &board_id, &task_id).await?;
    Ok(Json(task))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}/boards/{board_id}/tasks/{task_id}",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the board"),
        ("board_id" = String, Path, description = "Board identifier"),
        ("task_id" = String, Path, description = "Task identifier")
    ),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "No updatable fields supplied", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Board belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Task not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, board_id, task_id)): Path<(String, String, String)>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    user.ensure_owner(&user_id)?;
    let task =
        task_service::update_task(state.store(), &user_id, &board_id, &task_id, req).await?;
    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/boards/{board_id}/tasks/{task_id}",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the board"),
        ("board_id" = String, Path, description = "Board identifier"),
        ("task_id" = String, Path, description = "Task identifier")
    ),
    responses(
        (status = 200, description = "Task deleted", body = DeletedResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Board belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Task not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, board_id, task_id)): Path<(String, String, String)>,
) -> Result<Json<DeletedResponse>, ApiError> {
    user.ensure_owner(&user_id)?;
    task_service::delete_task(state.store(), &user_id, &board_id, &task_id).await?;
    Ok(Json(DeletedResponse::new("Task deleted successfully")))
}
