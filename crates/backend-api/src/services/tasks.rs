use societas_store::{new_document_id, now_timestamp, DocumentStore, Query};

use super::{
    boards, fetch, fetch_all, merge, non_blank, paths, record_fields, remove, update_fields,
    ServiceError,
};
use crate::routes::models::{CreateTaskRequest, Task, UpdateTaskRequest};

pub async fn list_tasks(
    store: &dyn DocumentStore,
    user_id: &str,
    board_id: &str,
) -> Result<Vec<Task>, ServiceError> {
    fetch_all(store, &paths::tasks(user_id, board_id), &Query::new()).await
}

pub async fn get_task(
    store: &dyn DocumentStore,
    user_id: &str,
    board_id: &str,
    task_id: &str,
) -> Result<Task, ServiceError> {
    fetch(store, &paths::tasks(user_id, board_id).doc(task_id), "Task").await
}

/// Tasks are filed under an existing board. `creator_id` defaults to the caller.
pub async fn create_task(
    store: &dyn DocumentStore,
    user_id: &str,
    board_id: &str,
    req: CreateTaskRequest,
) -> Result<Task, ServiceError> {
    let description = non_blank(req.description)
        .ok_or_else(|| ServiceError::bad_request("Task description is required"))?;
    boards::get_board(store, user_id, board_id).await?;

    let task = Task {
        id: new_document_id(),
        description: Some(description),
        status: non_blank(req.status),
        creator_id: non_blank(req.creator_id).or_else(|| Some(user_id.to_string())),
        assignee_id: non_blank(req.assignee_id),
        created_at: Some(now_timestamp()),
        related_task_id: non_blank(req.related_task_id),
        result: req.result,
    };
    store
        .create(
            &paths::tasks(user_id, board_id).doc(&task.id),
            record_fields(&task)?,
        )
        .await?;
    tracing::debug!(%board_id, task_id = %task.id, "created task");
    Ok(task)
}

pub async fn update_task(
    store: &dyn DocumentStore,
    user_id: &str,
    board_id: &str,
    task_id: &str,
    req: UpdateTaskRequest,
) -> Result<Task, ServiceError> {
    let fields = update_fields(&req)?;
    merge(
        store,
        &paths::tasks(user_id, board_id).doc(task_id),
        fields,
        "Task",
    )
    .await
}

pub async fn delete_task(
    store: &dyn DocumentStore,
    user_id: &str,
    board_id: &str,
    task_id: &str,
) -> Result<(), ServiceError> {
    remove(store, &paths::tasks(user_id, board_id).doc(task_id), "Task").await
}
