use societas_store::{new_document_id, now_timestamp, DocumentStore, Query};

use super::{
    fetch, fetch_all, merge, non_blank, paths, record_fields, remove, update_fields,
    ServiceError,
};
use crate::routes::models::{Board, CreateBoardRequest, UpdateBoardRequest};

pub async fn list_boards(store: &dyn DocumentStore, user_id: &str) -> Result<Vec<Board>, ServiceError> {
    fetch_all(store, &paths::boards(user_id), &Query::new()).await
}

pub async fn get_board(
    store: &dyn DocumentStore,
    user_id: &str,
    board_id: &str,
) -> Result<Board, ServiceError> {
    fetch(store, &paths::board(user_id, board_id), "Board").await
}

pub async fn create_board(
    store: &dyn DocumentStore,
    user_id: &str,
    req: CreateBoardRequest,
) -> Result<Board, ServiceError> {
    let title = non_blank(req.title)
        .ok_or_else(|| ServiceError::bad_request("Board title is required"))?;

    let board = Board {
        id: new_document_id(),
        title: Some(title),
        owner_id: Some(user_id.to_string()),
        created_at: Some(now_timestamp()),
        description: non_blank(req.description),
        summary: non_blank(req.summary),
        finish_pc: req.finish_pc,
        members: req.members,
    };
    store
        .create(&paths::board(user_id, &board.id), record_fields(&board)?)
        .await?;
    tracing::debug!(%user_id, board_id = %board.id, "created board");
    Ok(board)
}

pub async fn update_board(
    store: &dyn DocumentStore,
    user_id: &str,
    board_id: &str,
    req: UpdateBoardRequest,
) -> Result<Board, ServiceError> {
    let fields = update_fields(&req)?;
    merge(store, &paths::board(user_id, board_id), fields, "Board").await
}

pub async fn delete_board(
    store: &dyn DocumentStore,
    user_id: &str,
    board_id: &str,
) -> Result<(), ServiceError> {
    remove(store, &paths::board(user_id, board_id), "Board").await
}
