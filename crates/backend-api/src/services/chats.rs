use serde_json::Value;
use societas_store::{new_document_id, now_timestamp, DocumentStore, Filter, Query};

use super::{
    fetch, fetch_all, merge, non_blank, paths, record_fields, remove, update_fields,
    ServiceError,
};
use crate::routes::models::{Chat, CreateChatRequest, UpdateChatRequest};

pub async fn list_chats(store: &dyn DocumentStore, user_id: &str) -> Result<Vec<Chat>, ServiceError> {
    fetch_all(store, &paths::chats(user_id), &Query::new()).await
}

pub async fn get_chat(
    store: &dyn DocumentStore,
    user_id: &str,
    chat_id: &str,
) -> Result<Chat, ServiceError> {
    fetch(store, &paths::chat(user_id, chat_id), "Chat").await
}

/// Open a chat. `agent_id` is shorthand for `participants = [user, agent]`;
/// the human participant always comes first.
pub async fn create_chat(
    store: &dyn DocumentStore,
    user_id: &str,
    req: CreateChatRequest,
) -> Result<Chat, ServiceError> {
    let participants = match (non_blank(req.agent_id), req.participants) {
        (Some(agent_id), _) => vec![user_id.to_string(), agent_id],
        (None, Some(participants)) if !participants.is_empty() => participants,
        _ => {
            return Err(ServiceError::bad_request(
                "Chat participants are required (agent_id or participants)",
            ))
        }
    };

    let chat = Chat {
        id: new_document_id(),
        participants,
        summary: non_blank(req.summary),
        last_message: req.last_message,
        created_at: Some(now_timestamp()),
    };
    store
        .create(&paths::chat(user_id, &chat.id), record_fields(&chat)?)
        .await?;
    tracing::debug!(%user_id, chat_id = %chat.id, "created chat");
    Ok(chat)
}

/// First chat that counts `agent_id` among its participants.
pub async fn find_chat_with(
    store: &dyn DocumentStore,
    user_id: &str,
    agent_id: &str,
) -> Result<Chat, ServiceError> {
    let query = Query::new()
        .filter(Filter::ArrayContains(
            "participants".into(),
            Value::String(agent_id.to_string()),
        ))
        .limit(1);
    let chats: Vec<Chat> = fetch_all(store, &paths::chats(user_id), &query).await?;
    chats
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::not_found("No chat found with this agent."))
}

pub async fn update_chat(
    store: &dyn DocumentStore,
    user_id: &str,
    chat_id: &str,
    req: UpdateChatRequest,
) -> Result<Chat, ServiceError> {
    let fields = update_fields(&req)?;
    merge(store, &paths::chat(user_id, chat_id), fields, "Chat").await
}

/// Removes the chat document only; its messages stay in the store.
pub async fn delete_chat(
    store: &dyn DocumentStore,
    user_id: &str,
    chat_id: &str,
) -> Result<(), ServiceError> {
    remove(store, &paths::chat(user_id, chat_id), "Chat").await
}
