use societas_store::{DocumentStore, Query};

use super::{chats, fetch, fetch_all, paths, ServiceError};
use crate::routes::models::Message;

/// Messages of an existing chat, oldest first.
pub async fn list_messages(
    store: &dyn DocumentStore,
    user_id: &str,
    chat_id: &str,
) -> Result<Vec<Message>, ServiceError> {
    chats::get_chat(store, user_id, chat_id).await?;
    let query = Query::new().order_by("timestamp");
    fetch_all(store, &paths::messages(user_id, chat_id), &query).await
}

pub async fn get_message(
    store: &dyn DocumentStore,
    user_id: &str,
    chat_id: &str,
    message_id: &str,
) -> Result<Message, ServiceError> {
    fetch(
        store,
        &paths::messages(user_id, chat_id).doc(message_id),
        "Message",
    )
    .await
}
