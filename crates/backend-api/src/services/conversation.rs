//! Chat-with-agent turns.
//!
//! A turn moves through [`TurnStage`]s: the request is validated, the chat
//! history is loaded and mapped onto completion turns, the agent reply is
//! generated, and finally the inbound message, the reply and the chat's
//! `last_message` are committed as one batch. A turn is never partially
//! visible: nothing is written before the reply exists.

use std::fmt;

use chrono::{Duration, Utc};
use serde_json::json;
use societas_completion::Turn;
use societas_store::{
    format_timestamp, new_document_id, DocumentStore, Fields, Query, WriteBatch,
};
use tracing::debug;

use super::{chats, fetch_all, json_fields, non_blank, paths, ServiceError};
use crate::{
    routes::models::{ChatTurnRequest, ChatTurnResponse, Message},
    AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Received,
    HistoryLoaded,
    Generated,
    Committed,
    Failed,
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TurnStage::Received => "received",
            TurnStage::HistoryLoaded => "history_loaded",
            TurnStage::Generated => "generated",
            TurnStage::Committed => "committed",
            TurnStage::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Label each stored message `user` when the human sent it and `model` otherwise.
pub fn history_from_messages(messages: &[Message], human_id: &str) -> Vec<Turn> {
    messages
        .iter()
        .map(|message| {
            if message.sender_id == human_id {
                Turn::user(message.content.clone())
            } else {
                Turn::model(message.content.clone())
            }
        })
        .collect()
}

/// Load the conversation between `user_id` and `agent_id` in `chat_id`.
///
/// The chat must exist and the agent must be one of its participants other
/// than the user. An empty chat yields an empty history.
pub async fn assemble_history(
    store: &dyn DocumentStore,
    user_id: &str,
    chat_id: &str,
    agent_id: &str,
) -> Result<Vec<Turn>, ServiceError> {
    let chat = chats::get_chat(store, user_id, chat_id).await?;
    let is_counterparty =
        agent_id != user_id && chat.participants.iter().any(|member| member == agent_id);
    if !is_counterparty {
        return Err(ServiceError::not_found(
            "Agent is not a participant in this chat",
        ));
    }

    let query = Query::new().order_by("timestamp");
    let messages: Vec<Message> =
        fetch_all(store, &paths::messages(user_id, chat_id), &query).await?;
    Ok(history_from_messages(&messages, user_id))
}

/// One inbound message and the reply it produced.
#[derive(Debug, Clone, Copy)]
pub struct TurnDraft<'a> {
    pub sender_id: &'a str,
    pub inbound: &'a str,
    pub responder_id: &'a str,
    pub reply: &'a str,
}

/// Write both messages and refresh the chat's `last_message` atomically.
///
/// The chat update carries an existence precondition, so a chat deleted in
/// the meantime aborts the whole batch.
pub async fn commit_turn(
    store: &dyn DocumentStore,
    user_id: &str,
    chat_id: &str,
    draft: TurnDraft<'_>,
) -> Result<ChatTurnResponse, ServiceError> {
    let sent_at = Utc::now();
    let inbound_id = new_document_id();
    let reply_id = new_document_id();
    let messages = paths::messages(user_id, chat_id);

    let mut batch = WriteBatch::new();
    batch
        .create(
            messages.doc(&inbound_id),
            message_fields(draft.sender_id, draft.inbound, &format_timestamp(sent_at)),
        )
        .create(
            messages.doc(&reply_id),
            message_fields(
                draft.responder_id,
                draft.reply,
                &format_timestamp(sent_at + Duration::microseconds(1)),
            ),
        )
        .update(
            paths::chat(user_id, chat_id),
            json_fields(json!({ "last_message": draft.reply })),
        );

    store.commit(batch).await.map_err(ServiceError::Storage)?;

    Ok(ChatTurnResponse {
        user_message_id: inbound_id,
        ai_message_id: reply_id,
    })
}

/// Handle `POST .../chats/{chat_id}/messages` end to end. No step is retried.
pub async fn run_chat_turn(
    state: &AppState,
    user_id: &str,
    chat_id: &str,
    req: ChatTurnRequest,
) -> Result<ChatTurnResponse, ServiceError> {
    debug!(%chat_id, stage = %TurnStage::Received, "chat turn");
    let outcome = advance(state, user_id, chat_id, req).await;
    match &outcome {
        Ok(_) => debug!(%chat_id, stage = %TurnStage::Committed, "chat turn"),
        Err(err) => debug!(%chat_id, stage = %TurnStage::Failed, error = %err, "chat turn"),
    }
    outcome
}

async fn advance(
    state: &AppState,
    user_id: &str,
    chat_id: &str,
    req: ChatTurnRequest,
) -> Result<ChatTurnResponse, ServiceError> {
    let (message, agent_id) = match (non_blank(req.message), non_blank(req.agent_id)) {
        (Some(message), Some(agent_id)) => (message, agent_id),
        _ => {
            return Err(ServiceError::bad_request(
                "Both message and agentId are required",
            ))
        }
    };

    let history = assemble_history(state.store(), user_id, chat_id, &agent_id).await?;
    debug!(%chat_id, stage = %TurnStage::HistoryLoaded, turns = history.len(), "chat turn");

    let reply = state
        .completion()
        .generate(state.system_instruction(), &history, &message)
        .await?;
    debug!(%chat_id, stage = %TurnStage::Generated, reply_len = reply.len(), "chat turn");

    commit_turn(
        state.store(),
        user_id,
        chat_id,
        TurnDraft {
            sender_id: user_id,
            inbound: &message,
            responder_id: &agent_id,
            reply: &reply,
        },
    )
    .await
}

fn message_fields(sender_id: &str, content: &str, timestamp: &str) -> Fields {
    json_fields(json!({
        "sender_id": sender_id,
        "content": content,
        "timestamp": timestamp,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_utils::{create_test_store, seed_chat};
    use societas_completion::Role;

    fn message(id: &str, sender: &str, content: &str, timestamp: &str) -> Message {
        Message {
            id: id.into(),
            sender_id: sender.into(),
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }

    #[test]
    fn history_labels_human_and_agent_turns() {
        let messages = vec![
            message("m1", "u1", "hello", "2024-01-01T00:00:00.000000Z"),
            message("m2", "a1", "hi there", "2024-01-01T00:00:01.000000Z"),
            message("m3", "u1", "how are you?", "2024-01-01T00:00:02.000000Z"),
        ];

        let history = history_from_messages(&messages, "u1");
        let roles: Vec<Role> = history.iter().map(|turn| turn.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Model, Role::User]);
        assert_eq!(history[1].text(), "hi there");
    }

    #[test]
    fn history_of_empty_chat_is_empty() {
        assert!(history_from_messages(&[], "u1").is_empty());
    }

    #[tokio::test]
    async fn assemble_history_requires_agent_participant() {
        let (store, _dir) = create_test_store().await;
        let chat_id = seed_chat(store.as_ref(), "u1", &["u1", "a1"]).await;

        let err = assemble_history(store.as_ref(), "u1", &chat_id, "a2")
            .await
            .expect_err("a2 is not in the chat");
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = assemble_history(store.as_ref(), "u1", &chat_id, "u1")
            .await
            .expect_err("the human is not a counter-party");
        assert!(matches!(err, ServiceError::NotFound(_)));

        let history = assemble_history(store.as_ref(), "u1", &chat_id, "a1")
            .await
            .expect("history loads");
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn assemble_history_of_missing_chat_is_not_found() {
        let (store, _dir) = create_test_store().await;
        let err = assemble_history(store.as_ref(), "u1", "nope", "a1")
            .await
            .expect_err("chat is missing");
        assert!(matches!(err, ServiceError::NotFound(msg) if msg == "Chat not found"));
    }

    #[tokio::test]
    async fn commit_turn_orders_reply_after_inbound() {
        let (store, _dir) = create_test_store().await;
        let chat_id = seed_chat(store.as_ref(), "u1", &["u1", "a1"]).await;

        let ids = commit_turn(
            store.as_ref(),
            "u1",
            &chat_id,
            TurnDraft {
                sender_id: "u1",
                inbound: "ping",
                responder_id: "a1",
                reply: "pong",
            },
        )
        .await
        .expect("turn commits");

        let messages = crate::services::messages::list_messages(store.as_ref(), "u1", &chat_id)
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, ids.user_message_id);
        assert_eq!(messages[0].sender_id, "u1");
        assert_eq!(messages[1].id, ids.ai_message_id);
        assert_eq!(messages[1].sender_id, "a1");
        assert!(messages[0].timestamp < messages[1].timestamp);

        let chat = chats::get_chat(store.as_ref(), "u1", &chat_id).await.unwrap();
        assert_eq!(chat.last_message.as_deref(), Some("pong"));
    }

    #[tokio::test]
    async fn commit_turn_on_deleted_chat_writes_nothing() {
        let (store, _dir) = create_test_store().await;

        let err = commit_turn(
            store.as_ref(),
            "u1",
            "gone",
            TurnDraft {
                sender_id: "u1",
                inbound: "ping",
                responder_id: "a1",
                reply: "pong",
            },
        )
        .await
        .expect_err("chat precondition fails");
        assert!(matches!(err, ServiceError::Storage(_)));

        let leftovers = store
            .list(&paths::messages("u1", "gone"), &Query::new())
            .await
            .unwrap();
        assert!(leftovers.is_empty());
    }
}
