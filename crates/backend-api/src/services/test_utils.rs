//! Test utilities for service layer testing

use std::sync::Arc;

use societas_config::SqliteStoreConfig;
use societas_store::{DocumentStore, SqliteDocumentStore};
use tempfile::TempDir;

use super::chats;
use crate::routes::models::CreateChatRequest;

/// Creates an empty document store backed by a throwaway SQLite file.
pub async fn create_test_store() -> (Arc<dyn DocumentStore>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("services.sqlite");

    let config = SqliteStoreConfig {
        url: format!("sqlite://{}", db_path.display()),
        max_connections: 1,
    };
    let store = SqliteDocumentStore::connect(&config)
        .await
        .expect("Failed to create test database");

    (Arc::new(store), temp_dir)
}

/// Creates a chat owned by `user_id` and returns its id.
pub async fn seed_chat(store: &dyn DocumentStore, user_id: &str, participants: &[&str]) -> String {
    let request = CreateChatRequest {
        participants: Some(participants.iter().map(|id| id.to_string()).collect()),
        ..CreateChatRequest::default()
    };
    chats::create_chat(store, user_id, request)
        .await
        .expect("Failed to seed chat")
        .id
}
