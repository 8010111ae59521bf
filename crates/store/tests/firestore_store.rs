//! Firestore REST backend against a mocked emulator endpoint.

use httpmock::prelude::*;
use serde_json::{json, Value};

use societas_config::FirestoreConfig;
use societas_store::{
    CollectionPath, DocumentStore, Fields, Filter, FirestoreStore, Query, StoreError, WriteBatch,
};

const ROOT: &str = "/v1/projects/demo/databases/(default)/documents";

fn store_for(server: &MockServer) -> FirestoreStore {
    let config = FirestoreConfig {
        project_id: Some("demo".to_string()),
        emulator_host: Some(server.address().to_string()),
        ..FirestoreConfig::default()
    };
    FirestoreStore::new(&config).expect("store configures")
}

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(fields) => fields,
        other => panic!("expected an object, got {other}"),
    }
}

#[tokio::test]
async fn get_decodes_typed_fields() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("{ROOT}/users/u1"))
                .header("authorization", "Bearer owner");
            then.status(200).json_body(json!({
                "name": "projects/demo/databases/(default)/documents/users/u1",
                "fields": {
                    "name": { "stringValue": "Ada" },
                    "email_verified": { "booleanValue": false }
                }
            }));
        })
        .await;

    let store = store_for(&server);
    let document = store
        .get(&CollectionPath::root("users").doc("u1"))
        .await
        .expect("get succeeds")
        .expect("document exists");

    mock.assert_async().await;
    assert_eq!(
        document.into_json(),
        json!({ "id": "u1", "name": "Ada", "email_verified": false })
    );
}

#[tokio::test]
async fn get_maps_404_to_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{ROOT}/users/ghost"));
            then.status(404).json_body(json!({
                "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" }
            }));
        })
        .await;

    let store = store_for(&server);
    let document = store
        .get(&CollectionPath::root("users").doc("ghost"))
        .await
        .expect("get succeeds");
    assert!(document.is_none());
}

#[tokio::test]
async fn reserved_characters_in_ids_are_escaped_in_urls_only() {
    let server = MockServer::start_async().await;
    let escaped = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{ROOT}/users/a%23b"));
            then.status(200).json_body(json!({
                "name": "projects/demo/databases/(default)/documents/users/a#b",
                "fields": { "name": { "stringValue": "Hash" } }
            }));
        })
        .await;
    let truncated = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{ROOT}/users/a"));
            then.status(200).json_body(json!({
                "name": "projects/demo/databases/(default)/documents/users/a",
                "fields": { "name": { "stringValue": "Wrong" } }
            }));
        })
        .await;
    let commit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{ROOT}:commit"))
                .json_body(json!({ "writes": [
                    { "delete": "projects/demo/databases/(default)/documents/users/a#b" }
                ] }));
            then.status(200).json_body(json!({ "writeResults": [{}] }));
        })
        .await;

    let store = store_for(&server);
    let path = CollectionPath::root("users").doc("a#b");
    let document = store
        .get(&path)
        .await
        .expect("get succeeds")
        .expect("document exists");
    assert_eq!(document.into_json(), json!({ "id": "a#b", "name": "Hash" }));

    let mut batch = WriteBatch::new();
    batch.delete(path);
    store.commit(batch).await.expect("commit succeeds");

    escaped.assert_hits_async(1).await;
    truncated.assert_hits_async(0).await;
    commit.assert_async().await;
}

#[tokio::test]
async fn list_runs_structured_query_on_parent_document() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{ROOT}/users/u1/chats/c1:runQuery"))
                .json_body_partial(
                    r#"{ "structuredQuery": {
                        "from": [{ "collectionId": "messages" }],
                        "orderBy": [{ "field": { "fieldPath": "timestamp" }, "direction": "ASCENDING" }]
                    } }"#,
                );
            then.status(200).json_body(json!([
                { "document": {
                    "name": "projects/demo/databases/(default)/documents/users/u1/chats/c1/messages/m1",
                    "fields": {
                        "sender_id": { "stringValue": "u1" },
                        "content": { "stringValue": "hi" }
                    }
                }, "readTime": "2024-01-01T00:00:00Z" },
                { "document": {
                    "name": "projects/demo/databases/(default)/documents/users/u1/chats/c1/messages/m2",
                    "fields": {
                        "sender_id": { "stringValue": "a1" },
                        "content": { "stringValue": "hello" }
                    }
                }, "readTime": "2024-01-01T00:00:00Z" }
            ]));
        })
        .await;

    let store = store_for(&server);
    let messages = CollectionPath::root("users")
        .doc("u1")
        .collection("chats")
        .doc("c1")
        .collection("messages");
    let documents = store
        .list(&messages, &Query::new().order_by("timestamp"))
        .await
        .expect("list succeeds");

    mock.assert_async().await;
    let ids: Vec<&str> = documents.iter().map(|document| document.id()).collect();
    assert_eq!(ids, ["m1", "m2"]);
    assert_eq!(documents[1].path, messages.doc("m2"));
    assert_eq!(documents[1].get_str("content"), Some("hello"));
}

#[tokio::test]
async fn list_on_top_level_collection_queries_root_and_skips_empty_results() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{ROOT}:runQuery"))
                .json_body_partial(
                    r#"{ "structuredQuery": {
                        "where": { "fieldFilter": {
                            "field": { "fieldPath": "email" },
                            "op": "EQUAL",
                            "value": { "stringValue": "ada@example.com" }
                        } },
                        "limit": 1
                    } }"#,
                );
            then.status(200)
                .json_body(json!([{ "readTime": "2024-01-01T00:00:00Z" }]));
        })
        .await;

    let store = store_for(&server);
    let query = Query::new()
        .filter(Filter::Equal("email".into(), json!("ada@example.com")))
        .limit(1);
    let documents = store
        .list(&CollectionPath::root("users"), &query)
        .await
        .expect("list succeeds");

    mock.assert_async().await;
    assert!(documents.is_empty());
}

#[tokio::test]
async fn commit_sends_preconditions_and_update_mask() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{ROOT}:commit"))
                .json_body(json!({ "writes": [
                    {
                        "update": {
                            "name": "projects/demo/databases/(default)/documents/users/u1/chats/c1/messages/m1",
                            "fields": { "content": { "stringValue": "hi" } }
                        },
                        "currentDocument": { "exists": false }
                    },
                    {
                        "update": {
                            "name": "projects/demo/databases/(default)/documents/users/u1/chats/c1",
                            "fields": { "last_message": { "stringValue": "hello" } }
                        },
                        "updateMask": { "fieldPaths": ["last_message"] },
                        "currentDocument": { "exists": true }
                    },
                    { "delete": "projects/demo/databases/(default)/documents/users/u1/chats/old" }
                ] }));
            then.status(200)
                .json_body(json!({ "writeResults": [{}, {}, {}], "commitTime": "2024-01-01T00:00:00Z" }));
        })
        .await;

    let store = store_for(&server);
    let chats = CollectionPath::root("users").doc("u1").collection("chats");
    let mut batch = WriteBatch::new();
    batch
        .create(
            chats.doc("c1").collection("messages").doc("m1"),
            fields(json!({ "content": "hi" })),
        )
        .update(chats.doc("c1"), fields(json!({ "last_message": "hello" })))
        .delete(chats.doc("old"));

    store.commit(batch).await.expect("commit succeeds");
    mock.assert_async().await;
}

#[tokio::test]
async fn commit_maps_status_codes_to_store_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{ROOT}:commit"));
            then.status(409).json_body(json!({
                "error": { "code": 409, "message": "Document already exists: users/u1", "status": "ALREADY_EXISTS" }
            }));
        })
        .await;

    let store = store_for(&server);
    let error = store
        .create(&CollectionPath::root("users").doc("u1"), fields(json!({ "name": "Ada" })))
        .await
        .expect_err("create must fail");
    assert!(matches!(error, StoreError::AlreadyExists(message) if message.contains("users/u1")));
}

#[tokio::test]
async fn unexpected_errors_keep_http_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{ROOT}:commit"));
            then.status(503).body("backend unavailable");
        })
        .await;

    let store = store_for(&server);
    let error = store
        .delete(&CollectionPath::root("users").doc("u1"))
        .await
        .expect_err("commit must fail");
    match error {
        StoreError::Remote { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "backend unavailable");
        }
        other => panic!("unexpected error {other:?}"),
    }
}
