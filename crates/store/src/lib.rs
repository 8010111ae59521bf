//! Societas document store.
//!
//! Documents live in nested collections addressed by slash-separated paths
//! (`users/{uid}/chats/{chatId}/messages/{messageId}`). The [`DocumentStore`]
//! trait is implemented by an embedded SQLite backend and by a Firestore REST
//! client; callers only ever see the trait.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use cuid2::CuidConstructor;
use once_cell::sync::Lazy;

pub mod batch;
pub mod document;
pub mod error;
pub mod firestore;
pub mod path;
pub mod sqlite;

pub use batch::{Write, WriteBatch};
pub use document::{compare_values, to_fields, Document, Fields, Filter, Query};
pub use error::{StoreError, StoreResult};
pub use firestore::FirestoreStore;
pub use path::{validate_id, CollectionPath, DocumentPath};
pub use sqlite::SqliteDocumentStore;

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

/// Fresh collision-resistant id for server generated documents.
pub fn new_document_id() -> String {
    CUID.create_id()
}

/// RFC 3339 UTC with a fixed microsecond width, so string order is time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Document>>;

    /// Documents directly inside `collection`, evaluated against `query`.
    async fn list(&self, collection: &CollectionPath, query: &Query) -> StoreResult<Vec<Document>>;

    /// Apply every write in the batch atomically.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    async fn create(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.create(path.clone(), fields);
        self.commit(batch).await
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.set(path.clone(), fields);
        self.commit(batch).await
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.update(path.clone(), fields);
        self.commit(batch).await
    }

    async fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(path.clone());
        self.commit(batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_keep_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(whole), "2024-05-01T12:00:00.000000Z");

        let later = whole + chrono::Duration::microseconds(1);
        assert!(format_timestamp(whole) < format_timestamp(later));
    }

    #[test]
    fn generated_ids_are_unique() {
        let first = new_document_id();
        let second = new_document_id();
        assert_ne!(first, second);
        assert!(validate_id(&first).is_ok());
    }
}
