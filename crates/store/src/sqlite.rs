//! Embedded document backend used for local development and tests.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tokio::fs;
use tracing::{debug, info};

use societas_config::SqliteStoreConfig;

use crate::batch::{Write, WriteBatch};
use crate::document::{Document, Fields, Query};
use crate::error::{StoreError, StoreResult};
use crate::path::{CollectionPath, DocumentPath};
use crate::{now_timestamp, DocumentStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    parent TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (parent, id)
)
"#;

/// Documents stored as JSON rows keyed by `(parent collection, id)`.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Open (creating if needed) the database described by `config` and ensure the schema.
    pub async fn connect(config: &SqliteStoreConfig) -> anyhow::Result<Self> {
        ensure_sqlite_directory(&config.url).await?;

        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("invalid sqlite url {}", config.url))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to database {}", config.url))?;

        let store = Self::from_pool(pool);
        store
            .ensure_schema()
            .await
            .context("failed to create documents table")?;

        info!(url = %config.url, "document store connected");
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Every stored document, ordered by path. Used by data dumps.
    pub async fn all_documents(&self) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query("SELECT parent, id, data FROM documents ORDER BY parent, id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> StoreResult<Document> {
                let parent: String = row.try_get("parent")?;
                let id: String = row.try_get("id")?;
                let data: String = row.try_get("data")?;
                let path = DocumentPath::parse(&format!("{parent}/{id}"))?;
                Ok(Document::new(path, decode_data(&data)?))
            })
            .collect()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        path.validate()?;
        let row = sqlx::query("SELECT data FROM documents WHERE parent = ? AND id = ?")
            .bind(path.parent().to_string())
            .bind(path.id())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                Ok(Some(Document::new(path.clone(), decode_data(&data)?)))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, collection: &CollectionPath, query: &Query) -> StoreResult<Vec<Document>> {
        collection.validate()?;
        let rows = sqlx::query(
            "SELECT id, data FROM documents WHERE parent = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(collection.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let data: String = row.try_get("data")?;
            documents.push(Document::new(collection.doc(id), decode_data(&data)?));
        }

        Ok(query.apply(documents))
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        for write in batch.writes() {
            write.path().validate()?;
        }

        let writes = batch.len();
        let mut tx = self.pool.begin().await?;
        let now = now_timestamp();

        // Returning early drops `tx`, which rolls every earlier write back.
        for write in batch.into_writes() {
            match write {
                Write::Create { path, fields } => {
                    if load_data(&mut tx, &path).await?.is_some() {
                        return Err(StoreError::AlreadyExists(path.to_string()));
                    }
                    sqlx::query(
                        "INSERT INTO documents (parent, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
                    )
                    .bind(path.parent().to_string())
                    .bind(path.id())
                    .bind(encode_data(&fields)?)
                    .bind(now.as_str())
                    .bind(now.as_str())
                    .execute(&mut *tx)
                    .await?;
                }
                Write::Set { path, fields } => {
                    sqlx::query(
                        "INSERT INTO documents (parent, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?) \
                         ON CONFLICT(parent, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                    )
                    .bind(path.parent().to_string())
                    .bind(path.id())
                    .bind(encode_data(&fields)?)
                    .bind(now.as_str())
                    .bind(now.as_str())
                    .execute(&mut *tx)
                    .await?;
                }
                Write::Update { path, fields } => {
                    let Some(mut existing) = load_data(&mut tx, &path).await? else {
                        return Err(StoreError::NotFound(path.to_string()));
                    };
                    existing.extend(fields);
                    sqlx::query(
                        "UPDATE documents SET data = ?, updated_at = ? WHERE parent = ? AND id = ?",
                    )
                    .bind(encode_data(&existing)?)
                    .bind(now.as_str())
                    .bind(path.parent().to_string())
                    .bind(path.id())
                    .execute(&mut *tx)
                    .await?;
                }
                Write::Delete { path } => {
                    sqlx::query("DELETE FROM documents WHERE parent = ? AND id = ?")
                        .bind(path.parent().to_string())
                        .bind(path.id())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        debug!(writes, "committed document batch");
        Ok(())
    }
}

async fn load_data(
    tx: &mut Transaction<'_, Sqlite>,
    path: &DocumentPath,
) -> StoreResult<Option<Fields>> {
    let row = sqlx::query("SELECT data FROM documents WHERE parent = ? AND id = ?")
        .bind(path.parent().to_string())
        .bind(path.id())
        .fetch_optional(&mut **tx)
        .await?;

    match row {
        Some(row) => {
            let data: String = row.try_get("data")?;
            Ok(Some(decode_data(&data)?))
        }
        None => Ok(None),
    }
}

fn encode_data(fields: &Fields) -> StoreResult<String> {
    Ok(serde_json::to_string(fields)?)
}

fn decode_data(data: &str) -> StoreResult<Fields> {
    match serde_json::from_str(data)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(StoreError::Payload("stored document is not an object".to_string())),
    }
}

/// SQLite creates the file but not missing parent directories.
async fn ensure_sqlite_directory(url: &str) -> anyhow::Result<()> {
    let Some(sqlite_path) = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };

    if sqlite_path.is_empty() || sqlite_path.contains(":memory:") {
        return Ok(());
    }

    let sqlite_path = sqlite_path.split('?').next().unwrap_or(sqlite_path);
    if let Some(parent) = Path::new(sqlite_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create sqlite directory {}", parent.display())
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(fields) => fields,
            _ => panic!("expected object"),
        }
    }

    async fn temp_store() -> (SqliteDocumentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("store.db");
        let config = SqliteStoreConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 1,
        };
        let store = SqliteDocumentStore::connect(&config).await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn connect_creates_missing_directories() {
        let (store, temp_dir) = temp_store().await;
        assert!(temp_dir.path().join("nested").join("store.db").exists());
        store.close().await;
    }

    #[tokio::test]
    async fn in_memory_database_is_usable() {
        let config = SqliteStoreConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 1,
        };
        let store = SqliteDocumentStore::connect(&config).await.unwrap();
        let path = CollectionPath::root("users").doc("u1");
        store.set(&path, fields(json!({ "name": "Ada" }))).await.unwrap();
        assert!(store.get(&path).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn all_documents_spans_collections() {
        let (store, _temp_dir) = temp_store().await;
        let user = CollectionPath::root("users").doc("u1");
        store.set(&user, fields(json!({ "name": "Ada" }))).await.unwrap();
        store
            .set(
                &user.collection("boards").doc("b1"),
                fields(json!({ "title": "Roadmap" })),
            )
            .await
            .unwrap();

        let paths: Vec<String> = store
            .all_documents()
            .await
            .unwrap()
            .into_iter()
            .map(|document| document.path.to_string())
            .collect();
        assert_eq!(paths, ["users/u1", "users/u1/boards/b1"]);
    }
}
