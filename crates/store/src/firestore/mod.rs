//! Firestore REST v1 backend.
//!
//! Reads use `GET` on the document resource and `:runQuery` on the parent,
//! batches go through `documents:commit` so every write shares one atomic commit.

pub mod value;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use societas_config::FirestoreConfig;

use crate::batch::{Write, WriteBatch};
use crate::document::{Document, Filter, Query};
use crate::error::{StoreError, StoreResult};
use crate::path::{CollectionPath, DocumentPath};
use crate::DocumentStore;

use value::{decode_fields, encode_fields, encode_value};

const EMULATOR_ENV: &str = "FIRESTORE_EMULATOR_HOST";
const EMULATOR_TOKEN: &str = "owner";

#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    base_url: Url,
    project_id: String,
    database_id: String,
    access_token: Option<String>,
}

impl FirestoreStore {
    pub fn new(config: &FirestoreConfig) -> StoreResult<Self> {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &FirestoreConfig) -> StoreResult<Self> {
        let project_id = config
            .project_id
            .clone()
            .or_else(|| std::env::var("GOOGLE_CLOUD_PROJECT").ok())
            .filter(|project| !project.trim().is_empty())
            .ok_or_else(|| StoreError::Configuration("firestore project_id is missing".into()))?;

        let emulator_host = config
            .emulator_host
            .clone()
            .or_else(|| std::env::var(EMULATOR_ENV).ok())
            .filter(|host| !host.trim().is_empty());

        let (base_url, access_token) = match emulator_host {
            Some(host) => (format!("http://{host}/v1"), Some(EMULATOR_TOKEN.to_string())),
            None => (
                config.base_url.trim_end_matches('/').to_string(),
                config.access_token.clone(),
            ),
        };

        let base_url = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                StoreError::Configuration(format!("invalid firestore base url: {base_url}"))
            })?;

        debug!(%base_url, project = %project_id, "configured firestore store");

        Ok(Self {
            client,
            base_url,
            project_id,
            database_id: config.database_id.clone(),
            access_token,
        })
    }

    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }

    /// Resource name as it appears in request bodies, segments unescaped.
    fn document_name(&self, path: &DocumentPath) -> String {
        format!("{}/{path}", self.documents_root())
    }

    /// Request URL for a resource below `documents`, optionally suffixed with `:{action}`.
    /// Every segment is percent-encoded on its own so ids like `a#b` or `a?b` stay intact.
    fn url(&self, segments: &[String], action: Option<&str>) -> StoreResult<Url> {
        let mut parts: Vec<String> = vec![
            "projects".into(),
            self.project_id.clone(),
            "databases".into(),
            self.database_id.clone(),
            "documents".into(),
        ];
        parts.extend(segments.iter().cloned());
        if let (Some(action), Some(last)) = (action, parts.last_mut()) {
            last.push(':');
            last.push_str(action);
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StoreError::Configuration(format!("invalid firestore base url: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(&parts);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn structured_query(&self, collection: &CollectionPath, query: &Query) -> Value {
        let mut structured = Map::new();
        structured.insert(
            "from".into(),
            json!([{ "collectionId": collection.id() }]),
        );

        if let Some(filter) = &query.filter {
            let (op, value) = match filter {
                Filter::Equal(_, value) => ("EQUAL", value),
                Filter::ArrayContains(_, value) => ("ARRAY_CONTAINS", value),
            };
            structured.insert(
                "where".into(),
                json!({
                    "fieldFilter": {
                        "field": { "fieldPath": field_path(filter.field()) },
                        "op": op,
                        "value": encode_value(value),
                    }
                }),
            );
        }

        if let Some(field) = &query.order_by {
            structured.insert(
                "orderBy".into(),
                json!([{ "field": { "fieldPath": field_path(field) }, "direction": "ASCENDING" }]),
            );
        }

        if let Some(limit) = query.limit {
            structured.insert("limit".into(), json!(limit.min(i32::MAX as usize)));
        }

        json!({ "structuredQuery": Value::Object(structured) })
    }

    fn encode_write(&self, write: Write) -> Value {
        match write {
            Write::Create { path, fields } => json!({
                "update": { "name": self.document_name(&path), "fields": encode_fields(&fields) },
                "currentDocument": { "exists": false },
            }),
            Write::Set { path, fields } => json!({
                "update": { "name": self.document_name(&path), "fields": encode_fields(&fields) },
            }),
            Write::Update { path, fields } => {
                let mask: Vec<String> = fields.keys().map(|key| field_path(key)).collect();
                json!({
                    "update": { "name": self.document_name(&path), "fields": encode_fields(&fields) },
                    "updateMask": { "fieldPaths": mask },
                    "currentDocument": { "exists": true },
                })
            }
            Write::Delete { path } => json!({ "delete": self.document_name(&path) }),
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        path.validate()?;
        let response = self
            .authorize(self.client.get(self.url(path.segments(), None)?))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;
        let document: FirestoreDocument = response.json().await?;
        Ok(Some(Document::new(
            path.clone(),
            decode_fields(&document.fields.unwrap_or_default())?,
        )))
    }

    async fn list(&self, collection: &CollectionPath, query: &Query) -> StoreResult<Vec<Document>> {
        collection.validate()?;
        let parent = collection
            .parent()
            .map(|parent| parent.segments().to_vec())
            .unwrap_or_default();

        let response = self
            .authorize(
                self.client
                    .post(self.url(&parent, Some("runQuery"))?)
                    .json(&self.structured_query(collection, query)),
            )
            .send()
            .await?;
        let response = check_status(response).await?;
        let results: Vec<RunQueryResponse> = response.json().await?;

        results
            .into_iter()
            .filter_map(|result| result.document)
            .map(|document| -> StoreResult<Document> {
                let id = document
                    .name
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                Ok(Document::new(
                    collection.doc(id),
                    decode_fields(&document.fields.unwrap_or_default())?,
                ))
            })
            .collect()
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        for write in batch.writes() {
            write.path().validate()?;
        }
        if batch.is_empty() {
            return Ok(());
        }

        let count = batch.len();
        let writes: Vec<Value> = batch
            .into_writes()
            .into_iter()
            .map(|write| self.encode_write(write))
            .collect();

        let response = self
            .authorize(
                self.client
                    .post(self.url(&[], Some("commit"))?)
                    .json(&json!({ "writes": writes })),
            )
            .send()
            .await?;
        check_status(response).await?;

        debug!(writes = count, "committed firestore batch");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    fields: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RunQueryResponse {
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

async fn check_status(response: reqwest::Response) -> StoreResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            (
                wrapper.error.status.unwrap_or_default(),
                wrapper.error.message.unwrap_or_else(|| body.clone()),
            )
        })
        .unwrap_or_else(|_| (String::new(), body.clone()));

    Err(match code.as_str() {
        "NOT_FOUND" => StoreError::NotFound(message),
        "ALREADY_EXISTS" => StoreError::AlreadyExists(message),
        _ => StoreError::Remote {
            status: status.as_u16(),
            message,
        },
    })
}

/// Quote a field name for use in a Firestore field path when it is not a plain identifier.
fn field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = chars
        .next()
        .map(|first| first.is_ascii_alphabetic() || first == '_')
        .unwrap_or(false)
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}
