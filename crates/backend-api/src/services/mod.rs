pub mod agents;
pub mod auth;
pub mod boards;
pub mod chats;
pub mod conversation;
pub mod error;
pub mod home;
pub mod messages;
pub mod paths;
pub mod tasks;
pub mod users;

#[cfg(test)]
pub mod test_utils;

pub use error::*;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use societas_store::{
    to_fields, validate_id, CollectionPath, Document, DocumentPath, DocumentStore, Fields, Query,
};

/// Decode a stored document into its `{id, ...fields}` record.
pub(crate) fn decode<T: DeserializeOwned>(document: Document) -> Result<T, ServiceError> {
    let path = document.path.to_string();
    serde_json::from_value(document.into_json())
        .map_err(|err| ServiceError::internal(format!("malformed document {path}: {err}")))
}

pub(crate) fn decode_all<T: DeserializeOwned>(
    documents: Vec<Document>,
) -> Result<Vec<T>, ServiceError> {
    documents.into_iter().map(decode).collect()
}

/// Fields of a literal `json!` object. Anything else yields no fields.
pub(crate) fn json_fields(value: Value) -> Fields {
    match value {
        Value::Object(fields) => fields,
        _ => Fields::new(),
    }
}

/// Stored fields of a record; the id lives in the path, not the document.
pub(crate) fn record_fields<T: Serialize>(record: &T) -> Result<Fields, ServiceError> {
    let mut fields = to_fields(record)?;
    fields.remove("id");
    Ok(fields)
}

pub(crate) async fn fetch<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &DocumentPath,
    entity: &str,
) -> Result<T, ServiceError> {
    match store.get(path).await? {
        Some(document) => decode(document),
        None => Err(ServiceError::not_found(format!("{entity} not found"))),
    }
}

pub(crate) async fn fetch_all<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &CollectionPath,
    query: &Query,
) -> Result<Vec<T>, ServiceError> {
    decode_all(store.list(collection, query).await?)
}

/// Merge `fields` into an existing document and return the stored result.
pub(crate) async fn merge<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &DocumentPath,
    fields: Fields,
    entity: &str,
) -> Result<T, ServiceError> {
    store.update(path, fields).await.or_missing(entity)?;
    fetch(store, path, entity).await
}

/// Delete an existing document. Sub-collections are left in place.
pub(crate) async fn remove(
    store: &dyn DocumentStore,
    path: &DocumentPath,
    entity: &str,
) -> Result<(), ServiceError> {
    if store.get(path).await?.is_none() {
        return Err(ServiceError::not_found(format!("{entity} not found")));
    }
    store.delete(path).await?;
    Ok(())
}

/// Turn an allow-listed update request into the fields it actually carries.
pub(crate) fn update_fields<T: Serialize>(request: &T) -> Result<Fields, ServiceError> {
    let fields = to_fields(request)?;
    if fields.is_empty() {
        return Err(ServiceError::bad_request("No updatable fields supplied"));
    }
    Ok(fields)
}

/// Client supplied ids become path segments, so they must be plain segments.
pub(crate) fn require_id(value: Option<String>, message: &str) -> Result<String, ServiceError> {
    let id = value
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServiceError::bad_request(message))?;
    validate_id(&id)
        .map_err(|_| ServiceError::bad_request(format!("Invalid identifier '{id}'")))?;
    Ok(id)
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
