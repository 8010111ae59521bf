use std::cmp::Ordering;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::path::DocumentPath;

/// Top-level fields of a stored document.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub fields: Fields,
}

impl Document {
    pub fn new(path: DocumentPath, fields: Fields) -> Self {
        Self { path, fields }
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Decode the fields into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }

    /// Flatten into `{ "id": ..., ...fields }`, the shape returned to API clients.
    pub fn into_json(self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert("id".to_string(), Value::String(self.path.id().to_string()));
        for (key, value) in self.fields {
            if key != "id" {
                object.insert(key, value);
            }
        }
        Value::Object(object)
    }
}

/// Serialize a record into document fields. The value must serialize to a JSON object.
pub fn to_fields<T: Serialize>(value: &T) -> StoreResult<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Payload(format!(
            "expected an object, got {}",
            kind_name(&other)
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equal(String, Value),
    ArrayContains(String, Value),
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::Equal(field, _) | Filter::ArrayContains(field, _) => field,
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            Filter::Equal(field, expected) => fields.get(field) == Some(expected),
            Filter::ArrayContains(field, expected) => fields
                .get(field)
                .and_then(Value::as_array)
                .map(|items| items.contains(expected))
                .unwrap_or(false),
        }
    }
}

/// Collection query: at most one filter, ascending order on one field, and a limit.
///
/// ```
/// use serde_json::json;
/// use societas_store::{Filter, Query};
///
/// let query = Query::new()
///     .filter(Filter::ArrayContains("participants".into(), json!("agent-1")))
///     .limit(1);
/// assert_eq!(query.limit, Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub order_by: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluate the query over documents already in insertion order.
    ///
    /// Ordering on a field drops documents missing that field, the way Firestore does.
    pub fn apply(&self, documents: Vec<Document>) -> Vec<Document> {
        let mut selected: Vec<Document> = documents
            .into_iter()
            .filter(|document| {
                self.filter
                    .as_ref()
                    .map(|filter| filter.matches(&document.fields))
                    .unwrap_or(true)
            })
            .collect();

        if let Some(field) = &self.order_by {
            selected.retain(|document| document.fields.contains_key(field));
            selected.sort_by(|left, right| {
                compare_values(&left.fields[field], &right.fields[field])
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Total order over JSON values following Firestore's cross-type ordering.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Value::Object(a), Value::Object(b)) => a.len().cmp(&b.len()),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}
