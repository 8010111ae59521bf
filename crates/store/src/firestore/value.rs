//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! `{"name": "Ada", "tags": ["a"]}` becomes
//! `{"name": {"stringValue": "Ada"}, "tags": {"arrayValue": {"values": [{"stringValue": "a"}]}}}`.

use serde_json::{json, Map, Number, Value};

use crate::document::Fields;
use crate::error::{StoreError, StoreResult};

pub fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => json!({ "integerValue": integer.to_string() }),
            None => json!({ "doubleValue": number.as_f64().unwrap_or_default() }),
        },
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(object) => json!({ "mapValue": { "fields": encode_fields(object) } }),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> StoreResult<Fields> {
    fields
        .iter()
        .map(|(key, value)| -> StoreResult<(String, Value)> {
            Ok((key.clone(), decode_value(value)?))
        })
        .collect()
}

pub fn decode_value(value: &Value) -> StoreResult<Value> {
    let Some((kind, inner)) = value.as_object().and_then(|object| object.iter().next()) else {
        return Err(StoreError::Payload(format!("untyped firestore value {value}")));
    };

    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => {
            let parsed = match inner {
                Value::String(text) => text.parse::<i64>().ok(),
                Value::Number(number) => number.as_i64(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| StoreError::Payload(format!("bad integerValue {inner}")))?
        }
        // NaN and infinities have no JSON form.
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect::<StoreResult<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Value::Array(values)
        }
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .transpose()?
                .unwrap_or_default();
            Value::Object(fields)
        }
        other => {
            return Err(StoreError::Payload(format!(
                "unsupported firestore value type {other}"
            )))
        }
    };

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_structures_encode_to_typed_values() {
        let encoded = encode_value(&json!({
            "capabilities": ["search", "plan"],
            "finish_pc": 0.5,
            "count": 3,
            "archived": false,
            "note": null
        }));

        assert_eq!(
            encoded,
            json!({ "mapValue": { "fields": {
                "capabilities": { "arrayValue": { "values": [
                    { "stringValue": "search" },
                    { "stringValue": "plan" }
                ] } },
                "finish_pc": { "doubleValue": 0.5 },
                "count": { "integerValue": "3" },
                "archived": { "booleanValue": false },
                "note": { "nullValue": null }
            } } })
        );
    }

    #[test]
    fn decoding_handles_empty_containers_and_timestamps() {
        let decoded = decode_fields(
            json!({
                "participants": { "arrayValue": {} },
                "settings_template": { "mapValue": {} },
                "created_at": { "timestampValue": "2024-01-01T00:00:00Z" },
                "count": { "integerValue": "42" }
            })
            .as_object()
            .unwrap(),
        )
        .unwrap();

        assert_eq!(
            Value::Object(decoded),
            json!({
                "participants": [],
                "settings_template": {},
                "created_at": "2024-01-01T00:00:00Z",
                "count": 42
            })
        );
    }

    #[test]
    fn unknown_value_types_are_rejected() {
        assert!(decode_value(&json!({ "vectorValue": {} })).is_err());
        assert!(decode_value(&json!("plain")).is_err());
    }
}
