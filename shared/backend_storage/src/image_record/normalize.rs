//! Post-read normalization of `DynamoDB` items
//!
//! `DynamoDB` numbers carry no integer/float distinction. Items are first decoded into
//! a generic JSON value, every whole-valued float is turned back into an integer, and
//! only then is the value mapped onto the target type.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::{Number, Value};

use super::ImageStorageResult;

/// Recursively converts floats without a fractional part into integers
#[must_use]
pub fn normalize_numbers(value: Value) -> Value {
    match value {
        Value::Number(number) => Value::Number(normalize_number(number)),
        Value::Array(values) => Value::Array(values.into_iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize_numbers(value)))
                .collect(),
        ),
        other => other,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn normalize_number(number: Number) -> Number {
    if number.is_i64() || number.is_u64() {
        return number;
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
            Number::from(f as i64)
        }
        _ => number,
    }
}

/// Decodes a `DynamoDB` item into `T` through the normalization pass
///
/// # Errors
///
/// Returns `ImageStorageError::SerializationError` if the item cannot be decoded
pub fn record_from_item<T: DeserializeOwned>(
    item: HashMap<String, AttributeValue>,
) -> ImageStorageResult<T> {
    let raw: Value = serde_dynamo::from_item(item)?;
    Ok(serde_json::from_value(normalize_numbers(raw))?)
}

/// Reads a timestamp attribute, truncating fractional seconds
///
/// Strings holding an integer are accepted; anything else decodes as `None`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && f.abs() < 9_007_199_254_740_992.0)
                .map(|f| f.trunc() as i64)
        }),
        Some(Value::String(raw)) => raw.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_record::{ImageRecord, ImageStatus};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_whole_floats_become_integers() {
        let value = json!({
            "created_at": 1_700_000_000.0,
            "ratio": 0.5,
            "nested": { "count": 3.0, "list": [1.0, 2.5, -4.0] },
            "name": "a.png"
        });

        let normalized = normalize_numbers(value);

        assert_eq!(
            normalized,
            json!({
                "created_at": 1_700_000_000,
                "ratio": 0.5,
                "nested": { "count": 3, "list": [1, 2.5, -4] },
                "name": "a.png"
            })
        );
        assert!(normalized["created_at"].is_i64());
    }

    #[test]
    fn test_integers_are_untouched() {
        assert_eq!(normalize_numbers(json!(42)), json!(42));
        assert_eq!(normalize_numbers(json!(u64::MAX)), json!(u64::MAX));
    }

    #[test]
    fn test_fractional_number_attribute_is_kept_as_float() {
        let item = HashMap::from([
            ("a".to_string(), AttributeValue::N("12.0".to_string())),
            ("b".to_string(), AttributeValue::N("12.25".to_string())),
        ]);

        let value: Value = record_from_item(item).unwrap();

        assert_eq!(value["a"], json!(12));
        assert_eq!(value["b"], json!(12.25));
    }

    fn odd_item(status: &str, created_at: AttributeValue) -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("user_id".to_string(), AttributeValue::S("alice".to_string())),
            ("image_id".to_string(), AttributeValue::S("img1".to_string())),
            ("status".to_string(), AttributeValue::S(status.to_string())),
            ("created_at".to_string(), created_at),
        ])
    }

    #[test]
    fn test_unknown_status_and_fractional_timestamp_still_decode() {
        let item = odd_item("ARCHIVED", AttributeValue::N("1700000000.5".to_string()));

        let record: ImageRecord = record_from_item(item).unwrap();

        assert_eq!(record.status, ImageStatus::Other("ARCHIVED".to_string()));
        assert!(!record.is_uploaded());
        assert_eq!(record.created_at, Some(1_700_000_000));
    }

    #[test]
    fn test_non_numeric_timestamp_decodes_as_none() {
        let item = odd_item("UPLOADED", AttributeValue::S("yesterday".to_string()));

        let record: ImageRecord = record_from_item(item).unwrap();

        assert_eq!(record.status, ImageStatus::Uploaded);
        assert_eq!(record.created_at, None);
    }

    #[test]
    fn test_string_timestamp_holding_integer_is_read() {
        let item = odd_item("PENDING", AttributeValue::S("1700000000".to_string()));

        let record: ImageRecord = record_from_item(item).unwrap();

        assert_eq!(record.created_at, Some(1_700_000_000));
    }
}
