//! Conversion of host values into driver bind values.

use chrono::{DateTime, FixedOffset};
use serde_json::{Number, Value};
use std::fmt;

/// A value handed to the node by the host, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    Timestamp(DateTime<FixedOffset>),
    Binary(Vec<u8>),
    /// Arrays and objects
    Composite(Value),
}

impl From<&Value> for InputValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => InputValue::Null,
            Value::Bool(b) => InputValue::Bool(*b),
            Value::Number(n) => InputValue::Number(n.clone()),
            Value::String(s) => InputValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => InputValue::Composite(value.clone()),
        }
    }
}

impl From<Value> for InputValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => InputValue::Null,
            Value::Bool(b) => InputValue::Bool(b),
            Value::Number(n) => InputValue::Number(n),
            Value::String(s) => InputValue::Text(s),
            composite => InputValue::Composite(composite),
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Null => f.write_str("null"),
            InputValue::Bool(b) => write!(f, "{}", b),
            InputValue::Number(n) => write!(f, "{}", n),
            InputValue::Text(s) => f.write_str(s),
            InputValue::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
            InputValue::Binary(bytes) => write!(f, "{} bytes", bytes.len()),
            InputValue::Composite(v) => write!(f, "{}", v),
        }
    }
}

/// A value the driver can bind.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Null,
    Number(Number),
    Text(String),
    Timestamp(DateTime<FixedOffset>),
    Binary(Vec<u8>),
}

/// Normalizes a host value into a bindable one. Never fails: booleans become
/// 1/0 and composite values are bound as their JSON text.
pub fn normalize(value: InputValue) -> BindValue {
    match value {
        InputValue::Null => BindValue::Null,
        InputValue::Bool(b) => BindValue::Number(Number::from(u8::from(b))),
        InputValue::Timestamp(ts) => BindValue::Timestamp(ts),
        InputValue::Binary(bytes) => BindValue::Binary(bytes),
        InputValue::Composite(v) => match serde_json::to_string(&v) {
            Ok(text) => BindValue::Text(text),
            Err(_) => BindValue::Text(v.to_string()),
        },
        InputValue::Text(s) => BindValue::Text(s),
        InputValue::Number(n) => BindValue::Number(n),
    }
}

/// Shorthand for normalizing a JSON field read from an input record.
pub fn normalize_json(value: &Value) -> BindValue {
    normalize(InputValue::from(value))
}

/// Turns driver number text into a JSON number when it fits, keeping the
/// text otherwise so large NUMBER values lose no precision.
pub fn number_from_text(text: &str) -> Value {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    // f64 holds 15 significant decimal digits exactly
    let significant = trimmed
        .chars()
        .take_while(|c| *c != 'e' && *c != 'E')
        .filter(|c| c.is_ascii_digit())
        .skip_while(|c| *c == '0')
        .count();
    if significant <= 15 {
        if let Ok(f) = trimmed.parse::<f64>() {
            if let Some(n) = Number::from_f64(f) {
                return Value::Number(n);
            }
        }
    }
    Value::String(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_booleans_become_integers() {
        assert_eq!(normalize(InputValue::Bool(true)), BindValue::Number(1.into()));
        assert_eq!(normalize(InputValue::Bool(false)), BindValue::Number(0.into()));
        assert_eq!(normalize_json(&json!(true)), BindValue::Number(1.into()));
    }

    #[test]
    fn test_null_stays_null() {
        assert_eq!(normalize(InputValue::Null), BindValue::Null);
        assert_eq!(normalize_json(&Value::Null), BindValue::Null);
    }

    #[test]
    fn test_composite_serializes_to_json_text() {
        let original = json!({"name": "John", "tags": ["a", "b"], "nested": {"n": 1.5}});
        match normalize_json(&original) {
            BindValue::Text(text) => {
                let reparsed: Value = serde_json::from_str(&text).unwrap();
                assert_eq!(reparsed, original);
            }
            other => panic!("expected text, got {:?}", other),
        }

        let array = json!([1, 2, 3]);
        assert_eq!(normalize_json(&array), BindValue::Text("[1,2,3]".to_string()));
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(normalize_json(&json!("John")), BindValue::Text("John".to_string()));
        assert_eq!(normalize_json(&json!(75000)), BindValue::Number(75000.into()));
        assert_eq!(
            normalize_json(&json!(12.5)),
            BindValue::Number(Number::from_f64(12.5).unwrap())
        );
    }

    #[test]
    fn test_number_from_text() {
        assert_eq!(number_from_text("42"), json!(42));
        assert_eq!(number_from_text("-7"), json!(-7));
        assert_eq!(number_from_text("12.5"), json!(12.5));
        // beyond i64 and not exactly representable as f64
        assert_eq!(
            number_from_text("123456789012345678901234567890"),
            json!("123456789012345678901234567890")
        );
        assert_eq!(number_from_text("abc"), json!("abc"));
    }

    #[test]
    fn test_timestamp_and_binary_pass_through() {
        let ts = DateTime::parse_from_rfc3339("2024-03-01T10:15:00+02:00").unwrap();
        assert_eq!(normalize(InputValue::Timestamp(ts)), BindValue::Timestamp(ts));
        assert_eq!(
            normalize(InputValue::Binary(vec![0xde, 0xad])),
            BindValue::Binary(vec![0xde, 0xad])
        );
    }
}
