//! Literal values for predicates and inserts

use serde::{Deserialize, Serialize};

/// A SQL value rendered inline into generated statements
///
/// There are no bind parameters: [`Value::to_sql_literal`] is a minimal
/// formatter that single-quotes text without escaping. Never pass untrusted
/// input through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// JSON value, rendered as quoted JSON text
    Json(serde_json::Value),
    /// Array of values
    Array(Vec<Value>),
    /// Date-time, rendered as `'YYYY-MM-DD HH:MM:SS'`
    #[cfg(feature = "datetime-support")]
    DateTime(chrono::NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render this value as an inline SQL literal
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::I32(i) => i.to_string(),
            Value::I64(i) => i.to_string(),
            Value::F32(f) => format!("{:?}", f),
            Value::F64(f) => format!("{:?}", f),
            Value::String(s) => format!("'{}'", s),
            Value::Json(j) => format!("'{}'", j),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_sql_literal).collect();
                format!("[{}]", parts.join(","))
            }
            #[cfg(feature = "datetime-support")]
            Value::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }

    /// Extract array values if this is an Array variant
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<u32> for Value {
    fn from(val: u32) -> Self {
        Value::I64(i64::from(val))
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F32(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<&String> for Value {
    fn from(val: &String) -> Self {
        Value::String(val.clone())
    }
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Self {
        Value::Json(val)
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDateTime> for Value {
    fn from(val: chrono::NaiveDateTime) -> Self {
        Value::DateTime(val)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(vals: Vec<T>) -> Self {
        Value::Array(vals.into_iter().map(|v| v.into()).collect())
    }
}

impl<T> From<&[T]> for Value
where
    T: Clone + Into<Value>,
{
    fn from(vals: &[T]) -> Self {
        Value::Array(vals.iter().cloned().map(|v| v.into()).collect())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        assert_eq!(Value::from(42i32), Value::I32(42));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(()), Value::Null);
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_scalar_literals() {
        assert_eq!(Value::from(18).to_sql_literal(), "18");
        assert_eq!(Value::from(-7i64).to_sql_literal(), "-7");
        assert_eq!(Value::from(2.5f64).to_sql_literal(), "2.5");
        assert_eq!(Value::from(1.0f64).to_sql_literal(), "1.0");
        assert_eq!(Value::from(false).to_sql_literal(), "false");
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
    }

    #[test]
    fn test_text_is_quoted_verbatim() {
        assert_eq!(Value::from("active").to_sql_literal(), "'active'");
        // no escaping is performed
        assert_eq!(Value::from("O'Brien").to_sql_literal(), "'O'Brien'");
    }

    #[test]
    fn test_array_literal() {
        let value = Value::from(vec![0.5f32, 0.25f32]);
        assert_eq!(value.to_sql_literal(), "[0.5,0.25]");
        assert_eq!(Value::from(vec!["a", "b"]).to_sql_literal(), "['a','b']");
    }

    #[test]
    fn test_json_literal() {
        let value = Value::from(serde_json::json!({"k": 1}));
        assert_eq!(value.to_sql_literal(), r#"'{"k":1}'"#);
    }

    #[cfg(feature = "datetime-support")]
    #[test]
    fn test_datetime_literal() {
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();
        assert_eq!(Value::from(dt).to_sql_literal(), "'2024-01-15 09:30:00'");
    }
}
