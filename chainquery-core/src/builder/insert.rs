//! INSERT statement builder with inline literals

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::common::QueryBuilder;
use crate::{Error, Result, Value};

/// INSERT builder over a fixed column list
///
/// Rows are rendered as inline literals through [`Value::to_sql_literal`].
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table_name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl InsertBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table_name: table.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Add one record; its columns become the statement's columns
    ///
    /// # Examples
    /// ```
    /// use chainquery_core::{InsertBuilder, QueryBuilder, Value};
    ///
    /// let query = InsertBuilder::new("users")
    ///     .values(vec![("name", Value::from("John")), ("age", Value::from(30))]);
    /// assert_eq!(query.to_sql()?, "INSERT INTO users (name, age) VALUES ('John', 30)");
    /// # Ok::<(), chainquery_core::Error>(())
    /// ```
    pub fn values<T>(mut self, data: T) -> Self
    where
        T: IntoInsertData,
    {
        let (columns, values) = data.into_insert_data();
        self.columns = columns;
        self.rows = vec![values];
        self
    }

    /// Add many records
    ///
    /// Columns come from the first record; later records are looked up by
    /// column name and missing cells become NULL. Columns that only appear
    /// in later records are dropped, including embedding columns added for
    /// them, so put a complete record first.
    pub fn values_many<T>(mut self, data: Vec<T>) -> Self
    where
        T: IntoInsertData,
    {
        let mut records = data.into_iter().map(IntoInsertData::into_insert_data);

        let Some((columns, first)) = records.next() else {
            self.columns.clear();
            self.rows.clear();
            return self;
        };

        let mut rows = vec![first];
        for (cols, vals) in records {
            let by_name: BTreeMap<String, Value> = cols.into_iter().zip(vals).collect();
            let dropped: Vec<&str> = by_name
                .keys()
                .filter(|c| !columns.contains(*c))
                .map(String::as_str)
                .collect();
            if !dropped.is_empty() {
                debug!(
                    table = %self.table_name,
                    ?dropped,
                    "dropping columns missing from first record"
                );
            }
            rows.push(
                columns
                    .iter()
                    .map(|c| by_name.get(c).cloned().unwrap_or(Value::Null))
                    .collect(),
            );
        }

        self.columns = columns;
        self.rows = rows;
        self
    }
}

impl QueryBuilder for InsertBuilder {
    fn to_sql(&self) -> Result<String> {
        if self.columns.is_empty() || self.rows.is_empty() {
            return Err(Error::validation("INSERT requires columns and values"));
        }

        let mut sql = String::new();

        // INSERT INTO clause
        sql.push_str("INSERT INTO ");
        sql.push_str(&self.table_name);

        // Columns
        sql.push_str(" (");
        sql.push_str(&self.columns.join(", "));
        sql.push(')');

        // VALUES clause
        sql.push_str(" VALUES ");
        let value_groups: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let literals: Vec<String> = row.iter().map(Value::to_sql_literal).collect();
                format!("({})", literals.join(", "))
            })
            .collect();
        sql.push_str(&value_groups.join(", "));

        Ok(sql)
    }
}

/// Trait for types that can be converted to INSERT data
pub trait IntoInsertData {
    fn into_insert_data(self) -> (Vec<String>, Vec<Value>);
}

impl IntoInsertData for Vec<(String, Value)> {
    fn into_insert_data(self) -> (Vec<String>, Vec<Value>) {
        self.into_iter().unzip()
    }
}

impl IntoInsertData for Vec<(&str, Value)> {
    fn into_insert_data(self) -> (Vec<String>, Vec<Value>) {
        self.into_iter().map(|(k, v)| (k.to_string(), v)).unzip()
    }
}

impl IntoInsertData for BTreeMap<String, Value> {
    fn into_insert_data(self) -> (Vec<String>, Vec<Value>) {
        self.into_iter().unzip()
    }
}

/// JSON records keep their key order; nested values are inserted as JSON text
impl IntoInsertData for Map<String, JsonValue> {
    fn into_insert_data(self) -> (Vec<String>, Vec<Value>) {
        self.into_iter().map(|(k, v)| (k, json_to_value(v))).unzip()
    }
}

/// Convert a JSON scalar into the matching literal value
pub fn json_to_value(value: JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::I64(i),
            None => n.as_f64().map(Value::F64).unwrap_or(Value::Null),
        },
        JsonValue::String(s) => Value::String(s),
        JsonValue::Array(items) => Value::Array(items.into_iter().map(json_to_value).collect()),
        other @ JsonValue::Object(_) => Value::Json(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_insert_builder() {
        let query = InsertBuilder::new("users")
            .values(vec![("name", Value::from("John")), ("age", Value::from(30))]);
        assert_eq!(
            query.to_sql().unwrap(),
            "INSERT INTO users (name, age) VALUES ('John', 30)"
        );
    }

    #[test]
    fn test_insert_many_aligns_columns() {
        let query = InsertBuilder::new("users").values_many(vec![
            record(json!({"name": "John", "age": 30})),
            record(json!({"age": 25, "name": "Jane"})),
            record(json!({"name": "Bob"})),
        ]);
        assert_eq!(
            query.to_sql().unwrap(),
            "INSERT INTO users (name, age) VALUES ('John', 30), ('Jane', 25), ('Bob', NULL)"
        );
    }

    #[test]
    fn test_insert_many_drops_columns_absent_from_first_record() {
        let query = InsertBuilder::new("users").values_many(vec![
            record(json!({"name": "John"})),
            record(json!({"name": "Jane", "age": 25})),
        ]);
        assert_eq!(
            query.to_sql().unwrap(),
            "INSERT INTO users (name) VALUES ('John'), ('Jane')"
        );
    }

    #[test]
    fn test_insert_empty_data_fails() {
        let result = InsertBuilder::new("users").to_sql();
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = InsertBuilder::new("users")
            .values_many(Vec::<Map<String, JsonValue>>::new())
            .to_sql();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("INSERT requires columns and values"));
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(json_to_value(json!(3)), Value::I64(3));
        assert_eq!(json_to_value(json!(0.5)), Value::F64(0.5));
        assert_eq!(
            json_to_value(json!([1, 2])),
            Value::Array(vec![Value::I64(1), Value::I64(2)])
        );
        assert_eq!(
            json_to_value(json!({"a": 1})),
            Value::Json(json!({"a": 1}))
        );
    }
}
