//! Paginated tabular data readers backing `Python(reader)` sources

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value as JsonValue};
use tracing::trace;

use crate::{Error, Result};

/// Column name to engine type tag (`Int64`, `Float64`, `String`, `Bool`)
pub type Schema = BTreeMap<String, String>;

/// A tabular data source the engine pulls rows from page by page
///
/// Paging state lives in the reader, not in the query.
pub trait DataReader: Send {
    /// Table name, used as the alias of queries over this reader
    fn name(&self) -> &str;

    /// Column name to type tag
    fn schema(&self) -> Schema;

    /// Next `count` rows of `columns`, one vector per requested column.
    /// Returns an empty batch once exhausted.
    fn read(&mut self, columns: &[String], count: usize) -> Vec<Vec<JsonValue>>;
}

/// Shared, cloneable handle to a reader
#[derive(Clone)]
pub struct ReaderHandle {
    name: String,
    inner: Arc<Mutex<dyn DataReader>>,
}

impl ReaderHandle {
    pub fn new<R>(reader: R) -> Self
    where
        R: DataReader + 'static,
    {
        let name = reader.name().to_string();
        Self {
            name,
            inner: Arc::new(Mutex::new(reader)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Result<Schema> {
        self.with_reader(|reader| reader.schema())
    }

    /// Run `f` with exclusive access to the reader
    pub fn with_reader<T>(&self, f: impl FnOnce(&mut dyn DataReader) -> T) -> Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| Error::execution(format!("reader '{}' lock poisoned", self.name)))?;
        Ok(f(&mut *guard))
    }

    /// Drain every remaining row of `columns`, row-major
    pub fn read_all(&self, columns: &[String], batch_size: usize) -> Result<Vec<Vec<JsonValue>>> {
        if batch_size == 0 {
            return Err(Error::validation("reader batch size must be > 0"));
        }
        self.with_reader(|reader| {
            let mut rows = Vec::new();
            loop {
                let batch = reader.read(columns, batch_size);
                let batch_len = batch.first().map(Vec::len).unwrap_or(0);
                if batch_len == 0 {
                    break;
                }
                for i in 0..batch_len {
                    rows.push(
                        batch
                            .iter()
                            .map(|column| column.get(i).cloned().unwrap_or(JsonValue::Null))
                            .collect(),
                    );
                }
                trace!(reader = reader.name(), rows = batch_len, "read batch");
            }
            rows
        })
    }
}

impl PartialEq for ReaderHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ReaderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderHandle").field("name", &self.name).finish()
    }
}

/// In-memory reader over row records
#[derive(Debug, Clone)]
pub struct MemoryReader {
    name: String,
    columns: BTreeMap<String, Vec<JsonValue>>,
    row_count: usize,
    cursor: usize,
}

impl MemoryReader {
    /// Build a reader from row records, converting them to columns
    pub fn from_records(name: impl Into<String>, records: Vec<Map<String, JsonValue>>) -> Self {
        let row_count = records.len();
        let columns = to_columnar(&records);
        Self {
            name: name.into(),
            columns,
            row_count,
            cursor: 0,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

impl DataReader for MemoryReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> Schema {
        infer_column_types(&self.columns)
    }

    fn read(&mut self, columns: &[String], count: usize) -> Vec<Vec<JsonValue>> {
        if self.columns.is_empty() || self.cursor >= self.row_count {
            self.cursor = 0;
            return Vec::new();
        }

        let start = self.cursor;
        let end = (start + count).min(self.row_count);
        self.cursor = end;

        columns
            .iter()
            .map(|name| match self.columns.get(name) {
                Some(values) => values[start..end].to_vec(),
                None => vec![JsonValue::Null; end - start],
            })
            .collect()
    }
}

/// Row records to columns; the column set is the union of all keys and
/// missing cells become null.
pub fn to_columnar(records: &[Map<String, JsonValue>]) -> BTreeMap<String, Vec<JsonValue>> {
    let names: BTreeSet<&String> = records.iter().flat_map(|row| row.keys()).collect();

    names
        .into_iter()
        .map(|name| {
            let values = records
                .iter()
                .map(|row| row.get(name).cloned().unwrap_or(JsonValue::Null))
                .collect();
            (name.clone(), values)
        })
        .collect()
}

/// Type tag per column from its first non-null value
pub fn infer_column_types(columns: &BTreeMap<String, Vec<JsonValue>>) -> Schema {
    columns
        .iter()
        .map(|(name, values)| {
            let tag = match values.iter().find(|v| !v.is_null()) {
                Some(JsonValue::Number(n)) if n.is_i64() || n.is_u64() => "Int64",
                Some(JsonValue::Number(_)) => "Float64",
                Some(JsonValue::Bool(_)) => "Bool",
                _ => "String",
            };
            (name.clone(), tag.to_string())
        })
        .collect()
}
