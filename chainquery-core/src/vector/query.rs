//! Similarity search and insert statements for a table model

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use super::embed::{embed_checked, Embedder};
use super::model::TableModel;
use crate::builder::{json_to_value, InsertBuilder, QueryBuilder};
use crate::{Error, Operator, Result, Value};

/// Column holding the distance of each row to the search text
pub const SCORE_COLUMN: &str = "similarity_score";

/// Vector search over one table
#[derive(Clone)]
pub struct VectorQuery {
    model: TableModel,
    embedder: Arc<dyn Embedder>,
    filters: Vec<String>,
    limit: Option<u64>,
    index_name: Option<String>,
    search_text: Option<String>,
}

impl VectorQuery {
    pub fn new(model: TableModel, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            model,
            embedder,
            filters: Vec::new(),
            limit: None,
            index_name: None,
            search_text: None,
        }
    }

    pub fn model(&self) -> &TableModel {
        &self.model
    }

    /// Index whose embedding column is searched
    pub fn using_index(mut self, name: &str) -> Self {
        self.index_name = Some(name.to_string());
        self
    }

    /// Text to search for
    pub fn search(mut self, text: &str) -> Self {
        self.search_text = Some(text.to_string());
        self
    }

    /// Add a condition; `key` is `field` or `field__op` with op one of
    /// `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
    pub fn filter(mut self, key: &str, value: impl Into<Value>) -> Result<Self> {
        let (field, operator) = match key.split_once("__") {
            Some((field, suffix)) => {
                let operator = Operator::from_suffix(suffix).ok_or_else(|| {
                    Error::validation(format!("unknown filter operator '{}'", suffix))
                })?;
                (field, operator)
            }
            None => (key, Operator::EQ),
        };
        self.filters.push(format!(
            "{} {} {}",
            field,
            operator,
            value.into().to_sql_literal()
        ));
        Ok(self)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Record as column/value pairs, with one embedding per index whose
    /// source field is present
    fn with_embeddings(&self, record: Map<String, JsonValue>) -> Result<Vec<(String, Value)>> {
        let mut embeddings = Vec::new();
        for index in &self.model.indexes {
            let text = match record.get(&index.source_field) {
                Some(JsonValue::String(text)) => text.clone(),
                Some(JsonValue::Null) | None => continue,
                Some(other) => other.to_string(),
            };
            let vector = embed_checked(self.embedder.as_ref(), &text, index.dim)?;
            embeddings.push((index.embedding_column(), Value::from(vector)));
        }

        let mut pairs: Vec<(String, Value)> = record
            .into_iter()
            .map(|(column, value)| (column, json_to_value(value)))
            .collect();
        for (column, vector) in embeddings {
            match pairs.iter_mut().find(|(c, _)| *c == column) {
                Some(pair) => pair.1 = vector,
                None => pairs.push((column, vector)),
            }
        }
        Ok(pairs)
    }

    /// INSERT for one record
    pub fn insert_sql(&self, record: Map<String, JsonValue>) -> Result<String> {
        let pairs = self.with_embeddings(record)?;
        InsertBuilder::new(&self.model.name).values(pairs).to_sql()
    }

    /// INSERT for many records; columns come from the first record
    pub fn insert_many_sql(&self, records: Vec<Map<String, JsonValue>>) -> Result<String> {
        let rows = records
            .into_iter()
            .map(|record| self.with_embeddings(record))
            .collect::<Result<Vec<_>>>()?;
        InsertBuilder::new(&self.model.name).values_many(rows).to_sql()
    }
}

impl QueryBuilder for VectorQuery {
    fn to_sql(&self) -> Result<String> {
        let (Some(index_name), Some(text)) = (&self.index_name, &self.search_text) else {
            return Err(Error::validation(
                "vector search needs an index and search text",
            ));
        };
        let index = self.model.find_index(index_name).ok_or_else(|| {
            Error::validation(format!(
                "vector index '{}' not found on '{}'",
                index_name, self.model.name
            ))
        })?;

        let embedding = Value::from(embed_checked(self.embedder.as_ref(), text, index.dim)?);
        let where_clause = if self.filters.is_empty() {
            "1=1".to_string()
        } else {
            self.filters.join(" AND ")
        };

        let mut sql = format!(
            "SELECT *, {}({}, {}) AS {} FROM {} WHERE {} ORDER BY {} ASC",
            index.distance.as_str(),
            index.embedding_column(),
            embedding.to_sql_literal(),
            SCORE_COLUMN,
            self.model.name,
            where_clause,
            SCORE_COLUMN
        );
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        Ok(sql)
    }
}

impl fmt::Debug for VectorQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorQuery")
            .field("table", &self.model.name)
            .field("filters", &self.filters)
            .field("limit", &self.limit)
            .field("index_name", &self.index_name)
            .field("search_text", &self.search_text)
            .finish()
    }
}
