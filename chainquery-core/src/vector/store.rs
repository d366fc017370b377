//! Registry of vector tables run through an executor

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};

use super::embed::Embedder;
use super::model::TableModel;
use super::query::VectorQuery;
use crate::builder::QueryBuilder;
use crate::executor::{OutputFormat, SqlExecutor};
use crate::{Error, Result};

/// Vector tables created through one executor
pub struct VectorStore<E> {
    executor: E,
    embedder: Arc<dyn Embedder>,
    tables: HashMap<String, TableModel>,
}

impl<E> VectorStore<E>
where
    E: SqlExecutor,
{
    pub fn new(executor: E, embedder: impl Embedder + 'static) -> Self {
        Self {
            executor,
            embedder: Arc::new(embedder),
            tables: HashMap::new(),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Create the table and its embedding columns, then register it
    pub async fn create_table(&mut self, model: TableModel) -> Result<()> {
        let create = model.create_table_sql()?;
        debug!(sql = %create, "creating vector table");
        self.run(&create).await?;

        for index in &model.indexes {
            let alter = model.add_embedding_column_sql(index);
            debug!(sql = %alter, index = %index.name, "adding embedding column");
            self.run(&alter).await?;
        }

        info!(table = %model.name, indexes = model.indexes.len(), "registered vector table");
        self.tables.insert(model.name.clone(), model);
        Ok(())
    }

    /// Search builder for a registered table
    pub fn table(&self, name: &str) -> Result<VectorQuery> {
        let model = self
            .tables
            .get(name)
            .ok_or_else(|| Error::validation(format!("table '{}' not found", name)))?;
        Ok(VectorQuery::new(model.clone(), Arc::clone(&self.embedder)))
    }

    pub async fn insert(&self, table: &str, record: Map<String, JsonValue>) -> Result<()> {
        let sql = self.table(table)?.insert_sql(record)?;
        self.run(&sql).await
    }

    pub async fn insert_many(
        &self,
        table: &str,
        records: Vec<Map<String, JsonValue>>,
    ) -> Result<()> {
        let count = records.len();
        let sql = self.table(table)?.insert_many_sql(records)?;
        self.run(&sql).await?;
        debug!(table, rows = count, "inserted records");
        Ok(())
    }

    /// Run a search and return one object per row, including `similarity_score`
    pub async fn search(&self, query: &VectorQuery) -> Result<Vec<Map<String, JsonValue>>> {
        let sql = query.to_sql()?;
        debug!(sql = %sql, "vector search");
        let output = self
            .executor
            .query(&sql, &OutputFormat::JsonEachRow, None)
            .await?;

        output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Ok(serde_json::from_str::<Map<String, JsonValue>>(line)?))
            .collect()
    }

    async fn run(&self, sql: &str) -> Result<()> {
        self.executor
            .query(sql, &OutputFormat::TabSeparated, None)
            .await?;
        Ok(())
    }
}
