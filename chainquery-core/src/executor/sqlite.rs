//! Embedded SQLite executor

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as JsonValue;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Executor, Row, Statement, TypeInfo, ValueRef};
use tracing::{debug, trace};

use super::{render, OutputFormat, SqlExecutor};
use crate::config::ExecutorConfig;
use crate::reader::ReaderHandle;
use crate::table_ref::READER_TABLE_FUNCTION;
use crate::{Error, Result};

/// Temporary table a reader is materialized into for one query
pub const READER_TABLE: &str = "chainquery_reader";

pub const DEFAULT_BATCH_SIZE: usize = 8192;

static READER_SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(FROM|JOIN)(\s+){}",
        regex::escape(READER_TABLE_FUNCTION)
    ))
    .expect("valid reader source pattern")
});

/// Executor backed by a single SQLite connection
///
/// A single connection keeps `sqlite::memory:` databases alive across
/// queries.
#[derive(Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
    batch_size: usize,
}

impl SqliteExecutor {
    /// Connect to `database_url`
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url)
            .await?;
        Ok(Self::from_pool(pool))
    }

    /// Connect using the executor section of the configuration
    pub async fn from_config(config: &ExecutorConfig) -> Result<Self> {
        Ok(Self::connect(&config.database_url)
            .await?
            .with_batch_size(config.batch_size))
    }

    /// Create from an existing SqlitePool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Rows pulled from a reader per page
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn materialize(
        &self,
        conn: &mut PoolConnection<Sqlite>,
        handle: &ReaderHandle,
    ) -> Result<()> {
        let schema = handle.schema()?;
        if schema.is_empty() {
            return Err(Error::execution(format!(
                "reader '{}' exposes no columns",
                handle.name()
            )));
        }

        let columns: Vec<String> = schema.keys().cloned().collect();
        let definitions: Vec<String> = schema
            .iter()
            .map(|(name, tag)| format!("\"{}\" {}", name, sqlite_type(tag)))
            .collect();

        sqlx::query(&format!("DROP TABLE IF EXISTS {}", READER_TABLE))
            .execute(&mut **conn)
            .await?;
        sqlx::query(&format!(
            "CREATE TEMP TABLE {} ({})",
            READER_TABLE,
            definitions.join(", ")
        ))
        .execute(&mut **conn)
        .await?;

        // drained synchronously; the reader lock is released before any await
        let rows = handle.read_all(&columns, self.batch_size)?;

        let quoted: Vec<String> = columns.iter().map(|c| format!("\"{}\"", c)).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            READER_TABLE,
            quoted.join(", "),
            placeholders
        );

        for row in &rows {
            let mut query = sqlx::query(&insert);
            for value in row {
                query = bind_json(query, value);
            }
            query.execute(&mut **conn).await?;
        }

        debug!(
            reader = handle.name(),
            table = READER_TABLE,
            rows = rows.len(),
            "materialized reader"
        );
        Ok(())
    }

    async fn run(
        &self,
        conn: &mut PoolConnection<Sqlite>,
        sql: &str,
    ) -> Result<(Vec<String>, Vec<Vec<JsonValue>>)> {
        let statement = (&mut **conn).prepare(sql).await?;
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect();

        let rows = sqlx::query(sql).fetch_all(&mut **conn).await?;
        let decoded = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>>>()?;
        trace!(rows = decoded.len(), "fetched rows");
        Ok((columns, decoded))
    }
}

impl SqlExecutor for SqliteExecutor {
    async fn query(
        &self,
        sql: &str,
        format: &OutputFormat,
        reader: Option<&ReaderHandle>,
    ) -> Result<String> {
        if let OutputFormat::Other(name) = format {
            return Err(Error::execution(format!(
                "unsupported output format '{}'",
                name
            )));
        }

        let mut conn = self.pool.acquire().await?;

        let (sql, materialized) = match reader {
            Some(handle) => match substitute_reader(sql) {
                Some(rewritten) => {
                    self.materialize(&mut conn, handle).await?;
                    (rewritten, true)
                }
                None => (sql.to_string(), false),
            },
            None => (sql.to_string(), false),
        };

        let result = self.run(&mut conn, &sql).await;

        if materialized {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", READER_TABLE))
                .execute(&mut *conn)
                .await?;
        }

        let (columns, rows) = result?;
        render(format, &columns, &rows)
    }
}

/// Point `FROM`/`JOIN Python(reader)` at the materialized table
///
/// Only the table-function token after `FROM` or `JOIN` is rewritten, so the
/// same text inside a string literal is kept. `None` when no such token exists.
fn substitute_reader(sql: &str) -> Option<String> {
    if !READER_SOURCE_RE.is_match(sql) {
        return None;
    }
    let replacement = format!("${{1}}${{2}}{}", READER_TABLE);
    Some(READER_SOURCE_RE.replace_all(sql, replacement.as_str()).into_owned())
}

fn sqlite_type(tag: &str) -> &'static str {
    match tag {
        "Int64" | "Bool" => "INTEGER",
        "Float64" => "REAL",
        _ => "TEXT",
    }
}

fn bind_json<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &JsonValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        JsonValue::Null => query.bind(None::<i64>),
        JsonValue::Bool(b) => query.bind(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        JsonValue::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

/// Decode by the runtime storage class of each cell
fn decode_row(row: &SqliteRow) -> Result<Vec<JsonValue>> {
    let mut values = Vec::with_capacity(row.columns().len());
    for i in 0..row.columns().len() {
        let raw = row.try_get_raw(i)?;
        if raw.is_null() {
            values.push(JsonValue::Null);
            continue;
        }
        let value = match raw.type_info().name() {
            "INTEGER" => JsonValue::from(row.try_get_unchecked::<i64, _>(i)?),
            "REAL" => JsonValue::from(row.try_get_unchecked::<f64, _>(i)?),
            "BLOB" => {
                let bytes = row.try_get_unchecked::<Vec<u8>, _>(i)?;
                JsonValue::String(String::from_utf8_lossy(&bytes).into_owned())
            }
            _ => JsonValue::String(row.try_get_unchecked::<String, _>(i)?),
        };
        values.push(value);
    }
    Ok(values)
}
