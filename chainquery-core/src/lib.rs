//! Chainquery Core - fluent SQL over an embedded analytical engine
//!
//! Build queries against in-process readers, remote Postgres tables and
//! files, compile them to SQL with automatic aliasing, run them through a
//! [`SqlExecutor`], and refine them with a text-to-SQL [`SqlOracle`].
//!
//! ```
//! use chainquery_core::{Query, QueryBuilder};
//!
//! let sql = Query::new("file('events.csv', 'CSV')")?
//!     .select("id, kind")
//!     .filter("kind", "=", "click")
//!     .limit(10)
//!     .to_sql()?;
//! assert_eq!(
//!     sql,
//!     "SELECT events.id, events.kind FROM file('events.csv', 'CSV') AS events \
//!      WHERE events.kind = 'click' LIMIT 10"
//! );
//! # Ok::<(), chainquery_core::Error>(())
//! ```

pub mod alias;
pub mod builder;
pub mod config;
pub mod error;
pub mod executor;
pub mod operator;
pub mod oracle;
pub mod reader;
pub mod source;
pub mod table_ref;
pub mod value;
pub mod vector;

// Re-export main types
pub use alias::derive_alias;
pub use builder::{
    InsertBuilder, IntoFields, IntoJoinConditions, IntoJoinTarget, JoinConditions, JoinTarget,
    Query, QueryBuilder,
};
pub use config::{Config, ExecutorConfig, OracleConfig};
pub use error::{Error, Result};
pub use executor::{OutputFormat, SqlExecutor};
#[cfg(feature = "sqlite")]
pub use executor::sqlite::SqliteExecutor;
pub use operator::{op, IntoOperator, Operator};
pub use oracle::{AnthropicOracle, ColumnDescriptor, OracleRequest, SchemaHint, SqlOracle};
pub use reader::{DataReader, MemoryReader, ReaderHandle, Schema};
pub use source::{DataSource, SourceKind};
pub use table_ref::{FileSource, RemoteTable, TableRef};
pub use value::Value;

/// Start a query over `source`
pub fn from(source: impl Into<TableRef>) -> Result<Query> {
    Query::new(source)
}
