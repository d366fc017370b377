//! Typed data source descriptions that hand out query plans

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::reader::{MemoryReader, ReaderHandle};
use crate::table_ref::{FileSource, RemoteTable, TableRef};
use crate::{Error, Query, Result};

/// Kind tag of a data source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Api,
    Postgres,
    File,
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(SourceKind::Api),
            "postgres" => Ok(SourceKind::Postgres),
            "file" => Ok(SourceKind::File),
            other => Err(Error::validation(format!(
                "unsupported source type '{}'",
                other
            ))),
        }
    }
}

/// Connection details of an HTTP API source
///
/// The crate does no HTTP itself; these are handed to the [`RecordSource`]
/// that fetches each collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL collections are fetched from
    pub url: String,
    pub api_key: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub schema: Option<String>,
}

fn default_postgres_port() -> u16 {
    5432
}

impl PostgresConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_postgres_port(),
            database: String::new(),
            user: String::new(),
            password: String::new(),
            schema: None,
        }
    }
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("schema", &self.schema)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    pub path: String,
    #[serde(default = "default_file_format")]
    pub format: String,
}

fn default_file_format() -> String {
    "CSV".to_string()
}

impl FileConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: default_file_format(),
        }
    }
}

/// Supplies row records for a named API collection
pub trait RecordSource: Send + Sync {
    fn fetch(&self, config: &ApiConfig, collection: &str) -> Result<Vec<Map<String, JsonValue>>>;
}

impl<F> RecordSource for F
where
    F: Fn(&ApiConfig, &str) -> Result<Vec<Map<String, JsonValue>>> + Send + Sync,
{
    fn fetch(&self, config: &ApiConfig, collection: &str) -> Result<Vec<Map<String, JsonValue>>> {
        self(config, collection)
    }
}

/// A configured data source
#[derive(Clone)]
pub enum DataSource {
    Api {
        config: ApiConfig,
        records: Option<Arc<dyn RecordSource>>,
    },
    Postgres(PostgresConfig),
    File(FileConfig),
}

impl DataSource {
    pub fn api(config: ApiConfig) -> Self {
        DataSource::Api {
            config,
            records: None,
        }
    }

    /// API source whose collections are fetched through `records`
    pub fn api_with_records<R>(config: ApiConfig, records: R) -> Self
    where
        R: RecordSource + 'static,
    {
        DataSource::Api {
            config,
            records: Some(Arc::new(records)),
        }
    }

    pub fn postgres(config: PostgresConfig) -> Self {
        DataSource::Postgres(config)
    }

    pub fn file(config: FileConfig) -> Self {
        DataSource::File(config)
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            DataSource::Api { .. } => SourceKind::Api,
            DataSource::Postgres(_) => SourceKind::Postgres,
            DataSource::File(_) => SourceKind::File,
        }
    }

    /// Table reference for `name` within this source
    pub fn table_ref(&self, name: &str) -> Result<TableRef> {
        match self {
            DataSource::Postgres(config) => Ok(TableRef::Remote(RemoteTable {
                host: config.host.clone(),
                port: config.port,
                database: config.database.clone(),
                table: name.to_string(),
                user: config.user.clone(),
                password: config.password.clone(),
                schema: config.schema.clone(),
            })),
            DataSource::File(config) => Ok(TableRef::File(FileSource::new(
                config.path.clone(),
                config.format.clone(),
            ))),
            DataSource::Api { records: None, .. } => Ok(TableRef::Reader(None)),
            DataSource::Api {
                config,
                records: Some(records),
            } => {
                let rows = records.fetch(config, name)?;
                let reader = MemoryReader::from_records(name, rows);
                debug!(collection = name, rows = reader.row_count(), "loaded api collection");
                Ok(TableRef::reader(ReaderHandle::new(reader)))
            }
        }
    }

    /// Query plan over table `name`
    ///
    /// For API sources the plan also carries the reader's column types.
    pub fn table(&self, name: &str) -> Result<Query> {
        let table = self.table_ref(name)?;
        let column_types = table.reader_handle().map(ReaderHandle::schema).transpose()?;
        let query = Query::new(table)?;
        Ok(match column_types {
            Some(types) => query.with_column_types(types),
            None => query,
        })
    }

    /// Query plan over an API collection
    pub fn collection(&self, name: &str) -> Result<Query> {
        if self.kind() != SourceKind::Api {
            return Err(Error::validation(
                "collection() is only available for API sources",
            ));
        }
        self.table(name)
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Api { config, records } => f
                .debug_struct("Api")
                .field("config", config)
                .field("records", &records.is_some())
                .finish(),
            DataSource::Postgres(config) => f.debug_tuple("Postgres").field(config).finish(),
            DataSource::File(config) => f.debug_tuple("File").field(config).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryBuilder;
    use serde_json::json;

    fn api_config() -> ApiConfig {
        ApiConfig {
            url: "http://localhost:8000".to_string(),
            api_key: None,
            headers: BTreeMap::new(),
        }
    }

    fn mock_records(_config: &ApiConfig, collection: &str) -> Result<Vec<Map<String, JsonValue>>> {
        match collection {
            "comments" => Ok(vec![
                json!({"id": 1, "user_id": 10, "text": "hello"})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            ]),
            other => Err(Error::execution(format!("no collection '{}'", other))),
        }
    }

    #[test]
    fn test_source_kind_parsing() {
        assert_eq!("API".parse::<SourceKind>().unwrap(), SourceKind::Api);
        assert_eq!("Postgres".parse::<SourceKind>().unwrap(), SourceKind::Postgres);
        assert_eq!("file".parse::<SourceKind>().unwrap(), SourceKind::File);
        assert!(matches!(
            "mongo".parse::<SourceKind>(),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_postgres_table() {
        let config = PostgresConfig {
            database: "mydb".to_string(),
            user: "user".to_string(),
            password: "secret".to_string(),
            ..PostgresConfig::new("localhost")
        };
        let query = DataSource::postgres(config).table("users").unwrap();
        assert_eq!(query.alias(), "mydb_users");
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT mydb_users.* FROM postgresql('localhost:5432', 'mydb', 'users', 'user', 'secret') AS mydb_users"
        );
    }

    #[test]
    fn test_file_table() {
        let query = DataSource::file(FileConfig::new("data/comments.csv"))
            .table("ignored")
            .unwrap();
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT comments.* FROM file('data/comments.csv', 'CSV') AS comments"
        );
    }

    #[test]
    fn test_api_collection_carries_reader_and_types() {
        let source = DataSource::api_with_records(api_config(), mock_records);
        let query = source.collection("comments").unwrap();

        assert_eq!(query.alias(), "comments");
        assert_eq!(query.reader_handle().map(ReaderHandle::name), Some("comments"));
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT comments.* FROM Python(reader) AS comments"
        );

        let hints = query.schema();
        match &hints[0].columns {
            crate::oracle::ColumnDescriptor::Typed(types) => {
                assert_eq!(types["user_id"], "Int64");
                assert_eq!(types["text"], "String");
            }
            other => panic!("expected typed columns, got {:?}", other),
        }
    }

    #[test]
    fn test_api_record_errors_propagate() {
        let source = DataSource::api_with_records(api_config(), mock_records);
        assert!(matches!(
            source.table("missing"),
            Err(Error::Execution { .. })
        ));
    }

    #[test]
    fn test_record_source_receives_api_config() {
        let mut config = api_config();
        config.api_key = Some("token".to_string());
        config
            .headers
            .insert("X-Tenant".to_string(), "acme".to_string());

        let source = DataSource::api_with_records(
            config,
            |config: &ApiConfig, collection: &str| -> Result<Vec<Map<String, JsonValue>>> {
                let row = json!({
                    "url": format!("{}/{}", config.url, collection),
                    "key": config.api_key.clone(),
                    "tenant": config.headers.get("X-Tenant").cloned(),
                });
                Ok(vec![row.as_object().cloned().unwrap_or_default()])
            },
        );

        let handle = source.table_ref("users").unwrap().reader_handle().cloned().unwrap();
        let rows = handle
            .read_all(&["key".to_string(), "tenant".to_string(), "url".to_string()], 10)
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![json!("token"), json!("acme"), json!("http://localhost:8000/users")]]
        );
    }

    #[test]
    fn test_api_without_records_is_readerless() {
        let query = DataSource::api(api_config()).table("comments").unwrap();
        assert_eq!(query.alias(), "python");
        assert!(query.reader_handle().is_none());
    }

    #[test]
    fn test_collection_requires_api_source() {
        let source = DataSource::file(FileConfig::new("a.csv"));
        assert!(matches!(
            source.collection("x"),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_configs_deserialize_with_defaults() {
        let pg: PostgresConfig = serde_json::from_value(json!({"host": "db"})).unwrap();
        assert_eq!(pg.port, 5432);
        let file: FileConfig = serde_json::from_value(json!({"path": "x.parquet"})).unwrap();
        assert_eq!(file.format, "CSV");

        let debug = format!("{:?}", PostgresConfig { password: "pw".into(), ..pg });
        assert!(!debug.contains("\"pw\""));
    }
}
