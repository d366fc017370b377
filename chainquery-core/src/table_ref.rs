//! Table references: where a query's rows come from

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::reader::ReaderHandle;

/// SQL text of the reader table function
pub const READER_TABLE_FUNCTION: &str = "Python(reader)";

static READER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Python\(\w*\)$").expect("valid reader pattern"));

static FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^file\('([^']*)',\s*'([^']*)'\)$").expect("valid file pattern")
});

static POSTGRES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^postgresql\('([^':]*):(\d+)',\s*'([^']*)',\s*'([^']*)',\s*'([^']*)',\s*'([^']*)'(?:,\s*schema='([^']*)')?\)$",
    )
    .expect("valid postgresql pattern")
});

/// A networked relational table reached through the `postgresql(...)` table function
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteTable {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub table: String,
    pub user: String,
    pub password: String,
    pub schema: Option<String>,
}

impl RemoteTable {
    pub fn to_sql(&self) -> String {
        let schema_part = match &self.schema {
            Some(schema) => format!(", schema='{}'", schema),
            None => String::new(),
        };
        format!(
            "postgresql('{}:{}', '{}', '{}', '{}', '{}'{})",
            self.host, self.port, self.database, self.table, self.user, self.password, schema_part
        )
    }
}

impl fmt::Debug for RemoteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTable")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("table", &self.table)
            .field("user", &self.user)
            .field("password", &"***")
            .field("schema", &self.schema)
            .finish()
    }
}

/// A file read through the `file(path, format)` table function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    pub path: String,
    pub format: String,
}

impl FileSource {
    pub fn new(path: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: format.into(),
        }
    }

    pub fn to_sql(&self) -> String {
        format!("file('{}', '{}')", self.path, self.format)
    }
}

/// Where a query's rows come from
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// Programmatic paginated source, optionally with its reader attached
    Reader(Option<ReaderHandle>),
    /// Remote relational table
    Remote(RemoteTable),
    /// File with a format tag
    File(FileSource),
    /// Opaque source text, emitted unmodified
    Raw(String),
}

impl TableRef {
    pub fn reader(handle: ReaderHandle) -> Self {
        TableRef::Reader(Some(handle))
    }

    pub fn file(path: impl Into<String>, format: impl Into<String>) -> Self {
        TableRef::File(FileSource::new(path, format))
    }

    pub fn raw(text: impl Into<String>) -> Self {
        TableRef::Raw(text.into())
    }

    /// Recognize `Python(..)`, `file(..)` and `postgresql(..)` constructor text;
    /// everything else is kept as raw text.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();

        if READER_RE.is_match(trimmed) {
            return TableRef::Reader(None);
        }

        if let Some(caps) = FILE_RE.captures(trimmed) {
            return TableRef::file(&caps[1], &caps[2]);
        }

        if let Some(caps) = POSTGRES_RE.captures(trimmed) {
            if let Ok(port) = caps[2].parse::<u16>() {
                return TableRef::Remote(RemoteTable {
                    host: caps[1].to_string(),
                    port,
                    database: caps[3].to_string(),
                    table: caps[4].to_string(),
                    user: caps[5].to_string(),
                    password: caps[6].to_string(),
                    schema: caps.get(7).map(|m| m.as_str().to_string()),
                });
            }
        }

        TableRef::Raw(text.to_string())
    }

    /// SQL text of this source as it appears after FROM / JOIN
    pub fn to_sql(&self) -> String {
        match self {
            TableRef::Reader(_) => READER_TABLE_FUNCTION.to_string(),
            TableRef::Remote(remote) => remote.to_sql(),
            TableRef::File(file) => file.to_sql(),
            TableRef::Raw(text) => text.clone(),
        }
    }

    /// The attached reader, if any
    pub fn reader_handle(&self) -> Option<&ReaderHandle> {
        match self {
            TableRef::Reader(handle) => handle.as_ref(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TableRef::Raw(text) if text.trim().is_empty())
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl From<&str> for TableRef {
    fn from(text: &str) -> Self {
        TableRef::parse(text)
    }
}

impl From<String> for TableRef {
    fn from(text: String) -> Self {
        TableRef::parse(&text)
    }
}

impl From<ReaderHandle> for TableRef {
    fn from(handle: ReaderHandle) -> Self {
        TableRef::Reader(Some(handle))
    }
}

impl From<RemoteTable> for TableRef {
    fn from(remote: RemoteTable) -> Self {
        TableRef::Remote(remote)
    }
}

impl From<FileSource> for TableRef {
    fn from(file: FileSource) -> Self {
        TableRef::File(file)
    }
}
