//! Query execution interface

use std::fmt;
use std::future::Future;

use crate::reader::ReaderHandle;
use crate::Result;

pub mod format;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use format::render;

/// Result encoding requested from an executor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    PrettyCompact,
    /// One JSON document with `meta`, `data` and `rows`
    Json,
    /// One JSON object per line
    JsonEachRow,
    Csv,
    CsvWithNames,
    TabSeparated,
    TabSeparatedWithNames,
    /// Passed through to executors that understand it
    Other(String),
}

impl OutputFormat {
    pub fn as_str(&self) -> &str {
        match self {
            OutputFormat::PrettyCompact => "PrettyCompact",
            OutputFormat::Json => "JSON",
            OutputFormat::JsonEachRow => "JSONEachRow",
            OutputFormat::Csv => "CSV",
            OutputFormat::CsvWithNames => "CSVWithNames",
            OutputFormat::TabSeparated => "TabSeparated",
            OutputFormat::TabSeparatedWithNames => "TabSeparatedWithNames",
            OutputFormat::Other(name) => name,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for OutputFormat {
    fn from(name: &str) -> Self {
        match name.trim() {
            "PrettyCompact" | "pretty" => OutputFormat::PrettyCompact,
            "JSON" | "json" => OutputFormat::Json,
            "JSONEachRow" | "jsonl" | "ndjson" => OutputFormat::JsonEachRow,
            "CSV" | "csv" => OutputFormat::Csv,
            "CSVWithNames" => OutputFormat::CsvWithNames,
            "TabSeparated" | "TSV" | "tsv" => OutputFormat::TabSeparated,
            "TabSeparatedWithNames" | "TSVWithNames" => OutputFormat::TabSeparatedWithNames,
            other => OutputFormat::Other(other.to_string()),
        }
    }
}

impl From<String> for OutputFormat {
    fn from(name: String) -> Self {
        OutputFormat::from(name.as_str())
    }
}

/// The SQL engine behind a query
///
/// Implementations receive finished SQL text and return the result rendered
/// in `format`. Engine errors are returned unchanged.
pub trait SqlExecutor: Send + Sync {
    /// Run `sql`; `reader` backs the `Python(reader)` table function if present
    fn query(
        &self,
        sql: &str,
        format: &OutputFormat,
        reader: Option<&ReaderHandle>,
    ) -> impl Future<Output = Result<String>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_round_trip() {
        for format in [
            OutputFormat::PrettyCompact,
            OutputFormat::Json,
            OutputFormat::JsonEachRow,
            OutputFormat::Csv,
            OutputFormat::CsvWithNames,
            OutputFormat::TabSeparated,
            OutputFormat::TabSeparatedWithNames,
        ] {
            assert_eq!(OutputFormat::from(format.to_string()), format);
        }
    }

    #[test]
    fn test_aliases_and_passthrough() {
        assert_eq!(OutputFormat::from("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("tsv"), OutputFormat::TabSeparated);
        assert_eq!(
            OutputFormat::from("Parquet"),
            OutputFormat::Other("Parquet".to_string())
        );
        // only the canonical spelling and listed aliases are recognized
        assert_eq!(
            OutputFormat::from("Json"),
            OutputFormat::Other("Json".to_string())
        );
    }

    #[test]
    fn test_default_is_pretty_compact() {
        assert_eq!(OutputFormat::default().as_str(), "PrettyCompact");
    }
}
