//! Alias derivation for table references

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::table_ref::TableRef;

pub const READER_FALLBACK_ALIAS: &str = "python";
pub const REMOTE_FALLBACK_ALIAS: &str = "pg";
pub const FILE_FALLBACK_ALIAS: &str = "file";
pub const RAW_ALIAS: &str = "table";

static REMOTE_ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"postgresql\([^,]+,\s*'([^']+)',\s*'([^']+)'").expect("valid remote alias pattern")
});

static FILE_ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"file\('([^']+)',\s*'[^']+'").expect("valid file alias pattern"));

/// Derive the alias a table reference is known by in generated SQL
///
/// Never fails: every kind has a fallback string.
pub fn derive_alias(table: &TableRef) -> String {
    match table {
        TableRef::Reader(Some(handle)) => handle.name().to_string(),
        TableRef::Reader(None) => READER_FALLBACK_ALIAS.to_string(),
        TableRef::Remote(_) => remote_alias(&table.to_sql()),
        TableRef::File(_) => file_alias(&table.to_sql()),
        TableRef::Raw(_) => RAW_ALIAS.to_string(),
    }
}

fn remote_alias(sql: &str) -> String {
    match REMOTE_ALIAS_RE.captures(sql) {
        Some(caps) => format!("{}_{}", &caps[1], &caps[2]),
        None => {
            debug!(source = sql, alias = REMOTE_FALLBACK_ALIAS, "alias fallback");
            REMOTE_FALLBACK_ALIAS.to_string()
        }
    }
}

fn file_alias(sql: &str) -> String {
    let stem = FILE_ALIAS_RE.captures(sql).and_then(|caps| {
        let path = caps.get(1)?.as_str();
        let base = path.rsplit('/').next().unwrap_or(path);
        let stem = match base.rsplit_once('.') {
            Some((stem, _ext)) => stem,
            None => base,
        };
        (!stem.is_empty()).then(|| stem.to_string())
    });

    stem.unwrap_or_else(|| {
        debug!(source = sql, alias = FILE_FALLBACK_ALIAS, "alias fallback");
        FILE_FALLBACK_ALIAS.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{MemoryReader, ReaderHandle};
    use crate::table_ref::RemoteTable;

    fn remote(database: &str, table: &str) -> TableRef {
        TableRef::Remote(RemoteTable {
            host: "localhost".to_string(),
            port: 5432,
            database: database.to_string(),
            table: table.to_string(),
            user: "user".to_string(),
            password: "pw".to_string(),
            schema: None,
        })
    }

    #[test]
    fn test_remote_alias() {
        assert_eq!(derive_alias(&remote("mydb", "orders")), "mydb_orders");
    }

    #[test]
    fn test_remote_alias_falls_back_when_unmatched() {
        // empty database and table names do not match the capture groups
        assert_eq!(derive_alias(&remote("", "")), "pg");
    }

    #[test]
    fn test_file_alias_strips_directory_and_extension() {
        assert_eq!(
            derive_alias(&TableRef::file("data/comments.csv", "CSV")),
            "comments"
        );
        assert_eq!(
            derive_alias(&TableRef::file("/var/lib/events.2024.parquet", "Parquet")),
            "events.2024"
        );
        assert_eq!(derive_alias(&TableRef::file("plain", "TSV")), "plain");
    }

    #[test]
    fn test_file_alias_fallbacks() {
        assert_eq!(derive_alias(&TableRef::file("", "CSV")), "file");
        assert_eq!(derive_alias(&TableRef::file("dir/.csv", "CSV")), "file");
    }

    #[test]
    fn test_reader_alias() {
        let handle = ReaderHandle::new(MemoryReader::from_records("comments", Vec::new()));
        assert_eq!(derive_alias(&TableRef::reader(handle)), "comments");
        assert_eq!(derive_alias(&TableRef::Reader(None)), "python");
    }

    #[test]
    fn test_raw_alias() {
        assert_eq!(derive_alias(&TableRef::raw("users")), "table");
        assert_eq!(derive_alias(&TableRef::raw("numbers(10)")), "table");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let table = TableRef::file("a/b/c.csv", "CSV");
        assert_eq!(derive_alias(&table), derive_alias(&table));
    }
}
