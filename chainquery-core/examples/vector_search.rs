//! Vector table DDL, inserts and similarity search against a printing executor.

use chainquery_core::executor::{OutputFormat, SqlExecutor};
use chainquery_core::vector::{
    ColumnType, FieldDef, HashEmbedder, TableModel, VectorIndex, VectorStore,
};
use chainquery_core::ReaderHandle;
use serde_json::json;

/// Prints every statement and answers searches with canned rows
struct PrintingExecutor;

impl SqlExecutor for PrintingExecutor {
    async fn query(
        &self,
        sql: &str,
        _format: &OutputFormat,
        _reader: Option<&ReaderHandle>,
    ) -> chainquery_core::Result<String> {
        println!("SQL: {}", sql);
        if sql.starts_with("SELECT") {
            Ok("{\"id\":\"a\",\"text\":\"great product\",\"similarity_score\":0.02}\n".to_string())
        } else {
            Ok(String::new())
        }
    }
}

#[tokio::main]
async fn main() -> chainquery_core::Result<()> {
    let mut store = VectorStore::new(PrintingExecutor, HashEmbedder);

    let comments = TableModel::new("comments")
        .field(FieldDef::new("id", ColumnType::String).primary_key().auto_uuid())
        .field(FieldDef::new("text", ColumnType::String))
        .field(FieldDef::new("created_at", ColumnType::DateTime).default_now())
        .index(VectorIndex::new("text_idx", "text", "hash", 8));
    store.create_table(comments).await?;

    let rows = json!([{"text": "great product"}, {"text": "arrived broken"}]);
    let records = rows
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r.as_object().cloned()).collect())
        .unwrap_or_default();
    store.insert_many("comments", records).await?;

    let query = store
        .table("comments")?
        .using_index("text_idx")
        .search("excellent")
        .limit(3);
    for row in store.search(&query).await? {
        println!("{}", serde_json::Value::Object(row));
    }
    Ok(())
}
