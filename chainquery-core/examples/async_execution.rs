//! Run queries over an in-process reader with the embedded engine.
//!
//! Set `ANTHROPIC_API_KEY` to also refine the query from a question.

use chainquery_core::{
    op, AnthropicOracle, Config, MemoryReader, OutputFormat, Query, QueryBuilder, ReaderHandle,
    SqliteExecutor,
};
use serde_json::{json, Map, Value as JsonValue};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn records() -> Vec<Map<String, JsonValue>> {
    let rows = json!([
        {"region": "north", "product": "widget", "units": 12, "price": 2.5},
        {"region": "south", "product": "widget", "units": 7, "price": 2.5},
        {"region": "north", "product": "gadget", "units": 3, "price": 11.0},
        {"region": "east", "product": "gizmo", "units": 20, "price": null}
    ]);
    rows.as_array()
        .map(|rows| rows.iter().filter_map(|r| r.as_object().cloned()).collect())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> chainquery_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::resolve()?;
    let executor = SqliteExecutor::from_config(&config.executor).await?;

    let sales = ReaderHandle::new(MemoryReader::from_records("sales", records()));
    let query = Query::new(sales)?
        .select("region, product, units")
        .filter("units", op::GT, 5);
    info!(sql = %query.to_sql()?, "running");

    println!("{}", query.execute(&executor, config.executor.output_format()).await?);
    println!("{}", query.execute(&executor, OutputFormat::CsvWithNames).await?);
    println!("{}", query.execute(&executor, "JSONEachRow").await?);

    match AnthropicOracle::new(&config.oracle) {
        Ok(oracle) => {
            let refined = query
                .ask(&oracle, "total units per region, largest first", true)
                .await?;
            println!("generated: {}", refined.to_sql()?);
            println!("{}", refined.execute(&executor, OutputFormat::PrettyCompact).await?);
        }
        Err(err) => warn!(error = %err, "skipping text-to-SQL step"),
    }

    Ok(())
}
