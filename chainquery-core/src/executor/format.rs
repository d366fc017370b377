//! Rendering of result sets into output formats

use serde_json::{json, Map, Value as JsonValue};
use tabled::{builder::Builder, settings::Style};

use super::OutputFormat;
use crate::{Error, Result};

/// Render `rows` (row-major, aligned with `columns`) in `format`
pub fn render(format: &OutputFormat, columns: &[String], rows: &[Vec<JsonValue>]) -> Result<String> {
    match format {
        OutputFormat::PrettyCompact => Ok(pretty(columns, rows)),
        OutputFormat::Json => json_document(columns, rows),
        OutputFormat::JsonEachRow => json_each_row(columns, rows),
        OutputFormat::Csv => delimited(columns, rows, false),
        OutputFormat::CsvWithNames => delimited(columns, rows, true),
        OutputFormat::TabSeparated => Ok(tab_separated(columns, rows, false)),
        OutputFormat::TabSeparatedWithNames => Ok(tab_separated(columns, rows, true)),
        OutputFormat::Other(name) => Err(Error::execution(format!(
            "unsupported output format '{}'",
            name
        ))),
    }
}

fn row_object(columns: &[String], row: &[JsonValue]) -> Map<String, JsonValue> {
    columns
        .iter()
        .cloned()
        .zip(row.iter().cloned().chain(std::iter::repeat(JsonValue::Null)))
        .collect()
}

fn json_document(columns: &[String], rows: &[Vec<JsonValue>]) -> Result<String> {
    let meta: Vec<JsonValue> = columns.iter().map(|name| json!({ "name": name })).collect();
    let data: Vec<JsonValue> = rows
        .iter()
        .map(|row| JsonValue::Object(row_object(columns, row)))
        .collect();
    let document = json!({
        "meta": meta,
        "data": data,
        "rows": rows.len(),
    });
    Ok(serde_json::to_string(&document)?)
}

fn json_each_row(columns: &[String], rows: &[Vec<JsonValue>]) -> Result<String> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&serde_json::to_string(&row_object(columns, row))?);
        out.push('\n');
    }
    Ok(out)
}

/// Plain text of a cell; `null` is used for SQL NULL
fn cell_text(value: &JsonValue, null: &str) -> String {
    match value {
        JsonValue::Null => null.to_string(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn delimited(columns: &[String], rows: &[Vec<JsonValue>], with_names: bool) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    let csv_err = |e: csv::Error| Error::execution(format!("csv rendering failed: {}", e));

    if with_names {
        writer.write_record(columns).map_err(csv_err)?;
    }
    for row in rows {
        let cells: Vec<String> = row.iter().map(|v| cell_text(v, "")).collect();
        writer.write_record(&cells).map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::execution(format!("csv rendering failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::execution(format!("csv output is not utf-8: {}", e)))
}

fn escape_tsv(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
}

fn tab_separated(columns: &[String], rows: &[Vec<JsonValue>], with_names: bool) -> String {
    let mut out = String::new();
    if with_names {
        let names: Vec<String> = columns.iter().map(|c| escape_tsv(c)).collect();
        out.push_str(&names.join("\t"));
        out.push('\n');
    }
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .map(|v| match v {
                JsonValue::Null => "\\N".to_string(),
                other => escape_tsv(&cell_text(other, "")),
            })
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

fn pretty(columns: &[String], rows: &[Vec<JsonValue>]) -> String {
    let mut builder = Builder::new();
    builder.push_record(columns.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().map(|v| cell_text(v, "NULL")));
    }
    builder.build().with(Style::rounded()).to_string()
}
