//! Text and JSON views over data frames.
//!
//! Every cell is stringified by casting its column to `String`; nulls render
//! as the empty string. The same rendering backs the whole-row search, the
//! text block handed to the language model and the HTTP payloads.

use crate::error::Result;
use polars::prelude::*;

/// Stringified copy of every column, in frame order.
pub fn string_columns(df: &DataFrame) -> Result<Vec<StringChunked>> {
    let mut columns = Vec::with_capacity(df.width());
    for series in df.get_columns() {
        let as_text = series.cast(&DataType::String)?;
        columns.push(as_text.str()?.clone());
    }
    Ok(columns)
}

pub fn cell_text(column: &StringChunked, row_idx: usize) -> &str {
    column.get(row_idx).unwrap_or("")
}

/// All fields of one row joined by newlines, so a substring can never
/// straddle two fields.
pub fn row_text(columns: &[StringChunked], row_idx: usize) -> String {
    columns
        .iter()
        .map(|column| cell_text(column, row_idx))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a frame as an aligned plain-text table with a leading row index.
/// Unlike the polars `Display` impl nothing is elided, so the caller
/// controls the size with `head`.
pub fn text_block(df: &DataFrame) -> Result<String> {
    let columns = string_columns(df)?;
    let names: Vec<&str> = df.get_column_names();
    let height = df.height();
    let index_width = height.saturating_sub(1).to_string().len();

    let widths: Vec<usize> = columns
        .iter()
        .zip(names.iter())
        .map(|(column, name)| {
            (0..height)
                .map(|i| cell_text(column, i).chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(height + 1);
    let mut header = " ".repeat(index_width);
    for (name, width) in names.iter().zip(&widths) {
        header.push_str(&format!("  {:>width$}", name, width = width));
    }
    lines.push(header);

    for row_idx in 0..height {
        let mut line = format!("{:>width$}", row_idx, width = index_width);
        for (column, width) in columns.iter().zip(&widths) {
            line.push_str(&format!("  {:>width$}", cell_text(column, row_idx), width = width));
        }
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

/// Convert a frame to `{"columns": [...], "rows": [{...}, ...]}`.
pub fn to_json_rows(df: &DataFrame) -> Result<serde_json::Value> {
    let columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    let mut rows = Vec::with_capacity(df.height());

    for row_idx in 0..df.height() {
        let mut row = serde_json::Map::new();
        for series in df.get_columns() {
            row.insert(series.name().to_string(), json_value(series, row_idx)?);
        }
        rows.push(serde_json::Value::Object(row));
    }

    Ok(serde_json::json!({
        "columns": columns,
        "rows": rows,
    }))
}

fn json_value(series: &Series, row_idx: usize) -> Result<serde_json::Value> {
    let value = series.get(row_idx)?;
    Ok(match value {
        AnyValue::Null => serde_json::Value::Null,
        AnyValue::Boolean(b) => serde_json::Value::Bool(b),
        AnyValue::String(s) => serde_json::Value::String(s.to_string()),
        AnyValue::Int8(i) => serde_json::Value::Number(i.into()),
        AnyValue::Int16(i) => serde_json::Value::Number(i.into()),
        AnyValue::Int32(i) => serde_json::Value::Number(i.into()),
        AnyValue::Int64(i) => serde_json::Value::Number(i.into()),
        AnyValue::UInt8(u) => serde_json::Value::Number(u.into()),
        AnyValue::UInt16(u) => serde_json::Value::Number(u.into()),
        AnyValue::UInt32(u) => serde_json::Value::Number(u.into()),
        AnyValue::UInt64(u) => serde_json::Value::Number(u.into()),
        AnyValue::Float32(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        AnyValue::Float64(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        other => serde_json::Value::String(other.to_string()),
    })
}
