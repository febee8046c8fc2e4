//! CSV export of extraction results.
//!
//! Columns are the union of the keys of every serialized result, in the
//! order they are first seen. Missing values are written as empty cells.

use std::io::Write;

use csv::{QuoteStyle, WriterBuilder};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ExportError;
use crate::models::result::ExtractionResult;

/// Render `results` as a CSV document.
pub fn to_csv(results: &[ExtractionResult]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(results, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ExportError::Serialize(e.to_string()))
}

/// Write `results` as CSV to `writer`.
pub fn write_csv<W: Write>(results: &[ExtractionResult], writer: W) -> Result<(), ExportError> {
    if results.is_empty() {
        return Err(ExportError::Empty);
    }

    let rows = results
        .iter()
        .map(flatten)
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let mut out = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(writer);

    out.write_record(&columns)?;
    for row in &rows {
        out.write_record(columns.iter().map(|c| cell(row.get(c))))?;
    }
    out.flush()?;

    debug!("Exported {} rows with {} columns", rows.len(), columns.len());
    Ok(())
}

fn flatten(result: &ExtractionResult) -> Result<Map<String, Value>, ExportError> {
    match serde_json::to_value(result) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ExportError::Serialize(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(ExportError::Serialize(e.to_string())),
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
