pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// A computation result split for tabular output: scalar fields flattened to
/// dotted keys, and row collections (installments, loans) kept apart.
pub(crate) struct Flattened<'a> {
    pub fields: Vec<(String, &'a Value)>,
    pub row_sets: Vec<(String, &'a [Value])>,
}

pub(crate) fn flatten(map: &Map<String, Value>) -> Flattened<'_> {
    let mut out = Flattened {
        fields: Vec::new(),
        row_sets: Vec::new(),
    };
    flatten_into(map, "", &mut out);
    out
}

fn flatten_into<'a>(map: &'a Map<String, Value>, prefix: &str, out: &mut Flattened<'a>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(inner, &name, out),
            Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
                out.row_sets.push((name, rows.as_slice()));
            }
            _ => out.fields.push((name, val)),
        }
    }
}

pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_scalar).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Column headers of a row set, taken from its first row.
pub(crate) fn row_headers(rows: &[Value]) -> Vec<String> {
    match rows.first() {
        Some(Value::Object(first)) => first.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn row_cells(row: &Value, headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|h| row.get(h.as_str()).map(format_scalar).unwrap_or_default())
        .collect()
}
