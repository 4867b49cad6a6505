use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten, format_scalar, row_cells, row_headers};

/// Format output as tables: one Field/Value table for the result, then one
/// table per row collection (installments, loans).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result(result, map),
            _ => print_object(map),
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    print_object(result);

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_object(map: &Map<String, Value>) {
    let flat = flatten(map);

    if !flat.fields.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in &flat.fields {
            builder.push_record([key.as_str(), &format_scalar(val)]);
        }
        println!("{}", Table::from(builder));
    }

    for (name, rows) in flat.row_sets {
        println!("\n{}:", name);
        print_rows(rows);
    }
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let headers = row_headers(rows);
    if headers.is_empty() {
        for item in rows {
            println!("{}", format_scalar(item));
        }
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        builder.push_record(row_cells(row, &headers));
    }
    println!("{}", Table::from(builder));
}
