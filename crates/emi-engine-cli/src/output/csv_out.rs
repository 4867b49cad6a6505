use serde_json::{Map, Value};
use std::io;

use super::{flatten, format_scalar, row_cells, row_headers};

/// Write output as CSV to stdout.
///
/// Results carrying a row collection (a schedule's installments, a
/// portfolio's loans) are written one row per element; anything else as
/// two-column `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            write_object(&mut wtr, body);
        }
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_scalar(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_object<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) {
    let flat = flatten(map);
    // The innermost collection is the one worth exporting, e.g. the
    // installments of the schedule inside a payment outcome.
    if let Some((_, rows)) = flat.row_sets.last() {
        write_rows(wtr, rows);
        return;
    }

    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in &flat.fields {
        let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
    }
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let headers = row_headers(rows);
    if headers.is_empty() {
        for item in rows {
            let _ = wtr.write_record([&format_scalar(item)]);
        }
        return;
    }

    let _ = wtr.write_record(&headers);
    for row in rows {
        let _ = wtr.write_record(row_cells(row, &headers));
    }
}
