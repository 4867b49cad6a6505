use serde_json::{Map, Value};

use super::format_scalar;

/// The headline figure of each command, in priority order.
const PRIORITY_KEYS: [&str; 6] = [
    "emi_amount",
    "status",
    "pending_emi_amount",
    "total_pending_amount",
    "remaining_amount",
    "total_outstanding",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields first (also inside a payment outcome's
/// `installment`), then falls back to the first field of the result.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        if let Some(found) = priority_value(map) {
            return found;
        }
        if let Some(Value::Object(inst)) = map.get("installment") {
            if let Some(found) = priority_value(inst) {
                return found;
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

fn priority_value(map: &Map<String, Value>) -> Option<String> {
    PRIORITY_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|val| !val.is_null())
        .map(format_minimal)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        other => format_scalar(other),
    }
}
