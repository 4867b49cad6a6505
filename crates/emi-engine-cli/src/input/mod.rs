pub mod file;
pub mod policy;
pub mod stdin;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Resolve a command's JSON input: `--input` file first, then piped stdin.
/// `None` means neither was supplied and the caller should fall back to flags.
///
/// Output of another `emi` command may be fed back in as is; its envelope is
/// stripped down to `result`.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let value = match path {
        Some(path) => strip_envelope(file::read_json::<Value>(path)?),
        None => match stdin::read_stdin()? {
            Some(value) => value,
            None => return Ok(None),
        },
    };
    Ok(Some(serde_json::from_value(value)?))
}

/// Read a JSON file that may be a bare record or a command envelope.
pub fn read_record<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let value = file::read_json::<Value>(path)?;
    serde_json::from_value(strip_envelope(value))
        .map_err(|e| format!("Failed to parse '{}': {}", path, e).into())
}

/// Reduce a command envelope to its `result`; bare records pass through.
pub(crate) fn strip_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("result") && map.contains_key("metadata") => {
            map.remove("result").unwrap_or_default()
        }
        other => other,
    }
}
