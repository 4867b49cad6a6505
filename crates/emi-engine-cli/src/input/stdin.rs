use serde_json::Value;
use std::io::{self, Read};

use super::strip_envelope;

/// JSON piped into `emi`, e.g. `emi schedule ... | emi summary`.
///
/// `None` when stdin is a terminal or the pipe is empty, so the command falls
/// back to its flags. Another command's envelope is reduced to its `result`.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| format!("Failed to parse piped input: {}", e))?;
    Ok(Some(strip_envelope(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_pipe_falls_back_to_flags() {
        assert!(parse_piped("  \n").unwrap().is_none());
    }

    #[test]
    fn test_piped_envelope_is_unwrapped() {
        let piped = r#"{"result": {"file_number": "F-1"}, "warnings": [], "metadata": {}}"#;
        assert_eq!(parse_piped(piped).unwrap(), Some(json!({"file_number": "F-1"})));
    }

    #[test]
    fn test_garbage_is_an_error() {
        let err = parse_piped("emi_amount=103.33").unwrap_err();
        assert!(err.to_string().contains("piped input"));
    }
}
