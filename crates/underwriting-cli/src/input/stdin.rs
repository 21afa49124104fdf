use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Deserialize a piped document from stdin.
///
/// Returns `None` when stdin is a terminal or the pipe is empty, so the
/// caller can fall back to flags.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| format!("stdin is not a valid input document: {e}").into())
}
