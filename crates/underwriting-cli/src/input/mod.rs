pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Read command input from `--input <file>` or, failing that, piped stdin.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_json(path)
    } else if let Some(parsed) = stdin::read_stdin()? {
        Ok(parsed)
    } else {
        Err(format!("--input <file.json> or stdin required for {what}").into())
    }
}
