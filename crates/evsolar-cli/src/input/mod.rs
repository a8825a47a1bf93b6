pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Read typed input from `--input <file>` or, failing that, piped stdin.
/// Piped text starting with `{` is JSON, anything else YAML.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
    purpose: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        tracing::debug!(path, "Reading {purpose} input file");
        file::read_input(path)
    } else if let Some(text) = stdin::read_stdin()? {
        tracing::debug!(bytes = text.len(), "Reading {purpose} input from stdin");
        if text.starts_with('{') {
            Ok(serde_json::from_str(&text)?)
        } else {
            Ok(serde_yaml::from_str(&text)?)
        }
    } else {
        Err(format!("--input <file.json|file.yaml> or stdin required for {purpose}").into())
    }
}
