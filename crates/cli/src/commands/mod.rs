pub(crate) mod check;
pub(crate) mod correct;
pub(crate) mod eval;

use std::path::Path;
use std::process;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{report_error, OutputFormat};

/// Read and deserialize a JSON file, exiting with a reported error on
/// failure. `what` names the file in messages ("catalog", "records", ...).
pub(crate) fn read_json<T: DeserializeOwned>(
    path: &Path,
    what: &str,
    output: OutputFormat,
    quiet: bool,
) -> T {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => {
            let msg = format!("error: {} file not found: {}", what, path.display());
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error: invalid {} in {}: {}", what, path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("serialization error: {}", e))
}
