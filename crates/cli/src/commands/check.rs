use std::path::Path;
use std::process;

use saep_eval::Resolution;

use super::{read_json, to_pretty_json};
use crate::OutputFormat;

pub(crate) fn cmd_check(
    catalog: &Path,
    report_kind: Option<&str>,
    output: OutputFormat,
    quiet: bool,
) {
    let resolution: Resolution = read_json(catalog, "catalog", output, quiet);

    let findings: Vec<String> = match resolution.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    };
    let using: Option<Vec<&str>> = report_kind.map(|kind| {
        resolution
            .rules_using_report_kind(kind)
            .into_iter()
            .map(|r| r.code.as_str())
            .collect()
    });

    if !quiet {
        match output {
            OutputFormat::Json => {
                let mut result = serde_json::json!({
                    "resolution": resolution.id(),
                    "rules": resolution.rules().len(),
                    "valid": findings.is_empty(),
                    "errors": findings,
                });
                if let (Some(kind), Some(codes)) = (report_kind, &using) {
                    result["report_kind"] = serde_json::json!({ "kind": kind, "rules": codes });
                }
                println!("{}", to_pretty_json(&result));
            }
            OutputFormat::Text => {
                if findings.is_empty() {
                    println!(
                        "Resolution {} is valid ({} rules)",
                        resolution.id(),
                        resolution.rules().len()
                    );
                } else {
                    println!("{} problem(s) in resolution {}:", findings.len(), resolution.id());
                    for f in &findings {
                        println!("  {}", f);
                    }
                }
                if let (Some(kind), Some(codes)) = (report_kind, &using) {
                    if codes.is_empty() {
                        println!("No rules count report kind '{}'", kind);
                    } else {
                        println!("Rules counting report kind '{}': {}", kind, codes.join(", "));
                    }
                }
            }
        }
    }

    if !findings.is_empty() {
        process::exit(1);
    }
}
