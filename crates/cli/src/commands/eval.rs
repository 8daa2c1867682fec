use std::path::Path;
use std::process;

use saep_domain::{ActivityReport, Record, Value};
use saep_eval::{Context, Engine, EngineOptions, Resolution, ScoringSession};

use super::{read_json, to_pretty_json};
use crate::{report_error, OutputFormat};

pub(crate) struct EvalOptions<'a> {
    pub catalog: &'a Path,
    pub records: Option<&'a Path>,
    pub rules: &'a [String],
    pub vars: Vec<(String, Value)>,
    pub trace: bool,
    pub max_branch_depth: usize,
    pub output: OutputFormat,
    pub quiet: bool,
}

pub(crate) fn cmd_eval(opts: EvalOptions<'_>) {
    let output = opts.output;
    let quiet = opts.quiet;

    let resolution: Resolution = read_json(opts.catalog, "catalog", output, quiet);
    if let Err(errors) = resolution.validate() {
        for e in &errors {
            report_error(&format!("error: {}", e), output, quiet);
        }
        process::exit(1);
    }

    // Records from every supplied report are scored together.
    let records: Option<Vec<Record>> = opts.records.map(|path| {
        let reports: Vec<ActivityReport> = read_json(path, "records", output, quiet);
        reports.into_iter().flat_map(|r| r.records).collect()
    });

    let codes: Vec<&str> = if opts.rules.is_empty() {
        resolution.rules().iter().map(|r| r.code.as_str()).collect()
    } else {
        opts.rules.iter().map(String::as_str).collect()
    };

    let engine = Engine::new().with_options(EngineOptions {
        max_branch_depth: opts.max_branch_depth,
    });
    let mut session = ScoringSession::with_engine(&resolution, engine)
        .with_context(Context::with_variables(opts.vars));

    if let Err(e) = session.evaluate_sequence(codes, records.as_deref()) {
        report_error(&format!("error: {}", e), output, quiet);
        process::exit(1);
    }

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let mut result = serde_json::json!({
                "resolution": resolution.id(),
                "scores": session.scores(),
            });
            if opts.trace {
                result["trace"] = serde_json::json!(session.trace());
            }
            println!("{}", to_pretty_json(&result));
        }
        OutputFormat::Text => {
            println!("Resolution: {} ({})", resolution.id(), resolution.name());
            println!("{} score(s):", session.scores().len());
            for s in session.scores() {
                println!("  {} = {}", s.name(), s.value());
            }
            if opts.trace {
                println!("Trace:");
                for t in session.trace() {
                    let branch = t
                        .branch
                        .as_deref()
                        .map(|b| format!(" via {}", b))
                        .unwrap_or_default();
                    println!(
                        "  [{}] {}{} -> {} = {}",
                        t.rule, t.kind, branch, t.variable, t.result
                    );
                }
            }
        }
    }
}
