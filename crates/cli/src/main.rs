mod commands;
mod config;
mod telemetry;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use saep_domain::Value;
use serde::Deserialize;

use crate::config::Config;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// SAEP rule-based scoring for academic evaluation dossiers.
#[derive(Parser)]
#[command(
    name = "saep",
    version,
    about = "SAEP rule-based scoring for academic evaluation dossiers"
)]
struct Cli {
    /// Output format (text or json); overrides the config file
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a saep.toml config file (default: ./saep.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. "debug" or "saep_eval=trace"; RUST_LOG wins
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a resolution's rules against activity report records
    Eval {
        /// Path to the resolution (rule catalog) JSON file
        catalog: PathBuf,
        /// Path to a JSON array of activity reports
        #[arg(long)]
        records: Option<PathBuf>,
        /// Rule code to evaluate, repeatable; evaluated in the given order.
        /// Default: every rule in catalog order
        #[arg(long = "rule")]
        rules: Vec<String>,
        /// Seed a context variable, e.g. --var cha=64; repeatable
        #[arg(long = "var", value_parser = parse_assignment)]
        vars: Vec<(String, Value)>,
        /// Include the per-rule evaluation trace
        #[arg(long)]
        trace: bool,
    },

    /// Validate a resolution's structure
    Check {
        /// Path to the resolution (rule catalog) JSON file
        catalog: PathBuf,
        /// List the rules that count records of this report kind
        #[arg(long)]
        report_kind: Option<String>,
    },

    /// Apply or remove a score correction on a dossier
    Correct {
        /// Path to the dossier JSON file
        dossier: PathBuf,
        /// Score being corrected, as NAME=VALUE
        #[arg(long, value_parser = parse_assignment)]
        original: (String, Value),
        /// Replacement score, as NAME=VALUE
        #[arg(long, value_parser = parse_assignment)]
        replacement: Option<(String, Value)>,
        /// Reason for the correction
        #[arg(long)]
        justification: Option<String>,
        /// Remove the first correction whose original matches --original
        #[arg(long, conflicts_with_all = ["replacement", "justification"])]
        remove: bool,
        /// Write the updated dossier back to the input file
        #[arg(long)]
        in_place: bool,
    },
}

/// Parse `NAME=VALUE`, reading VALUE as a boolean, number or text.
fn parse_assignment(input: &str) -> Result<(String, Value), String> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", input))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{}'", input));
    }
    Ok((name.to_string(), Value::parse_literal(value)))
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            report_error(
                &e.to_string(),
                cli.output.unwrap_or(OutputFormat::Text),
                cli.quiet,
            );
            process::exit(1);
        }
    };
    let output = cli
        .output
        .or(config.output.format)
        .unwrap_or(OutputFormat::Text);

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    if let Err(e) = telemetry::init(level) {
        report_error(&e.to_string(), output, cli.quiet);
        process::exit(1);
    }

    match cli.command {
        Commands::Eval {
            catalog,
            records,
            rules,
            vars,
            trace,
        } => {
            commands::eval::cmd_eval(commands::eval::EvalOptions {
                catalog: &catalog,
                records: records.as_deref(),
                rules: &rules,
                vars,
                trace,
                max_branch_depth: config.eval.max_branch_depth,
                output,
                quiet: cli.quiet,
            });
        }
        Commands::Check {
            catalog,
            report_kind,
        } => {
            commands::check::cmd_check(&catalog, report_kind.as_deref(), output, cli.quiet);
        }
        Commands::Correct {
            dossier,
            original,
            replacement,
            justification,
            remove,
            in_place,
        } => {
            commands::correct::cmd_correct(commands::correct::CorrectOptions {
                dossier: &dossier,
                original,
                replacement,
                justification,
                remove,
                in_place,
                output,
                quiet: cli.quiet,
            });
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
