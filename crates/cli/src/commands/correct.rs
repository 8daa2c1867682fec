use std::path::Path;
use std::process;

use saep_domain::{DomainError, Dossier, Note, Score, Value};

use super::{read_json, to_pretty_json};
use crate::{report_error, OutputFormat};

pub(crate) struct CorrectOptions<'a> {
    pub dossier: &'a Path,
    pub original: (String, Value),
    pub replacement: Option<(String, Value)>,
    pub justification: Option<String>,
    pub remove: bool,
    pub in_place: bool,
    pub output: OutputFormat,
    pub quiet: bool,
}

/// Applies or removes one correction. The updated dossier goes to stdout,
/// or back to the input file with `--in-place`.
pub(crate) fn cmd_correct(opts: CorrectOptions<'_>) {
    let output = opts.output;
    let quiet = opts.quiet;
    let fail = |e: DomainError| -> ! {
        report_error(&format!("error: {}", e), output, quiet);
        process::exit(1);
    };

    let mut dossier: Dossier = read_json(opts.dossier, "dossier", output, quiet);
    let (name, value) = opts.original;
    let original = Score::new(name, value).unwrap_or_else(|e| fail(e));

    let summary = if opts.remove {
        match dossier.remove_correction(&original) {
            Some(note) => format!(
                "Removed correction of {} ({} -> {})",
                original.name(),
                note.original().value(),
                note.replacement().value()
            ),
            None => format!("No correction of {} matched", original.name()),
        }
    } else {
        let replacement = opts
            .replacement
            .map(|(n, v)| Score::new(n, v).unwrap_or_else(|e| fail(e)));
        let note = Note::new(original, replacement, opts.justification.unwrap_or_default())
            .unwrap_or_else(|e| fail(e));
        let summary = format!(
            "Corrected {}: {} -> {}",
            note.original().name(),
            note.original().value(),
            note.replacement().value()
        );
        dossier.apply_correction(note);
        summary
    };

    let json = to_pretty_json(&dossier);
    if !opts.in_place {
        println!("{}", json);
        return;
    }

    if let Err(e) = std::fs::write(opts.dossier, format!("{}\n", json)) {
        let msg = format!("error writing '{}': {}", opts.dossier.display(), e);
        report_error(&msg, output, quiet);
        process::exit(1);
    }
    if !quiet {
        match output {
            OutputFormat::Json => println!("{}", json),
            OutputFormat::Text => {
                println!("{}", summary);
                println!(
                    "Dossier {}: {} score(s), {} correction(s)",
                    dossier.id(),
                    dossier.scores().len(),
                    dossier.notes().len()
                );
            }
        }
    }
}
