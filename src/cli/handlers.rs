//! Subcommand handlers
//!
//! Each handler prints its report to stdout and returns the process exit
//! code. Errors are logged and summarised on stderr.

use anyhow::Result;
use tracing::{debug, error};

use super::commands::{FindArgs, FormatsArgs, ShowArgs};
use super::output::{display_path, FindReport, InstanceReport, OutputFormatter};
use crate::config::DxformatConfig;
use crate::format::{FormatInstance, Registry};
use crate::stream::{self, Encoding};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;

/// `dxformat find`: exits with 1 if any file is unrecognised.
pub fn handle_find(args: &FindArgs, registry: &Registry) -> i32 {
    let reports: Vec<FindReport> = args
        .files
        .iter()
        .map(|path| {
            let encoding = Encoding::detect(path);
            let candidates = if args.all {
                registry.rank(path)
            } else {
                Vec::new()
            };

            match registry.find_scored(path) {
                Ok((plugin, score)) => FindReport {
                    path: display_path(path),
                    encoding,
                    format: Some(plugin.name()),
                    score: Some(score),
                    error: None,
                    candidates,
                },
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Format resolution failed");
                    FindReport {
                        path: display_path(path),
                        encoding,
                        format: None,
                        score: None,
                        error: Some(e.to_string()),
                        candidates,
                    }
                }
            }
        })
        .collect();

    let formatter = OutputFormatter::new(args.format.into());
    if let Err(e) = emit(formatter.format_find(&reports)) {
        error!(error = ?e, "Failed to write find results");
        return EXIT_FAILURE;
    }

    if reports.iter().all(FindReport::is_resolved) {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

/// `dxformat show`: exits with 1 if the file cannot be opened or resolved.
///
/// Models that fail to build are reported but do not fail the command.
pub fn handle_show(args: &ShowArgs, registry: &Registry, config: &DxformatConfig) -> i32 {
    match show(args, registry, config) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!(error = ?e, "Failed to read image");
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

fn show(args: &ShowArgs, registry: &Registry, config: &DxformatConfig) -> Result<()> {
    let path = args.file.as_path();

    // Missing local files fail before scoring
    if !stream::is_url(path) && !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let min_confidence = args.min_confidence.unwrap_or(config.min_confidence);
    let plugin = registry.find_with_threshold(path, min_confidence)?;
    let instance = FormatInstance::open(plugin, path)?;

    let formatter = OutputFormatter::new(args.format.into());
    emit(formatter.format_instance(&InstanceReport::from_instance(&instance)))
}

/// `dxformat formats`
pub fn handle_formats(args: &FormatsArgs, registry: &Registry) -> i32 {
    let formats: Vec<_> = registry.formats().collect();
    let formatter = OutputFormatter::new(args.format.into());

    match emit(formatter.format_formats(&formats)) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!(error = ?e, "Failed to list formats");
            EXIT_FAILURE
        }
    }
}

fn emit(rendered: Result<String>) -> Result<()> {
    let text = rendered?;
    if text.ends_with('\n') {
        print!("{}", text);
    } else {
        println!("{}", text);
    }
    Ok(())
}
