use crate::config::{self, Config};
use crate::engine::{Engine, FileReport};
use crate::io::{self, create_writer, OutputFormat, Totals};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub struct CheckConfig {
    pub paths: Vec<PathBuf>,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub jobs: usize,
    pub exclude: Vec<String>,
}

/// Check every input file under the given paths and write the report.
///
/// Returns the totals so the caller can pick an exit status.
pub fn run_check(check: CheckConfig) -> Result<Totals> {
    let config = resolve_config(check.config.as_deref())?;

    let mut ignore_patterns = config.ignore.patterns.clone();
    ignore_patterns.extend(check.exclude.iter().cloned());
    let files = io::find_input_files(&check.paths, &ignore_patterns)
        .context("Failed to collect input files")?;
    log::debug!("Checking {} file(s)", files.len());

    let engine = Engine::new(&config);
    let reports = analyze_files(&engine, &files, check.jobs)?;
    let totals = Totals::from_reports(&reports);

    let format = check.format.unwrap_or(config.output.format);
    match &check.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            create_writer(format, BufWriter::new(file)).write_reports(&reports)?;
        }
        None => create_writer(format, std::io::stdout()).write_reports(&reports)?,
    }

    Ok(totals)
}

fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(config::load_config()),
    }
}

/// Analyse files on a rayon pool; unreadable files are logged and skipped.
fn analyze_files(engine: &Engine, files: &[PathBuf], jobs: usize) -> Result<Vec<FileReport>> {
    let analyze = || -> Vec<FileReport> {
        files
            .par_iter()
            .filter_map(|path| match io::load_source_file(path) {
                Ok(file) => Some(engine.analyze_with_inline_suppressions(&file)),
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    None
                }
            })
            .collect()
    };

    let mut reports = if jobs == 0 {
        analyze()
    } else {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("Failed to build worker pool")?
            .install(analyze)
    };

    reports.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(reports)
}
