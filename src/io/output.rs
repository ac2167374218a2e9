use crate::diagnostics::Severity;
use crate::engine::FileReport;
use crate::analysis::CacheStats;
use colored::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

pub trait OutputWriter {
    fn write_reports(&mut self, reports: &[FileReport]) -> anyhow::Result<()>;
}

/// Totals across every analysed file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
    pub cache: CacheStats,
}

impl Totals {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        reports.iter().fold(Totals::default(), |mut acc, report| {
            acc.files += 1;
            acc.errors += report.count(Severity::Error);
            acc.warnings += report.count(Severity::Warning);
            acc.cache.merge(&report.cache);
            acc
        })
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    files: &'a [FileReport],
    totals: Totals,
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_reports(&mut self, reports: &[FileReport]) -> anyhow::Result<()> {
        let report = JsonReport {
            files: reports,
            totals: Totals::from_reports(reports),
        };
        let json = serde_json::to_string_pretty(&report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_file(&mut self, report: &FileReport) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", report.file.bold().underline())?;
        for diagnostic in &report.diagnostics {
            let severity = match diagnostic.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
            };
            writeln!(
                self.writer,
                "  {:>5}  {:<7}  {} {}",
                diagnostic.line,
                severity,
                diagnostic.message(),
                format!("({})", diagnostic.full_code()).dimmed()
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_summary(&mut self, totals: &Totals) -> anyhow::Result<()> {
        if totals.errors == 0 && totals.warnings == 0 {
            writeln!(
                self.writer,
                "{} No issues found in {} file(s)",
                "✓".green(),
                totals.files
            )?;
            return Ok(());
        }

        let errors = format!("{} error(s)", totals.errors);
        let warnings = format!("{} warning(s)", totals.warnings);
        writeln!(
            self.writer,
            "{} Found {} and {} in {} file(s)",
            if totals.errors > 0 { "✗".red() } else { "!".yellow() },
            if totals.errors > 0 { errors.red() } else { errors.normal() },
            warnings.yellow(),
            totals.files
        )?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_reports(&mut self, reports: &[FileReport]) -> anyhow::Result<()> {
        for report in reports.iter().filter(|r| !r.diagnostics.is_empty()) {
            self.write_file(report)?;
        }
        self.write_summary(&Totals::from_reports(reports))
    }
}

pub fn create_writer<W: Write + 'static>(format: OutputFormat, writer: W) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;

    fn report(file: &str, severities: &[Severity]) -> FileReport {
        FileReport {
            file: file.to_string(),
            diagnostics: severities
                .iter()
                .enumerate()
                .map(|(i, &severity)| Diagnostic {
                    check: "WordPress.CSRF.NonceVerification".to_string(),
                    position: i,
                    line: i + 1,
                    severity,
                    code: "NoNonceVerification".to_string(),
                    message_template: "Processing form data without nonce verification.".to_string(),
                    message_args: Vec::new(),
                })
                .collect(),
            cache: CacheStats {
                hits: 1,
                misses: 2,
                tokens_scanned: 10,
            },
        }
    }

    #[test]
    fn test_totals_sum_across_files() {
        let reports = vec![
            report("a.php", &[Severity::Error, Severity::Warning]),
            report("b.php", &[Severity::Warning]),
        ];
        let totals = Totals::from_reports(&reports);
        assert_eq!(totals.files, 2);
        assert_eq!(totals.errors, 1);
        assert_eq!(totals.warnings, 2);
        assert_eq!(totals.cache.tokens_scanned, 20);
    }

    #[test]
    fn test_json_writer_output_parses() {
        let reports = vec![report("a.php", &[Severity::Error])];
        let mut buffer = Vec::new();
        JsonWriter::new(&mut buffer).write_reports(&reports).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["totals"]["errors"], 1);
        assert_eq!(value["files"][0]["file"], "a.php");
        assert_eq!(value["files"][0]["diagnostics"][0]["severity"], "error");
    }

    #[test]
    fn test_terminal_writer_lists_only_files_with_findings() {
        let reports = vec![report("a.php", &[Severity::Error]), report("clean.php", &[])];
        let mut buffer = Vec::new();
        TerminalWriter::new(&mut buffer).write_reports(&reports).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("a.php"));
        assert!(!text.contains("clean.php"));
        assert!(text.contains("Processing form data without nonce verification."));
        assert!(text.contains("WordPress.CSRF.NonceVerification.NoNonceVerification"));
        assert!(text.contains("in 2 file(s)"));
    }

    #[test]
    fn test_terminal_writer_reports_clean_run() {
        let mut buffer = Vec::new();
        TerminalWriter::new(&mut buffer)
            .write_reports(&[report("clean.php", &[])])
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("No issues found in 1 file(s)"));
    }
}
