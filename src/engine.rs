//! Per-file driver.
//!
//! Offers every token of a file to the nonce check and the slashing check, the
//! way a sniffing host would. The registry is assembled once in [`Engine::new`];
//! each call to [`Engine::analyze_file`] owns a fresh scan cache, so files can be
//! analysed on any number of threads.

use crate::analysis::{CacheStats, ExpectedSlashedCheck, NonceVerificationCheck, ScanCache};
use crate::config::Config;
use crate::diagnostics::{Diagnostic, InlineSuppressions, Severity, SuppressionLookup};
use crate::registry::Registry;
use crate::tokens::SourceFile;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub file: String,
    /// Sorted by token position
    pub diagnostics: Vec<Diagnostic>,
    pub cache: CacheStats,
}

impl FileReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    registry: Registry,
    exempt_existence_checks: bool,
    cache_capacity: usize,
}

impl Engine {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: Registry::build(config),
            exempt_existence_checks: config.nonce.exempt_existence_checks,
            cache_capacity: config.nonce.cache_capacity,
        }
    }

    /// Run both checks over one file.
    pub fn analyze_file(&self, file: &SourceFile, suppressions: &dyn SuppressionLookup) -> FileReport {
        let _span = debug_span!("analyze_file", file = file.id()).entered();

        let mut cache = ScanCache::new(self.cache_capacity);
        let diagnostics = self.analyze_with_cache(file, suppressions, &mut cache);
        let report = FileReport {
            file: file.id().to_string(),
            diagnostics,
            cache: cache.stats(),
        };

        debug!(
            tokens = file.len(),
            errors = report.count(Severity::Error),
            warnings = report.count(Severity::Warning),
            cache = %report.cache,
            "file analysed"
        );
        report
    }

    /// Analyse a file with its own `WPCS: ... ok` comments as suppressions.
    pub fn analyze_with_inline_suppressions(&self, file: &SourceFile) -> FileReport {
        let suppressions = InlineSuppressions::from_file(file);
        self.analyze_file(file, &suppressions)
    }

    /// Run both checks, reusing a caller-owned scan cache.
    pub fn analyze_with_cache(
        &self,
        file: &SourceFile,
        suppressions: &dyn SuppressionLookup,
        cache: &mut ScanCache,
    ) -> Vec<Diagnostic> {
        let nonce = NonceVerificationCheck::new(&self.registry, self.exempt_existence_checks);
        let slashing = ExpectedSlashedCheck::new(&self.registry);

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        for ptr in 0..file.len() {
            nonce.process(file, ptr, cache, suppressions, &mut diagnostics);
            slashing.process(file, ptr, suppressions, &mut diagnostics);
        }
        diagnostics.sort_by_key(|d| d.position);
        diagnostics
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NoSuppressions;

    #[test]
    fn test_both_checks_run_and_sort_by_position() {
        let file = SourceFile::from_source(
            "t.php",
            "<?php update_post_meta( $id, 'k', $_POST['v'] ); $x = $_GET['y'];",
        )
        .unwrap();
        let report = Engine::default().analyze_file(&file, &NoSuppressions);
        let codes: Vec<&str> = report.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(
            codes,
            vec!["MissingSlashing", "NoNonceVerification", "NoNonceVerification"]
        );
        assert_eq!(report.diagnostics[0].position, report.diagnostics[1].position);
        assert_eq!(report.count(Severity::Error), 2);
        assert_eq!(report.count(Severity::Warning), 1);
        assert!(report.has_errors());
    }

    #[test]
    fn test_inline_comments_suppress_each_check_by_name() {
        let file = SourceFile::from_source(
            "t.php",
            "<?php update_post_meta( $id, 'k', $_POST['v'] ); // WPCS: CSRF ok.",
        )
        .unwrap();
        let report = Engine::default().analyze_with_inline_suppressions(&file);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].code, "MissingSlashing");
    }

    #[test]
    fn test_cache_stats_are_reported() {
        let file = SourceFile::from_source("t.php", "<?php $_POST; $_POST; $_POST;").unwrap();
        let report = Engine::default().analyze_file(&file, &NoSuppressions);
        assert_eq!(report.diagnostics.len(), 3);
        assert_eq!(report.cache.misses, 3);
        let last = file
            .tokens()
            .iter()
            .rposition(|t| t.content == "$_POST")
            .unwrap();
        assert_eq!(report.cache.tokens_scanned, last);
    }
}
