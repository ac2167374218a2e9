//! Diagnostic records and the reporter seam.
//!
//! Checks hand [`Diagnostic`]s to a [`Reporter`]. A diagnostic keeps its message
//! as a `%s` template plus arguments; [`Diagnostic::message`] performs the
//! substitution and nothing more.

pub mod suppression;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use suppression::{InlineSuppressions, NoSuppressions, SuppressionLookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Check that produced the diagnostic, e.g. `WordPress.CSRF.NonceVerification`
    pub check: String,
    /// Token index the diagnostic points at
    pub position: usize,
    pub line: usize,
    pub severity: Severity,
    pub code: String,
    pub message_template: String,
    pub message_args: Vec<String>,
}

impl Diagnostic {
    /// Substitute `message_args` into the `%s` slots of the template, in order.
    /// Missing arguments leave the slot empty; surplus arguments are dropped.
    pub fn message(&self) -> String {
        let mut out = String::with_capacity(self.message_template.len());
        let mut args = self.message_args.iter();
        let mut rest = self.message_template.as_str();
        while let Some(at) = rest.find("%s") {
            out.push_str(&rest[..at]);
            if let Some(arg) = args.next() {
                out.push_str(arg);
            }
            rest = &rest[at + 2..];
        }
        out.push_str(rest);
        out
    }

    /// `check.code`, the identifier users reference in configuration.
    pub fn full_code(&self) -> String {
        format!("{}.{}", self.check, self.code)
    }
}

/// Receives diagnostics as checks produce them.
pub trait Reporter {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl Reporter for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(template: &str, args: &[&str]) -> Diagnostic {
        Diagnostic {
            check: "WordPress.WP.ExpectedSlashed".to_string(),
            position: 4,
            line: 1,
            severity: Severity::Error,
            code: "MissingSlashing".to_string(),
            message_template: template.to_string(),
            message_args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_message_substitutes_in_order() {
        let d = diagnostic(
            "%s() expects the value of the $%s arg to be slashed with wp_slash(); %s found.",
            &["update_post_meta", "meta_value", "$val"],
        );
        assert_eq!(
            d.message(),
            "update_post_meta() expects the value of the $meta_value arg to be slashed with wp_slash(); $val found."
        );
    }

    #[test]
    fn test_message_tolerates_argument_count_mismatch() {
        assert_eq!(diagnostic("%s and %s", &["a"]).message(), "a and ");
        assert_eq!(diagnostic("plain", &["a"]).message(), "plain");
    }

    #[test]
    fn test_full_code_and_severity_order() {
        let d = diagnostic("x", &[]);
        assert_eq!(d.full_code(), "WordPress.WP.ExpectedSlashed.MissingSlashing");
        assert!(Severity::Error > Severity::Warning);
    }

    #[test]
    fn test_vec_reporter_collects() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.report(diagnostic("x", &[]));
        assert_eq!(sink.len(), 1);
    }
}
