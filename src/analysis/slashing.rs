//! Slashing contract check.
//!
//! For every call to a function with a registered contract, each declared
//! argument is classified and every violation becomes a diagnostic. Arguments
//! the call does not supply are skipped.

use super::call_site::{match_call, ArgumentSpan, CallSite};
use super::classifier::{ArgumentClassifier, Disposition, KeyRules, Reason, Verdict};
use super::scope::resolve_scope;
use crate::diagnostics::{Diagnostic, Reporter, Severity, SuppressionLookup};
use crate::registry::{CallContract, MixedKeys, Registry, SlashedArg};
use crate::tokens::{SourceFile, TokenKind};
use std::collections::BTreeSet;

pub const SLASHING_CHECK: &str = "WordPress.WP.ExpectedSlashed";
/// Name used in `WPCS: ... ok` comments
pub const SLASHING_SUPPRESSION: &str = "slashing";

const MISSING_SLASHING: (&str, &str) = (
    "MissingSlashing",
    "%s() expects the value of the $%s arg to be slashed with wp_slash(); %s found.",
);
const EXPECTED_PARTLY_SLASHED: (&str, &str) = (
    "ExpectedPartlySlashed",
    "%s() expects the value of %s to be slashed with wp_slash().",
);
const EXPECTED_MIXED: (&str, &str) = (
    "ExpectedMixed",
    "%s() expects the value of %s to be slashed with wp_slash(), and %s to be unslashed.",
);
const EXPECTED_KEY_SLASHED: (&str, &str) = (
    "ExpectedKeySlashed",
    "%s() expects the value of %s to be slashed with wp_slash().",
);
const EXPECTED_KEY_UNSLASHED: (&str, &str) = (
    "ExpectedKeyUnslashed",
    "%s() expects the value of %s to be unslashed.",
);

pub struct ExpectedSlashedCheck<'r> {
    registry: &'r Registry,
}

/// Per-call state while dispatching contracts.
struct CallContext<'a> {
    file: &'a SourceFile,
    call: &'a CallSite,
    classifier: ArgumentClassifier<'a>,
    /// Errors raised here are reported as warnings
    downgrade: bool,
}

impl<'r> ExpectedSlashedCheck<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Inspect the token at `ptr`; a no-op unless it starts a registered call.
    pub fn process(
        &self,
        file: &SourceFile,
        ptr: usize,
        suppressions: &dyn SuppressionLookup,
        reporter: &mut dyn Reporter,
    ) {
        match file.kind(ptr) {
            Some(TokenKind::Name | TokenKind::Variable) => {}
            _ => return,
        }
        let Some(call) = match_call(file, ptr, self.registry) else {
            return;
        };
        if suppressions.is_suppressed(SLASHING_SUPPRESSION, ptr) {
            return;
        }
        self.check_call(file, &call, reporter);
    }

    /// Dispatch every contract registered for a matched call.
    pub fn check_call(&self, file: &SourceFile, call: &CallSite, reporter: &mut dyn Reporter) {
        let ctx = CallContext {
            file,
            call,
            classifier: ArgumentClassifier::new(file, self.registry),
            downgrade: self.inside_registered_definition(file, call.name_ptr),
        };

        for contract in self.registry.contracts_for(&call.name) {
            match contract {
                CallContract::FullySlashed(args) => {
                    if !self.selector_skips(file, call) {
                        self.check_fully_slashed(&ctx, args, reporter);
                    }
                }
                CallContract::PartlySlashed(args) => {
                    for (index, slashed) in args {
                        let Some(span) = call.argument(*index) else {
                            continue;
                        };
                        self.check_partly_slashed(&ctx, span, slashed, reporter);
                    }
                }
                CallContract::Mixed(args) => {
                    for (index, keys) in args {
                        let Some(span) = call.argument(*index) else {
                            continue;
                        };
                        self.check_mixed(&ctx, span, keys, reporter);
                    }
                }
            }
        }
    }

    fn check_fully_slashed(&self, ctx: &CallContext<'_>, args: &[SlashedArg], reporter: &mut dyn Reporter) {
        for arg in args {
            let Some(span) = ctx.call.argument(arg.index) else {
                continue;
            };
            let verdict =
                ctx.classifier
                    .classify(span.start, span.end, Disposition::Slashed, KeyRules::none());
            for violation in verdict.violations() {
                ctx.report(
                    reporter,
                    violation.token,
                    Severity::Error,
                    MISSING_SLASHING,
                    vec![
                        ctx.call.name.clone(),
                        arg.name.clone(),
                        violation.found.clone(),
                    ],
                );
            }
        }
    }

    fn check_partly_slashed(
        &self,
        ctx: &CallContext<'_>,
        span: &ArgumentSpan,
        slashed: &BTreeSet<String>,
        reporter: &mut dyn Reporter,
    ) {
        let Some(first) = span.first_significant(ctx.file) else {
            return;
        };
        if ctx.file.kind(first) == Some(TokenKind::Array) {
            let verdict = ctx.classifier.classify(
                span.start,
                span.end,
                Disposition::NoOpinion,
                KeyRules::slashed(slashed),
            );
            self.report_key_violations(ctx, &verdict, reporter);
            return;
        }

        // The array is built elsewhere; only a slashing call on the whole value helps.
        if self.registry.is_slashing_function(ctx.file.content(first)) {
            return;
        }
        ctx.report(
            reporter,
            first,
            Severity::Error,
            EXPECTED_PARTLY_SLASHED,
            vec![ctx.call.name.clone(), join_keys(slashed)],
        );
    }

    fn check_mixed(
        &self,
        ctx: &CallContext<'_>,
        span: &ArgumentSpan,
        keys: &MixedKeys,
        reporter: &mut dyn Reporter,
    ) {
        let Some(first) = span.first_significant(ctx.file) else {
            return;
        };
        if ctx.file.kind(first) == Some(TokenKind::Array) {
            let rules = KeyRules {
                slashed: &keys.slashed,
                unslashed: &keys.unslashed,
            };
            let verdict = ctx
                .classifier
                .classify(span.start, span.end, Disposition::NoOpinion, rules);
            self.report_key_violations(ctx, &verdict, reporter);
            return;
        }

        ctx.report(
            reporter,
            first,
            Severity::Warning,
            EXPECTED_MIXED,
            vec![
                ctx.call.name.clone(),
                join_keys(&keys.slashed),
                join_keys(&keys.unslashed),
            ],
        );
    }

    fn report_key_violations(&self, ctx: &CallContext<'_>, verdict: &Verdict, reporter: &mut dyn Reporter) {
        for violation in verdict.violations() {
            let Some(key) = &violation.key else {
                continue;
            };
            let code = if violation.reason == Reason::UnexpectedSlashing {
                EXPECTED_KEY_UNSLASHED
            } else {
                EXPECTED_KEY_SLASHED
            };
            ctx.report(
                reporter,
                violation.token,
                Severity::Error,
                code,
                vec![ctx.call.name.clone(), key.clone()],
            );
        }
    }

    /// A literal selector argument other than the sentinel means the call shape
    /// never needs slashing. Dynamic selectors are checked as if they matched.
    fn selector_skips(&self, file: &SourceFile, call: &CallSite) -> bool {
        let Some(rule) = self.registry.selector_for(&call.name) else {
            return false;
        };
        let Some(selector) = call
            .argument(rule.argument)
            .and_then(|span| span.first_significant(file))
        else {
            return false;
        };
        let Some(token) = file.get(selector) else {
            return false;
        };
        token.kind == TokenKind::ConstantString
            && token.content.trim_matches(|c| c == '\'' || c == '"') != rule.sentinel
    }

    /// Whether `ptr` sits in the body of a function that itself has a contract.
    fn inside_registered_definition(&self, file: &SourceFile, ptr: usize) -> bool {
        let Some(owner) = resolve_scope(file, ptr).owner else {
            return false;
        };
        file.next_non_empty(owner + 1, None)
            .filter(|&name| file.kind(name) == Some(TokenKind::Name))
            .is_some_and(|name| self.registry.has_contract(file.content(name)))
    }
}

impl CallContext<'_> {
    fn report(
        &self,
        reporter: &mut dyn Reporter,
        position: usize,
        severity: Severity,
        (code, template): (&str, &str),
        message_args: Vec<String>,
    ) {
        let severity = if self.downgrade {
            Severity::Warning
        } else {
            severity
        };
        reporter.report(Diagnostic {
            check: SLASHING_CHECK.to_string(),
            position,
            line: self.file.get(position).map_or(0, |t| t.line),
            severity,
            code: code.to_string(),
            message_template: template.to_string(),
            message_args,
        });
    }
}

fn join_keys(keys: &BTreeSet<String>) -> String {
    keys.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
