//! Nonce verification check.
//!
//! Flags uses of request superglobals that are not preceded, within their scope,
//! by a call to one of the registered verification functions. Assignment
//! targets are never flagged. A use guarded by `isset()`/`empty()` is either
//! exempt outright or, with `exempt_existence_checks` off, counts as verified by
//! a verification call anywhere in its scope.

use super::nonce_cache::ScanCache;
use super::scope::resolve_scope;
use crate::diagnostics::{Diagnostic, Reporter, SuppressionLookup};
use crate::registry::Registry;
use crate::tokens::{SourceFile, TokenKind};

pub const NONCE_CHECK: &str = "WordPress.CSRF.NonceVerification";
/// Name used in `WPCS: ... ok` comments
pub const NONCE_SUPPRESSION: &str = "CSRF";

const NO_NONCE_VERIFICATION: &str = "NoNonceVerification";
const NO_NONCE_MESSAGE: &str = "Processing form data without nonce verification.";

pub struct NonceVerificationCheck<'r> {
    registry: &'r Registry,
    exempt_existence_checks: bool,
}

impl<'r> NonceVerificationCheck<'r> {
    pub fn new(registry: &'r Registry, exempt_existence_checks: bool) -> Self {
        Self {
            registry,
            exempt_existence_checks,
        }
    }

    /// Inspect the token at `ptr`, reporting it if it is an unverified use.
    pub fn process(
        &self,
        file: &SourceFile,
        ptr: usize,
        cache: &mut ScanCache,
        suppressions: &dyn SuppressionLookup,
        reporter: &mut dyn Reporter,
    ) {
        let Some(token) = file.get(ptr) else {
            return;
        };
        if token.kind != TokenKind::Variable {
            return;
        }
        let Some(severity) = self.registry.nonce_severity(&token.content) else {
            return;
        };
        if suppressions.is_suppressed(NONCE_SUPPRESSION, ptr) || is_assignment(file, ptr) {
            return;
        }
        if self.exempt_existence_checks && is_in_isset_or_empty(file, ptr) {
            return;
        }
        if self.has_verification(file, ptr, cache) {
            return;
        }

        reporter.report(Diagnostic {
            check: NONCE_CHECK.to_string(),
            position: ptr,
            line: token.line,
            severity,
            code: NO_NONCE_VERIFICATION.to_string(),
            message_template: NO_NONCE_MESSAGE.to_string(),
            message_args: Vec::new(),
        });
    }

    /// Whether a verification call covers the token at `ptr`.
    ///
    /// The search runs from the start of the enclosing scope up to `ptr`, or to
    /// the end of the scope when `ptr` sits inside `isset()`/`empty()`.
    pub fn has_verification(&self, file: &SourceFile, ptr: usize, cache: &mut ScanCache) -> bool {
        let scope = resolve_scope(file, ptr);
        let end = if is_in_isset_or_empty(file, ptr) {
            scope.end
        } else {
            ptr
        };
        cache.verified_before(file, &scope, end, |name| {
            self.registry.is_verification_function(name)
        })
    }
}

/// Whether the token at `ptr` is written to: `$x = ...`, `$x .= ...`, or any
/// depth of subscripts such as `$x['a'][]['b'] = ...`.
pub fn is_assignment(file: &SourceFile, ptr: usize) -> bool {
    let mut cursor = ptr;
    loop {
        let Some(next) = file.next_non_empty(cursor + 1, None) else {
            return false;
        };
        match file.kind(next) {
            Some(TokenKind::Assignment) => return true,
            Some(TokenKind::OpenBracket) => match file.closer_of(next) {
                Some(closer) => cursor = closer,
                None => return false,
            },
            _ => return false,
        }
    }
}

/// Whether the innermost parenthesis around `ptr` belongs to `isset` or `empty`.
pub fn is_in_isset_or_empty(file: &SourceFile, ptr: usize) -> bool {
    let Some(paren) = file.innermost_paren(ptr) else {
        return false;
    };
    paren
        .opener
        .checked_sub(1)
        .and_then(|p| file.prev_non_empty(p))
        .and_then(|p| file.kind(p))
        .is_some_and(|kind| matches!(kind, TokenKind::Isset | TokenKind::Empty))
}
