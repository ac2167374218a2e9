//! Memoized verification-call scans.
//!
//! Each entry remembers, for one `(file, scope start)` pair, how far the scope
//! has been searched and where the first verification call sits. Repeated
//! queries against the same scope either answer from the entry or resume the
//! scan where the previous one stopped, so every token of a scope is examined at
//! most once no matter how many superglobal uses it contains.
//!
//! Entries are kept in least-recently-used order; a capacity of one behaves like
//! a single-slot cache.

use super::scope::Scope;
use crate::tokens::{SourceFile, TokenKind};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// What is known about one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeScanState {
    pub file_id: String,
    pub scope_start: usize,
    pub scope_end: usize,
    /// Tokens in `scope_start..scanned_end` have been examined
    pub scanned_end: usize,
    /// First verification call in the scope, once found
    pub verified_at: Option<usize>,
}

impl ScopeScanState {
    fn new(file_id: &str, scope: &Scope) -> Self {
        Self {
            file_id: file_id.to_string(),
            scope_start: scope.start,
            scope_end: scope.end,
            scanned_end: scope.start,
            verified_at: None,
        }
    }

    fn is_for(&self, file_id: &str, scope: &Scope) -> bool {
        self.scope_start == scope.start && self.file_id == file_id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Queries answered without examining any token
    pub hits: usize,
    /// Queries that had to scan, from scratch or resuming
    pub misses: usize,
    pub tokens_scanned: usize,
}

impl CacheStats {
    pub fn merge(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.tokens_scanned += other.tokens_scanned;
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hits, {} misses, {} tokens scanned",
            self.hits, self.misses, self.tokens_scanned
        )
    }
}

#[derive(Debug, Clone)]
pub struct ScanCache {
    capacity: usize,
    /// Most recently used first
    entries: VecDeque<ScopeScanState>,
    stats: CacheStats,
}

impl ScanCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current state for a scope, if it is cached.
    pub fn peek(&self, file_id: &str, scope: &Scope) -> Option<&ScopeScanState> {
        self.entries.iter().find(|e| e.is_for(file_id, scope))
    }

    /// Whether a verification call occurs in `scope.start..end`.
    ///
    /// `is_verifier` is consulted for bare name tokens only.
    pub fn verified_before<F>(
        &mut self,
        file: &SourceFile,
        scope: &Scope,
        end: usize,
        is_verifier: F,
    ) -> bool
    where
        F: Fn(&str) -> bool,
    {
        let end = end.min(file.len());
        let mut state = self.take_or_create(file.id(), scope);

        let answer = if let Some(found) = state.verified_at {
            self.stats.hits += 1;
            found < end
        } else if end <= state.scanned_end {
            self.stats.hits += 1;
            false
        } else {
            self.stats.misses += 1;
            let from = state.scanned_end;
            let found = (from..end).find(|&i| {
                file.get(i)
                    .is_some_and(|t| t.kind == TokenKind::Name && is_verifier(&t.content))
            });
            let scanned_to = found.map_or(end, |i| i + 1);
            self.stats.tokens_scanned += scanned_to - from;
            state.scanned_end = scanned_to;
            state.verified_at = found;
            found.is_some()
        };

        self.entries.push_front(state);
        answer
    }

    fn take_or_create(&mut self, file_id: &str, scope: &Scope) -> ScopeScanState {
        match self.entries.iter().position(|e| e.is_for(file_id, scope)) {
            Some(at) => self
                .entries
                .remove(at)
                .unwrap_or_else(|| ScopeScanState::new(file_id, scope)),
            None => {
                if self.entries.len() >= self.capacity {
                    self.entries.pop_back();
                }
                ScopeScanState::new(file_id, scope)
            }
        }
    }
}

impl Default for ScanCache {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scope::resolve_scope;
    use indoc::indoc;

    fn is_verifier(name: &str) -> bool {
        name == "check_admin_referer"
    }

    fn positions(file: &SourceFile, content: &str) -> Vec<usize> {
        file.tokens()
            .iter()
            .filter(|t| t.content == content)
            .map(|t| t.index)
            .collect()
    }

    #[test]
    fn test_found_verification_answers_by_position() {
        let file = SourceFile::from_source(
            "t.php",
            "<?php $_POST['a']; check_admin_referer( 'x' ); $_POST['b'];",
        )
        .unwrap();
        let posts = positions(&file, "$_POST");
        let scope = Scope::file(&file);
        let mut cache = ScanCache::new(4);

        assert!(!cache.verified_before(&file, &scope, posts[0], is_verifier));
        assert!(cache.verified_before(&file, &scope, posts[1], is_verifier));
        // Already found; the earlier position still precedes it.
        assert!(!cache.verified_before(&file, &scope, posts[0], is_verifier));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_repeat_queries_never_rescan() {
        let file = SourceFile::from_source("t.php", "<?php $a; $b; $c; $d; $e;").unwrap();
        let scope = Scope::file(&file);
        let mut cache = ScanCache::new(1);

        assert!(!cache.verified_before(&file, &scope, 12, is_verifier));
        assert!(!cache.verified_before(&file, &scope, 6, is_verifier));
        assert!(!cache.verified_before(&file, &scope, 12, is_verifier));
        assert_eq!(cache.stats().tokens_scanned, 12);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 2);

        // Extending the range resumes where the last scan stopped.
        assert!(!cache.verified_before(&file, &scope, file.len(), is_verifier));
        assert_eq!(cache.stats().tokens_scanned, file.len());
        assert_eq!(cache.peek("t.php", &scope).unwrap().scanned_end, file.len());
    }

    #[test]
    fn test_scopes_are_cached_independently() {
        let file = SourceFile::from_source(
            "t.php",
            indoc! {"
                <?php
                function a() { check_admin_referer( 'x' ); $_POST; }
                function b() { $_POST; }
            "},
        )
        .unwrap();
        let posts = positions(&file, "$_POST");
        let scope_a = resolve_scope(&file, posts[0]);
        let scope_b = resolve_scope(&file, posts[1]);
        let mut cache = ScanCache::new(2);

        assert!(cache.verified_before(&file, &scope_a, posts[0], is_verifier));
        assert!(!cache.verified_before(&file, &scope_b, posts[1], is_verifier));
        assert!(cache.verified_before(&file, &scope_a, posts[0], is_verifier));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_least_recently_used_scope_is_evicted() {
        let file = SourceFile::from_source(
            "t.php",
            "<?php function a() { $x; } function b() { $y; } function c() { $z; }",
        )
        .unwrap();
        let scopes: Vec<Scope> = ["$x", "$y", "$z"]
            .iter()
            .map(|v| resolve_scope(&file, positions(&file, v)[0]))
            .collect();
        let mut cache = ScanCache::new(2);

        for scope in &scopes {
            cache.verified_before(&file, scope, scope.end, is_verifier);
        }
        assert!(cache.peek("t.php", &scopes[0]).is_none());
        assert!(cache.peek("t.php", &scopes[1]).is_some());
        assert!(cache.peek("t.php", &scopes[2]).is_some());
    }

    #[test]
    fn test_same_start_in_another_file_is_a_different_entry() {
        let first =
            SourceFile::from_source("a.php", "<?php check_admin_referer(); $_POST;").unwrap();
        let second = SourceFile::from_source("b.php", "<?php $_GET; $_POST;").unwrap();
        let mut cache = ScanCache::new(2);

        assert!(cache.verified_before(&first, &Scope::file(&first), first.len(), is_verifier));
        assert!(!cache.verified_before(&second, &Scope::file(&second), second.len(), is_verifier));
    }

    #[test]
    fn test_zero_capacity_is_treated_as_one() {
        let file = SourceFile::from_source("t.php", "<?php $a;").unwrap();
        let mut cache = ScanCache::new(0);
        cache.verified_before(&file, &Scope::file(&file), file.len(), is_verifier);
        assert_eq!(cache.len(), 1);
    }
}
