//! Inline suppression comments.
//!
//! A comment of the form `// WPCS: CSRF ok.` or `/* WPCS: slashing, CSRF ok */`
//! silences the named checks for the line it sits on. The annotation is also
//! honoured when it trails the end of a statement that spans several lines.

use crate::tokens::{SourceFile, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static WHITELIST_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)WPCS:\s*([\w\s,-]+?)\s+ok\b").expect("Invalid regex")
});

/// Answers whether a check is silenced at a token position.
pub trait SuppressionLookup {
    fn is_suppressed(&self, check: &str, position: usize) -> bool;
}

/// Never suppresses anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuppressions;

impl SuppressionLookup for NoSuppressions {
    fn is_suppressed(&self, _check: &str, _position: usize) -> bool {
        false
    }
}

/// Suppressions read from `WPCS: ... ok` comments in one file.
#[derive(Debug, Clone, Default)]
pub struct InlineSuppressions {
    /// line -> lower-cased check names
    by_line: HashMap<usize, HashSet<String>>,
    /// token index -> line, plus the line its statement ends on
    lines: Vec<(usize, usize)>,
}

impl InlineSuppressions {
    pub fn from_file(file: &SourceFile) -> Self {
        let mut by_line: HashMap<usize, HashSet<String>> = HashMap::new();
        for token in file.tokens() {
            if !matches!(token.kind, TokenKind::Comment | TokenKind::DocComment) {
                continue;
            }
            for caps in WHITELIST_COMMENT.captures_iter(&token.content) {
                let checks = caps[1]
                    .split(',')
                    .map(|c| c.trim().to_ascii_lowercase())
                    .filter(|c| !c.is_empty());
                by_line.entry(token.line).or_default().extend(checks);
            }
        }

        let lines = if by_line.is_empty() {
            Vec::new()
        } else {
            statement_lines(file)
        };
        Self { by_line, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.by_line.is_empty()
    }

    fn line_allows(&self, line: usize, check: &str) -> bool {
        self.by_line
            .get(&line)
            .is_some_and(|checks| checks.contains(check))
    }
}

impl SuppressionLookup for InlineSuppressions {
    fn is_suppressed(&self, check: &str, position: usize) -> bool {
        if self.by_line.is_empty() {
            return false;
        }
        let Some(&(line, statement_end)) = self.lines.get(position) else {
            return false;
        };
        let check = check.to_ascii_lowercase();
        self.line_allows(line, &check) || self.line_allows(statement_end, &check)
    }
}

/// For each token, its own line and the line of the `;` (or close tag) ending
/// its statement. Single backwards pass.
fn statement_lines(file: &SourceFile) -> Vec<(usize, usize)> {
    let tokens = file.tokens();
    let mut out = vec![(0, 0); tokens.len()];
    // innermost-first stack of (depth, line of next statement end at that depth)
    let mut ends: Vec<(usize, usize)> = Vec::new();
    let last_line = tokens.last().map_or(0, |t| t.line);

    for token in tokens.iter().rev() {
        let depth = token.nesting.len();
        if matches!(token.kind, TokenKind::Semicolon | TokenKind::CloseTag) {
            ends.retain(|&(d, _)| d < depth);
            ends.push((depth, token.line));
        }
        let end = ends
            .iter()
            .rev()
            .find(|&&(d, _)| d <= depth)
            .map_or(last_line, |&(_, line)| line);
        out[token.index] = (token.line, end);
    }
    out
}
