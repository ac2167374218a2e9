//! Argument expression classifier.
//!
//! Walks the tokens of one expression left to right and decides whether the
//! value reaching a parameter is slashed. The walk is a lexical heuristic, not an
//! evaluator. The expression is cut into watched units at commas and
//! concatenation operators; within a unit:
//!
//! - literals that can never contain a backslash (numbers, `true`, `false`,
//!   `null`, single-quoted strings, unary minus) keep the unit watched
//! - an `(int)`, `(float)` or `(bool)` cast satisfies the unit
//! - a call to a slashing or auto-slashing function satisfies the unit without
//!   looking at its arguments
//! - an `array( ... )` literal is decomposed pair by pair, each value judged
//!   against the disposition of its key
//! - anything else is a violation when the unit must be slashed
//!
//! After the first decisive token of a unit the walker stops watching until the
//! next comma or `.`, so a unit yields at most one violation. Bracket groups seen
//! while not watching are skipped whole.

use super::call_site::split_arguments;
use crate::registry::Registry;
use crate::tokens::{SourceFile, TokenKind};
use std::collections::BTreeSet;

static NO_KEYS: BTreeSet<String> = BTreeSet::new();

/// What a value is required to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Slashed,
    Unslashed,
    NoOpinion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// A value that is not known to be slashed
    NotSlashed,
    /// Raw request input such as `$_POST`
    RawInput,
    /// A slashing call where the value must stay unslashed
    UnexpectedSlashing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub token: usize,
    /// Content of the offending token
    pub found: String,
    pub reason: Reason,
    /// Array key whose rule was broken, when the value sat under one
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Satisfied,
    /// One entry per offending unit, in token order
    Violated(Vec<Violation>),
    /// The range is structurally broken (an unclosed bracket)
    Indeterminate,
}

impl Verdict {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Verdict::Satisfied)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Verdict::Violated(v) => v,
            _ => &[],
        }
    }
}

/// Per-key requirements for the top level of an array literal argument.
#[derive(Debug, Clone, Copy)]
pub struct KeyRules<'a> {
    pub slashed: &'a BTreeSet<String>,
    pub unslashed: &'a BTreeSet<String>,
}

impl<'a> KeyRules<'a> {
    pub fn none() -> KeyRules<'static> {
        KeyRules {
            slashed: &NO_KEYS,
            unslashed: &NO_KEYS,
        }
    }

    pub fn slashed(keys: &'a BTreeSet<String>) -> Self {
        Self {
            slashed: keys,
            unslashed: &NO_KEYS,
        }
    }

    fn disposition_for(&self, key: &str) -> Option<Disposition> {
        if self.slashed.contains(key) {
            Some(Disposition::Slashed)
        } else if self.unslashed.contains(key) {
            Some(Disposition::Unslashed)
        } else {
            None
        }
    }
}

/// An opener whose closer is missing.
#[derive(Debug, Clone, Copy)]
struct Unbalanced(usize);

type Walk = std::result::Result<(), Unbalanced>;

pub struct ArgumentClassifier<'a> {
    file: &'a SourceFile,
    registry: &'a Registry,
}

impl<'a> ArgumentClassifier<'a> {
    pub fn new(file: &'a SourceFile, registry: &'a Registry) -> Self {
        Self { file, registry }
    }

    /// Classify the inclusive range `start..=end` against `disposition`.
    ///
    /// `keys` applies to the pairs of an `array( ... )` literal found at the top
    /// of the range; nested arrays inherit the disposition of the value holding
    /// them.
    pub fn classify(
        &self,
        start: usize,
        end: usize,
        disposition: Disposition,
        keys: KeyRules<'_>,
    ) -> Verdict {
        let mut violations = Vec::new();
        match self.walk(start, end, disposition, Some(keys), None, &mut violations) {
            Err(Unbalanced(at)) => {
                tracing::debug!(file = self.file.id(), token = at, "unbalanced bracket, argument skipped");
                Verdict::Indeterminate
            }
            Ok(()) if violations.is_empty() => Verdict::Satisfied,
            Ok(()) => Verdict::Violated(violations),
        }
    }

    fn walk(
        &self,
        start: usize,
        end: usize,
        disposition: Disposition,
        keys: Option<KeyRules<'_>>,
        key: Option<&str>,
        out: &mut Vec<Violation>,
    ) -> Walk {
        let mut watch = true;
        let mut i = start;

        while i <= end {
            let Some(token) = self.file.get(i) else {
                break;
            };
            let kind = token.kind;

            if kind == TokenKind::Comma {
                watch = true;
                i += 1;
                continue;
            }

            if !watch {
                if kind == TokenKind::Concat {
                    watch = true;
                } else if kind.is_opener() {
                    i = self.closer(i)?;
                }
                i += 1;
                continue;
            }

            match kind {
                k if k.is_empty() => {}
                TokenKind::LNumber
                | TokenKind::DNumber
                | TokenKind::Minus
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::ConstantString => {}
                // Grouping and pair punctuation are transparent.
                TokenKind::OpenParen
                | TokenKind::CloseParen
                | TokenKind::DoubleArrow
                | TokenKind::Concat => {}
                TokenKind::Cast(cast) if cast.is_scalar() => watch = false,
                TokenKind::Array => {
                    match self.call_opener(i) {
                        Some(opener) => {
                            let closer = self.closer(opener)?;
                            self.walk_array(opener, closer, disposition, keys, key, out)?;
                            i = closer;
                        }
                        None if disposition == Disposition::Slashed => {
                            out.push(self.violation(i, Reason::NotSlashed, key));
                        }
                        None => {}
                    }
                    watch = false;
                }
                TokenKind::Name => {
                    if let Some(opener) = self.call_opener(i) {
                        let closer = self.closer(opener)?;
                        if self.registry.is_slashing_function(&token.content) {
                            if disposition == Disposition::Unslashed {
                                out.push(self.violation(i, Reason::UnexpectedSlashing, key));
                            }
                        } else if disposition == Disposition::Slashed {
                            out.push(self.violation(i, Reason::NotSlashed, key));
                        }
                        i = closer;
                    } else if disposition == Disposition::Slashed {
                        out.push(self.violation(i, Reason::NotSlashed, key));
                    }
                    watch = false;
                }
                TokenKind::Variable => {
                    if disposition == Disposition::Slashed {
                        let reason = if self.registry.is_raw_input(&token.content) {
                            Reason::RawInput
                        } else {
                            Reason::NotSlashed
                        };
                        out.push(self.violation(i, reason, key));
                    }
                    watch = false;
                }
                _ => {
                    if disposition == Disposition::Slashed {
                        out.push(self.violation(i, Reason::NotSlashed, key));
                    }
                    if kind.is_opener() {
                        i = self.closer(i)?;
                    }
                    watch = false;
                }
            }
            i += 1;
        }
        Ok(())
    }

    /// Judge each value of the array literal `opener..closer`.
    fn walk_array(
        &self,
        opener: usize,
        closer: usize,
        parent: Disposition,
        keys: Option<KeyRules<'_>>,
        inherited_key: Option<&str>,
        out: &mut Vec<Violation>,
    ) -> Walk {
        let elements = split_arguments(self.file, opener, closer).ok_or(Unbalanced(opener))?;

        for element in elements {
            let Some(arrow) = self.top_level_arrow(element.start, element.end)? else {
                self.walk(element.start, element.end, parent, None, inherited_key, out)?;
                continue;
            };

            let literal = self.literal_key(element.start, arrow);
            let rule = literal
                .as_deref()
                .zip(keys)
                .and_then(|(name, rules)| rules.disposition_for(name));
            match rule {
                Some(disposition) => {
                    self.walk(arrow + 1, element.end, disposition, None, literal.as_deref(), out)?
                }
                None => self.walk(arrow + 1, element.end, parent, None, inherited_key, out)?,
            }
        }
        Ok(())
    }

    fn top_level_arrow(&self, start: usize, end: usize) -> std::result::Result<Option<usize>, Unbalanced> {
        let mut i = start;
        while i <= end {
            match self.file.kind(i) {
                Some(TokenKind::DoubleArrow) => return Ok(Some(i)),
                Some(kind) if kind.is_opener() => i = self.closer(i)?,
                Some(_) => {}
                None => break,
            }
            i += 1;
        }
        Ok(None)
    }

    /// The key name when the key is a single quoted string literal.
    fn literal_key(&self, start: usize, arrow: usize) -> Option<String> {
        let first = self.file.next_non_empty(start, Some(arrow))?;
        if self.file.next_non_empty(first + 1, Some(arrow)).is_some() {
            return None;
        }
        let token = self.file.get(first)?;
        (token.kind == TokenKind::ConstantString)
            .then(|| token.content.trim_matches(|c| c == '\'' || c == '"').to_string())
    }

    fn call_opener(&self, ptr: usize) -> Option<usize> {
        let next = self.file.next_non_empty(ptr + 1, None)?;
        (self.file.kind(next)? == TokenKind::OpenParen).then_some(next)
    }

    fn closer(&self, opener: usize) -> std::result::Result<usize, Unbalanced> {
        self.file.closer_of(opener).ok_or(Unbalanced(opener))
    }

    fn violation(&self, token: usize, reason: Reason, key: Option<&str>) -> Violation {
        Violation {
            token,
            found: self.file.content(token).to_string(),
            reason,
            key: key.map(str::to_string),
        }
    }
}
