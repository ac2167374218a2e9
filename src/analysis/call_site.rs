//! Call-site matching.
//!
//! Recognises calls to registered names at a candidate token and splits the
//! parenthesised argument list into top-level [`ArgumentSpan`]s. Three call
//! shapes are recognised:
//!
//! - `name(...)`, keyed as `name`
//! - `Class::method(...)`, keyed as `Class::method`; `new Class(...)` is keyed as
//!   `Class::__construct`
//! - `$receiver->method(...)`, keyed as `$receiver->method`, matched at the
//!   receiver variable
//!
//! Not matching is the normal outcome for almost every token and is reported as
//! `None`, never as an error.

use crate::registry::Registry;
use crate::tokens::{SourceFile, TokenKind};

/// Anything that can say whether a call name is of interest.
pub trait CallRegistry {
    fn is_target(&self, name: &str) -> bool;
}

impl CallRegistry for Registry {
    fn is_target(&self, name: &str) -> bool {
        self.has_contract(name)
    }
}

impl CallRegistry for [&str] {
    fn is_target(&self, name: &str) -> bool {
        self.contains(&name)
    }
}

/// One positional argument: 1-based `index`, inclusive token range `start..=end`.
///
/// `start` is the first token after the opening parenthesis or separating comma
/// and may be whitespace; use [`ArgumentSpan::first_significant`] for the first
/// real token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentSpan {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl ArgumentSpan {
    pub fn first_significant(&self, file: &SourceFile) -> Option<usize> {
        file.next_non_empty(self.start, Some(self.end + 1))
    }
}

/// A matched call of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Registry key the call matched under
    pub name: String,
    /// The method or function name token
    pub name_ptr: usize,
    pub opener: usize,
    pub closer: usize,
    pub arguments: Vec<ArgumentSpan>,
}

impl CallSite {
    /// Argument by 1-based position.
    pub fn argument(&self, index: usize) -> Option<&ArgumentSpan> {
        self.arguments.iter().find(|arg| arg.index == index)
    }
}

/// Try to match a registered call starting at `ptr`.
pub fn match_call<R: CallRegistry + ?Sized>(
    file: &SourceFile,
    ptr: usize,
    registry: &R,
) -> Option<CallSite> {
    let start = file.next_non_empty(ptr, None)?;
    let (name, name_ptr) = match file.kind(start)? {
        TokenKind::Name => resolve_name(file, start)?,
        TokenKind::Variable => resolve_receiver(file, start)?,
        _ => return None,
    };
    if !registry.is_target(&name) {
        return None;
    }

    let opener = file.next_non_empty(name_ptr + 1, None)?;
    if file.kind(opener)? != TokenKind::OpenParen {
        return None;
    }
    let closer = file.closer_of(opener)?;
    let arguments = split_arguments(file, opener, closer)?;

    Some(CallSite {
        name,
        name_ptr,
        opener,
        closer,
        arguments,
    })
}

/// Key a bare name token by how it is being called.
fn resolve_name(file: &SourceFile, ptr: usize) -> Option<(String, usize)> {
    let content = file.content(ptr);
    // A name at the very start of the stream has nothing before it.
    let Some(prev) = ptr.checked_sub(1).and_then(|p| file.prev_non_empty(p)) else {
        return Some((content.to_string(), ptr));
    };

    match file.kind(prev)? {
        // Methods and declarations are not function calls.
        TokenKind::ObjectOperator | TokenKind::Function => None,
        TokenKind::New => Some((format!("{}::__construct", content), ptr)),
        TokenKind::DoubleColon => {
            let class = file.prev_non_empty(prev.checked_sub(1)?)?;
            if file.kind(class)? != TokenKind::Name {
                return None;
            }
            Some((format!("{}::{}", file.content(class), content), ptr))
        }
        // `Foo\bar()` is a namespaced function; only the global `\bar()` counts.
        TokenKind::NsSeparator => {
            let before = prev
                .checked_sub(1)
                .and_then(|p| file.prev_non_empty(p))
                .and_then(|p| file.kind(p));
            if before == Some(TokenKind::Name) {
                None
            } else {
                Some((content.to_string(), ptr))
            }
        }
        _ => Some((content.to_string(), ptr)),
    }
}

/// `$receiver->method`, keyed at the receiver variable.
fn resolve_receiver(file: &SourceFile, ptr: usize) -> Option<(String, usize)> {
    let arrow = file.next_non_empty(ptr + 1, None)?;
    if file.kind(arrow)? != TokenKind::ObjectOperator {
        return None;
    }
    let method = file.next_non_empty(arrow + 1, None)?;
    if file.kind(method)? != TokenKind::Name {
        return None;
    }
    Some((
        format!("{}->{}", file.content(ptr), file.content(method)),
        method,
    ))
}

/// Split `opener..closer` on commas that are not nested any deeper.
///
/// Returns `None` when a nested bracket is never closed.
pub fn split_arguments(
    file: &SourceFile,
    opener: usize,
    closer: usize,
) -> Option<Vec<ArgumentSpan>> {
    let mut arguments = Vec::new();
    if file.next_non_empty(opener + 1, Some(closer)).is_none() {
        return Some(arguments);
    }

    let mut start = opener + 1;
    let mut i = opener + 1;
    while i < closer {
        let token = file.get(i)?;
        if token.kind.is_opener() {
            i = token.matching.filter(|&m| m > i && m < closer)?;
        } else if token.kind == TokenKind::Comma {
            arguments.push(ArgumentSpan {
                index: arguments.len() + 1,
                start,
                end: i.saturating_sub(1).max(start),
            });
            start = i + 1;
        }
        i += 1;
    }

    // A trailing comma does not open another argument.
    if file.next_non_empty(start, Some(closer)).is_some() {
        arguments.push(ArgumentSpan {
            index: arguments.len() + 1,
            start,
            end: closer - 1,
        });
    }
    Some(arguments)
}
