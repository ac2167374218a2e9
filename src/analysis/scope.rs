//! Scope resolution for the nonce check.
//!
//! A verification call only covers uses in the same function body. Closures
//! get their own body; everything outside a function shares the file scope.

use crate::tokens::{NestingKind, SourceFile, TokenKind};

/// The analyzable range around a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    /// Opening brace of the function body, or 0 for file scope
    pub start: usize,
    /// Closing brace of the function body, or the token count for file scope
    pub end: usize,
    /// The `function` keyword owning the body
    pub owner: Option<usize>,
}

impl Scope {
    pub fn file(file: &SourceFile) -> Self {
        Self {
            start: 0,
            end: file.len(),
            owner: None,
        }
    }

    pub fn is_file_scope(&self) -> bool {
        self.owner.is_none()
    }
}

/// Innermost function body (named function or closure) enclosing `ptr`, or the
/// whole file.
///
/// A body whose closing brace is missing extends to the end of the file.
pub fn resolve_scope(file: &SourceFile, ptr: usize) -> Scope {
    let Some(token) = file.get(ptr) else {
        return Scope::file(file);
    };

    token
        .nesting
        .iter()
        .rev()
        .filter(|n| n.kind == NestingKind::Brace)
        .find_map(|n| {
            let owner = n.owner?;
            (file.kind(owner)? == TokenKind::Function).then(|| Scope {
                start: n.opener,
                end: n.closer.unwrap_or(file.len()),
                owner: Some(owner),
            })
        })
        .unwrap_or_else(|| Scope::file(file))
}
