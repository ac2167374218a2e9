//! Token model consumed by the analyses.
//!
//! A [`SourceFile`] is an ordered, indexed sequence of [`Token`]s. Besides kind and
//! content, each token records the stack of bracketing contexts it sits in and, for
//! brackets themselves, the index of the matching bracket. The analyses only read
//! this model; producing it is the job of a tokenizer ([`parser`] builds it from
//! the tree-sitter PHP grammar, and JSON token dumps are accepted as well).
//!
//! Every stream goes through [`SourceFile::new`], which rejects streams whose
//! bracket links would send a forward scan backwards.

pub mod parser;

use crate::errors::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};

/// Scalar and non-scalar casts, `(int)`, `(string)` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastKind {
    Int,
    Double,
    Bool,
    String,
    Array,
    Object,
    Unset,
}

impl CastKind {
    /// Casts whose result can never carry characters that need escaping.
    pub fn is_scalar(self) -> bool {
        matches!(self, CastKind::Int | CastKind::Double | CastKind::Bool)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    OpenTag,
    CloseTag,
    InlineHtml,
    Whitespace,
    Comment,
    DocComment,
    Variable,
    /// A bare identifier: function, class, constant or method name.
    Name,
    Keyword,
    Function,
    Array,
    Isset,
    Empty,
    New,
    True,
    False,
    Null,
    LNumber,
    DNumber,
    ConstantString,
    DoubleQuotedString,
    Cast(CastKind),
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Comma,
    Semicolon,
    DoubleArrow,
    ObjectOperator,
    DoubleColon,
    NsSeparator,
    Concat,
    Minus,
    /// Any member of the assignment family: `=`, `+=`, `.=`, `??=`, ...
    Assignment,
    Operator,
}

impl TokenKind {
    /// Whitespace and comments.
    pub fn is_empty(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment
        )
    }

    pub fn is_opener(self) -> bool {
        matches!(
            self,
            TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenBrace
        )
    }

    pub fn is_closer(self) -> bool {
        matches!(
            self,
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace
        )
    }

    /// The nesting context an opener or closer belongs to.
    pub fn nesting_kind(self) -> Option<NestingKind> {
        match self {
            TokenKind::OpenParen | TokenKind::CloseParen => Some(NestingKind::Paren),
            TokenKind::OpenBracket | TokenKind::CloseBracket => Some(NestingKind::Bracket),
            TokenKind::OpenBrace | TokenKind::CloseBrace => Some(NestingKind::Brace),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingKind {
    Paren,
    Bracket,
    Brace,
}

/// One enclosing bracketing context of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nesting {
    pub kind: NestingKind,
    pub opener: usize,
    /// `None` when the opener is never closed; checks touching it bail out.
    pub closer: Option<usize>,
    /// For braces, the keyword owning the block (`function`, `class`, `if`, ...).
    #[serde(default)]
    pub owner: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub index: usize,
    pub kind: TokenKind,
    pub content: String,
    #[serde(default)]
    pub line: usize,
    /// Enclosing contexts, outermost first. Brackets do not list themselves.
    #[serde(default)]
    pub nesting: Vec<Nesting>,
    /// Closer for an opener, opener for a closer.
    #[serde(default)]
    pub matching: Option<usize>,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// A validated token stream for one file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    id: String,
    tokens: Vec<Token>,
}

impl SourceFile {
    /// Wrap a token stream, checking that its indices are self-consistent.
    pub fn new(id: impl Into<String>, tokens: Vec<Token>) -> Result<Self> {
        let id = id.into();
        validate_tokens(&id, &tokens)?;
        Ok(Self { id, tokens })
    }

    /// Tokenize PHP source with the tree-sitter grammar.
    pub fn from_source(id: impl Into<String>, source: &str) -> Result<Self> {
        let id = id.into();
        let tokens = parser::tokenize(source).context(format!("Failed to tokenize {id}"))?;
        Self::new(id, tokens)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, ptr: usize) -> Option<&Token> {
        self.tokens.get(ptr)
    }

    pub fn kind(&self, ptr: usize) -> Option<TokenKind> {
        self.tokens.get(ptr).map(|t| t.kind)
    }

    pub fn content(&self, ptr: usize) -> &str {
        self.tokens.get(ptr).map_or("", |t| t.content.as_str())
    }

    /// First non-whitespace, non-comment token in `from..limit`.
    pub fn next_non_empty(&self, from: usize, limit: Option<usize>) -> Option<usize> {
        let end = limit.unwrap_or(self.tokens.len()).min(self.tokens.len());
        (from..end).find(|&i| !self.tokens[i].kind.is_empty())
    }

    /// Last non-whitespace, non-comment token at or before `from`.
    pub fn prev_non_empty(&self, from: usize) -> Option<usize> {
        if self.tokens.is_empty() {
            return None;
        }
        let from = from.min(self.tokens.len() - 1);
        (0..=from).rev().find(|&i| !self.tokens[i].kind.is_empty())
    }

    /// Matching closer of the opener at `ptr`. Always after `ptr`.
    pub fn closer_of(&self, ptr: usize) -> Option<usize> {
        let token = self.tokens.get(ptr)?;
        if !token.kind.is_opener() {
            return None;
        }
        token.matching.filter(|&m| m > ptr)
    }

    /// The parenthesis directly enclosing `ptr`.
    pub fn innermost_paren(&self, ptr: usize) -> Option<&Nesting> {
        self.tokens
            .get(ptr)?
            .nesting
            .iter()
            .rev()
            .find(|n| n.kind == NestingKind::Paren)
    }
}

fn validate_tokens(id: &str, tokens: &[Token]) -> Result<()> {
    let len = tokens.len();
    let in_bounds = |ptr: usize| ptr < len;
    let invalid = |message: String| Err(Error::token_stream(id, message));

    for (position, token) in tokens.iter().enumerate() {
        if token.index != position {
            return invalid(format!(
                "token at position {} has index {}",
                position, token.index
            ));
        }
        if let Some(other) = token.matching {
            if !in_bounds(other) {
                return invalid(format!(
                    "token {} matches out-of-range token {}",
                    position, other
                ));
            }
            let forward = if token.kind.is_opener() {
                other > position
            } else if token.kind.is_closer() {
                other < position
            } else {
                return invalid(format!("non-bracket token {} has a match", position));
            };
            if !forward {
                return invalid(format!(
                    "bracket {} matches token {} on the wrong side",
                    position, other
                ));
            }
            let partner = &tokens[other];
            if partner.matching != Some(position) {
                return invalid(format!(
                    "brackets {} and {} do not match each other",
                    position, other
                ));
            }
            if partner.kind.nesting_kind() != token.kind.nesting_kind() {
                return invalid(format!(
                    "bracket {} is closed by a different bracket kind at {}",
                    position, other
                ));
            }
        }
        for nesting in &token.nesting {
            let refs = [Some(nesting.opener), nesting.closer, nesting.owner];
            if let Some(bad) = refs.into_iter().flatten().find(|&r| !in_bounds(r)) {
                return invalid(format!(
                    "token {} is nested in out-of-range token {}",
                    position, bad
                ));
            }
            if nesting.opener >= position || nesting.closer.is_some_and(|c| c <= position) {
                return invalid(format!(
                    "token {} lies outside its context at {}",
                    position, nesting.opener
                ));
            }
        }
    }
    Ok(())
}
