//! Tree-sitter tokenizer for PHP.
//!
//! The concrete syntax tree is flattened into the token model. Every leaf becomes a
//! [`Token`]; variables, literals, comments and `(type)` casts are folded into one
//! token each, and the source between leaves is kept as whitespace tokens. Bracket
//! pairs come from the tree: a bracket only matches a sibling under the same node,
//! and a `{` opening a block records the keyword of the construct that owns it.

use super::{CastKind, Nesting, NestingKind, Token, TokenKind};
use crate::errors::{Error, Result};
use tree_sitter::{Language, Node, Parser};

const KEYWORDS: &[&str] = &[
    "abstract", "and", "as", "break", "callable", "case", "catch", "class", "clone", "const",
    "continue", "declare", "default", "die", "do", "echo", "else", "elseif", "enddeclare",
    "endfor", "endforeach", "endif", "endswitch", "endwhile", "enum", "eval", "exit", "extends",
    "final", "finally", "fn", "for", "foreach", "global", "goto", "if", "implements", "include",
    "include_once", "instanceof", "insteadof", "interface", "list", "match", "namespace", "or",
    "print", "private", "protected", "public", "readonly", "require", "require_once", "return",
    "static", "switch", "throw", "trait", "try", "unset", "use", "var", "while", "xor", "yield",
];

const ASSIGNMENTS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", ".=", "%=", "&=", "|=", "^=", "<<=", ">>=", "**=", "??=",
];

/// Named nodes emitted as a single token without visiting their children.
const FOLDED: &[&str] = &[
    "variable_name",
    "string",
    "encapsed_string",
    "heredoc",
    "nowdoc",
    "shell_command_expression",
    "integer",
    "float",
    "boolean",
    "null",
    "comment",
    "text",
    "php_tag",
    "name",
];

/// Nodes whose braces belong to the construct around them.
const BLOCKS: &[&str] = &[
    "compound_statement",
    "declaration_list",
    "switch_block",
    "enum_declaration_list",
    "match_block",
];

/// Bare snippets without an open tag are parsed as code.
fn language_for(source: &str) -> Language {
    if source.contains("<?") {
        tree_sitter_php::LANGUAGE_PHP.into()
    } else {
        tree_sitter_php::LANGUAGE_PHP_ONLY.into()
    }
}

/// Tokenize PHP source into a linked token stream.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut parser = Parser::new();
    parser
        .set_language(&language_for(source))
        .map_err(|e| Error::parse(format!("Failed to set tree-sitter language: {e}")))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::parse("Failed to parse source code"))?;

    let root = tree.root_node();
    if root.has_error() {
        tracing::debug!("Source has syntax errors; brackets inside them may stay unmatched");
    }

    let mut builder = Builder::new(source);
    builder.walk(root);
    Ok(builder.finish())
}

struct RawToken {
    kind: TokenKind,
    content: String,
    line: usize,
    /// Openers still open when the token was emitted, outermost first.
    enclosing: Vec<usize>,
}

struct Frame {
    kind: &'static str,
    /// The keyword among the node's direct leaves, `function` preferred.
    keyword: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenBracket {
    opener: usize,
    kind: NestingKind,
    depth: usize,
}

/// Open brackets across the whole walk, each tagged with the depth of its node.
#[derive(Debug, Default)]
struct BracketStack {
    open: Vec<OpenBracket>,
}

impl BracketStack {
    fn open(&mut self, opener: usize, kind: NestingKind, depth: usize) {
        self.open.push(OpenBracket {
            opener,
            kind,
            depth,
        });
    }

    /// Close the nearest opener of `kind` under the same node. Unclosed openers
    /// above it are dropped with it.
    fn close(&mut self, kind: NestingKind, depth: usize) -> Option<usize> {
        let position = self
            .open
            .iter()
            .rev()
            .take_while(|b| b.depth == depth)
            .position(|b| b.kind == kind)?;
        let at = self.open.len() - 1 - position;
        let opener = self.open[at].opener;
        self.open.truncate(at);
        Some(opener)
    }

    /// Forget openers left unclosed by a node being exited.
    fn leave(&mut self, depth: usize) {
        while self.open.last().is_some_and(|b| b.depth >= depth) {
            self.open.pop();
        }
    }

    fn openers(&self) -> Vec<usize> {
        self.open.iter().map(|b| b.opener).collect()
    }
}

struct Builder<'s> {
    source: &'s str,
    offset: usize,
    line: usize,
    raw: Vec<RawToken>,
    matching: Vec<Option<usize>>,
    owners: Vec<Option<usize>>,
    frames: Vec<Frame>,
    brackets: BracketStack,
}

impl<'s> Builder<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            raw: Vec::new(),
            matching: Vec::new(),
            owners: Vec::new(),
            frames: Vec::new(),
            brackets: BracketStack::default(),
        }
    }

    fn slice(&self, start: usize, end: usize) -> &'s str {
        self.source.get(start..end).unwrap_or("")
    }

    fn walk(&mut self, root: Node<'_>) {
        let mut cursor = root.walk();
        'nodes: loop {
            let node = cursor.node();
            if self.visit(node) && cursor.goto_first_child() {
                self.frames.push(Frame {
                    kind: node.kind(),
                    keyword: None,
                });
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    continue 'nodes;
                }
                if !cursor.goto_parent() {
                    break 'nodes;
                }
                self.leave();
            }
        }
        self.gap(self.source.len());
    }

    /// Emit `node` if it is a token; returns whether its children should be visited.
    fn visit(&mut self, node: Node<'_>) -> bool {
        if node.is_named() && node.kind() == "cast_expression" {
            if let Some((kind, end)) = cast_prefix(node, self.source) {
                let start = node.start_byte().max(self.offset);
                self.gap(start);
                self.push(TokenKind::Cast(kind), start, end);
            }
            return node.child_count() > 0;
        }
        if node.child_count() > 0 && !(node.is_named() && FOLDED.contains(&node.kind())) {
            return true;
        }
        self.leaf(node);
        false
    }

    fn leaf(&mut self, node: Node<'_>) {
        let start = node.start_byte().max(self.offset);
        let end = node.end_byte();
        // Missing nodes are zero-width; cast parts are already consumed.
        if end <= start {
            return;
        }
        self.gap(start);
        let kind = leaf_kind(node, self.slice(start, end));
        self.push(kind, start, end);
    }

    fn gap(&mut self, until: usize) {
        if until <= self.offset {
            return;
        }
        let kind = if self.slice(self.offset, until).trim().is_empty() {
            TokenKind::Whitespace
        } else {
            TokenKind::Operator
        };
        self.push(kind, self.offset, until);
    }

    fn leave(&mut self) {
        self.brackets.leave(self.frames.len());
        self.frames.pop();
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        let index = self.raw.len();
        let depth = self.frames.len();

        let mut matching = None;
        if kind.is_closer() {
            if let Some(opener) = kind
                .nesting_kind()
                .and_then(|nesting| self.brackets.close(nesting, depth))
            {
                matching = Some(opener);
                self.matching[opener] = Some(index);
            }
        }

        let enclosing = self.brackets.openers();
        let owner = if kind == TokenKind::OpenBrace {
            self.brace_owner()
        } else {
            None
        };
        if let Some(nesting) = kind.nesting_kind().filter(|_| kind.is_opener()) {
            self.brackets.open(index, nesting, depth);
        }

        if let Some(frame) = self.frames.last_mut() {
            match kind {
                TokenKind::Function => frame.keyword = Some(index),
                TokenKind::Keyword => {
                    frame.keyword.get_or_insert(index);
                }
                _ => {}
            }
        }

        let content = self.slice(start, end);
        self.raw.push(RawToken {
            kind,
            content: content.to_string(),
            line: self.line,
            enclosing,
        });
        self.matching.push(matching);
        self.owners.push(owner);
        self.line += content.matches('\n').count();
        self.offset = end;
    }

    fn brace_owner(&self) -> Option<usize> {
        let (frame, outer) = self.frames.split_last()?;
        if BLOCKS.contains(&frame.kind) {
            outer.last()?.keyword
        } else {
            frame.keyword
        }
    }

    fn finish(self) -> Vec<Token> {
        let Builder {
            raw,
            matching,
            owners,
            ..
        } = self;
        let kinds: Vec<TokenKind> = raw.iter().map(|t| t.kind).collect();

        raw.into_iter()
            .enumerate()
            .map(|(index, token)| Token {
                index,
                kind: token.kind,
                content: token.content,
                line: token.line,
                nesting: token
                    .enclosing
                    .iter()
                    .filter_map(|&opener| {
                        Some(Nesting {
                            kind: kinds[opener].nesting_kind()?,
                            opener,
                            closer: matching[opener],
                            owner: owners[opener],
                        })
                    })
                    .collect(),
                matching: matching[index],
            })
            .collect()
    }
}

/// The cast kind and end byte of the `( type )` part of a cast expression.
fn cast_prefix(node: Node<'_>, source: &str) -> Option<(CastKind, usize)> {
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    let cast_type = children.iter().find(|c| c.kind() == "cast_type")?;
    let close = children
        .iter()
        .find(|c| c.kind() == ")" && c.start_byte() >= cast_type.end_byte())?;
    if close.is_missing() {
        return None;
    }
    let word = source.get(cast_type.byte_range())?.trim().to_ascii_lowercase();
    let kind = match word.as_str() {
        "int" | "integer" => CastKind::Int,
        "float" | "double" | "real" => CastKind::Double,
        "bool" | "boolean" => CastKind::Bool,
        "string" | "binary" => CastKind::String,
        "array" => CastKind::Array,
        "object" => CastKind::Object,
        "unset" => CastKind::Unset,
        _ => return None,
    };
    Some((kind, close.end_byte()))
}

fn leaf_kind(node: Node<'_>, text: &str) -> TokenKind {
    if node.is_named() {
        match node.kind() {
            "php_tag" => return TokenKind::OpenTag,
            "text" => return TokenKind::InlineHtml,
            "comment" if text.starts_with("/**") && text.len() > 4 => {
                return TokenKind::DocComment
            }
            "comment" => return TokenKind::Comment,
            "variable_name" => return TokenKind::Variable,
            "integer" => return TokenKind::LNumber,
            "float" => return TokenKind::DNumber,
            "string" | "nowdoc" => return TokenKind::ConstantString,
            "encapsed_string" if !interpolates(node) => return TokenKind::ConstantString,
            "encapsed_string" | "heredoc" | "shell_command_expression" => {
                return TokenKind::DoubleQuotedString
            }
            _ => {}
        }
    }
    if is_identifier(text) {
        classify_word(text)
    } else {
        punctuation_kind(text)
    }
}

fn interpolates(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).any(|child| {
        !matches!(
            child.kind(),
            "string_content" | "string_value" | "escape_sequence"
        )
    });
    found
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || !c.is_ascii())
        && chars.all(|c| c.is_alphanumeric() || c == '_' || !c.is_ascii())
}

fn punctuation_kind(text: &str) -> TokenKind {
    match text {
        "(" => TokenKind::OpenParen,
        ")" => TokenKind::CloseParen,
        "[" => TokenKind::OpenBracket,
        "]" => TokenKind::CloseBracket,
        "{" => TokenKind::OpenBrace,
        "}" => TokenKind::CloseBrace,
        "," => TokenKind::Comma,
        ";" => TokenKind::Semicolon,
        "=>" => TokenKind::DoubleArrow,
        "->" | "?->" => TokenKind::ObjectOperator,
        "::" => TokenKind::DoubleColon,
        "\\" => TokenKind::NsSeparator,
        "." => TokenKind::Concat,
        "-" => TokenKind::Minus,
        _ if text.starts_with("?>") => TokenKind::CloseTag,
        _ if ASSIGNMENTS.contains(&text) => TokenKind::Assignment,
        _ => TokenKind::Operator,
    }
}

fn classify_word(word: &str) -> TokenKind {
    let lower = word.to_ascii_lowercase();
    match lower.as_str() {
        "function" => TokenKind::Function,
        "array" => TokenKind::Array,
        "isset" => TokenKind::Isset,
        "empty" => TokenKind::Empty,
        "new" => TokenKind::New,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        w if KEYWORDS.contains(&w) => TokenKind::Keyword,
        _ => TokenKind::Name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_empty())
            .collect()
    }

    fn find(tokens: &[Token], content: &str) -> usize {
        tokens.iter().position(|t| t.content == content).unwrap()
    }

    #[test]
    fn test_open_tag_and_inline_html() {
        let tokens = tokenize("<p>hi</p><?php $a; ?>x").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::InlineHtml);
        assert_eq!(tokens[1].kind, TokenKind::OpenTag);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::InlineHtml);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::CloseTag));
    }

    #[test]
    fn test_tokens_cover_the_source() {
        let source = "<?php\n// note\nfoo( $a, \"x{$b}\" ); /** doc */\n";
        let text: String = tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(text, source);
    }

    #[test]
    fn test_literals_and_casts() {
        assert_eq!(
            kinds("$r = (int) $a . 'x' . \"y$z\" . \"plain\" . 1.5 . -3 . ( bool )$b;"),
            vec![
                TokenKind::Variable,
                TokenKind::Assignment,
                TokenKind::Cast(CastKind::Int),
                TokenKind::Variable,
                TokenKind::Concat,
                TokenKind::ConstantString,
                TokenKind::Concat,
                TokenKind::DoubleQuotedString,
                TokenKind::Concat,
                TokenKind::ConstantString,
                TokenKind::Concat,
                TokenKind::DNumber,
                TokenKind::Concat,
                TokenKind::Minus,
                TokenKind::LNumber,
                TokenKind::Concat,
                TokenKind::Cast(CastKind::Bool),
                TokenKind::Variable,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_assignment_family_and_arrows() {
        assert_eq!(
            kinds("$a .= $c->d ?? $e; $f ??= [ 'k' => 1 ];"),
            vec![
                TokenKind::Variable,
                TokenKind::Assignment,
                TokenKind::Variable,
                TokenKind::ObjectOperator,
                TokenKind::Name,
                TokenKind::Operator,
                TokenKind::Variable,
                TokenKind::Semicolon,
                TokenKind::Variable,
                TokenKind::Assignment,
                TokenKind::OpenBracket,
                TokenKind::ConstantString,
                TokenKind::DoubleArrow,
                TokenKind::LNumber,
                TokenKind::CloseBracket,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let tokens =
            tokenize("If ( ISSET( $a ) || Empty( $b ) ) { $c = Array( TRUE, null, foo() ); }")
                .unwrap();
        let kind_of = |content: &str| tokens[find(&tokens, content)].kind;
        assert_eq!(kind_of("If"), TokenKind::Keyword);
        assert_eq!(kind_of("ISSET"), TokenKind::Isset);
        assert_eq!(kind_of("Empty"), TokenKind::Empty);
        assert_eq!(kind_of("Array"), TokenKind::Array);
        assert_eq!(kind_of("TRUE"), TokenKind::True);
        assert_eq!(kind_of("null"), TokenKind::Null);
        assert_eq!(kind_of("foo"), TokenKind::Name);
    }

    #[test]
    fn test_brackets_are_matched_and_nested() {
        let tokens = tokenize("foo( $a[ 1 ], bar() );").unwrap();
        let open = find(&tokens, "(");
        let close = tokens.iter().rposition(|t| t.content == ")").unwrap();
        assert_eq!(tokens[open].matching, Some(close));
        assert_eq!(tokens[close].matching, Some(open));

        let one = find(&tokens, "1");
        let stack: Vec<NestingKind> = tokens[one].nesting.iter().map(|n| n.kind).collect();
        assert_eq!(stack, vec![NestingKind::Paren, NestingKind::Bracket]);
        assert!(tokens[open].nesting.is_empty());
        assert!(tokens[close].nesting.is_empty());
    }

    #[test]
    fn test_unclosed_opener_has_no_closer() {
        let tokens = tokenize("foo( $a ;").unwrap();
        let open = find(&tokens, "(");
        assert_eq!(tokens[open].matching, None);
        assert!(tokens
            .iter()
            .flat_map(|t| &t.nesting)
            .all(|n| n.closer.is_none()));
    }

    #[test]
    fn test_function_body_brace_is_owned_by_function() {
        let tokens = tokenize("function f( $x = array( 1 ) ) { if ( $x ) { $y; } }").unwrap();
        let y = find(&tokens, "$y");
        let owners: Vec<&str> = tokens[y]
            .nesting
            .iter()
            .filter_map(|n| n.owner)
            .map(|o| tokens[o].content.as_str())
            .collect();
        assert_eq!(owners, vec!["function", "if"]);
    }

    #[test]
    fn test_method_brace_is_owned_by_function() {
        let tokens =
            tokenize("<?php class A { public static function f() { $y; } }").unwrap();
        let y = find(&tokens, "$y");
        let owners: Vec<&str> = tokens[y]
            .nesting
            .iter()
            .filter_map(|n| n.owner)
            .map(|o| tokens[o].content.as_str())
            .collect();
        assert_eq!(owners, vec!["class", "function"]);
    }

    #[test]
    fn test_closure_inside_condition_does_not_steal_if_brace() {
        let tokens =
            tokenize("if ( array_map( function ( $v ) { return $v; }, $a ) ) { $z; }").unwrap();
        let z = find(&tokens, "$z");
        let owner = tokens[z].nesting.last().and_then(|n| n.owner).unwrap();
        assert_eq!(tokens[owner].content, "if");
        let v = tokens.iter().rposition(|t| t.content == "$v").unwrap();
        let owner = tokens[v].nesting.last().and_then(|n| n.owner).unwrap();
        assert_eq!(tokens[owner].kind, TokenKind::Function);
    }

    #[test]
    fn test_member_brace_has_no_owner() {
        let tokens =
            tokenize("<?php abstract class A { abstract function f(); } $o->{ 'p' };").unwrap();
        let p = find(&tokens, "'p'");
        let brace = tokens[p].nesting.last().unwrap();
        assert_eq!(tokens[brace.opener].content, "{");
        assert_eq!(brace.owner, None);
        assert_eq!(tokens[p].nesting.len(), 1);
    }

    #[test]
    fn test_lines_are_tracked() {
        let tokens = tokenize("<?php\n$a;\n/* x\n y */ $b;").unwrap();
        assert_eq!(tokens[find(&tokens, "$a")].line, 2);
        assert_eq!(tokens[find(&tokens, "$b")].line, 4);
    }

    #[test]
    fn test_closer_drops_unclosed_openers_above_its_match() {
        // `{ ( }`
        let mut stack = BracketStack::default();
        stack.open(0, NestingKind::Brace, 3);
        stack.open(1, NestingKind::Paren, 3);
        assert_eq!(stack.close(NestingKind::Brace, 3), Some(0));
        assert!(stack.openers().is_empty());
    }

    #[test]
    fn test_closer_never_matches_across_nodes() {
        let mut stack = BracketStack::default();
        stack.open(0, NestingKind::Paren, 2);
        stack.open(1, NestingKind::Bracket, 3);
        assert_eq!(stack.close(NestingKind::Paren, 3), None);
        assert_eq!(stack.openers(), vec![0, 1]);
        stack.leave(3);
        assert_eq!(stack.openers(), vec![0]);
        assert_eq!(stack.close(NestingKind::Paren, 2), Some(0));
    }
}
