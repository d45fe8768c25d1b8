//! Indentation-based configuration document parser.
//!
//! AirSend add-on configuration lives in two small documents (device
//! definitions and secrets) that use a flat/nested key-value shape with
//! two-space indentation. This module parses that subset with a
//! recursive-descent parser over an explicit grammar:
//!
//! ```text
//! document := entry*
//! entry    := KEY ':' scalar          (scalar entry)
//!           | KEY ':'                 (block or list opener)
//!           | '-' item                (list element)
//! block    := entries indented one level deeper than the opener
//! item     := scalar | KEY ':' scalar (single-entry mapping)
//! scalar   := quoted | bool | int | float | bare string
//! ```
//!
//! Comments (first non-space character `#`) and blank lines are skipped.
//! Values `~`, `null`, or nothing after the colon open a nested block;
//! an opener with no deeper lines yields an empty block.
//!
//! Malformed lines and surprising indentation are handled according to a
//! [`Strictness`] level: [`Strictness::Lenient`] (the default) skips them
//! and records a [`ParseWarning`], preserving the tolerant behavior the
//! bridge has always had with device-originated configuration, while
//! [`Strictness::Strict`] turns them into [`DocumentError`]s.

use crate::error::DocumentError;

/// A scalar leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Scalar {
    /// Render the scalar the way it would be written back to a document.
    pub fn to_display_string(&self) -> String {
        match self {
            Scalar::Str(s) => s.clone(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

/// A node in the parsed document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Block(Block),
    List(Vec<Node>),
}

impl Node {
    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Node::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar rendered as a string, if this node is a scalar.
    pub fn as_str(&self) -> Option<String> {
        self.as_scalar().map(Scalar::to_display_string)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.as_scalar()? {
            Scalar::Int(n) => Some(*n),
            Scalar::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_scalar()? {
            Scalar::Bool(b) => Some(*b),
            Scalar::Str(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// An ordered mapping of keys to nodes.
///
/// Insertion order is preserved: device iteration order is load-bearing for
/// channel matching, so the tree must not reorder entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    entries: Vec<(String, Node)>,
}

impl Block {
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How the parser reacts to malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Skip malformed lines and odd indentation, recording a warning.
    #[default]
    Lenient,
    /// Fail on the first malformed line or indentation error.
    Strict,
}

/// A non-fatal observation made while parsing in lenient mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based source line number.
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// A parsed document: the root block plus any lenient-mode warnings.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub root: Block,
    pub warnings: Vec<ParseWarning>,
}

/// Parse a document from raw text.
pub fn parse(text: &str, strictness: Strictness) -> Result<Document, DocumentError> {
    let mut warnings = Vec::new();
    let lines = scan_lines(text, strictness, &mut warnings)?;
    let mut parser = Parser {
        lines,
        pos: 0,
        strictness,
        warnings,
    };
    let mut root = Block::default();
    loop {
        let block = parser.parse_block(0)?;
        root.entries.extend(block.entries);
        // A list element at the root has no entry to belong to.
        match parser.peek_line() {
            None => break,
            Some((number, _, _)) => {
                parser.skip_line(number, "list element outside any entry".into())?;
            }
        }
    }
    Ok(Document {
        root,
        warnings: parser.warnings,
    })
}

#[derive(Debug)]
struct Line<'a> {
    number: usize,
    level: usize,
    content: &'a str,
}

fn scan_lines<'a>(
    text: &'a str,
    strictness: Strictness,
    warnings: &mut Vec<ParseWarning>,
) -> Result<Vec<Line<'a>>, DocumentError> {
    let mut lines = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let number = index + 1;
        let indent = raw.len() - raw.trim_start_matches(' ').len();
        let content = raw[indent..].trim_end();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }
        if content.starts_with('\t') {
            match strictness {
                Strictness::Lenient => {
                    warnings.push(ParseWarning {
                        line: number,
                        message: "tab indentation is not supported, line skipped".into(),
                    });
                    continue;
                }
                Strictness::Strict => return Err(DocumentError::BadIndent { line: number }),
            }
        }
        if indent % 2 != 0 {
            match strictness {
                Strictness::Lenient => warnings.push(ParseWarning {
                    line: number,
                    message: format!("odd indentation of {indent} spaces, rounded down"),
                }),
                Strictness::Strict => return Err(DocumentError::BadIndent { line: number }),
            }
        }
        lines.push(Line {
            number,
            level: indent / 2,
            content,
        });
    }
    Ok(lines)
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
    strictness: Strictness,
    warnings: Vec<ParseWarning>,
}

impl<'a> Parser<'a> {
    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_line(&mut self, number: usize, message: String) -> Result<(), DocumentError> {
        match self.strictness {
            Strictness::Lenient => {
                self.warnings.push(ParseWarning {
                    line: number,
                    message,
                });
                self.advance();
                Ok(())
            }
            Strictness::Strict => Err(DocumentError::MalformedEntry { line: number }),
        }
    }

    /// The next line as copied-out (number, level, content) fields.
    fn peek_line(&self) -> Option<(usize, usize, &'a str)> {
        self.lines
            .get(self.pos)
            .map(|line| (line.number, line.level, line.content))
    }

    fn parse_block(&mut self, level: usize) -> Result<Block, DocumentError> {
        let mut entries = Vec::new();
        while let Some((number, line_level, content)) = self.peek_line() {
            if line_level < level {
                break;
            }
            if line_level > level {
                match self.strictness {
                    Strictness::Lenient => {
                        self.warnings.push(ParseWarning {
                            line: number,
                            message: "unexpected deeper indentation, line skipped".into(),
                        });
                        self.advance();
                        continue;
                    }
                    Strictness::Strict => {
                        return Err(DocumentError::UnexpectedIndent { line: number })
                    }
                }
            }
            if is_list_item(content) {
                // A list element where a keyed entry is expected belongs to
                // the parent's list opener, never to this block.
                break;
            }
            let Some((raw_key, raw_value)) = content.split_once(':') else {
                self.skip_line(number, "entry has no key separator".into())?;
                continue;
            };
            let key = strip_quotes(raw_key.trim()).to_string();
            if key.is_empty() {
                self.skip_line(number, "entry has an empty key".into())?;
                continue;
            }
            let raw_value = raw_value.trim();
            self.advance();
            let node = if is_block_opener(raw_value) {
                self.parse_children(level)?
            } else {
                Node::Scalar(parse_scalar(raw_value))
            };
            entries.push((key, node));
        }
        Ok(Block { entries })
    }

    /// Parse whatever follows a block opener: a list, a nested block, or
    /// nothing at all (an empty block).
    fn parse_children(&mut self, level: usize) -> Result<Node, DocumentError> {
        let child = match self.peek_line() {
            Some((_, line_level, content)) if line_level > level => {
                Some((line_level, is_list_item(content)))
            }
            _ => None,
        };
        match child {
            Some((child_level, true)) => Ok(Node::List(self.parse_list(child_level)?)),
            Some(_) => Ok(Node::Block(self.parse_block(level + 1)?)),
            None => Ok(Node::Block(Block::default())),
        }
    }

    fn parse_list(&mut self, level: usize) -> Result<Vec<Node>, DocumentError> {
        let mut items = Vec::new();
        while let Some((_, line_level, content)) = self.peek_line() {
            if line_level != level || !is_list_item(content) {
                break;
            }
            let body = content.trim_start_matches('-').trim();
            self.advance();
            if body.is_empty() {
                items.push(Node::Block(Block::default()));
            } else if let Some((raw_key, raw_value)) = body.split_once(':') {
                let key = strip_quotes(raw_key.trim()).to_string();
                let value = Node::Scalar(parse_scalar(raw_value.trim()));
                items.push(Node::Block(Block {
                    entries: vec![(key, value)],
                }));
            } else {
                items.push(Node::Scalar(parse_scalar(body)));
            }
        }
        Ok(items)
    }
}

fn is_block_opener(raw_value: &str) -> bool {
    raw_value.is_empty() || raw_value == "~" || raw_value == "null"
}

fn is_list_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

fn strip_quotes(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

fn parse_scalar(raw: &str) -> Scalar {
    let stripped = strip_quotes(raw);
    if stripped.len() != raw.len() {
        // Quoted values stay strings regardless of their shape.
        return Scalar::Str(stripped.to_string());
    }
    match raw {
        "true" => return Scalar::Bool(true),
        "false" => return Scalar::Bool(false),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Scalar::Int(n);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Scalar::Float(f);
    }
    Scalar::Str(raw.to_string())
}
