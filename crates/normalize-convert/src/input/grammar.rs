//! Tree-sitter backed parser service.
//!
//! Lifts a concrete syntax tree into a [`SourceTree`] of named nodes.
//! Comment nodes are not kept as children: a comment on the same row as
//! the end of the previous sibling trails that sibling, any other comment
//! leads the next one. A gap of one or more empty rows between siblings
//! becomes a blank-line trivia on the later sibling.

use crate::error::ParseError;
use crate::source::{Role, SourceNode, SourceParser, SourceTree, Span, Trivia, TriviaKind};
use tree_sitter::{Language, Node, Parser};

pub struct TreeSitterParser {
    language: &'static str,
    grammar: Language,
    comment_prefix: &'static str,
    header_fields: &'static [&'static str],
}

impl TreeSitterParser {
    pub fn new(language: &'static str, grammar: Language, comment_prefix: &'static str) -> Self {
        Self {
            language,
            grammar,
            comment_prefix,
            header_fields: &[],
        }
    }

    /// Fields whose child is a header clause of its parent block.
    pub fn with_header_fields(mut self, fields: &'static [&'static str]) -> Self {
        self.header_fields = fields;
        self
    }
}

impl SourceParser for TreeSitterParser {
    fn language(&self) -> &'static str {
        self.language
    }

    fn parse(&self, text: &str) -> Result<SourceTree, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar)
            .map_err(|err| ParseError::Parse(err.to_string()))?;

        let tree = parser
            .parse(text, None)
            .ok_or_else(|| ParseError::Parse("failed to parse".into()))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(ParseError::Parse("syntax error in source".into()));
        }

        let lift = Lift {
            source: text,
            comment_prefix: self.comment_prefix,
            header_fields: self.header_fields,
        };
        Ok(SourceTree::new(text, lift.node(root)))
    }
}

/// Parser for Python source.
#[cfg(feature = "read-python")]
pub fn python_parser() -> TreeSitterParser {
    TreeSitterParser::new("python", arborium_python::language().into(), "#")
        .with_header_fields(&["superclasses"])
}

struct Lift<'a> {
    source: &'a str,
    comment_prefix: &'static str,
    header_fields: &'static [&'static str],
}

impl Lift<'_> {
    fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn node(&self, node: Node) -> SourceNode {
        let text = match node.child_by_field_name("name") {
            Some(name) => self.node_text(name),
            None if node.named_child_count() == 0 => self.node_text(node),
            None => "",
        };
        let mut out = SourceNode::new(node.kind(), Span::new(node.start_byte(), node.end_byte()))
            .with_text(text);

        let mut pending: Vec<Trivia> = Vec::new();
        let mut last_row: Option<usize> = None;
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                if child.is_named() {
                    let start_row = child.start_position().row;
                    if last_row.is_some_and(|row| start_row > row + 1) {
                        pending.push(Trivia::blank_line());
                    }

                    if child.kind() == "comment" {
                        let comment = Trivia::comment(self.comment_body(child));
                        match out.children.last_mut() {
                            Some(prev) if last_row == Some(start_row) && pending.is_empty() => {
                                prev.trailing.push(comment)
                            }
                            _ => pending.push(comment),
                        }
                    } else {
                        let role = match cursor.field_name() {
                            Some(field) if self.header_fields.contains(&field) => Role::Header,
                            _ => Role::Item,
                        };
                        let mut lifted = self.node(child).with_role(role);
                        lifted.leading = std::mem::take(&mut pending);
                        out.children.push(lifted);
                    }
                    last_row = Some(child.end_position().row);
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }

        // Comments after the last child stay with it
        pending.retain(|t| t.kind == TriviaKind::Comment);
        match out.children.last_mut() {
            Some(last) => last.trailing.append(&mut pending),
            None => out.trailing.append(&mut pending),
        }
        out
    }

    fn comment_body(&self, node: Node) -> String {
        let text = self.node_text(node);
        let body = text.strip_prefix(self.comment_prefix).unwrap_or(text);
        body.strip_prefix(' ').unwrap_or(body).trim_end().to_string()
    }
}
