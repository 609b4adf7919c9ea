//! Source-side syntax trees.
//!
//! A parser service hands the converter a [`SourceTree`]: positioned,
//! immutable nodes with formatting trivia already split off into
//! leading/trailing runs. The grammar itself is opaque here; nodes carry
//! a free-form `kind` that only the rule table interprets.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte range into the original source text.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Preorder index of a node within its tree. Assigned by [`SourceTree::new`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(pub u32);

/// Where a piece of trivia may end up on the produced tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Never carried (the target printer regenerates it).
    None,
    /// Carried only onto the target produced for this exact node.
    #[default]
    SubtreeOnly,
    /// Carried onto this node's target, or hoisted to the nearest carried ancestor.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriviaKind {
    /// Comment body, delimiters stripped.
    Comment,
    BlankLine,
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trivia {
    pub kind: TriviaKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub placement: Placement,
}

impl Trivia {
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            kind: TriviaKind::Comment,
            text: text.into(),
            placement: Placement::All,
        }
    }

    pub fn blank_line() -> Self {
        Self {
            kind: TriviaKind::BlankLine,
            text: String::new(),
            placement: Placement::SubtreeOnly,
        }
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Self {
            kind: TriviaKind::Whitespace,
            text: text.into(),
            placement: Placement::None,
        }
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Whether dropping this trivia loses visible formatting.
    pub fn is_significant(&self) -> bool {
        self.placement != Placement::None && self.kind != TriviaKind::Whitespace
    }
}

/// Position of a node inside a compound declaration block.
///
/// Header clauses (inheritance, implements) and end markers have no
/// one-to-one token in the target grammar; their trivia is ported to the
/// block's own anchor instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Item,
    Header,
    EndMarker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceNode {
    #[serde(default)]
    pub id: NodeId,
    pub kind: String,
    #[serde(default)]
    pub span: Span,
    #[serde(default)]
    pub role: Role,
    /// Token text for leaves, declared name for declarations.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub children: Vec<SourceNode>,
    #[serde(default)]
    pub leading: Vec<Trivia>,
    #[serde(default)]
    pub trailing: Vec<Trivia>,
}

impl SourceNode {
    pub fn new(kind: impl Into<String>, span: Span) -> Self {
        Self {
            id: NodeId::default(),
            kind: kind.into(),
            span,
            role: Role::Item,
            text: String::new(),
            children: Vec::new(),
            leading: Vec::new(),
            trailing: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_child(mut self, child: SourceNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = SourceNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_leading(mut self, trivia: Trivia) -> Self {
        self.leading.push(trivia);
        self
    }

    pub fn with_trailing(mut self, trivia: Trivia) -> Self {
        self.trailing.push(trivia);
        self
    }

    pub fn child(&self, kind: &str) -> Option<&SourceNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    pub fn children_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a SourceNode> + 'a {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Children playing the [`Role::Item`] role, in order.
    pub fn items(&self) -> impl Iterator<Item = &SourceNode> {
        self.children.iter().filter(|c| c.role == Role::Item)
    }

    /// Strict descendants in preorder.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    fn number(&mut self, next: &mut u32) {
        self.id = NodeId(*next);
        *next += 1;
        for child in &mut self.children {
            child.number(next);
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a SourceNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SourceNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A parsed source file: the text plus its root node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTree {
    pub text: String,
    pub root: SourceNode,
}

impl SourceTree {
    /// Build a tree, assigning preorder [`NodeId`]s.
    pub fn new(text: impl Into<String>, mut root: SourceNode) -> Self {
        let mut next = 0;
        root.number(&mut next);
        Self {
            text: text.into(),
            root,
        }
    }

    /// Load a tree produced by an out-of-process parser.
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let tree: SourceTree =
            serde_json::from_str(json).map_err(|err| ParseError::Parse(err.to_string()))?;
        Ok(Self::new(tree.text, tree.root))
    }

    /// Source text covered by `span`, or "" when out of range.
    pub fn snippet(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or("")
    }
}

/// The parser service consumed by the pipeline.
pub trait SourceParser: Send + Sync {
    /// Language identifier (e.g., "python").
    fn language(&self) -> &'static str;

    /// Parse source text into a [`SourceTree`].
    fn parse(&self, text: &str) -> Result<SourceTree, ParseError>;
}
