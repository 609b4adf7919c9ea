//! Diagnostic markers for constructs that failed to convert.

use crate::source::{SourceNode, SourceTree, Span};
use crate::target::TargetTrivia;
use serde::Serialize;
use std::fmt;

const SNIPPET_LINES: usize = 3;

/// Category of target node a converter was asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Member,
    Statement,
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeCategory::Member => "member",
            NodeCategory::Statement => "statement",
        })
    }
}

/// A conversion failure that was downgraded to a placeholder.
///
/// Markers are rendered into the tree as trailing comments on the
/// placeholder and also returned to the caller, in conversion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticMarker {
    pub span: Span,
    pub kind: String,
    pub category: NodeCategory,
    pub message: String,
    pub snippet: String,
}

impl DiagnosticMarker {
    pub fn new(
        tree: &SourceTree,
        node: &SourceNode,
        category: NodeCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            span: node.span,
            kind: node.kind.clone(),
            category,
            message: message.into(),
            snippet: tree.snippet(node.span).to_string(),
        }
    }

    /// Comment lines rendered after the placeholder.
    pub fn comment_trivia(&self) -> Vec<TargetTrivia> {
        let mut out = vec![TargetTrivia::Comment(format!(
            "Cannot convert {} '{}' ({}): {}",
            self.category, self.kind, self.span, self.message
        ))];

        let lines: Vec<&str> = self
            .snippet
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();
        for line in lines.iter().take(SNIPPET_LINES) {
            out.push(TargetTrivia::Comment(format!("| {line}")));
        }
        if lines.len() > SNIPPET_LINES {
            out.push(TargetTrivia::Comment("| ...".to_string()));
        }
        out
    }
}

/// A declaring unit that hit a unit-fatal error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitFailure {
    /// Declared name of the unit, or its kind when anonymous.
    pub unit: String,
    pub span: Span,
    pub reason: String,
}

impl UnitFailure {
    pub fn comment_trivia(&self) -> Vec<TargetTrivia> {
        vec![TargetTrivia::Comment(format!(
            "Conversion of '{}' ({}) failed: {}",
            self.unit, self.span, self.reason
        ))]
    }
}
