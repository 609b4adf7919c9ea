//! Error-isolating decorator around the rule table.
//!
//! Every member and statement conversion goes through [`ConvertContext::isolate`].
//! A failed conversion is downgraded, once, to a placeholder of the same
//! category with a [`DiagnosticMarker`] attached, so siblings and ancestors
//! keep converting. Unit-fatal errors are passed through untouched.

use crate::context::ConvertContext;
use crate::diagnostics::{DiagnosticMarker, NodeCategory};
use crate::error::ConvertError;
use crate::source::{SourceNode, Span};
use crate::trivia::Carried;
use tracing::debug;

/// Result of converting one node.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome<T> {
    Converted(T),
    Failed {
        kind: String,
        span: Span,
        error: ConvertError,
    },
}

impl<T> ConversionOutcome<T> {
    pub fn from_result(node: &SourceNode, result: Result<T, ConvertError>) -> Self {
        match result {
            Ok(value) => ConversionOutcome::Converted(value),
            Err(error) => ConversionOutcome::Failed {
                kind: node.kind.clone(),
                span: node.span,
                error,
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ConversionOutcome::Failed { .. })
    }
}

impl ConvertContext<'_> {
    pub(crate) fn isolate<T: Carried>(
        &mut self,
        node: &SourceNode,
        category: NodeCategory,
        convert: impl FnOnce(&mut Self, &SourceNode) -> Result<Vec<T>, ConvertError>,
    ) -> Result<Vec<T>, ConvertError> {
        let checkpoint = self.checkpoint();
        let outcome = ConversionOutcome::from_result(node, convert(self, node));

        let error = match outcome {
            ConversionOutcome::Converted(mut produced) => {
                self.carrier.attach(node, &mut produced);
                return Ok(produced);
            }
            ConversionOutcome::Failed { error, .. } if error.is_unit_fatal() => {
                return Err(error);
            }
            ConversionOutcome::Failed { error, .. } => error,
        };

        // Nothing from the failed attempt survives
        self.restore(checkpoint);
        debug!(kind = %node.kind, span = %node.span, %error, "downgraded to placeholder");

        let marker = DiagnosticMarker::new(self.tree(), node, category, error.to_string());
        let mut placeholder = vec![T::placeholder()];
        self.carrier.attach_placeholder(node, &mut placeholder);
        placeholder[0]
            .meta_mut()
            .trailing
            .extend(marker.comment_trivia());
        self.markers.push(marker);
        Ok(placeholder)
    }
}
