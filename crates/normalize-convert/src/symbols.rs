//! Symbol-resolution service interface.
//!
//! The converter never resolves symbols itself. The repair pass asks a
//! [`SymbolResolver`] for [`Bindings`] of the produced tree; the rule table
//! may consult an optional [`DataFlowAnalysis`] capability, resolved once
//! per run, to skip initializers that are provably unnecessary.

use crate::source::Span;
use crate::target::{PassMode, TargetFile};
use std::collections::{BTreeSet, HashMap};

/// Formal parameter modes of one callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<PassMode>,
}

impl Signature {
    pub fn new(name: impl Into<String>, params: Vec<PassMode>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// Candidate signatures keyed by callee path (`Name` or `Type.Name`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    signatures: HashMap<String, Vec<Signature>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, callee: impl Into<String>, signature: Signature) {
        let list = self.signatures.entry(callee.into()).or_default();
        if !list.contains(&signature) {
            list.push(signature);
        }
    }

    /// Every known overload for `callee`.
    pub fn candidates(&self, callee: &str) -> &[Signature] {
        self.signatures
            .get(callee)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn merge(&mut self, other: Bindings) {
        for (callee, list) in other.signatures {
            for signature in list {
                self.insert(callee.clone(), signature);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// Result of a data-flow query over a source range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataFlow {
    pub always_assigned: BTreeSet<String>,
    pub read_inside: BTreeSet<String>,
    pub written_inside: BTreeSet<String>,
}

pub trait DataFlowAnalysis: Send + Sync {
    /// `None` when the range cannot be analyzed.
    fn analyze_data_flow(&self, range: Span) -> Option<DataFlow>;
}

/// External symbol-resolution service; shared read-only across units.
pub trait SymbolResolver: Send + Sync {
    /// Best-effort bindings for a produced tree. Unknown callees are simply absent.
    fn resolve_symbols(&self, file: &TargetFile) -> Bindings;

    /// Optional data-flow capability.
    fn data_flow(&self) -> Option<&dyn DataFlowAnalysis> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_dedup_and_merge() {
        let mut a = Bindings::new();
        a.insert("Swap", Signature::new("Swap", vec![PassMode::Ref, PassMode::Ref]));
        a.insert("Swap", Signature::new("Swap", vec![PassMode::Ref, PassMode::Ref]));
        let mut b = Bindings::new();
        b.insert("Swap", Signature::new("Swap", vec![PassMode::Value]));
        a.merge(b);

        assert_eq!(a.candidates("Swap").len(), 2);
        assert!(a.candidates("Missing").is_empty());
    }
}
