//! Structural equality for target trees.
//!
//! `structure_eq` compares target trees ignoring [`NodeMeta`](super::NodeMeta)
//! and closing trivia: provenance links and carried comments/blank lines are
//! surface hints that passes such as formatting are allowed to change.
//!
//! # Core Fields (must match exactly)
//!
//! - All names, modifiers, pass modes
//! - Statement and member structure
//! - Expression trees

use super::{Member, MemberKind, Statement, StmtKind, TargetFile, TypeDecl};

/// Trait for structural equality comparison.
///
/// Unlike `PartialEq`, this ignores metadata that does not affect the
/// produced program.
pub trait StructureEq {
    /// Compare two values for structural equality.
    fn structure_eq(&self, other: &Self) -> bool;
}

impl StructureEq for TargetFile {
    fn structure_eq(&self, other: &Self) -> bool {
        vec_structure_eq(&self.members, &other.members)
    }
}

impl StructureEq for Member {
    fn structure_eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (MemberKind::Type(a), MemberKind::Type(b)) => a.structure_eq(b),
            (MemberKind::Routine(a), MemberKind::Routine(b)) => {
                a.kind == b.kind
                    && a.name == b.name
                    && a.is_static == b.is_static
                    && a.visibility == b.visibility
                    && a.return_type == b.return_type
                    && a.params == b.params
                    && a.chain == b.chain
                    && vec_structure_eq(&a.body, &b.body)
            }
            // Fields, imports and placeholders carry no metadata below the member
            (a, b) => a == b,
        }
    }
}

impl StructureEq for TypeDecl {
    fn structure_eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.visibility == other.visibility
            && self.bases == other.bases
            && vec_structure_eq(&self.members, &other.members)
    }
}

impl StructureEq for Statement {
    fn structure_eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (
                StmtKind::If {
                    test: t1,
                    then: c1,
                    otherwise: a1,
                },
                StmtKind::If {
                    test: t2,
                    then: c2,
                    otherwise: a2,
                },
            ) => {
                t1 == t2
                    && vec_structure_eq(c1, c2)
                    && match (a1, a2) {
                        (None, None) => true,
                        (Some(a), Some(b)) => vec_structure_eq(a, b),
                        _ => false,
                    }
            }

            (StmtKind::While { test: t1, body: b1 }, StmtKind::While { test: t2, body: b2 }) => {
                t1 == t2 && vec_structure_eq(b1, b2)
            }

            (StmtKind::Block(a), StmtKind::Block(b)) => vec_structure_eq(a, b),

            (a, b) => a == b,
        }
    }
}

fn vec_structure_eq<T: StructureEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structure_eq(y))
}
