//! The per-node rule table: the single extension point the pipeline wraps.

use crate::context::ConvertContext;
use crate::error::ConvertError;
use crate::source::SourceNode;
use crate::target::{Expr, Member, Statement};

/// Maps source constructs to target constructs, one node at a time.
///
/// Implementations recurse through the [`ConvertContext`] (`cx.members`,
/// `cx.statements`, `cx.expr`, `cx.type_body`) rather than calling
/// themselves, so every statement and member boundary is isolated and
/// carries its trivia. Returning `Err` from a member or statement rule
/// replaces just that node with a placeholder; an expression error fails
/// the enclosing statement.
pub trait RuleTable: Send + Sync {
    /// Convert a declaration-level node (import, type, field, routine).
    /// May produce zero or several members.
    fn convert_member(
        &self,
        node: &SourceNode,
        cx: &mut ConvertContext<'_>,
    ) -> Result<Vec<Member>, ConvertError>;

    /// Convert a statement. May produce zero or several statements.
    fn convert_statement(
        &self,
        node: &SourceNode,
        cx: &mut ConvertContext<'_>,
    ) -> Result<Vec<Statement>, ConvertError>;

    fn convert_expr(
        &self,
        node: &SourceNode,
        cx: &mut ConvertContext<'_>,
    ) -> Result<Expr, ConvertError>;
}
