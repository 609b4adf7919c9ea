//! Scope finalizer: splices hoisted initializers into constructors.
//!
//! Runs once per type, after all of its members are converted. For each
//! storage class with pending initializers, every root constructor (one
//! that does not chain to a sibling via `this(...)`) gets the assignments
//! prepended in registration order; a type without one gets an empty
//! constructor synthesized. Touched constructors move to the front of the
//! member list, statics first.

use crate::error::ConvertError;
use crate::source::Span;
use crate::synthesis::{PendingInitializerSet, TypeInitializers};
use crate::target::{Expr, Member, MemberKind, Routine, Statement};
use tracing::debug;

pub fn finalize_type(
    members: Vec<Member>,
    pending: TypeInitializers,
) -> Result<Vec<Member>, ConvertError> {
    let mut rest = members;
    let mut front = Vec::new();

    for is_static in [true, false] {
        let set = pending.set(is_static);
        if set.is_empty() {
            continue;
        }

        let (roots, others): (Vec<Member>, Vec<Member>) = rest
            .into_iter()
            .partition(|m| is_root_constructor(m, is_static));
        rest = others;

        let roots = if roots.is_empty() {
            debug!(owner = %pending.owner, is_static, "synthesizing constructor");
            vec![Member::from(Routine::constructor(
                simple_name(&pending.owner),
                is_static,
            ))]
        } else {
            roots
        };

        for mut root in roots {
            let routine_span = root.meta.provenance.as_ref().map(|p| p.span);
            if let MemberKind::Routine(routine) = &mut root.kind {
                inject(&pending.owner, routine, routine_span, set)?;
            }
            front.push(root);
        }
    }

    front.extend(rest);
    Ok(front)
}

fn is_root_constructor(member: &Member, is_static: bool) -> bool {
    member
        .as_routine()
        .is_some_and(|r| r.is_constructor() && r.is_static == is_static && !r.is_chaining())
}

fn inject(
    owner: &str,
    routine: &mut Routine,
    routine_span: Option<Span>,
    set: &PendingInitializerSet,
) -> Result<(), ConvertError> {
    let locals = Statement::declared_locals(&routine.body);
    let mut assignments = Vec::with_capacity(set.len());

    for (_, pending) in set.iter() {
        let init_span = pending.origin.as_ref().map(|p| p.span);
        let clash = routine
            .params
            .iter()
            .any(|p| p.name == pending.member)
            .then_some(routine_span)
            .or_else(|| {
                locals
                    .iter()
                    .find(|(name, _)| *name == pending.member)
                    .map(|(_, span)| *span)
            });
        if let Some(existing_span) = clash {
            return Err(ConvertError::InitializerCollision {
                owner: owner.to_string(),
                member: pending.member.clone(),
                routine: routine.describe(),
                init_span,
                existing_span,
            });
        }

        let mut stmt = Statement::assign(Expr::ident(&pending.member), pending.init.clone());
        stmt.meta.provenance = pending.origin.clone();
        assignments.push(stmt);
    }

    assignments.append(&mut routine.body);
    routine.body = assignments;
    Ok(())
}

fn simple_name(owner: &str) -> &str {
    owner.rsplit('.').next().unwrap_or(owner)
}
