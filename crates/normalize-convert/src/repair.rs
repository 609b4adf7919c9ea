//! Target-semantics repair pass.
//!
//! Some argument-passing modes can only be decided once the produced tree
//! exists: a source call `Swap(a, b)` must become `Swap(ref a, ref b)` when
//! the resolved target declares its parameters by reference. This pass
//! resolves each call against [`Bindings`] and rewrites argument markers to
//! match the single candidate with a matching argument count.
//!
//! Calls with no unique candidate, and calls using named arguments, are
//! left alone. Running the pass on its own output changes nothing.

use crate::error::ConvertError;
use crate::symbols::{Bindings, Signature, SymbolResolver};
use crate::target::{Argument, Expr, Member, MemberKind, PassMode, TargetFile};
use tracing::trace;

/// What one repair run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairReport {
    /// Arguments whose marker was rewritten.
    pub rewritten: usize,
    /// Calls with no candidate of matching arity.
    pub unresolved: Vec<ConvertError>,
    /// Calls with more than one candidate of matching arity.
    pub ambiguous: usize,
    /// Calls skipped because they use named arguments.
    pub skipped_named: usize,
}

pub fn repair_call_arguments(file: &mut TargetFile, bindings: &Bindings) -> RepairReport {
    let mut report = RepairReport::default();
    file.for_each_expr_mut(&mut |expr| repair_expr(expr, bindings, &mut report));
    report
}

fn repair_expr(expr: &mut Expr, bindings: &Bindings, report: &mut RepairReport) {
    match expr {
        Expr::Call { callee, args } => {
            repair_expr(callee, bindings, report);
            for arg in args.iter_mut() {
                repair_expr(&mut arg.value, bindings, report);
            }
            if let Some(path) = callee.path() {
                repair_site(&path, args, bindings, report);
            }
        }
        Expr::New { ty, args } => {
            for arg in args.iter_mut() {
                repair_expr(&mut arg.value, bindings, report);
            }
            repair_site(ty, args, bindings, report);
        }
        Expr::Member { object, .. } => repair_expr(object, bindings, report),
        Expr::Index { object, index } => {
            repair_expr(object, bindings, report);
            repair_expr(index, bindings, report);
        }
        Expr::Binary { left, right, .. } => {
            repair_expr(left, bindings, report);
            repair_expr(right, bindings, report);
        }
        Expr::Unary { operand, .. } => repair_expr(operand, bindings, report),
        Expr::Assign { target, value } => {
            repair_expr(target, bindings, report);
            repair_expr(value, bindings, report);
        }
        Expr::Ident(_) | Expr::Literal(_) | Expr::Default(_) => {}
    }
}

fn repair_site(callee: &str, args: &mut [Argument], bindings: &Bindings, report: &mut RepairReport) {
    if args.iter().any(|a| a.name.is_some()) {
        report.skipped_named += 1;
        return;
    }

    let matching: Vec<&Signature> = candidates(callee, bindings)
        .iter()
        .filter(|s| s.params.len() == args.len())
        .collect();
    let signature = match matching.as_slice() {
        [only] => *only,
        [] => {
            trace!(callee, "no candidate");
            report.unresolved.push(ConvertError::UnresolvedRepairSymbol {
                callee: callee.to_string(),
            });
            return;
        }
        _ => {
            trace!(callee, candidates = matching.len(), "ambiguous call");
            report.ambiguous += 1;
            return;
        }
    };

    for (position, (arg, mode)) in args.iter_mut().zip(&signature.params).enumerate() {
        if arg.mode == *mode {
            continue;
        }
        if *mode != PassMode::Value && !arg.value.is_assignable() {
            trace!(callee, position, "by-ref argument is not assignable; left as is");
            continue;
        }
        trace!(callee, position, from = ?arg.mode, to = ?mode, "rewriting argument");
        arg.mode = *mode;
        report.rewritten += 1;
    }
}

/// Exact path first, then the path without `this.`/`base.`. A qualified
/// call is never matched on its last segment alone: the receiver may be an
/// unrelated type that merely shares the routine name.
fn candidates<'b>(callee: &str, bindings: &'b Bindings) -> &'b [Signature] {
    let found = bindings.candidates(callee);
    if !found.is_empty() {
        return found;
    }
    match callee
        .strip_prefix("this.")
        .or_else(|| callee.strip_prefix("base."))
    {
        Some(stripped) => bindings.candidates(stripped),
        None => found,
    }
}

// ============================================================================
// Built-in resolver
// ============================================================================

/// Resolves calls against routines declared in the produced file itself.
///
/// Methods are indexed by simple name, by `Type.Name` and, for nested
/// types, by the fully qualified `Outer.Type.Name`; constructors by their
/// type's simple and qualified names.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredSymbols;

impl SymbolResolver for DeclaredSymbols {
    fn resolve_symbols(&self, file: &TargetFile) -> Bindings {
        let mut bindings = Bindings::new();
        index_members(&file.members, None, &mut bindings);
        bindings
    }
}

fn index_members(members: &[Member], owner: Option<&str>, bindings: &mut Bindings) {
    for member in members {
        match &member.kind {
            MemberKind::Type(decl) => {
                let qualified = match owner {
                    Some(owner) => format!("{owner}.{}", decl.name),
                    None => decl.name.clone(),
                };
                index_members(&decl.members, Some(&qualified), bindings);
            }
            MemberKind::Routine(routine) => {
                let signature = Signature::new(
                    routine.name.clone(),
                    routine.params.iter().map(|p| p.mode).collect(),
                );
                if routine.is_constructor() {
                    if routine.is_static {
                        continue;
                    }
                    bindings.insert(routine.name.clone(), signature.clone());
                    if let Some(owner) = owner.filter(|o| *o != routine.name) {
                        bindings.insert(owner, signature);
                    }
                    continue;
                }
                bindings.insert(routine.name.clone(), signature.clone());
                if let Some(owner) = owner {
                    if let Some((_, simple)) = owner.rsplit_once('.') {
                        bindings.insert(format!("{simple}.{}", routine.name), signature.clone());
                    }
                    bindings.insert(format!("{owner}.{}", routine.name), signature);
                }
            }
            MemberKind::Import(_) | MemberKind::Field(_) | MemberKind::Placeholder => {}
        }
    }
}

/// Two resolvers consulted together; bindings from both are merged.
pub struct Chained<'a> {
    first: &'a dyn SymbolResolver,
    second: &'a dyn SymbolResolver,
}

impl<'a> Chained<'a> {
    pub fn new(first: &'a dyn SymbolResolver, second: &'a dyn SymbolResolver) -> Self {
        Self { first, second }
    }
}

impl SymbolResolver for Chained<'_> {
    fn resolve_symbols(&self, file: &TargetFile) -> Bindings {
        let mut bindings = self.first.resolve_symbols(file);
        bindings.merge(self.second.resolve_symbols(file));
        bindings
    }

    fn data_flow(&self) -> Option<&dyn crate::symbols::DataFlowAnalysis> {
        self.first.data_flow().or_else(|| self.second.data_flow())
    }
}
