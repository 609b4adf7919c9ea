//! Scoped synthesis pools.
//!
//! [`AdditionalLocals`] holds temporaries a statement needs declared just
//! before it. [`AdditionalInitializers`] holds member initializers that must
//! run at the start of the owning type's constructors, because the target
//! cannot evaluate them in place.
//!
//! Both are stacks of scopes bracketed by the converter; neither is safe to
//! share between two in-flight conversions.

use crate::error::ConvertError;
use crate::target::{Expr, Provenance};
use indexmap::IndexMap;

// ============================================================================
// Temporaries
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Temporary {
    pub id: String,
    pub prefix: String,
    pub init: Expr,
    declared: bool,
}

#[derive(Debug, Default)]
struct LocalScope {
    entries: IndexMap<String, Temporary>,
}

/// Position in the active scope, used to find temporaries registered
/// after it and to roll back a failed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalsMark {
    depth: usize,
    len: usize,
}

#[derive(Debug)]
pub struct AdditionalLocals {
    scopes: Vec<LocalScope>,
    next_id: u64,
    separator: String,
}

impl Default for AdditionalLocals {
    fn default() -> Self {
        Self::new("_")
    }
}

impl AdditionalLocals {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            scopes: Vec::new(),
            next_id: 0,
            separator: separator.into(),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(LocalScope::default());
    }

    /// Pop the active scope, returning what it held.
    pub fn pop_scope(&mut self) -> Vec<Temporary> {
        self.scopes
            .pop()
            .map(|scope| scope.entries.into_values().collect())
            .unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Register a temporary in the active scope.
    ///
    /// The returned id is unique for the lifetime of this pool, independent
    /// of scope and content.
    pub fn add_temporary(
        &mut self,
        prefix: &str,
        init: Expr,
    ) -> Result<String, ConvertError> {
        let id = format!("{prefix}{}{}", self.separator, self.next_id);
        let scope = self
            .scopes
            .last_mut()
            .ok_or_else(|| ConvertError::ScopeViolation { id: id.clone() })?;
        self.next_id += 1;
        scope.entries.insert(
            id.clone(),
            Temporary {
                id: id.clone(),
                prefix: prefix.to_string(),
                init,
                declared: false,
            },
        );
        Ok(id)
    }

    /// Look up a temporary registered in the active scope (ancestors do not count).
    pub fn lookup(&self, id: &str) -> Result<&Temporary, ConvertError> {
        self.scopes
            .last()
            .and_then(|scope| scope.entries.get(id))
            .ok_or_else(|| ConvertError::ScopeViolation { id: id.to_string() })
    }

    pub fn mark(&self) -> LocalsMark {
        LocalsMark {
            depth: self.scopes.len(),
            len: self.scopes.last().map_or(0, |s| s.entries.len()),
        }
    }

    /// Temporaries registered since `mark` that no inner statement declared yet.
    /// They stay visible to `lookup` until the scope pops.
    pub fn take_undeclared_since(&mut self, mark: LocalsMark) -> Vec<Temporary> {
        let Some(scope) = self.active_at(mark) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (_, temp) in scope.entries.iter_mut().skip(mark.len) {
            if !temp.declared {
                temp.declared = true;
                out.push(temp.clone());
            }
        }
        out
    }

    /// Forget temporaries registered since `mark`.
    pub fn rollback(&mut self, mark: LocalsMark) {
        if let Some(scope) = self.active_at(mark) {
            scope.entries.truncate(mark.len);
        }
    }

    fn active_at(&mut self, mark: LocalsMark) -> Option<&mut LocalScope> {
        if self.scopes.len() != mark.depth {
            return None;
        }
        self.scopes.last_mut()
    }
}

// ============================================================================
// Hoisted initializers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PendingInitializer {
    /// Unqualified member name, the assignment target.
    pub member: String,
    pub init: Expr,
    pub origin: Option<Provenance>,
}

/// Initializers keyed by qualified member name, in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingInitializerSet {
    entries: IndexMap<String, PendingInitializer>,
}

impl PendingInitializerSet {
    /// Last write for a name wins; the first registration keeps its position.
    pub fn insert(&mut self, qualified: impl Into<String>, pending: PendingInitializer) {
        self.entries.insert(qualified.into(), pending);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PendingInitializer)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }
}

/// Pending initializers for one owning type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInitializers {
    pub owner: String,
    pub statics: PendingInitializerSet,
    pub instance: PendingInitializerSet,
}

impl TypeInitializers {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            statics: PendingInitializerSet::default(),
            instance: PendingInitializerSet::default(),
        }
    }

    pub fn set(&self, is_static: bool) -> &PendingInitializerSet {
        if is_static {
            &self.statics
        } else {
            &self.instance
        }
    }

    fn set_mut(&mut self, is_static: bool) -> &mut PendingInitializerSet {
        if is_static {
            &mut self.statics
        } else {
            &mut self.instance
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializersMark {
    depth: usize,
    statics: usize,
    instance: usize,
}

#[derive(Debug, Default)]
pub struct AdditionalInitializers {
    scopes: Vec<TypeInitializers>,
}

impl AdditionalInitializers {
    pub fn push_scope(&mut self, owner: impl Into<String>) {
        self.scopes.push(TypeInitializers::new(owner));
    }

    pub fn pop_scope(&mut self) -> Option<TypeInitializers> {
        self.scopes.pop()
    }

    /// Name of the type whose members are being converted.
    pub fn current_owner(&self) -> Option<&str> {
        self.scopes.last().map(|s| s.owner.as_str())
    }

    pub fn add_initializer(
        &mut self,
        qualified: &str,
        init: Expr,
        is_static: bool,
        origin: Option<Provenance>,
    ) -> Result<(), ConvertError> {
        let scope = self
            .scopes
            .last_mut()
            .ok_or_else(|| ConvertError::ScopeViolation {
                id: qualified.to_string(),
            })?;
        let member = qualified.rsplit('.').next().unwrap_or(qualified).to_string();
        scope.set_mut(is_static).insert(
            qualified,
            PendingInitializer {
                member,
                init,
                origin,
            },
        );
        Ok(())
    }

    pub fn mark(&self) -> InitializersMark {
        InitializersMark {
            depth: self.scopes.len(),
            statics: self.scopes.last().map_or(0, |s| s.statics.len()),
            instance: self.scopes.last().map_or(0, |s| s.instance.len()),
        }
    }

    pub fn rollback(&mut self, mark: InitializersMark) {
        if self.scopes.len() != mark.depth {
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.statics.truncate(mark.statics);
            scope.instance.truncate(mark.instance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_in_sibling_scope_fails() {
        let mut locals = AdditionalLocals::default();
        locals.push_scope();
        let id = locals.add_temporary("t", Expr::number("1")).unwrap();
        assert!(locals.lookup(&id).is_ok());
        locals.pop_scope();

        locals.push_scope();
        assert_eq!(
            locals.lookup(&id),
            Err(ConvertError::ScopeViolation { id: id.clone() })
        );
        locals.pop_scope();
    }

    #[test]
    fn test_ancestor_scope_not_visible() {
        let mut locals = AdditionalLocals::default();
        locals.push_scope();
        let id = locals.add_temporary("t", Expr::number("1")).unwrap();
        locals.push_scope();
        assert!(locals.lookup(&id).is_err());
        locals.pop_scope();
        assert!(locals.lookup(&id).is_ok());
    }

    #[test]
    fn test_ids_unique_across_scopes() {
        let mut locals = AdditionalLocals::default();
        locals.push_scope();
        let a = locals.add_temporary("t", Expr::number("1")).unwrap();
        locals.pop_scope();
        locals.push_scope();
        let b = locals.add_temporary("t", Expr::number("1")).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, "t_0");
        assert_eq!(b, "t_1");
    }

    #[test]
    fn test_add_without_scope_is_violation() {
        let mut locals = AdditionalLocals::default();
        assert!(matches!(
            locals.add_temporary("t", Expr::number("1")),
            Err(ConvertError::ScopeViolation { .. })
        ));
    }

    #[test]
    fn test_take_undeclared_skips_inner_declarations() {
        let mut locals = AdditionalLocals::default();
        locals.push_scope();
        let outer = locals.mark();
        locals.add_temporary("a", Expr::number("1")).unwrap();
        let inner = locals.mark();
        locals.add_temporary("b", Expr::number("2")).unwrap();

        let inner_temps = locals.take_undeclared_since(inner);
        assert_eq!(inner_temps.len(), 1);
        assert_eq!(inner_temps[0].prefix, "b");

        let outer_temps = locals.take_undeclared_since(outer);
        assert_eq!(outer_temps.len(), 1);
        assert_eq!(outer_temps[0].prefix, "a");

        // Still visible until the scope pops
        assert!(locals.lookup("b_1").is_ok());
    }

    #[test]
    fn test_rollback_forgets_temporaries() {
        let mut locals = AdditionalLocals::default();
        locals.push_scope();
        let mark = locals.mark();
        let id = locals.add_temporary("t", Expr::number("1")).unwrap();
        locals.rollback(mark);
        assert!(locals.lookup(&id).is_err());
    }

    #[test]
    fn test_initializers_last_write_wins_keeps_order() {
        let mut inits = AdditionalInitializers::default();
        inits.push_scope("Widget");
        inits
            .add_initializer("Widget.a", Expr::number("1"), false, None)
            .unwrap();
        inits
            .add_initializer("Widget.b", Expr::number("2"), false, None)
            .unwrap();
        inits
            .add_initializer("Widget.a", Expr::number("3"), false, None)
            .unwrap();
        let scope = inits.pop_scope().unwrap();

        let entries: Vec<(&str, &Expr)> =
            scope.instance.iter().map(|(k, v)| (k, &v.init)).collect();
        assert_eq!(
            entries,
            vec![
                ("Widget.a", &Expr::number("3")),
                ("Widget.b", &Expr::number("2"))
            ]
        );
        assert!(scope.statics.is_empty());
        assert_eq!(scope.instance.iter().next().unwrap().1.member, "a");
    }

    #[test]
    fn test_initializers_rollback() {
        let mut inits = AdditionalInitializers::default();
        inits.push_scope("T");
        let mark = inits.mark();
        inits
            .add_initializer("T.x", Expr::number("1"), true, None)
            .unwrap();
        inits.rollback(mark);
        assert!(inits.pop_scope().unwrap().statics.is_empty());
    }
}
