//! Trivia and provenance carrier.
//!
//! Every node produced through the error-isolating decorator passes through
//! [`TriviaCarrier::attach`], which moves the source node's comments and
//! blank lines onto the produced node(s) and records provenance.
//!
//! Placement rules:
//! - `All` trivia lands on the node's own target or, when the node was not
//!   carried itself (expressions), on the nearest carried ancestor. When a
//!   node produces nothing, it moves to the next produced sibling.
//! - `SubtreeOnly` trivia lands only on the node's own target; anywhere
//!   else it is dropped and the run is marked incomplete.
//! - `None` trivia is never carried.

use crate::source::{NodeId, Placement, Role, SourceNode, Trivia, TriviaKind};
use crate::target::{Member, MemberKind, NodeMeta, Provenance, Statement, TargetFile, TargetTrivia};
use std::collections::HashSet;

/// A produced node that can receive carried trivia.
pub trait Carried {
    fn meta(&self) -> &NodeMeta;
    fn meta_mut(&mut self) -> &mut NodeMeta;

    /// Minimal valid no-op of this node's category.
    fn placeholder() -> Self;

    /// Trivia rendered before the node's closing token, for block nodes.
    fn closing_mut(&mut self) -> Option<&mut Vec<TargetTrivia>> {
        None
    }
}

impl Carried for Statement {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut NodeMeta {
        &mut self.meta
    }

    fn placeholder() -> Self {
        Statement::empty()
    }
}

impl Carried for Member {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut NodeMeta {
        &mut self.meta
    }

    fn placeholder() -> Self {
        Member::placeholder()
    }

    fn closing_mut(&mut self) -> Option<&mut Vec<TargetTrivia>> {
        match &mut self.kind {
            MemberKind::Type(decl) => Some(&mut decl.closing),
            _ => None,
        }
    }
}

/// Carrier state to restore when a conversion is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierMark {
    orphans: usize,
    complete: bool,
}

#[derive(Debug)]
pub struct TriviaCarrier {
    attached: HashSet<NodeId>,
    orphans: Vec<TargetTrivia>,
    complete: bool,
    note_appended: bool,
}

impl Default for TriviaCarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl TriviaCarrier {
    pub fn new() -> Self {
        Self {
            attached: HashSet::new(),
            orphans: Vec::new(),
            complete: true,
            note_appended: false,
        }
    }

    /// Whether every significant piece of trivia found a place so far.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn mark(&self) -> CarrierMark {
        CarrierMark {
            orphans: self.orphans.len(),
            complete: self.complete,
        }
    }

    pub fn rollback(&mut self, mark: CarrierMark) {
        self.orphans.truncate(mark.orphans);
        self.complete = mark.complete;
    }

    /// Move `source`'s trivia onto `targets` and link their provenance.
    pub fn attach<T: Carried>(&mut self, source: &SourceNode, targets: &mut [T]) {
        self.attach_inner(source, targets, true);
    }

    /// Like [`attach`](Self::attach), for a placeholder replacing a failed
    /// subtree: descendants attached during the failed attempt are collected
    /// again, since their targets were discarded.
    pub fn attach_placeholder<T: Carried>(&mut self, source: &SourceNode, targets: &mut [T]) {
        self.attach_inner(source, targets, false);
    }

    fn attach_inner<T: Carried>(
        &mut self,
        source: &SourceNode,
        targets: &mut [T],
        skip_attached: bool,
    ) {
        self.attached.insert(source.id);

        let mut leading = self.own(&source.leading, !targets.is_empty());
        let trailing = self.own(&source.trailing, !targets.is_empty());

        // Header clauses and end markers have no target token of their own
        let mut header = Vec::new();
        let mut closing = Vec::new();
        for child in &source.children {
            let bucket = match child.role {
                Role::Header => &mut header,
                Role::EndMarker => &mut closing,
                Role::Item => continue,
            };
            self.attached.insert(child.id);
            bucket.extend(self.own(&child.leading, true));
            bucket.extend(self.own(&child.trailing, true));
            bucket.extend(self.hoist(child, false));
        }
        let hoisted = self.hoist(source, skip_attached);

        let Some(first) = targets.first_mut() else {
            // Nothing produced: comments wait for the next sibling
            self.orphans.extend(leading);
            self.orphans.extend(header);
            self.orphans.extend(trailing);
            self.orphans.extend(closing);
            self.orphans.extend(hoisted);
            return;
        };

        leading.extend(header);
        let meta = first.meta_mut();
        leading.append(&mut meta.leading);
        meta.leading = leading;

        // Orphans left over from an empty inner list trail the node
        let mut trailing = [hoisted, trailing].concat();
        trailing.append(&mut self.orphans);

        let provenance = Provenance {
            node: source.id,
            kind: source.kind.clone(),
            span: source.span,
        };
        for target in targets.iter_mut() {
            let meta = target.meta_mut();
            if meta.provenance.is_none() {
                meta.provenance = Some(provenance.clone());
            }
        }

        let last = targets.len() - 1;
        match targets[0].closing_mut() {
            Some(slot) => slot.extend(closing),
            None => targets[last].meta_mut().trailing.extend(closing),
        }
        targets[last].meta_mut().trailing.extend(trailing);
    }

    /// Trivia owned by the node itself.
    fn own(&mut self, trivia: &[Trivia], has_target: bool) -> Vec<TargetTrivia> {
        let mut out = Vec::new();
        for piece in trivia {
            if !piece.is_significant() {
                continue;
            }
            let carried = match piece.kind {
                TriviaKind::Comment => TargetTrivia::Comment(piece.text.trim_end().to_string()),
                TriviaKind::BlankLine => TargetTrivia::BlankLine,
                TriviaKind::Whitespace => continue,
            };
            if !has_target {
                match (piece.kind, piece.placement) {
                    // A removed node's blank line is not lost formatting
                    (TriviaKind::BlankLine, _) => continue,
                    (_, Placement::All) => {}
                    _ => {
                        self.complete = false;
                        continue;
                    }
                }
            }
            out.push(carried);
        }
        out
    }

    /// Trivia of descendants that were not carried themselves.
    fn hoist(&mut self, node: &SourceNode, skip_attached: bool) -> Vec<TargetTrivia> {
        let mut out = Vec::new();
        let mut stack: Vec<&SourceNode> = node.children.iter().rev().collect();
        while let Some(child) = stack.pop() {
            if child.role != Role::Item && node.children.iter().any(|c| c.id == child.id) {
                continue;
            }
            if skip_attached && self.attached.contains(&child.id) {
                continue;
            }
            for piece in child.leading.iter().chain(&child.trailing) {
                if !piece.is_significant() {
                    continue;
                }
                match (piece.placement, piece.kind) {
                    (Placement::All, TriviaKind::Comment) => {
                        out.push(TargetTrivia::Comment(piece.text.trim_end().to_string()))
                    }
                    // Blank lines inside an expression have nowhere to go
                    (_, TriviaKind::BlankLine) => {}
                    _ => self.complete = false,
                }
            }
            stack.extend(child.children.iter().rev());
        }
        out
    }

    /// Hand the trivia collected for a produced-nothing node to the caller.
    pub fn take_orphans(&mut self) -> Vec<TargetTrivia> {
        std::mem::take(&mut self.orphans)
    }

    pub fn restore_orphans(&mut self, orphans: Vec<TargetTrivia>) {
        self.orphans.extend(orphans);
    }

    /// Close out a file: root trivia, leftover orphans, and the
    /// dropped-formatting note (at most once).
    pub fn finish(&mut self, root: &SourceNode, file: &mut TargetFile, note: &str) {
        let mut leading = self.own(&root.leading, true);
        match file.members.first_mut() {
            Some(first) => {
                leading.append(&mut first.meta.leading);
                first.meta.leading = leading;
            }
            None => file.trailing.extend(leading),
        }
        let trailing = self.own(&root.trailing, true);
        file.trailing.extend(trailing);
        file.trailing.append(&mut self.orphans);

        if !self.complete && !self.note_appended {
            self.note_appended = true;
            file.trailing.push(TargetTrivia::Comment(note.to_string()));
        }
    }
}

/// Builds a list of sibling targets, moving trivia of siblings that
/// produced nothing onto the next sibling that produced something.
#[derive(Debug)]
pub struct SiblingList<T> {
    items: Vec<T>,
    carry: Vec<TargetTrivia>,
}

impl<T: Carried> Default for SiblingList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Carried> SiblingList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            carry: Vec::new(),
        }
    }

    pub fn push(&mut self, mut produced: Vec<T>, carrier: &mut TriviaCarrier) {
        match produced.first_mut() {
            None => self.carry.extend(carrier.take_orphans()),
            Some(first) => {
                if !self.carry.is_empty() {
                    let meta = first.meta_mut();
                    let mut leading = std::mem::take(&mut self.carry);
                    leading.append(&mut meta.leading);
                    meta.leading = leading;
                }
                self.items.extend(produced);
            }
        }
    }

    /// Finish the list; trivia still waiting trails the last item, or
    /// floats up to the enclosing list when there is none.
    pub fn finish(mut self, carrier: &mut TriviaCarrier) -> Vec<T> {
        if !self.carry.is_empty() {
            match self.items.last_mut() {
                Some(last) => last.meta_mut().trailing.append(&mut self.carry),
                None => carrier.restore_orphans(self.carry),
            }
        }
        self.items
    }
}
