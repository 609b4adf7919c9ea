//! Formatting reattachment pass.
//!
//! Normalizes blank lines between members to the target's conventions,
//! regardless of what the rule table emitted: imports form one block,
//! routines and nested types stand apart, and runs of same-kind
//! declarations (grouped by the source kind recorded in their provenance)
//! stay together with a blank line when the group changes.

use crate::config::FormatConfig;
use crate::target::{Member, MemberKind, NodeMeta, Statement, StmtKind, TargetFile, TargetTrivia};

pub fn reattach_formatting(file: &mut TargetFile, config: &FormatConfig) {
    format_members(&mut file.members, config);
    collapse_blank_lines(&mut file.trailing);
}

fn format_members(members: &mut [Member], config: &FormatConfig) {
    for i in 0..members.len() {
        if i == 0 {
            strip_leading_blank_lines(&mut members[0].meta);
        } else if wants_blank_line(&members[i - 1], &members[i], config) {
            ensure_leading_blank_line(&mut members[i].meta);
        }
        collapse_blank_lines(&mut members[i].meta.leading);

        match &mut members[i].kind {
            MemberKind::Type(decl) => {
                format_members(&mut decl.members, config);
                collapse_blank_lines(&mut decl.closing);
                trim_trailing_blank_lines(&mut decl.closing);
            }
            MemberKind::Routine(routine) => format_statements(&mut routine.body),
            MemberKind::Import(_) | MemberKind::Field(_) | MemberKind::Placeholder => {}
        }
    }
}

fn format_statements(body: &mut [Statement]) {
    for (i, stmt) in body.iter_mut().enumerate() {
        if i == 0 {
            strip_leading_blank_lines(&mut stmt.meta);
        }
        collapse_blank_lines(&mut stmt.meta.leading);
        match &mut stmt.kind {
            StmtKind::If {
                then, otherwise, ..
            } => {
                format_statements(then);
                if let Some(otherwise) = otherwise {
                    format_statements(otherwise);
                }
            }
            StmtKind::While { body, .. } | StmtKind::Block(body) => format_statements(body),
            StmtKind::Expr(_) | StmtKind::Local { .. } | StmtKind::Return(_) | StmtKind::Empty => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Import,
    Declaration,
    Routine,
}

fn section(member: &Member) -> Section {
    match member.kind {
        MemberKind::Import(_) => Section::Import,
        MemberKind::Type(_) | MemberKind::Routine(_) => Section::Routine,
        MemberKind::Field(_) | MemberKind::Placeholder => Section::Declaration,
    }
}

/// Group of a member: the source kind it came from, or its section.
fn group(member: &Member) -> (Section, Option<&str>) {
    (section(member), member.meta.source_kind())
}

fn wants_blank_line(prev: &Member, cur: &Member, config: &FormatConfig) -> bool {
    match (section(prev), section(cur)) {
        (Section::Import, Section::Import) => false,
        (Section::Import, _) => config.blank_line_after_imports,
        (Section::Routine, _) | (_, Section::Routine) => config.blank_line_between_routines,
        _ => config.blank_lines_between_groups && group(prev) != group(cur),
    }
}

fn ensure_leading_blank_line(meta: &mut NodeMeta) {
    if !meta.has_leading_blank_line() {
        meta.leading.insert(0, TargetTrivia::BlankLine);
    }
}

fn strip_leading_blank_lines(meta: &mut NodeMeta) {
    let n = meta
        .leading
        .iter()
        .take_while(|t| **t == TargetTrivia::BlankLine)
        .count();
    meta.leading.drain(..n);
}

fn trim_trailing_blank_lines(trivia: &mut Vec<TargetTrivia>) {
    while trivia.last() == Some(&TargetTrivia::BlankLine) {
        trivia.pop();
    }
}

fn collapse_blank_lines(trivia: &mut Vec<TargetTrivia>) {
    trivia.dedup_by(|a, b| *a == TargetTrivia::BlankLine && *b == TargetTrivia::BlankLine);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{NodeId, Span};
    use crate::target::{Expr, Field, Provenance, Routine, StructureEq, TypeDecl, TypeKind};

    fn with_kind(mut member: Member, kind: &str) -> Member {
        member.meta.provenance = Some(Provenance {
            node: NodeId(0),
            kind: kind.into(),
            span: Span::default(),
        });
        member
    }

    fn field(name: &str) -> Member {
        Field {
            name: name.into(),
            ty: None,
            is_static: false,
            visibility: Default::default(),
            init: None,
        }
        .into()
    }

    fn blanks(members: &[Member]) -> Vec<bool> {
        members.iter().map(|m| m.meta.has_leading_blank_line()).collect()
    }

    #[test]
    fn test_sections_and_groups() {
        let mut file = TargetFile::new(vec![
            Member::new(MemberKind::Import("System".into())),
            Member::new(MemberKind::Import("System.IO".into())),
            with_kind(field("a"), "field"),
            with_kind(field("b"), "field"),
            with_kind(field("C"), "const"),
            Routine::method("Run").into(),
            Routine::method("Stop").into(),
        ]);
        reattach_formatting(&mut file, &FormatConfig::default());
        assert_eq!(
            blanks(&file.members),
            vec![false, false, true, false, true, true, true]
        );
    }

    #[test]
    fn test_first_member_loses_blank_and_runs_collapse() {
        let mut first = field("a");
        first.meta.leading = vec![TargetTrivia::BlankLine, TargetTrivia::Comment("x".into())];
        let mut second = Routine::method("Run");
        second.body.push(Statement::expr(Expr::ident("f")));
        let mut second: Member = second.into();
        second.meta.leading = vec![TargetTrivia::BlankLine, TargetTrivia::BlankLine];

        let mut file = TargetFile::new(vec![
            TypeDecl {
                members: vec![first, second],
                ..TypeDecl::new(TypeKind::Class, "T")
            }
            .into(),
        ]);
        let before = file.clone();
        reattach_formatting(&mut file, &FormatConfig::default());

        let decl = file.members[0].as_type().unwrap();
        assert_eq!(decl.members[0].meta.leading, vec![TargetTrivia::Comment("x".into())]);
        assert_eq!(decl.members[1].meta.leading, vec![TargetTrivia::BlankLine]);
        assert!(file.structure_eq(&before));
    }

    #[test]
    fn test_pass_is_idempotent() {
        let mut file = TargetFile::new(vec![
            Member::new(MemberKind::Import("System".into())),
            with_kind(field("a"), "field"),
            Routine::method("Run").into(),
        ]);
        reattach_formatting(&mut file, &FormatConfig::default());
        let once = file.clone();
        reattach_formatting(&mut file, &FormatConfig::default());
        assert_eq!(file, once);
    }

    #[test]
    fn test_disabled_rules() {
        let config = FormatConfig {
            blank_line_after_imports: false,
            blank_lines_between_groups: false,
            blank_line_between_routines: false,
        };
        let mut file = TargetFile::new(vec![
            Member::new(MemberKind::Import("System".into())),
            with_kind(field("a"), "field"),
            with_kind(field("C"), "const"),
            Routine::method("Run").into(),
        ]);
        reattach_formatting(&mut file, &config);
        assert_eq!(blanks(&file.members), vec![false; 4]);
    }
}
