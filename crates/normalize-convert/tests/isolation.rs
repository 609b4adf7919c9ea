mod common;

use common::*;
use normalize_convert::target::{MemberKind, StmtKind, TargetTrivia};
use normalize_convert::{CSharpWriter, FileConversion, NodeCategory, Pipeline, SourceTree};

fn convert(tree: &SourceTree) -> FileConversion {
    Pipeline::new(&ToyRules).convert_tree(tree).unwrap()
}

#[test]
fn test_failed_statement_becomes_placeholder() {
    let tree = file(vec![class(
        "Widget",
        vec![sub(
            "Run",
            vec![],
            vec![
                call_stmt("Foo", vec![]),
                n("broken"),
                call_stmt("Bar", vec![]),
            ],
        )],
    )]);
    let out = convert(&tree);

    assert_eq!(out.markers.len(), 1);
    assert_eq!(out.markers[0].kind, "broken");
    assert_eq!(out.markers[0].category, NodeCategory::Statement);
    assert!(out.failures.is_empty());
    insta::assert_json_snapshot!(out.markers[0], @r#"
    {
      "span": {
        "start": 0,
        "end": 0
      },
      "kind": "broken",
      "category": "statement",
      "message": "no rule for this construct",
      "snippet": ""
    }
    "#);

    insta::assert_snapshot!(CSharpWriter::emit(&out.file), @r"
    public class Widget
    {
        public void Run()
        {
            Foo();
            ;
            // Cannot convert statement 'broken' (0..0): no rule for this construct
            Bar();
        }
    }
    ");
}

#[test]
fn test_bad_expression_fails_only_its_statement() {
    let tree = file(vec![class(
        "Widget",
        vec![sub(
            "Run",
            vec![],
            vec![
                n("call_stmt").with_child(n("bad_expr")),
                call_stmt("Bar", vec![]),
            ],
        )],
    )]);
    let out = convert(&tree);

    let decl = out.file.members[0].as_type().unwrap();
    let run = decl.members[0].as_routine().unwrap();
    assert_eq!(run.body.len(), 2);
    assert_eq!(run.body[0].kind, StmtKind::Empty);
    assert_eq!(
        run.body[0].meta.trailing,
        vec![TargetTrivia::Comment(
            "Cannot convert statement 'call_stmt' (0..0): expression has no translation".into()
        )]
    );
    assert!(matches!(run.body[1].kind, StmtKind::Expr(_)));
}

#[test]
fn test_unsupported_member_becomes_placeholder() {
    let tree = file(vec![class(
        "Widget",
        vec![named("property", "Size"), sub("Run", vec![], vec![])],
    )]);
    let out = convert(&tree);

    let decl = out.file.members[0].as_type().unwrap();
    assert_eq!(decl.members.len(), 2);
    assert_eq!(decl.members[0].kind, MemberKind::Placeholder);
    assert_eq!(out.markers[0].category, NodeCategory::Member);
    assert_eq!(out.markers[0].message, "unsupported syntax 'property'");
    assert_eq!(decl.members[1].as_routine().unwrap().name, "Run");
}

#[test]
fn test_failed_statement_leaves_no_temporaries() {
    let tree = file(vec![class(
        "Widget",
        vec![sub(
            "Run",
            vec![],
            vec![
                n("assign")
                    .with_child(n("with_temp").with_child(number("1")))
                    .with_child(n("bad_expr")),
                n("assign")
                    .with_child(ident("y"))
                    .with_child(n("with_temp").with_child(number("2"))),
            ],
        )],
    )]);
    let out = convert(&tree);
    let text = CSharpWriter::emit(&out.file);

    assert!(!text.contains("tmp_0"), "{text}");
    insta::assert_snapshot!(text, @r"
    public class Widget
    {
        public void Run()
        {
            ;
            // Cannot convert statement 'assign' (0..0): expression has no translation
            var tmp_1 = 2;
            y = tmp_1;
        }
    }
    ");
}

#[test]
fn test_scope_violation_fails_only_that_routine() {
    let tree = file(vec![class(
        "Widget",
        vec![
            sub(
                "A",
                vec![],
                vec![
                    n("assign")
                        .with_child(ident("x"))
                        .with_child(n("with_temp").with_child(number("1"))),
                ],
            ),
            sub("B", vec![], vec![named("use_temp", "tmp_0")]),
        ],
    )]);
    let out = convert(&tree);

    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].unit, "B");
    assert_eq!(
        out.failures[0].reason,
        "temporary 'tmp_0' is not registered in the active scope"
    );

    let decl = out.file.members[0].as_type().unwrap();
    assert_eq!(decl.members[0].as_routine().unwrap().body.len(), 2);
    assert_eq!(decl.members[1].kind, MemberKind::Placeholder);
    assert!(decl.members[1].meta.trailing.contains(&TargetTrivia::Comment(
        "Conversion of 'B' (0..0) failed: temporary 'tmp_0' is not registered in the active scope"
            .into()
    )));
}

#[test]
fn test_temporary_outside_a_body_is_a_scope_violation() {
    let tree = file(vec![class(
        "Widget",
        vec![field(
            "x",
            Some(n("with_temp").with_child(number("1"))),
        )],
    )]);
    let out = convert(&tree);

    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].unit, "x");
    assert!(out.markers.is_empty());
}

#[test]
fn test_sibling_units_continue_after_fatal_error() {
    let tree = file(vec![
        class(
            "Broken",
            vec![
                field("count", Some(call("Load", vec![]))),
                ctor(vec![named("param", "count")], vec![]),
            ],
        ),
        class("Fine", vec![sub("Run", vec![], vec![call_stmt("Foo", vec![])])]),
    ]);
    let out = convert(&tree);

    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].unit, "Broken");
    assert_eq!(out.file.members[0].kind, MemberKind::Placeholder);
    let fine = out.file.members[1].as_type().unwrap();
    assert_eq!(fine.name, "Fine");
    assert_eq!(fine.members.len(), 1);
}
