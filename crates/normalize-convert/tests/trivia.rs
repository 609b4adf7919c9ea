mod common;

use common::*;
use normalize_convert::{
    CSharpWriter, FileConversion, Placement, Pipeline, Role, SourceNode, SourceTree,
    StructureEq, Trivia,
};

fn convert(tree: &SourceTree) -> FileConversion {
    Pipeline::new(&ToyRules).convert_tree(tree).unwrap()
}

fn widget(run_body: Vec<SourceNode>) -> SourceTree {
    file(vec![class(
        "Widget",
        vec![
            named("inherits", "Base")
                .with_role(Role::Header)
                .with_trailing(comment("base note")),
            sub("Run", vec![], run_body).with_leading(comment("Runs it")),
            n("end")
                .with_role(Role::EndMarker)
                .with_leading(comment("end of widget")),
        ],
    )])
}

#[test]
fn test_comments_follow_their_constructs() {
    let tree = widget(vec![call_stmt(
        "Foo",
        vec![ident("x").with_trailing(comment("the x"))],
    )]);
    let out = convert(&tree);
    assert!(out.formatting_complete);

    insta::assert_snapshot!(CSharpWriter::emit(&out.file), @r"
    // base note
    public class Widget : Base
    {
        // Runs it
        public void Run()
        {
            Foo(x);
            // the x
        }
        // end of widget
    }
    ");
}

#[test]
fn test_comment_of_empty_output_moves_to_next_statement() {
    let tree = widget(vec![
        n("pragma").with_leading(comment("keep")),
        call_stmt("Foo", vec![]),
    ]);
    let text = CSharpWriter::emit(&convert(&tree).file);
    assert!(text.contains("        // keep\n        Foo();\n"), "{text}");
}

#[test]
fn test_failed_statement_keeps_its_comment() {
    let tree = widget(vec![n("broken").with_leading(comment("before"))]);
    let text = CSharpWriter::emit(&convert(&tree).file);
    assert!(
        text.contains(
            "        // before\n        ;\n        // Cannot convert statement 'broken' (0..0): no rule for this construct\n"
        ),
        "{text}"
    );
}

#[test]
fn test_temporaries_take_the_statement_comment() {
    let tree = widget(vec![
        n("assign")
            .with_leading(comment("compute"))
            .with_child(ident("x"))
            .with_child(n("with_temp").with_child(call("Make", vec![]))),
    ]);
    let text = CSharpWriter::emit(&convert(&tree).file);
    assert!(
        text.contains("        // compute\n        var tmp_0 = Make();\n        x = tmp_0;\n"),
        "{text}"
    );
}

#[test]
fn test_statement_with_only_temporaries_keeps_its_comment_above() {
    let tree = widget(vec![
        n("hoist_only")
            .with_leading(comment("belongs above hoist"))
            .with_child(number("1")),
        call_stmt("A", vec![]),
        call_stmt("B", vec![]),
    ]);
    let text = CSharpWriter::emit(&convert(&tree).file);
    assert!(
        text.contains(
            "        // belongs above hoist\n        var t_0 = 1;\n        A();\n        B();\n"
        ),
        "{text}"
    );
}

#[test]
fn test_blank_lines_between_statements_survive() {
    let tree = widget(vec![
        call_stmt("Foo", vec![]),
        call_stmt("Bar", vec![]).with_leading(Trivia::blank_line()),
    ]);
    let text = CSharpWriter::emit(&convert(&tree).file);
    assert!(text.contains("        Foo();\n\n        Bar();\n"), "{text}");
}

#[test]
fn test_lost_formatting_is_noted_once() {
    let lost = || {
        ident("x").with_leading(comment("lost").with_placement(Placement::SubtreeOnly))
    };
    let tree = widget(vec![
        call_stmt("Foo", vec![lost()]),
        call_stmt("Bar", vec![lost()]),
    ]);
    let out = convert(&tree);
    assert!(!out.formatting_complete);

    let text = CSharpWriter::emit(&out.file);
    assert!(!text.contains("lost"), "{text}");
    assert_eq!(
        text.matches("// Some source formatting could not be carried over")
            .count(),
        1
    );
    assert!(text.ends_with("// Some source formatting could not be carried over\n"));
}

#[test]
fn test_trivia_never_changes_structure() {
    let plain = widget(vec![call_stmt("Foo", vec![ident("x")])]);
    let commented = widget(vec![
        call_stmt("Foo", vec![ident("x").with_trailing(comment("note"))])
            .with_leading(comment("above"))
            .with_leading(Trivia::blank_line()),
    ]);
    let a = convert(&plain).file;
    let b = convert(&commented).file;
    assert_ne!(a, b);
    assert!(a.structure_eq(&b));
}
