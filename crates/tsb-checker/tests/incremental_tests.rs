//! Editing units one change at a time must converge on the same
//! diagnostics as checking the final program from scratch.

use tsb_checker::Program;
use tsb_common::Diagnostic;
use tsb_syntax::{NodeArena, NodeIndex, TreeBuilder};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn kinds(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
    diagnostics.iter().map(|d| d.kind.name()).collect()
}

fn statement(b: &TreeBuilder, index: usize) -> NodeIndex {
    match index {
        0 => b.interface_decl(
            "Point",
            &[],
            &[],
            &[
                b.property_sig("x", Some(b.number_type())),
                b.property_sig("y", Some(b.number_type())),
            ],
        ),
        1 => {
            let literal = b.object_lit(&[b.prop_assign("x", b.num(1.0))]);
            b.var_decl("p", Some(b.type_ref("Point", &[])), Some(literal))
        }
        2 => b.function_decl(
            "f",
            &[],
            &[b.param("n", Some(b.number_type()))],
            Some(b.number_type()),
            Some(&[b.return_stmt(Some(b.ident("n")))]),
        ),
        3 => {
            let call = b.call(b.ident("f"), &[], &[b.num(1.0)]);
            b.var_decl("s", Some(b.string_type()), Some(call))
        }
        _ => b.var_decl("q", None, Some(b.ident("missing"))),
    }
}

/// The first `count` statements of a small program with three errors.
fn program_prefix(count: usize) -> NodeArena {
    let b = TreeBuilder::new();
    let statements: Vec<NodeIndex> = (0..count).map(|i| statement(&b, i)).collect();
    b.finish(&statements)
}

fn interface_with_x(ty: &str) -> NodeArena {
    let b = TreeBuilder::new();
    let annotation = match ty {
        "string" => b.string_type(),
        _ => b.number_type(),
    };
    let statement = b.interface_decl("Point", &[], &[], &[b.property_sig("x", Some(annotation))]);
    b.finish(&[statement])
}

fn point_user() -> NodeArena {
    let b = TreeBuilder::new();
    let literal = b.object_lit(&[b.prop_assign("x", b.num(1.0))]);
    let statement = b.var_decl("p", Some(b.type_ref("Point", &[])), Some(literal));
    b.finish(&[statement])
}

#[test]
fn statement_by_statement_matches_one_pass() {
    init_tracing();
    let mut fresh = Program::new();
    let unit = fresh.add_unit("main.ts", program_prefix(5));
    let expected = fresh.check_unit(unit);
    assert_eq!(kinds(&expected), ["type-mismatch", "type-mismatch", "name-not-found"]);

    let mut edited = Program::new();
    let unit = edited.add_unit("main.ts", program_prefix(1));
    edited.check_unit(unit);
    for count in 2..=5 {
        edited.update_unit(unit, program_prefix(count));
        edited.check_unit(unit);
    }
    assert_eq!(edited.check_unit(unit), expected);
}

#[test]
fn deleting_statements_drops_their_diagnostics() {
    init_tracing();
    let mut program = Program::new();
    let unit = program.add_unit("main.ts", program_prefix(5));
    assert_eq!(program.check_unit(unit).len(), 3);

    program.update_unit(unit, program_prefix(3));
    assert_eq!(kinds(&program.check_unit(unit)), ["type-mismatch"]);
    program.update_unit(unit, program_prefix(1));
    assert!(program.check_unit(unit).is_empty());
}

#[test]
fn changing_a_member_type_rechecks_dependents() {
    init_tracing();
    let mut program = Program::new();
    let decl = program.add_unit("point.ts", interface_with_x("number"));
    let user = program.add_unit("user.ts", point_user());
    assert!(program.check_all().is_empty());

    let outcome = program
        .update_unit(decl, interface_with_x("string"))
        .expect("unit exists");
    assert!(outcome.dependent_units.contains(&user));
    let diagnostics = program.check_unit(user);
    assert_eq!(kinds(&diagnostics), ["type-mismatch"]);
    assert_eq!(diagnostics[0].args.last().map(String::as_str), Some("x"));

    program.update_unit(decl, interface_with_x("number"));
    assert!(program.check_all().is_empty());
}
