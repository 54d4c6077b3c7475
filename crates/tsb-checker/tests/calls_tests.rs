use super::*;
use crate::Program;
use tsb_common::Diagnostic;
use tsb_syntax::{BinaryOperator, TreeBuilder};

fn checked(
    options: AnalysisOptions,
    build: impl FnOnce(&TreeBuilder) -> Vec<NodeIndex>,
) -> (Program, Vec<Diagnostic>) {
    let b = TreeBuilder::new();
    let statements = build(&b);
    let mut program = Program::with_options(options);
    let unit = program.add_unit("calls.ts", b.finish(&statements));
    let diagnostics = program.check_unit(unit);
    (program, diagnostics)
}

fn global_type(program: &mut Program, name: &str) -> String {
    let sym = program
        .chain()
        .globals()
        .and_then(|g| g.get(name).copied())
        .unwrap_or_else(|| panic!("no global {name}"));
    let ty = program.type_of_symbol(sym);
    program.type_to_string(ty)
}

fn kinds(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
    diagnostics.iter().map(|d| d.kind.name()).collect()
}

fn strict() -> AnalysisOptions {
    AnalysisOptions {
        no_implicit_any: true,
        ..AnalysisOptions::default()
    }
}

/// `function f(x: number): number; function f(x: string): string;
/// function f(x: any): any { return x; }`
fn overloaded(b: &TreeBuilder, name: &str) -> Vec<NodeIndex> {
    vec![
        b.function_decl(name, &[], &[b.param("x", Some(b.number_type()))], Some(b.number_type()), None),
        b.function_decl(name, &[], &[b.param("x", Some(b.string_type()))], Some(b.string_type()), None),
        b.function_decl(
            name,
            &[],
            &[b.param("x", Some(b.any_type()))],
            Some(b.any_type()),
            Some(&[b.return_stmt(Some(b.ident("x")))]),
        ),
    ]
}

#[test]
fn overload_selected_by_argument() {
    let (mut program, diagnostics) = checked(AnalysisOptions::default(), |b| {
        let mut statements = overloaded(b, "f");
        statements.push(b.var_decl("r", None, Some(b.call(b.ident("f"), &[], &[b.str_lit("a")]))));
        statements
    });
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(global_type(&mut program, "r"), "string");
}

#[test]
fn no_overload_accepts_argument() {
    let (_, diagnostics) = checked(AnalysisOptions::default(), |b| {
        let mut statements = overloaded(b, "f");
        statements.push(b.expr_stmt(b.call(b.ident("f"), &[], &[b.true_lit()])));
        statements
    });
    assert_eq!(kinds(&diagnostics), ["no-matching-overload"]);
}

#[test]
fn any_argument_ambiguity_is_opt_in() {
    let build = |b: &TreeBuilder| {
        let mut statements = overloaded(b, "h");
        statements.push(b.var_decl("a", Some(b.any_type()), None));
        statements.push(b.expr_stmt(b.call(b.ident("h"), &[], &[b.ident("a")])));
        statements
    };
    let (_, quiet) = checked(AnalysisOptions::default(), build);
    assert!(quiet.is_empty(), "{quiet:?}");

    let options = AnalysisOptions {
        report_ambiguous_overloads: true,
        ..AnalysisOptions::default()
    };
    let (_, diagnostics) = checked(options, build);
    assert_eq!(kinds(&diagnostics), ["ambiguous-overload"]);
}

#[test]
fn generic_call_infers_from_argument() {
    let (mut program, diagnostics) = checked(AnalysisOptions::default(), |b| {
        let id = b.function_decl(
            "id",
            &[b.type_param("T", None)],
            &[b.param("x", Some(b.type_ref("T", &[])))],
            Some(b.type_ref("T", &[])),
            Some(&[b.return_stmt(Some(b.ident("x")))]),
        );
        vec![id, b.var_decl("n", None, Some(b.call(b.ident("id"), &[], &[b.num(1.0)])))]
    });
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(global_type(&mut program, "n"), "number");
}

#[test]
fn calling_a_non_function() {
    let (_, diagnostics) = checked(AnalysisOptions::default(), |b| {
        vec![
            b.var_decl("n", Some(b.number_type()), Some(b.num(1.0))),
            b.expr_stmt(b.call(b.ident("n"), &[], &[])),
        ]
    });
    assert_eq!(kinds(&diagnostics), ["not-callable"]);
    assert_eq!(diagnostics[0].args, ["number"]);
}

#[test]
fn constructing_a_generic_class() {
    let (mut program, diagnostics) = checked(AnalysisOptions::default(), |b| {
        let class = b.class_decl(
            "Box",
            &[b.type_param("T", None)],
            None,
            &[],
            &[
                b.property_decl("value", Some(b.type_ref("T", &[])), None),
                b.constructor(&[b.param("v", Some(b.type_ref("T", &[])))], &[]),
            ],
        );
        vec![class, b.var_decl("b", None, Some(b.new_expr(b.ident("Box"), &[], &[b.num(1.0)])))]
    });
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(global_type(&mut program, "b"), "Box<number>");
}

#[test]
fn arrow_parameters_take_contextual_types() {
    let (mut program, diagnostics) = checked(strict(), |b| {
        let callback = b.function_type(
            &[],
            &[b.param("x", Some(b.number_type()))],
            b.number_type(),
        );
        let apply = b.function_decl(
            "apply",
            &[],
            &[b.param("f", Some(callback))],
            Some(b.number_type()),
            Some(&[b.return_stmt(Some(b.call(b.ident("f"), &[], &[b.num(1.0)])))]),
        );
        let arrow = b.arrow(
            &[b.param("x", None)],
            None,
            b.binary(b.ident("x"), BinaryOperator::Plus, b.num(1.0)),
        );
        vec![apply, b.var_decl("r", None, Some(b.call(b.ident("apply"), &[], &[arrow])))]
    });
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(global_type(&mut program, "r"), "number");
}

#[test]
fn arrow_without_context_is_implicitly_any() {
    let (_, diagnostics) = checked(strict(), |b| {
        let arrow = b.arrow(&[b.param("x", None)], None, b.ident("x"));
        vec![b.var_decl("g", None, Some(arrow))]
    });
    assert_eq!(kinds(&diagnostics), ["implicit-any-parameter"]);
    assert_eq!(diagnostics[0].args, ["x"]);
}

#[test]
fn contextual_body_is_checked_against_annotation() {
    let (_, diagnostics) = checked(AnalysisOptions::default(), |b| {
        let callback = b.function_type(&[], &[b.param("x", Some(b.number_type()))], b.number_type());
        let arrow = b.arrow(&[b.param("x", None)], Some(b.number_type()), b.str_lit("no"));
        vec![b.var_decl("f", Some(callback), Some(arrow))]
    });
    assert_eq!(kinds(&diagnostics), ["type-mismatch"]);
}
