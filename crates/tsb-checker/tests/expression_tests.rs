use super::*;
use crate::Program;
use tsb_common::Diagnostic;
use tsb_syntax::TreeBuilder;

fn checked(build: impl FnOnce(&TreeBuilder) -> Vec<NodeIndex>) -> (Program, Vec<Diagnostic>) {
    let b = TreeBuilder::new();
    let statements = build(&b);
    let mut program = Program::new();
    let unit = program.add_unit("expr.ts", b.finish(&statements));
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

fn inferred(name: &str, build: impl FnOnce(&TreeBuilder) -> NodeIndex) -> String {
    let (mut program, diagnostics) = checked(|b| vec![b.var_decl(name, None, Some(build(b)))]);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    global_type(&mut program, name)
}

#[test]
fn literal_types_and_widening() {
    assert_eq!(inferred("a", |b| b.num(1.0)), "number");
    assert_eq!(inferred("a", |b| b.str_lit("s")), "string");
    assert_eq!(inferred("a", |b| b.false_lit()), "boolean");
    assert_eq!(inferred("a", |b| b.null_lit()), "any");
}

#[test]
fn array_literals_take_best_common_element() {
    assert_eq!(inferred("a", |b| b.array_lit(&[b.num(1.0), b.num(2.0)])), "number[]");
    assert_eq!(inferred("a", |b| b.array_lit(&[])), "any[]");
    assert_eq!(inferred("a", |b| b.array_lit(&[b.null_lit(), b.str_lit("s")])), "string[]");
}

#[test]
fn unrelated_array_elements_have_no_common_type() {
    let (_, diagnostics) = checked(|b| {
        vec![b.var_decl("a", None, Some(b.array_lit(&[b.num(1.0), b.str_lit("s")])))]
    });
    let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind.name()).collect();
    assert_eq!(kinds, ["no-best-common-type"]);
}

#[test]
fn operators() {
    let plus = |b: &TreeBuilder| b.binary(b.str_lit("a"), BinaryOperator::Plus, b.num(1.0));
    assert_eq!(inferred("a", plus), "string");
    let sum = |b: &TreeBuilder| b.binary(b.num(1.0), BinaryOperator::Plus, b.num(2.0));
    assert_eq!(inferred("a", sum), "number");
    let less = |b: &TreeBuilder| b.binary(b.num(1.0), BinaryOperator::Less, b.num(2.0));
    assert_eq!(inferred("a", less), "boolean");
    let choice = |b: &TreeBuilder| b.conditional(b.true_lit(), b.num(1.0), b.num(2.0));
    assert_eq!(inferred("a", choice), "number");
}

#[test]
fn assertion_overrides_operand() {
    assert_eq!(inferred("a", |b| b.assertion(b.string_type(), b.num(1.0))), "string");
}

#[test]
fn object_literal_members() {
    let (mut program, diagnostics) = checked(|b| {
        let literal = b.object_lit(&[b.prop_assign("a", b.num(1.0)), b.prop_assign("b", b.str_lit("x"))]);
        vec![
            b.var_decl("o", None, Some(literal)),
            b.var_decl("v", None, Some(b.access(b.ident("o"), "b"))),
        ]
    });
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(global_type(&mut program, "v"), "string");
}

#[test]
fn this_inside_method_is_instance() {
    let (mut program, diagnostics) = checked(|b| {
        let method = b.method_decl(
            "m",
            &[],
            &[],
            None,
            Some(&[b.return_stmt(Some(b.access(b.this_expr(), "x")))]),
        );
        let class = b.class_decl(
            "C",
            &[],
            None,
            &[],
            &[b.property_decl("x", Some(b.number_type()), None), method],
        );
        let instance = b.new_expr(b.ident("C"), &[], &[]);
        let call = b.call(b.access(instance, "m"), &[], &[]);
        vec![class, b.var_decl("r", None, Some(call))]
    });
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(global_type(&mut program, "r"), "number");
}

#[test]
fn element_access_reads_element_type() {
    let (mut program, diagnostics) = checked(|b| {
        vec![
            b.var_decl("arr", Some(b.array_type(b.number_type())), None),
            b.var_decl("e", None, Some(b.element_access(b.ident("arr"), b.num(0.0)))),
        ]
    });
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(global_type(&mut program, "e"), "number");
}

#[test]
fn primitive_members_are_opaque() {
    assert_eq!(inferred("a", |b| b.access(b.str_lit("abc"), "length")), "any");
}

#[test]
fn enum_and_module_exports() {
    let (mut program, diagnostics) = checked(|b| {
        let color = b.enum_decl("Color", &[b.enum_member("Red", None)]);
        let exported = b.exported(b.var_decl("v", Some(b.number_type()), Some(b.num(1.0))));
        let module = b.module_decl("M", &[exported]);
        vec![
            color,
            module,
            b.var_decl("c", None, Some(b.access(b.ident("Color"), "Red"))),
            b.var_decl("mv", None, Some(b.access(b.ident("M"), "v"))),
        ]
    });
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(global_type(&mut program, "c"), "Color");
    assert_eq!(global_type(&mut program, "mv"), "number");
}

#[test]
fn type_used_as_value() {
    let (_, diagnostics) = checked(|b| {
        vec![
            b.interface_decl("I", &[], &[], &[]),
            b.var_decl("v", None, Some(b.ident("I"))),
        ]
    });
    let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind.name()).collect();
    assert_eq!(kinds, ["wrong-symbol-kind"]);
}
