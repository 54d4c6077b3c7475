use super::*;
use tsb_syntax::TreeBuilder;
use tsb_solver::RelationKind;

fn kinds(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
    diagnostics.iter().map(|d| d.kind.name()).collect()
}

fn global(program: &Program, name: &str) -> SymbolId {
    program
        .chain()
        .globals()
        .and_then(|g| g.get(name).copied())
        .unwrap_or_else(|| panic!("no global {name}"))
}

fn annotated_var(name: &str, ty: &str) -> NodeArena {
    let b = TreeBuilder::new();
    let statement = b.var_decl(name, Some(b.type_ref(ty, &[])), None);
    b.finish(&[statement])
}

fn empty_interface(name: &str) -> NodeArena {
    let b = TreeBuilder::new();
    let statement = b.interface_decl(name, &[], &[], &[]);
    b.finish(&[statement])
}

#[test]
fn check_unit_is_idempotent() {
    let b = TreeBuilder::new();
    let statement = b.var_decl("x", Some(b.number_type()), Some(b.str_lit("a")));
    let arena = b.finish(&[statement]);
    let mut program = Program::new();
    let unit = program.add_unit("a.ts", arena);

    let first = program.check_unit(unit);
    let second = program.check_unit(unit);
    assert_eq!(kinds(&first), ["type-mismatch"]);
    assert_eq!(first, second);
    assert_eq!(program.diagnostics(unit), first);
}

#[test]
fn adding_a_unit_resolves_missing_names() {
    let mut program = Program::new();
    let a = program.add_unit("a.ts", annotated_var("v", "Thing"));
    assert_eq!(kinds(&program.check_unit(a)), ["name-not-found"]);

    let b = program.add_unit("b.ts", empty_interface("Thing"));
    assert!(program.check_unit(a).is_empty());
    let v = global(&program, "v");
    let ty = program.type_of_symbol(v);
    assert_eq!(program.type_to_string(ty), "Thing");

    program.remove_unit(b);
    assert_eq!(kinds(&program.check_unit(a)), ["name-not-found"]);
}

#[test]
fn editing_a_unit_replaces_its_diagnostics() {
    let mut program = Program::new();
    let b = TreeBuilder::new();
    let statement = b.var_decl("x", Some(b.number_type()), Some(b.str_lit("a")));
    let broken = b.finish(&[statement]);
    let unit = program.add_unit("a.ts", broken);
    assert_eq!(kinds(&program.check_unit(unit)), ["type-mismatch"]);

    let b = TreeBuilder::new();
    let statement = b.var_decl("x", Some(b.number_type()), Some(b.num(1.0)));
    let fixed = b.finish(&[statement]);
    let outcome = program.update_unit(unit, fixed).expect("unit exists");
    assert!(outcome.dependent_units.contains(&unit));
    assert!(program.check_unit(unit).is_empty());
}

#[test]
fn check_all_orders_by_file() {
    let mut program = Program::new();
    program.add_unit("b.ts", annotated_var("w", "Missing"));
    program.add_unit("a.ts", annotated_var("v", "Gone"));

    let diagnostics = program.check_all();
    let files: Vec<&str> = diagnostics.iter().map(|d| d.file.as_str()).collect();
    assert_eq!(files, ["a.ts", "b.ts"]);
}

#[test]
fn type_of_node_answers_for_expressions_and_types() {
    let b = TreeBuilder::new();
    let literal = b.str_lit("s");
    let annotation = b.number_type();
    let statements = [
        b.var_decl("s", None, Some(literal)),
        b.var_decl("n", Some(annotation), None),
    ];
    let arena = b.finish(&statements);
    let mut program = Program::new();
    let unit = program.add_unit("a.ts", arena);

    assert_eq!(program.type_of_node(unit, literal), SymbolId::STRING);
    assert_eq!(program.type_of_node(unit, annotation), SymbolId::NUMBER);
    assert_eq!(program.type_of_node(unit, NodeIndex(9999)), SymbolId::ERROR);
}

#[test]
fn assignability_between_intrinsics() {
    let mut program = Program::new();
    assert!(program.is_assignable(SymbolId::NUMBER, SymbolId::ANY));
    assert!(program.is_assignable(SymbolId::ANY, SymbolId::STRING));
    assert!(!program.is_assignable(SymbolId::NUMBER, SymbolId::STRING));
}

fn pair_of_interfaces(first: &str, second: &str, member: &str, second_type: fn(&TreeBuilder) -> NodeIndex) -> NodeArena {
    let b = TreeBuilder::new();
    let statements = [
        b.interface_decl(first, &[], &[], &[b.property_sig(member, Some(b.string_type()))]),
        b.interface_decl(second, &[], &[], &[b.property_sig(member, Some(second_type(&b)))]),
    ];
    b.finish(&statements)
}

#[test]
fn edits_keep_relations_between_untouched_types() {
    let mut program = Program::new();
    program.add_unit("a.ts", pair_of_interfaces("A", "B", "x", TreeBuilder::string_type));
    let second = program.add_unit("c.ts", pair_of_interfaces("C", "D", "y", TreeBuilder::string_type));
    let (a, b) = (global(&program, "A"), global(&program, "B"));
    let (c, d) = (global(&program, "C"), global(&program, "D"));
    assert!(program.is_assignable(a, b));
    assert!(program.is_assignable(c, d));

    program.update_unit(second, pair_of_interfaces("C", "D", "y", TreeBuilder::number_type));
    let relations = &program.relations;
    assert_eq!(relations.lookup(a, b, RelationKind::Assignable), Some(true));
    assert_eq!(relations.lookup(c, d, RelationKind::Assignable), None);
    assert_eq!(global(&program, "C"), c);
    assert!(!program.is_assignable(c, d));
}
