use super::*;
use tsb_syntax::TreeBuilder;

fn kinds(tree: &DeclTree) -> Vec<(DeclKind, String)> {
    tree.iter().map(|(_, d)| (d.kind, d.name.clone())).collect()
}

#[test]
fn one_decl_per_name_introducing_construct() {
    let b = TreeBuilder::new();
    let func = b.function_decl(
        "f",
        &[b.type_param("T", None)],
        &[b.param("x", Some(b.type_ref("T", &[])))],
        Some(b.void_type()),
        Some(&[b.var_decl("local", None, Some(b.num(1.0)))]),
    );
    let arena = b.finish(&[func]);
    let tree = build_decl_tree(&arena);

    assert_eq!(
        kinds(&tree),
        vec![
            (DeclKind::Function, "f".to_string()),
            (DeclKind::TypeParameter, "T".to_string()),
            (DeclKind::Parameter, "x".to_string()),
            (DeclKind::Variable, "local".to_string()),
        ]
    );
    let root = tree.roots()[0];
    assert_eq!(tree.children_of(Some(root)).len(), 3);
    assert_eq!(tree.decl_of_node(func), Some(root));
}

#[test]
fn overloads_form_a_group() {
    let b = TreeBuilder::new();
    let first = b.function_decl("f", &[], &[b.param("x", Some(b.number_type()))], None, None);
    let second = b.function_decl("f", &[], &[b.param("x", Some(b.string_type()))], None, None);
    let other = b.var_decl("f2", None, None);
    let arena = b.finish(&[first, second, other]);
    let tree = build_decl_tree(&arena);

    let first_id = tree.decl_of_node(first).expect("decl");
    let group = tree.group_of(first_id);
    assert_eq!(group.len(), 2);
    assert_eq!(Some(group[1]), tree.decl_of_node(second));
}

#[test]
fn flags_follow_modifiers_and_shape() {
    let b = TreeBuilder::new();
    let overload = b.function_decl("f", &[], &[], Some(b.number_type()), None);
    let implementation = b.function_decl("f", &[], &[], None, Some(&[]));
    let declared = b.with_modifiers(
        b.module_decl("M", &[b.var_decl("v", None, None)]),
        tsb_syntax::ModifierFlags::DECLARE | tsb_syntax::ModifierFlags::EXPORT,
    );
    let optional = b.optional_param("p", None);
    let func = b.function_decl("g", &[], &[optional], None, Some(&[]));
    let arena = b.finish(&[overload, implementation, declared, func]);
    let tree = build_decl_tree(&arena);

    let get = |node| tree.decl_of_node(node).and_then(|d| tree.get(d)).expect("decl");
    assert!(get(overload).has_flag(DeclFlags::ANNOTATED));
    assert!(!get(overload).has_flag(DeclFlags::HAS_BODY));
    assert!(get(implementation).has_flag(DeclFlags::HAS_BODY));
    assert!(get(declared).has_flag(DeclFlags::EXPORTED));
    assert!(get(optional).has_flag(DeclFlags::OPTIONAL));

    let module = tree.decl_of_node(declared).expect("module");
    let inner = tree.children_of(Some(module))[0];
    assert!(tree.get(inner).is_some_and(|d| d.has_flag(DeclFlags::AMBIENT)));
}

#[test]
fn catch_and_with_are_anonymous_scopes() {
    let b = TreeBuilder::new();
    let try_stmt = b.try_catch(&[], "e", &[b.var_decl("inner", None, None)]);
    let with = b.with_stmt(b.ident("o"), &[b.var_decl("w", None, None)]);
    let arena = b.finish(&[try_stmt, with]);
    let tree = build_decl_tree(&arena);

    let roots: Vec<_> = tree
        .roots()
        .iter()
        .filter_map(|&r| tree.get(r))
        .map(|d| (d.kind, d.is_anonymous()))
        .collect();
    assert_eq!(roots, vec![(DeclKind::Catch, true), (DeclKind::With, true)]);
    let catch = tree.roots()[0];
    let names: Vec<&str> = tree
        .children_of(Some(catch))
        .iter()
        .filter_map(|&c| tree.get(c))
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(names, ["e", "inner"]);
}

#[test]
fn shape_ignores_position_but_sees_signature() {
    let build = |padding: bool, ty: fn(&TreeBuilder) -> NodeIndex| {
        let b = TreeBuilder::new();
        let mut statements = Vec::new();
        if padding {
            statements.push(b.var_decl("pad", None, Some(b.str_lit("padding text"))));
        }
        let param_type = ty(&b);
        statements.push(b.function_decl("f", &[], &[b.param("x", Some(param_type))], None, None));
        let arena = b.finish(&statements);
        let tree = build_decl_tree(&arena);
        tree.iter()
            .find(|(_, d)| d.kind == DeclKind::Function)
            .map(|(_, d)| d.shape)
            .expect("function")
    };
    let plain = build(false, TreeBuilder::number_type);
    let moved = build(true, TreeBuilder::number_type);
    let retyped = build(false, TreeBuilder::string_type);
    assert_eq!(plain, moved);
    assert_ne!(plain, retyped);
}

#[test]
fn members_do_not_change_the_container_shape() {
    let shape = |member: &str| {
        let b = TreeBuilder::new();
        let iface = b.interface_decl("I", &[], &[], &[b.property_sig(member, None)]);
        let arena = b.finish(&[iface]);
        let tree = build_decl_tree(&arena);
        tree.get(tree.roots()[0]).map(|d| d.shape).expect("interface")
    };
    assert_eq!(shape("a"), shape("b"));
}

#[test]
fn innermost_decl_at_offset() {
    let b = TreeBuilder::new();
    let inner = b.var_decl("inner", None, None);
    let func = b.function_decl("f", &[], &[], None, Some(&[inner]));
    let arena = b.finish(&[func]);
    let tree = build_decl_tree(&arena);

    let offset = arena.span(inner).start;
    let found = tree.innermost_at(offset).and_then(|d| tree.get(d)).expect("decl");
    assert_eq!(found.name, "inner");
    assert_eq!(
        tree.scope_path(tree.decl_of_node(inner).expect("decl")),
        ["f", "inner"]
    );
}
