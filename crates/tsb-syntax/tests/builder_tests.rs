use super::*;
use crate::{NodeData, SyntaxKind};

fn var_statement_tree(prefix: bool) -> (NodeArena, NodeIndex) {
    let b = TreeBuilder::new();
    let mut statements = Vec::new();
    if prefix {
        statements.push(b.var_decl("padding", None, Some(b.str_lit("some text"))));
    }
    let var = b.var_decl("a", Some(b.number_type()), Some(b.num(1.0)));
    statements.push(var);
    (b.finish(&statements), var)
}

#[test]
fn finish_wraps_statements_in_source_file() {
    let (arena, var) = var_statement_tree(false);
    let root = arena.root();
    let root_node = arena.get(root).expect("root");
    assert_eq!(root_node.kind, SyntaxKind::SourceFile);
    match &root_node.data {
        NodeData::SourceFile { statements } => assert_eq!(statements.nodes, vec![var]),
        other => panic!("unexpected root data {other:?}"),
    }
    assert_eq!(arena.parent(var), root);
}

#[test]
fn composite_spans_cover_children() {
    let b = TreeBuilder::new();
    let body = b.return_stmt(Some(b.binary(
        b.ident("x"),
        BinaryOperator::Plus,
        b.num(2.0),
    )));
    let func = b.function_decl(
        "f",
        &[],
        &[b.param("x", Some(b.number_type()))],
        Some(b.number_type()),
        Some(&[body]),
    );
    let arena = b.finish(&[func]);

    for i in 0..arena.len() as u32 {
        let idx = NodeIndex(i);
        let parent = arena.parent(idx);
        if parent.is_none() {
            continue;
        }
        let (outer, inner) = (arena.span(parent), arena.span(idx));
        assert!(
            outer.start <= inner.start && inner.end <= outer.end,
            "{:?} not inside parent {:?}",
            inner,
            outer
        );
    }
}

#[test]
fn sibling_tokens_do_not_overlap() {
    let b = TreeBuilder::new();
    let call = b.call(b.ident("f"), &[], &[b.num(1.0), b.str_lit("s")]);
    let statement = b.expr_stmt(call);
    let arena = b.finish(&[statement]);
    let args = arena.children(call);
    assert_eq!(args.len(), 3);
    for pair in args.windows(2) {
        assert!(arena.span(pair[0]).end < arena.span(pair[1]).start);
    }
}

#[test]
fn node_at_offset_finds_deepest_node() {
    let b = TreeBuilder::new();
    let name = b.ident("target");
    let access = b.access(name, "length");
    let statement = b.expr_stmt(access);
    let arena = b.finish(&[statement]);

    let offset = arena.span(name).start + 1;
    assert_eq!(arena.node_at_offset(offset), name);
    assert_eq!(arena.node_at_offset(u32::MAX - 1), NodeIndex::NONE);
}

#[test]
fn entity_names_split_on_dots() {
    let b = TreeBuilder::new();
    let ty = b.type_ref("Outer.Inner.Leaf", &[]);
    let statement = b.var_decl("v", Some(ty), None);
    let arena = b.finish(&[statement]);
    let type_name = match &arena.get(ty).expect("type ref").data {
        NodeData::TypeReference { type_name, .. } => *type_name,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(
        arena.entity_name_parts(type_name).as_slice(),
        &["Outer", "Inner", "Leaf"]
    );
}

#[test]
fn structural_hash_ignores_position() {
    let (plain, a) = var_statement_tree(false);
    let (shifted, b) = var_statement_tree(true);
    assert_ne!(plain.span(a), shifted.span(b));
    assert_eq!(plain.structural_hash(a), shifted.structural_hash(b));
}

#[test]
fn structural_hash_sees_modifiers_and_names() {
    let b = TreeBuilder::new();
    let first = b.var_decl("a", Some(b.number_type()), None);
    let renamed = b.var_decl("b", Some(b.number_type()), None);
    let exported = b.exported(b.var_decl("a", Some(b.number_type()), None));
    let arena = b.finish(&[first, renamed, exported]);
    assert_ne!(arena.structural_hash(first), arena.structural_hash(renamed));
    assert_ne!(arena.structural_hash(first), arena.structural_hash(exported));
}

#[test]
fn json_round_trip_restores_parents() {
    let b = TreeBuilder::new();
    let member = b.property_sig("x", Some(b.number_type()));
    let iface = b.interface_decl("Point", &[], &[], &[member]);
    let arena = b.finish(&[iface]);

    let text = arena.to_json().expect("serialize");
    let decoded = NodeArena::from_json(&text).expect("deserialize");
    assert_eq!(decoded.len(), arena.len());
    assert_eq!(decoded.parent(member), iface);
    assert_eq!(decoded.span(member), arena.span(member));
    assert_eq!(
        decoded.structural_hash(decoded.root()),
        arena.structural_hash(arena.root())
    );
}

#[test]
fn parameter_markers_are_modifiers() {
    let b = TreeBuilder::new();
    let opt = b.optional_param("o", None);
    let rest = b.rest_param("r", Some(b.array_type(b.any_type())));
    let statement = b.function_decl("f", &[], &[opt, rest], None, None);
    let arena = b.finish(&[statement]);
    assert!(arena.get(opt).expect("opt").has_modifier(ModifierFlags::OPTIONAL));
    assert!(arena.get(rest).expect("rest").has_modifier(ModifierFlags::REST));
    assert_eq!(arena.name_text(rest), Some("r"));
}
