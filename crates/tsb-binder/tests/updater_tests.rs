use super::*;
use tsb_syntax::{NodeIndex, TreeBuilder};

fn arena(build: impl FnOnce(&TreeBuilder) -> Vec<NodeIndex>) -> NodeArena {
    let b = TreeBuilder::new();
    let statements = build(&b);
    b.finish(&statements)
}

fn global(chain: &SemanticInfoChain, name: &str) -> Option<SymbolId> {
    chain.globals().and_then(|g| g.get(name).copied())
}

#[test]
fn unchanged_decls_keep_their_symbols() {
    let source = |b: &TreeBuilder| {
        vec![
            b.interface_decl("I", &[], &[], &[b.property_sig("a", Some(b.number_type()))]),
            b.var_decl("v", Some(b.type_ref("I", &[])), None),
        ]
    };
    let mut chain = SemanticInfoChain::new();
    let unit = chain.add_unit("a.ts", arena(source));
    let before = (global(&chain, "I"), global(&chain, "v"));

    let outcome = chain.update_unit(unit, arena(source)).expect("unit exists");
    assert_eq!(outcome.diff.changed, 0);
    assert_eq!(outcome.diff.added, 0);
    assert!(outcome.removed.is_empty());
    assert_eq!((global(&chain, "I"), global(&chain, "v")), before);
}

#[test]
fn changed_decl_keeps_identity_and_is_invalidated() {
    let mut chain = SemanticInfoChain::new();
    let unit = chain.add_unit(
        "a.ts",
        arena(|b| vec![b.var_decl("v", Some(b.number_type()), None)]),
    );
    let v = global(&chain, "v").expect("v");
    if let Some(s) = chain.graph.get_mut(v) {
        s.type_of = Some(SymbolId::NUMBER);
        s.state = ResolutionState::Resolved;
    }
    chain.graph.link(v, SymbolId::NUMBER, LinkKind::TypeOf);

    let outcome = chain
        .update_unit(unit, arena(|b| vec![b.var_decl("v", Some(b.string_type()), None)]))
        .expect("unit exists");
    assert_eq!(outcome.diff.changed, 1);
    assert!(outcome.invalidated.contains(&v));
    assert_eq!(global(&chain, "v"), Some(v));
    let sym = chain.graph.get(v).expect("v survives");
    assert_eq!(sym.state, ResolutionState::Unresolved);
    assert_eq!(sym.type_of, None);
    assert!(chain.graph.targets(v, LinkKind::TypeOf).is_empty());
}

#[test]
fn removed_decls_remove_symbols_and_table_entries() {
    let mut chain = SemanticInfoChain::new();
    let unit = chain.add_unit(
        "a.ts",
        arena(|b| {
            vec![
                b.class_decl("C", &[], None, &[], &[b.property_decl("p", None, None)]),
                b.var_decl("keep", None, None),
            ]
        }),
    );
    let class = global(&chain, "C").expect("class");
    let ctor_type = chain.graph.get(class).and_then(|s| s.type_of).expect("ctor type");

    let outcome = chain
        .update_unit(unit, arena(|b| vec![b.var_decl("keep", None, None)]))
        .expect("unit exists");
    assert!(outcome.removed.contains(&class));
    assert!(!chain.graph.contains(class));
    assert!(!chain.graph.contains(ctor_type));
    assert_eq!(global(&chain, "C"), None);
    assert!(global(&chain, "keep").is_some());
}

#[test]
fn removing_one_unit_keeps_merged_symbol() {
    let iface = |member: &'static str| {
        move |b: &TreeBuilder| vec![b.interface_decl("I", &[], &[], &[b.property_sig(member, None)])]
    };
    let mut chain = SemanticInfoChain::new();
    let a = chain.add_unit("a.ts", arena(iface("x")));
    chain.add_unit("b.ts", arena(iface("y")));
    let i = global(&chain, "I").expect("I");

    let outcome = chain.remove_unit(a).expect("unit exists");
    assert!(chain.unit(a).is_none());
    assert!(outcome.invalidated.contains(&i));
    assert_eq!(global(&chain, "I"), Some(i));
    let sym = chain.graph.get(i).expect("I survives");
    assert_eq!(sym.members.keys().collect::<Vec<_>>(), ["y"]);
    assert_eq!(sym.declarations.len(), 1);
}

#[test]
fn dependent_units_lose_their_caches() {
    let mut chain = SemanticInfoChain::new();
    let a = chain.add_unit(
        "a.ts",
        arena(|b| vec![b.var_decl("v", Some(b.number_type()), None)]),
    );
    let b_unit = chain.add_unit("b.ts", arena(|b| vec![b.expr_stmt(b.ident("v"))]));
    let c_unit = chain.add_unit("c.ts", arena(|b| vec![b.expr_stmt(b.ident("w"))]));
    let v = global(&chain, "v").expect("v");
    if let Some(u) = chain.unit_mut(b_unit) {
        u.info.referenced.insert(v);
        u.info.checked = true;
    }
    if let Some(u) = chain.unit_mut(c_unit) {
        u.info.unresolved_names.insert("missing".to_string());
        u.info.checked = true;
    }

    let outcome = chain
        .update_unit(a, arena(|b| vec![b.var_decl("v", Some(b.string_type()), None)]))
        .expect("unit exists");
    assert_eq!(outcome.dependent_units, vec![a, b_unit]);
    assert!(chain.unit(b_unit).is_some_and(|u| !u.info.checked));
    assert!(chain.unit(c_unit).is_some_and(|u| u.info.checked));
}

#[test]
fn added_name_wakes_units_that_missed_it() {
    let mut chain = SemanticInfoChain::new();
    let a = chain.add_unit("a.ts", arena(|_| Vec::new()));
    let b_unit = chain.add_unit("b.ts", arena(|b| vec![b.expr_stmt(b.ident("later"))]));
    if let Some(u) = chain.unit_mut(b_unit) {
        u.info.unresolved_names.insert("later".to_string());
    }
    let outcome = chain
        .update_unit(a, arena(|b| vec![b.var_decl("later", None, None)]))
        .expect("unit exists");
    assert_eq!(outcome.diff.added, 1);
    assert!(outcome.dependent_units.contains(&b_unit));
}

#[test]
fn transient_symbols_without_references_are_released() {
    let mut chain = SemanticInfoChain::new();
    let unit = chain.add_unit("a.ts", arena(|_| Vec::new()));
    let literal = chain.graph.alloc(SymbolKind::ObjectType, "");
    let member = chain.graph.alloc(SymbolKind::Property, "x");
    chain.graph.link(member, literal, LinkKind::MemberOf);
    if let Some(s) = chain.graph.get_mut(literal) {
        s.members.insert("x".to_string(), member);
    }
    let kept = chain.graph.alloc(SymbolKind::ObjectType, "");
    let holder = chain.graph.alloc(SymbolKind::Variable, "holder");
    chain.graph.link(holder, kept, LinkKind::TypeOf);
    if let Some(u) = chain.unit_mut(unit) {
        u.info.transient_symbols = vec![literal, member, kept];
    }

    chain.clear_unit_caches(unit);
    assert!(!chain.graph.contains(literal));
    assert!(!chain.graph.contains(member));
    assert!(chain.graph.contains(kept));
}
