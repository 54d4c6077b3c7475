use super::*;
use crate::semantic_info::SemanticInfoChain;
use tsb_syntax::TreeBuilder;

fn bind(build: impl FnOnce(&TreeBuilder) -> Vec<NodeIndex>) -> SemanticInfoChain {
    let b = TreeBuilder::new();
    let statements = build(&b);
    let mut chain = SemanticInfoChain::new();
    chain.add_unit("a.ts", b.finish(&statements));
    chain
}

fn global(chain: &SemanticInfoChain, name: &str) -> SymbolId {
    chain
        .globals()
        .and_then(|g| g.get(name).copied())
        .unwrap_or_else(|| panic!("no global {name}"))
}

fn diagnostics(chain: &SemanticInfoChain) -> Vec<DiagnosticKind> {
    chain
        .units()
        .flat_map(|u| u.info.binder_diagnostics())
        .map(|d| d.diagnostic.kind)
        .collect()
}

fn member_names(chain: &SemanticInfoChain, sym: SymbolId) -> Vec<String> {
    chain
        .graph
        .get(sym)
        .map(|s| s.members.keys().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn merge_matrix() {
    assert_eq!(
        merge_action(SymbolKind::Interface, DeclKind::Interface),
        MergeAction::Merge
    );
    assert_eq!(merge_action(SymbolKind::Module, DeclKind::Module), MergeAction::Merge);
    assert_eq!(merge_action(SymbolKind::Class, DeclKind::Module), MergeAction::Merge);
    assert_eq!(merge_action(SymbolKind::Enum, DeclKind::Enum), MergeAction::Merge);
    assert_eq!(
        merge_action(SymbolKind::Function, DeclKind::Function),
        MergeAction::Overload
    );
    assert_eq!(
        merge_action(SymbolKind::Class, DeclKind::Interface),
        MergeAction::Conflict
    );
    assert_eq!(
        merge_action(SymbolKind::Variable, DeclKind::Variable),
        MergeAction::Conflict
    );
    assert_eq!(
        merge_action(SymbolKind::Module, DeclKind::Class),
        MergeAction::Conflict
    );
}

#[test]
fn reopened_interface_merges_members() {
    let chain = bind(|b| {
        vec![
            b.interface_decl("I", &[], &[], &[b.property_sig("a", Some(b.number_type()))]),
            b.interface_decl("I", &[], &[], &[b.property_sig("b", Some(b.string_type()))]),
        ]
    });
    let i = global(&chain, "I");
    assert_eq!(member_names(&chain, i), ["a", "b"]);
    assert_eq!(chain.graph.get(i).map(|s| s.declarations.len()), Some(2));
    assert!(diagnostics(&chain).is_empty());
}

#[test]
fn mismatched_kinds_report_duplicate_on_later_decl() {
    let chain = bind(|b| {
        vec![
            b.var_decl("x", Some(b.number_type()), None),
            b.function_decl("x", &[], &[], None, Some(&[])),
        ]
    });
    let unit = chain.units().next().expect("unit");
    let entries = unit.info.binder_diagnostics();
    assert_eq!(entries.len(), 1);
    let diag = &entries[0].diagnostic;
    assert_eq!(diag.kind, DiagnosticKind::DuplicateIdentifier);
    assert_eq!(diag.args, vec!["x".to_string()]);
    assert_eq!(diag.related_information.len(), 1);

    let (func_id, func) = unit
        .decls
        .iter()
        .find(|(_, d)| d.kind == DeclKind::Function)
        .expect("function decl");
    assert_eq!(diag.span(), name_span(func));

    let first = global(&chain, "x");
    assert_eq!(chain.graph.kind(first), SymbolKind::Variable);
    let orphan = unit.info.decl_symbol(func_id).expect("orphan symbol");
    assert_ne!(orphan, first);
    assert!(chain.graph.flags(orphan).contains(SymbolFlags::ORPHAN));
}

#[test]
fn overloads_share_one_symbol() {
    let chain = bind(|b| {
        vec![
            b.function_decl("f", &[], &[b.param("x", Some(b.number_type()))], None, None),
            b.function_decl("f", &[], &[b.param("x", Some(b.string_type()))], None, None),
            b.function_decl("f", &[], &[b.param("x", Some(b.any_type()))], None, Some(&[])),
        ]
    });
    let f = global(&chain, "f");
    let value_type = chain.graph.get(f).and_then(|s| s.type_of).expect("value type");
    let signatures = chain
        .graph
        .get(value_type)
        .map(|t| t.call_signatures.clone())
        .unwrap_or_default();
    assert_eq!(signatures.len(), 3);
    assert!(diagnostics(&chain).is_empty());
}

#[test]
fn second_body_is_a_duplicate_implementation() {
    let chain = bind(|b| {
        vec![
            b.function_decl("f", &[], &[], None, Some(&[])),
            b.function_decl("f", &[], &[], None, Some(&[])),
        ]
    });
    assert_eq!(
        diagnostics(&chain),
        vec![DiagnosticKind::DuplicateFunctionImplementation]
    );
}

#[test]
fn class_without_constructor_gets_implicit_one() {
    let chain = bind(|b| {
        let count = b.with_modifiers(
            b.property_decl("count", Some(b.number_type()), None),
            tsb_syntax::ModifierFlags::STATIC,
        );
        vec![b.class_decl(
            "C",
            &[b.type_param("T", None)],
            None,
            &[],
            &[b.property_decl("value", Some(b.type_ref("T", &[])), None), count],
        )]
    });
    let c = global(&chain, "C");
    let class = chain.graph.get(c).expect("class");
    assert_eq!(member_names(&chain, c), ["value"]);
    assert_eq!(class.type_parameters.len(), 1);

    let ctor_type = class.type_of.expect("constructor type");
    assert!(chain.graph.flags(ctor_type).contains(SymbolFlags::CONSTRUCTOR_TYPE));
    assert_eq!(member_names(&chain, ctor_type), ["count"]);
    let ctor = chain.graph.get(ctor_type).expect("ctor type");
    assert_eq!(ctor.construct_signatures.len(), 1);
    let implicit = chain.graph.get(ctor.construct_signatures[0]).expect("signature");
    assert!(implicit.has_flag(SymbolFlags::TRANSIENT));
    assert_eq!(implicit.type_parameters, class.type_parameters);
}

#[test]
fn enum_members_live_on_value_type() {
    let chain = bind(|b| {
        vec![b.enum_decl(
            "E",
            &[b.enum_member("A", None), b.enum_member("B", Some(b.num(2.0)))],
        )]
    });
    let e = global(&chain, "E");
    let value_type = chain.graph.get(e).and_then(|s| s.type_of).expect("value type");
    assert_eq!(member_names(&chain, value_type), ["A", "B"]);
    let a = chain
        .graph
        .get(value_type)
        .and_then(|t| t.members.get("A").copied())
        .expect("member");
    assert_eq!(chain.graph.get(a).and_then(|s| s.type_of), Some(e));
}

#[test]
fn module_reopens_class() {
    let chain = bind(|b| {
        vec![
            b.class_decl("C", &[], None, &[], &[]),
            b.module_decl(
                "C",
                &[b.exported(b.var_decl("x", Some(b.number_type()), None))],
            ),
        ]
    });
    let c = global(&chain, "C");
    assert_eq!(chain.graph.kind(c), SymbolKind::Class);
    let exports = chain.graph.get(c).map(|s| s.exports.clone()).unwrap_or_default();
    let x = exports.get("x").copied().expect("export");
    assert!(chain.graph.flags(x).contains(SymbolFlags::EXPORTED));
    assert!(diagnostics(&chain).is_empty());
}

#[test]
fn renamed_type_parameters_conflict() {
    let chain = bind(|b| {
        vec![
            b.interface_decl("I", &[b.type_param("T", None)], &[], &[]),
            b.interface_decl("I", &[b.type_param("U", None)], &[], &[]),
        ]
    });
    assert_eq!(
        diagnostics(&chain),
        vec![DiagnosticKind::ConflictingTypeParameters]
    );
}

#[test]
fn signature_parameters_are_locals() {
    let chain = bind(|b| {
        vec![b.function_decl(
            "f",
            &[b.type_param("T", None)],
            &[b.param("x", Some(b.type_ref("T", &[])))],
            None,
            Some(&[]),
        )]
    });
    let unit = chain.units().next().expect("unit");
    let (f_decl, _) = unit
        .decls
        .iter()
        .find(|(_, d)| d.kind == DeclKind::Function)
        .expect("function");
    let locals = unit.info.locals(f_decl).expect("locals");
    assert_eq!(locals.keys().collect::<Vec<_>>(), ["T", "x"]);

    let sig = unit.info.decl_signature(f_decl).expect("signature");
    let sig = chain.graph.get(sig).expect("signature symbol");
    assert_eq!(sig.parameters, vec![locals["x"]]);
    assert_eq!(sig.type_parameters, vec![locals["T"]]);
    assert!(chain.globals().is_some_and(|g| !g.contains_key("x")));
}

#[test]
fn catch_variable_is_any() {
    let chain = bind(|b| vec![b.try_catch(&[], "e", &[])]);
    let unit = chain.units().next().expect("unit");
    let (catch_decl, _) = unit
        .decls
        .iter()
        .find(|(_, d)| d.kind == DeclKind::Catch)
        .expect("catch");
    let e = unit.info.locals(catch_decl).and_then(|l| l.get("e").copied()).expect("e");
    assert_eq!(chain.graph.kind(e), SymbolKind::Variable);
    assert_eq!(chain.graph.get(e).and_then(|s| s.type_of), Some(SymbolId::ANY));
}

#[test]
fn members_keep_declaration_order_across_merges() {
    let chain = bind(|b| {
        vec![
            b.interface_decl("I", &[], &[], &[b.property_sig("z", None)]),
            b.interface_decl("I", &[], &[], &[b.property_sig("a", None)]),
        ]
    });
    assert_eq!(member_names(&chain, global(&chain, "I")), ["z", "a"]);
}
