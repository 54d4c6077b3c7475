//! Rebinding a unit edit by edit converges on the one-pass result.

use tsb_binder::{SemanticInfoChain, SymbolGraph, SymbolId, SymbolTable};
use tsb_common::DiagnosticKind;
use tsb_syntax::{NodeArena, NodeIndex, TreeBuilder};

/// The program, one top-level statement per step.
fn statements(b: &TreeBuilder, count: usize) -> Vec<NodeIndex> {
    let all: Vec<Box<dyn Fn(&TreeBuilder) -> NodeIndex>> = vec![
        Box::new(|b: &TreeBuilder| {
            b.interface_decl(
                "Point",
                &[],
                &[],
                &[
                    b.property_sig("x", Some(b.number_type())),
                    b.property_sig("y", Some(b.number_type())),
                ],
            )
        }),
        Box::new(|b: &TreeBuilder| {
            b.class_decl(
                "Shape",
                &[b.type_param("T", None)],
                None,
                &[b.type_ref("Point", &[])],
                &[
                    b.property_decl("x", Some(b.number_type()), None),
                    b.property_decl("y", Some(b.number_type()), None),
                    b.method_decl("area", &[], &[], Some(b.number_type()), Some(&[])),
                ],
            )
        }),
        Box::new(|b: &TreeBuilder| {
            b.function_decl("f", &[], &[b.param("x", Some(b.number_type()))], None, None)
        }),
        Box::new(|b: &TreeBuilder| {
            b.function_decl("f", &[], &[b.param("x", Some(b.string_type()))], None, None)
        }),
        Box::new(|b: &TreeBuilder| b.function_decl("f", &[], &[b.param("x", None)], None, Some(&[]))),
        Box::new(|b: &TreeBuilder| {
            b.module_decl(
                "Geometry",
                &[b.exported(b.var_decl("origin", Some(b.type_ref("Point", &[])), None))],
            )
        }),
        Box::new(|b: &TreeBuilder| b.var_decl("Shape", None, None)),
        Box::new(|b: &TreeBuilder| b.enum_decl("Color", &[b.enum_member("Red", None), b.enum_member("Blue", None)])),
    ];
    all.iter().take(count).map(|s| s(b)).collect()
}

fn program(count: usize) -> NodeArena {
    let b = TreeBuilder::new();
    let statements = statements(&b, count);
    b.finish(&statements)
}

const STEPS: usize = 8;

/// Shape of a table: names, kinds and member names, recursively.
fn describe(graph: &SymbolGraph, table: &SymbolTable, depth: usize, out: &mut Vec<String>) {
    for (name, &sym) in table {
        let Some(s) = graph.get(sym) else {
            out.push(format!("{depth}:{name}:<removed>"));
            continue;
        };
        out.push(format!(
            "{depth}:{name}:{:?}:{}:{}",
            s.kind,
            s.declarations.len(),
            s.call_signatures.len() + s.construct_signatures.len()
        ));
        describe(graph, &s.members, depth + 1, out);
        describe(graph, &s.exports, depth + 1, out);
        if let Some(value_type) = s.type_of.and_then(|t| graph.get(t)) {
            out.push(format!(
                "{depth}:{name}:value:{}",
                value_type.call_signatures.len() + value_type.construct_signatures.len()
            ));
            describe(graph, &value_type.members, depth + 1, out);
        }
    }
}

fn snapshot(chain: &SemanticInfoChain) -> (Vec<String>, Vec<(DiagnosticKind, u32, u32)>) {
    let mut shape = Vec::new();
    if let Some(globals) = chain.globals() {
        describe(&chain.graph, globals, 0, &mut shape);
    }
    let diagnostics = chain
        .units()
        .flat_map(|u| u.info.binder_diagnostics())
        .map(|d| (d.diagnostic.kind, d.diagnostic.start, d.diagnostic.length))
        .collect();
    (shape, diagnostics)
}

#[test]
fn statement_by_statement_matches_one_pass() {
    let mut one_pass = SemanticInfoChain::new();
    one_pass.add_unit("main.ts", program(STEPS));
    let expected = snapshot(&one_pass);
    assert!(
        expected
            .1
            .iter()
            .any(|(kind, _, _)| *kind == DiagnosticKind::DuplicateIdentifier)
    );

    let mut incremental = SemanticInfoChain::new();
    let unit = incremental.add_unit("main.ts", program(0));
    for step in 1..=STEPS {
        let outcome = incremental
            .update_unit(unit, program(step))
            .expect("unit exists");
        assert!(outcome.removed.is_empty(), "step {step} removed symbols");
    }
    assert_eq!(snapshot(&incremental), expected);
}

#[test]
fn editing_back_and_forth_restores_the_original() {
    let mut chain = SemanticInfoChain::new();
    let unit = chain.add_unit("main.ts", program(STEPS));
    let original = snapshot(&chain);
    let point = lookup(&chain, "Point");

    chain.update_unit(unit, program(3)).expect("unit exists");
    chain.update_unit(unit, program(STEPS)).expect("unit exists");
    assert_eq!(snapshot(&chain), original);
    // Point was never removed, so its identity survives both edits.
    assert_eq!(lookup(&chain, "Point"), point);
}

#[test]
fn other_units_are_untouched_by_an_unrelated_edit() {
    let mut chain = SemanticInfoChain::new();
    let main = chain.add_unit("main.ts", program(STEPS));
    let other = chain.add_unit("other.ts", {
        let b = TreeBuilder::new();
        let iface = b.interface_decl("Unrelated", &[], &[], &[b.property_sig("z", None)]);
        b.finish(&[iface])
    });
    let unrelated = lookup(&chain, "Unrelated");

    let outcome = chain.update_unit(main, program(STEPS - 1)).expect("unit exists");
    assert_eq!(outcome.dependent_units, vec![main]);
    assert!(!outcome.invalidated.contains(&unrelated));
    assert_eq!(lookup(&chain, "Unrelated"), unrelated);
    assert!(chain.unit(other).is_some());
    assert!(lookup_opt(&chain, "Color").is_none());
}

fn lookup_opt(chain: &SemanticInfoChain, name: &str) -> Option<SymbolId> {
    chain.globals().and_then(|g| g.get(name).copied())
}

fn lookup(chain: &SemanticInfoChain, name: &str) -> SymbolId {
    lookup_opt(chain, name).unwrap_or_else(|| panic!("no global {name}"))
}
