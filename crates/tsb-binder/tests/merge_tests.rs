//! Declaration merging across orders and repetitions.

use tsb_binder::{SemanticInfoChain, SymbolId, SymbolKind};
use tsb_syntax::{NodeIndex, TreeBuilder};

type Part = fn(&TreeBuilder) -> NodeIndex;

fn part_a(b: &TreeBuilder) -> NodeIndex {
    b.interface_decl("Merged", &[], &[], &[b.property_sig("a", Some(b.number_type()))])
}

fn part_b(b: &TreeBuilder) -> NodeIndex {
    b.interface_decl(
        "Merged",
        &[],
        &[],
        &[
            b.property_sig("b", Some(b.string_type())),
            b.method_sig("m", &[], &[], Some(b.void_type())),
        ],
    )
}

fn part_c(b: &TreeBuilder) -> NodeIndex {
    b.interface_decl(
        "Merged",
        &[],
        &[],
        &[b.call_sig(&[], &[b.param("x", Some(b.number_type()))], Some(b.number_type()))],
    )
}

fn bind_parts(parts: &[Part]) -> (SemanticInfoChain, SymbolId) {
    let b = TreeBuilder::new();
    let statements: Vec<NodeIndex> = parts.iter().map(|p| p(&b)).collect();
    let mut chain = SemanticInfoChain::new();
    chain.add_unit("merge.ts", b.finish(&statements));
    let merged = chain
        .globals()
        .and_then(|g| g.get("Merged").copied())
        .expect("merged symbol");
    (chain, merged)
}

fn sorted_members(chain: &SemanticInfoChain, sym: SymbolId) -> Vec<String> {
    let mut names: Vec<String> = chain
        .graph
        .get(sym)
        .map(|s| s.members.keys().cloned().collect())
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn merge_is_order_independent() {
    let orders: [[Part; 3]; 6] = [
        [part_a, part_b, part_c],
        [part_a, part_c, part_b],
        [part_b, part_a, part_c],
        [part_b, part_c, part_a],
        [part_c, part_a, part_b],
        [part_c, part_b, part_a],
    ];
    for order in orders {
        let (chain, merged) = bind_parts(&order);
        let sym = chain.graph.get(merged).expect("symbol");
        assert_eq!(sym.kind, SymbolKind::Interface);
        assert_eq!(sym.declarations.len(), 3);
        assert_eq!(sorted_members(&chain, merged), ["a", "b", "m"]);
        assert_eq!(sym.call_signatures.len(), 1);
        assert_eq!(chain.globals().map(|g| g.len()), Some(1));
    }
}

#[test]
fn repeated_reopening_is_idempotent() {
    for n in 1..=4 {
        let parts: Vec<Part> = std::iter::repeat_n(part_a as Part, n).collect();
        let (chain, merged) = bind_parts(&parts);
        assert_eq!(sorted_members(&chain, merged), ["a"]);
        assert_eq!(
            chain.graph.get(merged).map(|s| s.declarations.len()),
            Some(n)
        );
    }
}

#[test]
fn reopened_members_merge_into_one_symbol_per_name() {
    let (chain, merged) = bind_parts(&[part_a, part_a]);
    let member = chain
        .graph
        .get(merged)
        .and_then(|s| s.members.get("a").copied())
        .expect("member");
    // The second property of the same name is a duplicate, not a second member.
    assert_eq!(chain.graph.kind(member), SymbolKind::Property);
    let diagnostics: usize = chain.units().map(|u| u.info.binder_diagnostics().len()).sum();
    assert_eq!(diagnostics, 1);
}

#[test]
fn merge_spans_units() {
    let mut chain = SemanticInfoChain::new();
    for (path, part) in [("a.ts", part_a as Part), ("b.ts", part_b), ("c.ts", part_c)] {
        let b = TreeBuilder::new();
        let statement = part(&b);
        chain.add_unit(path, b.finish(&[statement]));
    }
    let merged = chain
        .globals()
        .and_then(|g| g.get("Merged").copied())
        .expect("merged symbol");
    assert_eq!(sorted_members(&chain, merged), ["a", "b", "m"]);
    let units: Vec<u32> = chain
        .graph
        .get(merged)
        .map(|s| s.declarations.iter().map(|d| d.unit.0).collect())
        .unwrap_or_default();
    assert_eq!(units, [0, 1, 2]);
}
