//! Graph updater.
//!
//! Applies a decl diff to the bound graph in place:
//!
//! 1. the old unit's decls are detached from every symbol they contributed to,
//! 2. the new decl tree is bound with paired decls reusing their old symbols,
//! 3. symbols left without any declaration are removed and their links severed,
//! 4. changed, added and removed symbols seed an invalidation walk along links,
//!    and every unit that looked up an invalidated symbol (or failed to find a
//!    name that now exists) has its resolution caches dropped.
//!
//! Symbols that are neither reachable from the walk nor declared in a
//! dependent unit keep their resolved state untouched.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};
use tsb_syntax::NodeArena;

use crate::binder::Binder;
use crate::decl_builder::build_decl_tree;
use crate::decls::{Decl, DeclFlags, DeclTree, UnitId};
use crate::differ::{DeclChange, DeclDiff, diff_decl_trees};
use crate::graph::SymbolGraph;
use crate::links::LinkKind;
use crate::semantic_info::{SemanticInfo, SemanticInfoChain, Unit};
use crate::symbols::{ResolutionState, SignatureKind, SymbolFlags, SymbolId, SymbolKind};

/// Flags that do not come from declarations and survive a detach.
const INTRINSIC_FLAGS: SymbolFlags = SymbolFlags::TRANSIENT
    .union(SymbolFlags::CONSTRUCTOR_TYPE)
    .union(SymbolFlags::OBJECT_LITERAL);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub unchanged: usize,
    pub changed: usize,
    pub added: usize,
    pub removed: usize,
}

impl DiffSummary {
    fn of(diff: &DeclDiff) -> Self {
        Self {
            unchanged: diff.count(DeclChange::Unchanged),
            changed: diff.count(DeclChange::Changed),
            added: diff.count(DeclChange::Added),
            removed: diff.count(DeclChange::Removed),
        }
    }
}

/// Result of replacing or removing a unit.
#[derive(Clone, Debug)]
pub struct UpdateOutcome {
    pub unit: UnitId,
    pub diff: DiffSummary,
    /// Surviving symbols whose resolved state was reset.
    pub invalidated: Vec<SymbolId>,
    /// Symbols removed from the graph.
    pub removed: Vec<SymbolId>,
    /// Units whose resolution caches were dropped, the updated unit included.
    pub dependent_units: Vec<UnitId>,
}

impl SemanticInfoChain {
    /// Replace the syntax tree of `unit` and selectively rebind it.
    ///
    /// Returns `None` when `unit` does not exist.
    pub fn update_unit(&mut self, unit: UnitId, arena: NodeArena) -> Option<UpdateOutcome> {
        let old = self.units.get_mut(unit.0 as usize)?.take()?;
        let arena = Arc::new(arena);
        let decls = Arc::new(build_decl_tree(&arena));
        let diff = diff_decl_trees(&old.decls, &decls);
        debug!(
            unit = unit.0,
            path = %old.path,
            unchanged = diff.count(DeclChange::Unchanged),
            changed = diff.count(DeclChange::Changed),
            added = diff.added.len(),
            removed = diff.removed.len(),
            "updating unit"
        );
        Some(self.rebind(old, Some((arena, decls)), &diff))
    }

    /// Remove `unit` and every symbol only it declared.
    pub fn remove_unit(&mut self, unit: UnitId) -> Option<UpdateOutcome> {
        let old = self.units.get_mut(unit.0 as usize)?.take()?;
        let diff = diff_decl_trees(&old.decls, &DeclTree::default());
        debug!(unit = unit.0, path = %old.path, "removing unit");
        Some(self.rebind(old, None, &diff))
    }

    /// Drop the resolution caches of `unit` and release its transient symbols.
    pub fn clear_unit_caches(&mut self, unit: UnitId) {
        let Some(u) = self.units.get_mut(unit.0 as usize).and_then(Option::as_mut) else {
            return;
        };
        let transient = u.info.clear_resolution_caches();
        release_transients(&mut self.graph, &transient);
    }

    fn rebind(
        &mut self,
        old: Unit,
        replacement: Option<(Arc<NodeArena>, Arc<DeclTree>)>,
        diff: &DeclDiff,
    ) -> UpdateOutcome {
        let Unit {
            id,
            path,
            decls: old_decls,
            info: old_info,
            ..
        } = old;

        let mut reuse = FxHashMap::default();
        let mut reuse_signatures = FxHashMap::default();
        for &(old_decl, new_decl, _) in &diff.pairs {
            if let Some(sym) = old_info.decl_symbol(old_decl) {
                reuse.insert(new_decl, sym);
            }
            if let Some(sig) = old_info.decl_signature(old_decl) {
                reuse_signatures.insert(new_decl, sig);
            }
        }

        let mut seeds: FxHashSet<SymbolId> = FxHashSet::default();
        let mut added_names: FxHashSet<String> = FxHashSet::default();
        for &old_decl in &diff.removed {
            seeds.extend(old_info.decl_symbol(old_decl));
            seeds.extend(old_info.decl_signature(old_decl));
            if let Some(d) = old_decls.get(old_decl) {
                trace!(name = %d.name, kind = ?d.kind, "decl removed");
            }
        }

        let detached = self.detach(id, &old_info, &mut seeds);
        release_transients(&mut self.graph, &old_info.transient_symbols);

        let mut dependent: FxHashSet<UnitId> = FxHashSet::default();
        if let Some((arena, decls)) = replacement {
            let mut unit = Unit {
                id,
                path,
                arena,
                decls,
                info: SemanticInfo::default(),
            };
            Binder::new(
                &mut self.graph,
                &self.units,
                &mut unit,
                &reuse,
                &reuse_signatures,
            )
            .bind_unit();

            let new_decls = diff
                .changed()
                .map(|(_, new_decl)| new_decl)
                .chain(diff.added.iter().copied());
            for new_decl in new_decls {
                seeds.extend(unit.info.decl_symbol(new_decl));
                seeds.extend(unit.info.decl_signature(new_decl));
            }
            for &new_decl in &diff.added {
                if let Some(d) = unit.decls.get(new_decl)
                    && !d.is_anonymous()
                {
                    added_names.insert(d.name.clone());
                }
                if let Some(sym) = unit.info.decl_symbol(new_decl) {
                    seeds.extend(self.graph.targets(sym, LinkKind::ContainedBy));
                }
            }
            dependent.insert(id);
            seeds.extend(stale_symbols(&self.graph, &unit));
            self.units[id.0 as usize] = Some(unit);
        }

        let removed: Vec<SymbolId> = {
            let mut removed: Vec<SymbolId> = detached
                .into_iter()
                .filter(|&s| {
                    self.graph
                        .get(s)
                        .is_some_and(|sym| sym.declarations.is_empty())
                })
                .collect();
            removed.sort_unstable();
            removed
        };
        seeds.extend(removed.iter().copied());

        // Walk, then pull in units that depended on anything reached, until stable.
        let mut invalidated: FxHashSet<SymbolId> = FxHashSet::default();
        let mut pending: Vec<SymbolId> = seeds.into_iter().collect();
        loop {
            self.graph.collect_dependents(pending, &mut invalidated);
            let newly: Vec<UnitId> = self
                .units()
                .filter(|u| !dependent.contains(&u.id))
                .filter(|u| {
                    u.info.referenced.iter().any(|s| invalidated.contains(s))
                        || u.info.unresolved_names.iter().any(|n| added_names.contains(n))
                })
                .map(|u| u.id)
                .collect();
            if newly.is_empty() {
                break;
            }
            pending = Vec::new();
            for unit in newly {
                trace!(unit = unit.0, "unit depends on invalidated symbols");
                dependent.insert(unit);
                if let Some(u) = self.unit(unit) {
                    pending.extend(stale_symbols(&self.graph, u));
                }
            }
        }

        for &sym in &removed {
            remove_with_value_type(&mut self.graph, sym);
        }

        let mut invalidated: Vec<SymbolId> = invalidated
            .into_iter()
            .filter(|s| self.graph.contains(*s) && !s.is_intrinsic())
            .collect();
        invalidated.sort_unstable();
        for &sym in &invalidated {
            reset_symbol(&mut self.graph, sym);
        }

        let mut dependent_units: Vec<UnitId> = dependent.into_iter().collect();
        dependent_units.sort_unstable();
        for &unit in &dependent_units {
            self.clear_unit_caches(unit);
        }

        debug!(
            unit = id.0,
            invalidated = invalidated.len(),
            removed = removed.len(),
            dependent_units = dependent_units.len(),
            "update applied"
        );
        UpdateOutcome {
            unit: id,
            diff: DiffSummary::of(diff),
            invalidated,
            removed,
            dependent_units,
        }
    }

    /// Remove every declaration of unit `id` from the symbols it contributed
    /// to, and prune table entries and signatures left without declarations.
    /// Returns the symbols that no longer have any declaration.
    fn detach(
        &mut self,
        id: UnitId,
        info: &SemanticInfo,
        seeds: &mut FxHashSet<SymbolId>,
    ) -> Vec<SymbolId> {
        let mut touched: Vec<SymbolId> = info
            .decl_symbols
            .values()
            .chain(info.decl_signatures.values())
            .copied()
            .collect();
        touched.sort_unstable();
        touched.dedup();

        let mut containers: FxHashSet<SymbolId> = FxHashSet::default();
        containers.insert(SymbolId::GLOBAL);
        let mut detached = Vec::new();
        for &sym in &touched {
            let Some(s) = self.graph.get_mut(sym) else {
                continue;
            };
            s.declarations.retain(|d| d.unit != id);
            if !s.declarations.is_empty() {
                continue;
            }
            s.flags &= INTRINSIC_FLAGS;
            s.owner = None;
            detached.push(sym);
            containers.insert(sym);
            for kind in [LinkKind::ContainedBy, LinkKind::MemberOf] {
                let targets = self.graph.targets(sym, kind);
                seeds.extend(targets.iter().copied());
                containers.extend(targets);
                self.graph.unlink_outgoing(sym, kind);
            }
            self.graph.unlink_outgoing(sym, LinkKind::ParameterOf);
        }

        let graph = &mut self.graph;
        let mut containers: Vec<SymbolId> = containers.into_iter().collect();
        containers.sort_unstable();
        for container in containers {
            let live = |g: &SymbolGraph, s: SymbolId| {
                g.get(s).is_some_and(|sym| !sym.declarations.is_empty())
            };
            let Some(c) = graph.get(container) else {
                continue;
            };
            let members: Vec<String> = c
                .members
                .iter()
                .filter(|(_, s)| !live(graph, **s))
                .map(|(name, _)| name.clone())
                .collect();
            let exports: Vec<String> = c
                .exports
                .iter()
                .filter(|(_, s)| !live(graph, **s))
                .map(|(name, _)| name.clone())
                .collect();
            let keep_signature = |g: &SymbolGraph, s: &SymbolId| {
                live(g, *s) || g.flags(*s).contains(SymbolFlags::TRANSIENT)
            };
            let signatures = [
                SignatureKind::Call,
                SignatureKind::Construct,
                SignatureKind::Index,
            ]
            .map(|kind| {
                c.signatures(kind)
                    .iter()
                    .copied()
                    .filter(|s| keep_signature(graph, s))
                    .collect::<Vec<_>>()
            });
            let type_parameters: Vec<SymbolId> = c
                .type_parameters
                .iter()
                .copied()
                .filter(|s| live(graph, *s))
                .collect();

            let Some(c) = graph.get_mut(container) else {
                continue;
            };
            for name in members {
                c.members.shift_remove(&name);
            }
            for name in exports {
                c.exports.shift_remove(&name);
            }
            let [call, construct, index] = signatures;
            c.call_signatures = call;
            c.construct_signatures = construct;
            c.index_signatures = index;
            c.type_parameters = type_parameters;
        }

        trace!(unit = id.0, detached = detached.len(), "unit detached");
        detached
    }
}

/// Symbols declared in `unit` whose resolved state may be stale once the
/// unit's caches are dropped: anything computed from an initializer or body,
/// heritage, type parameter constraints and anything resolved to an error.
fn stale_symbols(graph: &SymbolGraph, unit: &Unit) -> Vec<SymbolId> {
    let mut out = Vec::new();
    let decl = |id| unit.decls.get(id);
    let inferred = |d: &Decl| !d.has_flag(DeclFlags::ANNOTATED);
    for (&decl_id, &sym) in &unit.info.decl_symbols {
        let Some(s) = graph.get(sym) else {
            continue;
        };
        let errored = s.state == ResolutionState::Error || s.type_of == Some(SymbolId::ERROR);
        let stale = errored
            || match s.kind {
                SymbolKind::Class | SymbolKind::Interface | SymbolKind::TypeParameter => true,
                kind if kind.has_resolved_type() => decl(decl_id).is_some_and(inferred),
                _ => false,
            };
        if stale {
            out.push(sym);
        }
    }
    for (&decl_id, &sig) in &unit.info.decl_signatures {
        let errored = graph.get(sig).is_some_and(|s| {
            s.state == ResolutionState::Error || s.return_type == Some(SymbolId::ERROR)
        });
        if errored || decl(decl_id).is_some_and(inferred) {
            out.push(sig);
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}

/// Return a symbol to the unresolved state, keeping its identity.
fn reset_symbol(graph: &mut SymbolGraph, sym: SymbolId) {
    let Some(s) = graph.get(sym) else {
        return;
    };
    let kind = s.kind;
    let specialized = s.specialization.is_some();
    let resettable = specialized
        || kind.has_resolved_type()
        || matches!(
            kind,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::TypeParameter
                | SymbolKind::Signature(_)
        );
    if !resettable {
        return;
    }
    trace!(symbol = sym.0, kind = ?kind, "invalidating symbol");

    if specialized {
        // Materialized members are rebuilt from the root on next resolution.
        let materialized: Vec<SymbolId> = s
            .members
            .values()
            .chain(&s.call_signatures)
            .chain(&s.construct_signatures)
            .chain(&s.index_signatures)
            .chain(&s.parameters)
            .copied()
            .filter(|&m| graph.flags(m).contains(SymbolFlags::TRANSIENT))
            .collect();
        for m in materialized {
            graph.remove_symbol(m);
        }
        if let Some(s) = graph.get_mut(sym) {
            s.members.clear();
            s.call_signatures.clear();
            s.construct_signatures.clear();
            s.index_signatures.clear();
            s.parameters.clear();
        }
        graph.unlink_outgoing(sym, LinkKind::Extends);
    }

    if kind.has_resolved_type() || specialized {
        graph.unlink_outgoing(sym, LinkKind::TypeOf);
        graph.unlink_outgoing(sym, LinkKind::Aliases);
    }
    if matches!(kind, SymbolKind::Class | SymbolKind::Interface) {
        graph.unlink_outgoing(sym, LinkKind::Extends);
        graph.unlink_outgoing(sym, LinkKind::Implements);
    }
    if kind.is_signature() {
        graph.unlink_outgoing(sym, LinkKind::ReturnTypeOf);
    }
    if let Some(s) = graph.get_mut(sym) {
        s.state = ResolutionState::Unresolved;
        if kind.has_resolved_type() {
            s.type_of = None;
        }
        match kind {
            SymbolKind::Signature(_) => s.return_type = None,
            SymbolKind::TypeParameter => s.constraint = None,
            _ => {}
        }
    }
}

/// Remove `sym` together with the value-side type it owns.
fn remove_with_value_type(graph: &mut SymbolGraph, sym: SymbolId) {
    let owned = graph
        .get(sym)
        .and_then(|s| s.type_of)
        .filter(|&t| graph.get(t).is_some_and(|t| t.owner == Some(sym)));
    if let Some(value_type) = owned {
        let implicit: Vec<SymbolId> = graph
            .get(value_type)
            .map(|t| {
                t.construct_signatures
                    .iter()
                    .chain(&t.call_signatures)
                    .copied()
                    .filter(|&s| graph.flags(s).contains(SymbolFlags::TRANSIENT))
                    .collect()
            })
            .unwrap_or_default();
        for sig in implicit {
            graph.remove_symbol(sig);
        }
        graph.remove_symbol(value_type);
    }
    graph.remove_symbol(sym);
}

/// Remove synthesized symbols that nothing outside their own group links to.
/// Members of a removed synthesized type go with it.
fn release_transients(graph: &mut SymbolGraph, candidates: &[SymbolId]) {
    if candidates.is_empty() {
        return;
    }
    let group: FxHashSet<SymbolId> = candidates.iter().copied().collect();
    let mut released = 0usize;
    for &sym in candidates {
        let Some(s) = graph.get(sym) else {
            continue;
        };
        if s.owner.is_some_and(|o| group.contains(&o)) {
            continue;
        }
        let referenced = graph
            .incoming_links(sym)
            .any(|(_, l)| !(l.kind == LinkKind::MemberOf && group.contains(&l.source)));
        if referenced {
            continue;
        }
        let members: Vec<SymbolId> = s
            .members
            .values()
            .copied()
            .filter(|m| group.contains(m))
            .collect();
        for member in members {
            graph.remove_symbol(member);
        }
        graph.remove_symbol(sym);
        released += 1;
    }
    trace!(released, "released transient symbols");
}

#[cfg(test)]
#[path = "../tests/updater_tests.rs"]
mod tests;
