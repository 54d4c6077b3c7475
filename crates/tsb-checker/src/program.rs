//! The analysis session.
//!
//! A [`Program`] owns the semantic info chain together with everything
//! resolution caches across requests. All entry points (checking, tooling
//! queries, edits) go through it.

use rustc_hash::FxHashSet;
use tracing::{debug, info_span};
use tsb_binder::{LinkKind, SemanticInfoChain, SymbolId, SymbolKind, UnitId, UpdateOutcome};
use tsb_common::{AnalysisOptions, Diagnostic, sort_diagnostics};
use tsb_solver::RelationCache;
use tsb_syntax::{NodeArena, NodeIndex};

use crate::state::CheckerState;

#[derive(Debug, Default)]
pub struct Program {
    chain: SemanticInfoChain,
    options: AnalysisOptions,
    relations: RelationCache,
    /// Classes and interfaces whose heritage clauses have been linked.
    heritage: FxHashSet<SymbolId>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: AnalysisOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn chain(&self) -> &SemanticInfoChain {
        &self.chain
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub(crate) fn state(&mut self) -> CheckerState<'_> {
        CheckerState::new(
            &mut self.chain,
            &self.options,
            &mut self.relations,
            &mut self.heritage,
        )
    }

    // =========================================================================
    // Units
    // =========================================================================

    /// Bind a new unit. Units that failed to resolve one of its names, or
    /// that depend on a symbol it merges into, are resolved again.
    pub fn add_unit(&mut self, path: impl Into<String>, arena: NodeArena) -> UnitId {
        let unit = self.chain.add_unit(path, arena);
        self.invalidate_for_added(unit);
        unit
    }

    fn invalidate_for_added(&mut self, added: UnitId) {
        let Some(u) = self.chain.unit(added) else {
            return;
        };
        let names: FxHashSet<&str> = u
            .decls
            .roots()
            .iter()
            .filter_map(|&d| u.decls.get(d))
            .map(|d| d.name.as_str())
            .collect();
        let merged: FxHashSet<SymbolId> = self
            .chain
            .graph
            .iter()
            .filter(|(_, s)| {
                s.declarations.iter().any(|d| d.unit == added)
                    && s.declarations.iter().any(|d| d.unit != added)
            })
            .map(|(id, _)| id)
            .collect();
        let stale: Vec<UnitId> = self
            .chain
            .units()
            .filter(|other| other.id != added)
            .filter(|other| {
                other.info.referenced.iter().any(|s| merged.contains(s))
                    || other
                        .info
                        .unresolved_names
                        .iter()
                        .any(|n| names.contains(n.as_str()))
            })
            .map(|other| other.id)
            .collect();

        if !merged.is_empty() {
            let mut dirty = FxHashSet::default();
            self.chain
                .graph
                .collect_dependents(merged.iter().copied().collect(), &mut dirty);
            self.relations.purge(|s| dirty.contains(&s));
        }
        for sym in merged {
            if matches!(self.chain.graph.kind(sym), SymbolKind::Class | SymbolKind::Interface)
                && self.heritage.remove(&sym)
            {
                self.chain.graph.unlink_outgoing(sym, LinkKind::Extends);
                self.chain.graph.unlink_outgoing(sym, LinkKind::Implements);
            }
        }
        // Rebinding an unchanged tree resets what the unit resolved and
        // everything that depended on it.
        for unit in stale {
            let Some(arena) = self.chain.unit(unit).map(|u| NodeArena::clone(&u.arena)) else {
                continue;
            };
            debug!(unit = unit.0, added = added.0, "unit depends on added unit");
            if let Some(outcome) = self.chain.update_unit(unit, arena) {
                self.forget(&outcome);
            }
        }
    }

    /// Replace the syntax tree of `unit`, rebinding only what changed.
    pub fn update_unit(&mut self, unit: UnitId, arena: NodeArena) -> Option<UpdateOutcome> {
        let outcome = self.chain.update_unit(unit, arena)?;
        self.forget(&outcome);
        Some(outcome)
    }

    pub fn remove_unit(&mut self, unit: UnitId) -> Option<UpdateOutcome> {
        let outcome = self.chain.remove_unit(unit)?;
        self.forget(&outcome);
        Some(outcome)
    }

    /// Drop what was computed from symbols the update reset or removed.
    /// Relations between untouched types stay cached.
    fn forget(&mut self, outcome: &UpdateOutcome) {
        let dirty: FxHashSet<SymbolId> = outcome
            .invalidated
            .iter()
            .chain(&outcome.removed)
            .copied()
            .collect();
        let graph = &self.chain.graph;
        self.relations
            .purge(|s| dirty.contains(&s) || !graph.contains(s));
        for sym in &dirty {
            self.heritage.remove(sym);
        }
    }

    // =========================================================================
    // Checking
    // =========================================================================

    /// Diagnostics of one unit: binding errors plus the check pass, which
    /// runs at most once between edits.
    pub fn check_unit(&mut self, unit: UnitId) -> Vec<Diagnostic> {
        let needs_check = self.chain.unit(unit).is_some_and(|u| !u.info.checked);
        if needs_check {
            let path = self.chain.path(unit).to_string();
            let _span = info_span!("check_unit", unit = unit.0, path = %path).entered();
            self.state().check_unit(unit);
            if let Some(u) = self.chain.unit_mut(unit) {
                u.info.checked = true;
            }
        }
        self.diagnostics(unit)
    }

    /// Diagnostics of every unit, in reporter order.
    pub fn check_all(&mut self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for unit in self.chain.unit_ids() {
            out.extend(self.check_unit(unit));
        }
        sort_diagnostics(&mut out);
        out
    }

    /// Diagnostics recorded so far for `unit`, without running the check pass.
    pub fn diagnostics(&self, unit: UnitId) -> Vec<Diagnostic> {
        let Some(u) = self.chain.unit(unit) else {
            return Vec::new();
        };
        let mut out: Vec<Diagnostic> = u
            .info
            .binder_diagnostics()
            .iter()
            .chain(&u.info.check_diagnostics)
            .map(|d| d.diagnostic.clone())
            .collect();
        sort_diagnostics(&mut out);
        out
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Type of the expression or type node at `node`.
    pub fn type_of_node(&mut self, unit: UnitId, node: NodeIndex) -> SymbolId {
        let Some(kind) = self
            .chain
            .unit(unit)
            .and_then(|u| u.arena.get(node))
            .map(|n| n.kind)
        else {
            return SymbolId::ERROR;
        };
        let mut state = self.state();
        if kind.is_type_node() {
            state.resolve_type_node(unit, node)
        } else {
            state.resolve_expression(unit, node, None)
        }
    }

    /// Declared type of a value symbol, or the target of a type alias.
    pub fn type_of_symbol(&mut self, symbol: SymbolId) -> SymbolId {
        self.state().declared_type(symbol)
    }

    pub fn type_to_string(&self, ty: SymbolId) -> String {
        tsb_solver::type_to_string(&self.chain.graph, ty)
    }

    /// Whether `source` is assignable to `target`.
    pub fn is_assignable(&mut self, source: SymbolId, target: SymbolId) -> bool {
        let mut state = self.state();
        tsb_solver::is_assignable(&mut state, source, target)
    }
}

#[cfg(test)]
#[path = "../tests/program_tests.rs"]
mod tests;
