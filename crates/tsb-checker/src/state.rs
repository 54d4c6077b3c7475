//! Checker state: one resolution session over the semantic info chain.
//!
//! A `CheckerState` borrows the chain, the options and the relation cache
//! from the [`Program`](crate::Program) for the duration of one request.
//! Everything it computes that stays valid across requests is written back
//! into the chain (symbol state, links and per-unit caches); everything
//! else dies with it.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;
use tsb_binder::{
    AttachedDiagnostic, DeclId, DeclRef, DeclTree, SemanticInfo, SemanticInfoChain, SymbolId, UnitId,
};
use tsb_common::{AnalysisOptions, Diagnostic, DiagnosticKind};
use tsb_solver::RelationCache;
use tsb_solver::recursion::{DepthCounter, RecursionProfile};
use tsb_syntax::{NodeArena, NodeIndex};

/// Cache key of a node resolved under an optional contextual type.
pub(crate) type NodeKey = (UnitId, NodeIndex, Option<SymbolId>);

/// Location of one declaration of a symbol.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DeclSite {
    pub unit: UnitId,
    pub decl: DeclId,
    pub node: NodeIndex,
    pub name_node: NodeIndex,
}

/// Speculation and context saved while a declaration is resolved.
pub(crate) struct SavedContext {
    speculative: u32,
    overrides: FxHashMap<SymbolId, SymbolId>,
    scratch: FxHashMap<NodeKey, SymbolId>,
}

pub(crate) struct CheckerState<'a> {
    pub(crate) chain: &'a mut SemanticInfoChain,
    pub(crate) options: &'a AnalysisOptions,
    pub(crate) relations: &'a mut RelationCache,
    /// Classes and interfaces whose heritage clauses are linked.
    pub(crate) heritage: &'a mut FxHashSet<SymbolId>,
    /// Nesting of speculative resolutions. While positive, diagnostics are
    /// dropped and node types go to `scratch`.
    pub(crate) speculative: u32,
    /// Contextual types of the parameters of the function expression whose
    /// body is being resolved.
    pub(crate) overrides: FxHashMap<SymbolId, SymbolId>,
    /// Node types that must not reach the unit caches.
    pub(crate) scratch: FxHashMap<NodeKey, SymbolId>,
    /// Symbols that were asked for while their own resolution was running.
    pub(crate) circular: FxHashSet<SymbolId>,
    pub(crate) depth: DepthCounter,
}

impl<'a> CheckerState<'a> {
    pub(crate) fn new(
        chain: &'a mut SemanticInfoChain,
        options: &'a AnalysisOptions,
        relations: &'a mut RelationCache,
        heritage: &'a mut FxHashSet<SymbolId>,
    ) -> Self {
        Self {
            chain,
            options,
            relations,
            heritage,
            speculative: 0,
            overrides: FxHashMap::default(),
            scratch: FxHashMap::default(),
            circular: FxHashSet::default(),
            depth: DepthCounter::with_profile(RecursionProfile::ExpressionCheck),
        }
    }

    // =========================================================================
    // Unit access
    // =========================================================================

    pub(crate) fn arena(&self, unit: UnitId) -> Option<Arc<NodeArena>> {
        self.chain.unit(unit).map(|u| Arc::clone(&u.arena))
    }

    pub(crate) fn decls(&self, unit: UnitId) -> Option<Arc<DeclTree>> {
        self.chain.unit(unit).map(|u| Arc::clone(&u.decls))
    }

    pub(crate) fn info(&self, unit: UnitId) -> Option<&SemanticInfo> {
        self.chain.unit(unit).map(|u| &u.info)
    }

    pub(crate) fn info_mut(&mut self, unit: UnitId) -> Option<&mut SemanticInfo> {
        self.chain.unit_mut(unit).map(|u| &mut u.info)
    }

    pub(crate) fn site(&self, decl: DeclRef) -> Option<DeclSite> {
        let d = self.chain.decl(decl)?;
        Some(DeclSite {
            unit: decl.unit,
            decl: decl.decl,
            node: d.node,
            name_node: d.name_node,
        })
    }

    pub(crate) fn first_site(&self, sym: SymbolId) -> Option<DeclSite> {
        let first = self.chain.graph.get(sym)?.first_declaration()?;
        self.site(first)
    }

    /// Innermost decl whose node encloses `node`.
    pub(crate) fn enclosing_decl(&self, unit: UnitId, node: NodeIndex) -> Option<DeclId> {
        let u = self.chain.unit(unit)?;
        u.arena
            .ancestors(node)
            .find_map(|ancestor| u.decls.decl_of_node(ancestor))
    }

    // =========================================================================
    // Node caches
    // =========================================================================

    /// Whether results computed now may be stored in the unit caches.
    pub(crate) fn caching(&self) -> bool {
        self.speculative == 0 && self.overrides.is_empty()
    }

    pub(crate) fn lookup_type(
        &self,
        unit: UnitId,
        node: NodeIndex,
        contextual: Option<SymbolId>,
    ) -> Option<SymbolId> {
        if self.overrides.is_empty()
            && let Some(&ty) = self.info(unit)?.node_types.get(&(node, contextual))
        {
            return Some(ty);
        }
        self.scratch.get(&(unit, node, contextual)).copied()
    }

    pub(crate) fn store_type(
        &mut self,
        unit: UnitId,
        node: NodeIndex,
        contextual: Option<SymbolId>,
        ty: SymbolId,
    ) {
        if self.caching() {
            if let Some(info) = self.info_mut(unit) {
                info.node_types.insert((node, contextual), ty);
            }
        } else {
            self.scratch.insert((unit, node, contextual), ty);
        }
    }

    pub(crate) fn record_symbol(&mut self, unit: UnitId, node: NodeIndex, sym: SymbolId) {
        if let Some(info) = self.info_mut(unit) {
            info.node_symbols.insert(node, sym);
            info.referenced.insert(sym);
        }
    }

    pub(crate) fn record_unresolved(&mut self, unit: UnitId, name: &str) {
        if let Some(info) = self.info_mut(unit) {
            info.unresolved_names.insert(name.to_string());
        }
    }

    pub(crate) fn record_transient(&mut self, unit: UnitId, sym: SymbolId) {
        if let Some(info) = self.info_mut(unit) {
            info.transient_symbols.push(sym);
        }
    }

    // =========================================================================
    // Speculation
    // =========================================================================

    pub(crate) fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.speculative += 1;
        let result = f(self);
        self.speculative -= 1;
        if self.speculative == 0 && self.overrides.is_empty() {
            self.scratch.clear();
        }
        result
    }

    /// Leave any speculation or function-body context: declaration types
    /// never depend on the call site that first asked for them.
    pub(crate) fn enter_declaration(&mut self) -> SavedContext {
        SavedContext {
            speculative: std::mem::take(&mut self.speculative),
            overrides: std::mem::take(&mut self.overrides),
            scratch: std::mem::take(&mut self.scratch),
        }
    }

    pub(crate) fn leave_declaration(&mut self, saved: SavedContext) {
        self.speculative = saved.speculative;
        self.overrides = saved.overrides;
        self.scratch = saved.scratch;
    }

    /// Resolve under additional parameter overrides. Scratch results from
    /// outside do not apply inside and vice versa.
    pub(crate) fn with_overrides<T>(
        &mut self,
        overrides: &[(SymbolId, SymbolId)],
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let saved_overrides = self.overrides.clone();
        let saved_scratch = std::mem::take(&mut self.scratch);
        self.overrides.extend(overrides.iter().copied());
        let result = f(self);
        self.overrides = saved_overrides;
        self.scratch = saved_scratch;
        result
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub(crate) fn report(
        &mut self,
        unit: UnitId,
        node: NodeIndex,
        kind: DiagnosticKind,
        args: Vec<String>,
    ) {
        if self.speculative > 0 {
            return;
        }
        let Some(u) = self.chain.unit(unit) else {
            return;
        };
        let diagnostic = Diagnostic::new(u.path.clone(), u.arena.span(node), kind, args);
        self.push_diagnostic(unit, node, diagnostic);
    }

    pub(crate) fn push_diagnostic(&mut self, unit: UnitId, node: NodeIndex, diagnostic: Diagnostic) {
        if self.speculative > 0 {
            return;
        }
        let decl = self.enclosing_decl(unit, node);
        let Some(info) = self.info_mut(unit) else {
            return;
        };
        let duplicate = info.check_diagnostics.iter().any(|d| {
            d.node == node && d.diagnostic.kind == diagnostic.kind && d.diagnostic.args == diagnostic.args
        });
        if duplicate {
            return;
        }
        debug!(
            unit = unit.0,
            code = diagnostic.code,
            start = diagnostic.start,
            args = ?diagnostic.args,
            "check diagnostic"
        );
        info.check_diagnostics.push(AttachedDiagnostic {
            decl,
            node,
            diagnostic,
        });
    }
}
