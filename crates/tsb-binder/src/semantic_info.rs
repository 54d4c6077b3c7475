//! Per-unit semantic caches and the session-scoped chain that owns them.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;
use tsb_common::Diagnostic;
use tsb_syntax::{NodeArena, NodeIndex};

use crate::binder::Binder;
use crate::decl_builder::build_decl_tree;
use crate::decls::{Decl, DeclId, DeclRef, DeclTree, UnitId};
use crate::graph::SymbolGraph;
use crate::symbols::{SymbolId, SymbolTable};

/// A diagnostic together with the node and decl it is attached to, so that
/// invalidating either also drops the diagnostic.
#[derive(Clone, Debug)]
pub struct AttachedDiagnostic {
    pub decl: Option<DeclId>,
    pub node: NodeIndex,
    pub diagnostic: Diagnostic,
}

/// Outcome of overload resolution at one call site, kept for tooling.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallResolution {
    /// The chosen signature, specialized when generic.
    pub chosen: Option<SymbolId>,
    pub chosen_index: Option<usize>,
    /// Every signature considered, in declaration order.
    pub candidates: Vec<SymbolId>,
}

/// Semantic caches for one compilation unit.
///
/// Binding tables (`decl_*`) are rebuilt whenever the unit is rebound.
/// Resolution caches are owned by the resolver and cleared wholesale by
/// [`SemanticInfo::clear_resolution_caches`].
#[derive(Debug, Default)]
pub struct SemanticInfo {
    pub(crate) decl_symbols: FxHashMap<DeclId, SymbolId>,
    pub(crate) decl_signatures: FxHashMap<DeclId, SymbolId>,
    pub(crate) decl_locals: FxHashMap<DeclId, SymbolTable>,
    pub(crate) binder_diagnostics: Vec<AttachedDiagnostic>,

    /// Resolved type of a node, keyed by the contextual type it was resolved under.
    pub node_types: FxHashMap<(NodeIndex, Option<SymbolId>), SymbolId>,
    /// Symbol a name node refers to.
    pub node_symbols: FxHashMap<NodeIndex, SymbolId>,
    pub call_resolutions: FxHashMap<NodeIndex, CallResolution>,
    pub check_diagnostics: Vec<AttachedDiagnostic>,
    /// Symbols this unit's resolution looked up or depended on.
    pub referenced: FxHashSet<SymbolId>,
    /// Names this unit failed to resolve; a later declaration may satisfy them.
    pub unresolved_names: FxHashSet<String>,
    /// Symbols synthesized while resolving this unit's nodes.
    pub transient_symbols: Vec<SymbolId>,
    /// Whether the check pass has run since the caches were last cleared.
    pub checked: bool,
}

impl SemanticInfo {
    pub fn decl_symbol(&self, decl: DeclId) -> Option<SymbolId> {
        self.decl_symbols.get(&decl).copied()
    }

    pub fn decl_signature(&self, decl: DeclId) -> Option<SymbolId> {
        self.decl_signatures.get(&decl).copied()
    }

    pub fn locals(&self, decl: DeclId) -> Option<&SymbolTable> {
        self.decl_locals.get(&decl)
    }

    pub fn binder_diagnostics(&self) -> &[AttachedDiagnostic] {
        &self.binder_diagnostics
    }

    /// Decls whose bound symbol is `symbol`.
    pub fn decls_of_symbol(&self, symbol: SymbolId) -> impl Iterator<Item = DeclId> + '_ {
        self.decl_symbols
            .iter()
            .filter(move |(_, s)| **s == symbol)
            .map(|(d, _)| *d)
    }

    /// Drop every resolver-owned cache. Returns the transient symbols the
    /// caller should remove from the graph.
    pub fn clear_resolution_caches(&mut self) -> Vec<SymbolId> {
        self.node_types.clear();
        self.node_symbols.clear();
        self.call_resolutions.clear();
        self.check_diagnostics.clear();
        self.referenced.clear();
        self.unresolved_names.clear();
        self.checked = false;
        std::mem::take(&mut self.transient_symbols)
    }
}

/// One bound compilation unit.
#[derive(Debug)]
pub struct Unit {
    pub id: UnitId,
    pub path: String,
    pub arena: Arc<NodeArena>,
    pub decls: Arc<DeclTree>,
    pub info: SemanticInfo,
}

/// Session-scoped owner of the symbol graph and all units.
///
/// Created once per analysis session and passed explicitly to every
/// component; there is no process-wide state.
#[derive(Debug, Default)]
pub struct SemanticInfoChain {
    pub graph: SymbolGraph,
    pub(crate) units: Vec<Option<Unit>>,
}

impl SemanticInfoChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the decl tree for `arena` and bind it as a new unit.
    pub fn add_unit(&mut self, path: impl Into<String>, arena: NodeArena) -> UnitId {
        let id = UnitId(self.units.len() as u32);
        let arena = Arc::new(arena);
        let decls = Arc::new(build_decl_tree(&arena));
        let path = path.into();
        debug!(unit = id.0, path = %path, decls = decls.len(), "adding unit");
        self.units.push(None);
        let mut unit = Unit {
            id,
            path,
            arena,
            decls,
            info: SemanticInfo::default(),
        };
        let no_reuse = FxHashMap::default();
        Binder::new(&mut self.graph, &self.units, &mut unit, &no_reuse, &no_reuse).bind_unit();
        self.units[id.0 as usize] = Some(unit);
        id
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn unit_by_path(&self, path: &str) -> Option<UnitId> {
        self.units().find(|u| u.path == path).map(|u| u.id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter_map(Option::as_ref)
    }

    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units().map(|u| u.id).collect()
    }

    pub fn decl(&self, decl: DeclRef) -> Option<&Decl> {
        self.unit(decl.unit)?.decls.get(decl.decl)
    }

    pub fn decl_symbol(&self, decl: DeclRef) -> Option<SymbolId> {
        self.unit(decl.unit)?.info.decl_symbol(decl.decl)
    }

    pub fn decl_signature(&self, decl: DeclRef) -> Option<SymbolId> {
        self.unit(decl.unit)?.info.decl_signature(decl.decl)
    }

    pub fn locals(&self, decl: DeclRef) -> Option<&SymbolTable> {
        self.unit(decl.unit)?.info.locals(decl.decl)
    }

    /// Path of a unit, or the empty string for a removed one.
    pub fn path(&self, unit: UnitId) -> &str {
        self.unit(unit).map_or("", |u| u.path.as_str())
    }

    /// The global scope table: top-level names of every unit.
    pub fn globals(&self) -> Option<&SymbolTable> {
        self.graph.get(SymbolId::GLOBAL).map(|g| &g.exports)
    }
}

#[cfg(test)]
#[path = "../tests/semantic_info_tests.rs"]
mod tests;
