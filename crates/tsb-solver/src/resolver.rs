//! The seam between the solver and whoever resolves declarations.
//!
//! The solver never reads syntax. Whenever it needs the type of a member,
//! the return type of a signature or the bases of a class it asks a
//! [`SymbolResolver`], which may compute the answer lazily (the checker does)
//! or simply read what is already in the graph ([`GraphResolver`]).

use smallvec::SmallVec;
use tsb_binder::{LinkKind, SymbolGraph, SymbolId, SymbolKind};
use tsb_common::AnalysisOptions;

use crate::instantiate::ensure_materialized;
use crate::relation::RelationCache;

pub trait SymbolResolver {
    fn graph(&self) -> &SymbolGraph;

    fn graph_mut(&mut self) -> &mut SymbolGraph;

    fn options(&self) -> &AnalysisOptions;

    fn relation_cache(&mut self) -> &mut RelationCache;

    /// Type of a value symbol, or the aliased type of a type alias.
    fn type_of_symbol(&mut self, sym: SymbolId) -> SymbolId;

    fn return_type_of(&mut self, signature: SymbolId) -> SymbolId;

    /// Resolved `extends` targets of a class or interface.
    fn base_types(&mut self, ty: SymbolId) -> SmallVec<[SymbolId; 2]>;

    fn constraint_of(&mut self, type_parameter: SymbolId) -> Option<SymbolId>;
}

/// Resolver over a graph whose types were filled in ahead of time.
///
/// Missing types read as `any`. Used by tests and by callers that build
/// symbol graphs programmatically.
#[derive(Debug, Default)]
pub struct GraphResolver {
    pub graph: SymbolGraph,
    pub options: AnalysisOptions,
    cache: RelationCache,
}

impl GraphResolver {
    pub fn new(graph: SymbolGraph) -> Self {
        Self {
            graph,
            options: AnalysisOptions::default(),
            cache: RelationCache::default(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    fn materialize_if_specialized(&mut self, sym: SymbolId) {
        if self
            .graph
            .get(sym)
            .is_some_and(|s| s.specialization.is_some() && !s.state.is_done())
        {
            ensure_materialized(self, sym);
        }
    }
}

impl SymbolResolver for GraphResolver {
    fn graph(&self) -> &SymbolGraph {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut SymbolGraph {
        &mut self.graph
    }

    fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    fn relation_cache(&mut self) -> &mut RelationCache {
        &mut self.cache
    }

    fn type_of_symbol(&mut self, sym: SymbolId) -> SymbolId {
        let Some(s) = self.graph.get(sym) else {
            return SymbolId::ERROR;
        };
        if let Some(ty) = s.type_of {
            return ty;
        }
        // A getter's type is its return type.
        if s.kind == SymbolKind::Accessor
            && let Some(&getter) = s.call_signatures.first()
        {
            return self.return_type_of(getter);
        }
        SymbolId::ANY
    }

    fn return_type_of(&mut self, signature: SymbolId) -> SymbolId {
        self.materialize_if_specialized(signature);
        self.graph
            .get(signature)
            .and_then(|s| s.return_type)
            .unwrap_or(SymbolId::ANY)
    }

    fn base_types(&mut self, ty: SymbolId) -> SmallVec<[SymbolId; 2]> {
        self.materialize_if_specialized(ty);
        self.graph
            .targets(ty, LinkKind::Extends)
            .into_iter()
            .collect()
    }

    fn constraint_of(&mut self, type_parameter: SymbolId) -> Option<SymbolId> {
        self.graph.get(type_parameter).and_then(|s| s.constraint)
    }
}
