//! Lazy declaration resolution.
//!
//! The binder records shapes; the types that need another declaration
//! (annotations, initializers, return types, heritage clauses, constraints)
//! are computed here the first time the solver or the checker asks for them.
//! Each computation runs the symbol's state machine
//! (`Unresolved -> Resolving -> Resolved | Error`); asking for a symbol
//! that is `Resolving` yields the error type and marks the cycle, which is
//! reported once when the outer computation finishes.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{debug, trace};
use tsb_binder::{
    DeclKind, DeclRef, LinkKind, ResolutionState, SymbolFlags, SymbolGraph, SymbolId, SymbolKind, UnitId,
};
use tsb_common::{AnalysisOptions, DiagnosticKind};
use tsb_solver::objects::resolve_alias;
use tsb_solver::{RelationCache, SymbolResolver, ensure_materialized};
use tsb_syntax::{NodeArena, NodeData, NodeIndex, SyntaxKind};

use crate::state::{CheckerState, DeclSite};

impl SymbolResolver for CheckerState<'_> {
    fn graph(&self) -> &SymbolGraph {
        &self.chain.graph
    }

    fn graph_mut(&mut self) -> &mut SymbolGraph {
        &mut self.chain.graph
    }

    fn options(&self) -> &AnalysisOptions {
        self.options
    }

    fn relation_cache(&mut self) -> &mut RelationCache {
        &mut *self.relations
    }

    fn type_of_symbol(&mut self, sym: SymbolId) -> SymbolId {
        self.declared_type(sym)
    }

    fn return_type_of(&mut self, signature: SymbolId) -> SymbolId {
        self.return_type(signature)
    }

    fn base_types(&mut self, ty: SymbolId) -> SmallVec<[SymbolId; 2]> {
        self.bases_of(ty)
    }

    fn constraint_of(&mut self, type_parameter: SymbolId) -> Option<SymbolId> {
        self.constraint(type_parameter)
    }
}

/// `null` and `undefined` inferred for a declaration widen to `any`.
pub(crate) fn widen(ty: SymbolId) -> SymbolId {
    if ty.is_widening() { SymbolId::ANY } else { ty }
}

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Value types
    // =========================================================================

    /// Type of a value symbol, or the aliased type of a type alias.
    pub(crate) fn declared_type(&mut self, sym: SymbolId) -> SymbolId {
        if let Some(&ty) = self.overrides.get(&sym) {
            return ty;
        }
        let Some(s) = self.chain.graph.get(sym) else {
            return SymbolId::ERROR;
        };
        let (kind, state, bound) = (s.kind, s.state, s.type_of);
        let synthesized = s.has_flag(SymbolFlags::TRANSIENT) || s.specialization.is_some();
        if !kind.has_resolved_type() || synthesized || s.declarations.is_empty() {
            if kind == SymbolKind::Accessor && bound.is_none() {
                return self.accessor_type(sym);
            }
            return bound.unwrap_or(if kind == SymbolKind::Error {
                SymbolId::ERROR
            } else {
                SymbolId::ANY
            });
        }
        match state {
            ResolutionState::Resolved => return bound.unwrap_or(SymbolId::ANY),
            ResolutionState::Error => return SymbolId::ERROR,
            ResolutionState::Resolving => {
                trace!(sym = sym.0, "type requested while resolving");
                self.circular.insert(sym);
                return SymbolId::ERROR;
            }
            ResolutionState::Unresolved => {}
        }

        self.set_state(sym, ResolutionState::Resolving);
        let saved = self.enter_declaration();
        let ty = match kind {
            SymbolKind::Accessor => self.accessor_type(sym),
            _ => self.compute_declared_type(sym),
        };
        self.leave_declaration(saved);

        let ty = self.finish(sym, ty);
        if let Some(s) = self.chain.graph.get_mut(sym) {
            s.type_of = Some(ty);
        }
        let link = if kind == SymbolKind::TypeAlias {
            LinkKind::Aliases
        } else {
            LinkKind::TypeOf
        };
        self.chain.graph.link(sym, ty, link);
        trace!(sym = sym.0, ty = ty.0, "declared type resolved");
        ty
    }

    fn compute_declared_type(&mut self, sym: SymbolId) -> SymbolId {
        let Some(site) = self.first_site(sym) else {
            return SymbolId::ANY;
        };
        let Some(arena) = self.arena(site.unit) else {
            return SymbolId::ERROR;
        };
        let rest = self.chain.graph.flags(sym).contains(SymbolFlags::REST);
        match arena.get(site.node).map(|n| &n.data) {
            Some(NodeData::TypeAlias { type_node, .. }) => {
                let target = self.resolve_type_node(site.unit, *type_node);
                // Follow alias chains now so that a cycle is caught here.
                if self.chain.graph.kind(target) == SymbolKind::TypeAlias {
                    self.declared_type(target);
                }
                target
            }
            Some(NodeData::Variable {
                type_annotation,
                initializer,
                ..
            }) => {
                if type_annotation.is_some() {
                    self.resolve_type_node(site.unit, *type_annotation)
                } else if initializer.is_some() {
                    let ty = self.resolve_expression(site.unit, *initializer, None);
                    widen(ty)
                } else if rest {
                    self.chain.graph.array_of(SymbolId::ANY)
                } else {
                    SymbolId::ANY
                }
            }
            _ => SymbolId::ANY,
        }
    }

    /// A getter's return type, else the parameter type of the setter.
    fn accessor_type(&mut self, sym: SymbolId) -> SymbolId {
        let signatures: Vec<SymbolId> = self
            .chain
            .graph
            .get(sym)
            .map(|s| s.call_signatures.clone())
            .unwrap_or_default();
        let mut setter_param = None;
        for sig in signatures {
            let site = self
                .chain
                .graph
                .get(sig)
                .and_then(|s| s.first_declaration())
                .and_then(|d| self.chain.decl(d).map(|decl| decl.kind));
            match site {
                Some(DeclKind::GetAccessor) => return self.return_type(sig),
                Some(DeclKind::SetAccessor) => {
                    setter_param = self
                        .chain
                        .graph
                        .get(sig)
                        .and_then(|s| s.parameters.first().copied());
                }
                _ => {}
            }
        }
        match setter_param {
            Some(param) => self.declared_type(param),
            None => SymbolId::ANY,
        }
    }

    // =========================================================================
    // Return types
    // =========================================================================

    pub(crate) fn return_type(&mut self, sig: SymbolId) -> SymbolId {
        let Some(s) = self.chain.graph.get(sig) else {
            return SymbolId::ERROR;
        };
        if s.specialization.is_some() {
            if !s.state.is_done() {
                ensure_materialized(self, sig);
            }
            return self.stored_return_type(sig);
        }
        match s.state {
            ResolutionState::Resolved => return s.return_type.unwrap_or(SymbolId::ANY),
            ResolutionState::Error => return SymbolId::ERROR,
            ResolutionState::Resolving => {
                self.circular.insert(sig);
                return SymbolId::ERROR;
            }
            ResolutionState::Unresolved => {}
        }
        if let (true, Some(ty)) = (s.declarations.is_empty(), s.return_type) {
            return ty;
        }

        self.set_state(sig, ResolutionState::Resolving);
        let saved = self.enter_declaration();
        let ty = match self.first_site(sig) {
            Some(site) => self.compute_return_type(sig, site),
            None => self.implicit_construct_return(sig),
        };
        self.leave_declaration(saved);

        let ty = self.finish(sig, ty);
        if let Some(s) = self.chain.graph.get_mut(sig) {
            s.return_type = Some(ty);
        }
        self.chain.graph.link(sig, ty, LinkKind::ReturnTypeOf);
        ty
    }

    fn stored_return_type(&self, sig: SymbolId) -> SymbolId {
        self.chain
            .graph
            .get(sig)
            .and_then(|s| s.return_type)
            .unwrap_or(SymbolId::ANY)
    }

    /// An implicit constructor creates an instance of its class.
    fn implicit_construct_return(&self, sig: SymbolId) -> SymbolId {
        self.chain
            .graph
            .targets(sig, LinkKind::MemberOf)
            .first()
            .and_then(|&ctor_type| self.chain.graph.get(ctor_type))
            .and_then(|t| t.owner)
            .unwrap_or(SymbolId::ANY)
    }

    fn compute_return_type(&mut self, sig: SymbolId, site: DeclSite) -> SymbolId {
        let Some(decl) = self.chain.decl(DeclRef::new(site.unit, site.decl)) else {
            return SymbolId::ERROR;
        };
        let (kind, parent) = (decl.kind, decl.parent);
        if kind == DeclKind::Constructor {
            let class = parent.and_then(|p| self.chain.decl_symbol(DeclRef::new(site.unit, p)));
            return class.unwrap_or_else(|| self.implicit_construct_return(sig));
        }
        let Some(arena) = self.arena(site.unit) else {
            return SymbolId::ERROR;
        };
        let Some(NodeData::FunctionLike {
            return_type, body, ..
        }) = arena.get(site.node).map(|n| &n.data)
        else {
            return SymbolId::ANY;
        };
        if return_type.is_some() {
            return self.resolve_type_node(site.unit, *return_type);
        }
        if kind == DeclKind::SetAccessor {
            return SymbolId::VOID;
        }
        if body.is_none() {
            return SymbolId::ANY;
        }
        self.infer_body_type(site.unit, &arena, site.node, *body)
    }

    /// Return type of an unannotated body: the best common type of its
    /// `return` expressions, `void` when there are none, or the type of an
    /// expression body.
    pub(crate) fn infer_body_type(
        &mut self,
        unit: UnitId,
        arena: &NodeArena,
        function: NodeIndex,
        body: NodeIndex,
    ) -> SymbolId {
        if arena.get(body).map(|n| n.kind) != Some(SyntaxKind::Block) {
            let ty = self.resolve_expression(unit, body, None);
            return widen(ty);
        }
        let returns = return_expressions(arena, body);
        if returns.is_empty() {
            return SymbolId::VOID;
        }
        let types: Vec<SymbolId> = returns
            .iter()
            .map(|&expr| {
                let ty = self.resolve_expression(unit, expr, None);
                widen(ty)
            })
            .collect();
        match self.best_common_type(&types) {
            Some(ty) => ty,
            None => {
                let at = arena.get(function).map(|n| n.name()).filter(|n| n.is_some());
                self.report(unit, at.unwrap_or(function), DiagnosticKind::NoBestCommonType, Vec::new());
                SymbolId::ERROR
            }
        }
    }

    // =========================================================================
    // Bases and constraints
    // =========================================================================

    pub(crate) fn bases_of(&mut self, ty: SymbolId) -> SmallVec<[SymbolId; 2]> {
        let Some(s) = self.chain.graph.get(ty) else {
            return SmallVec::new();
        };
        if s.specialization.is_some() {
            if !s.state.is_done() {
                ensure_materialized(self, ty);
            }
        } else if matches!(s.kind, SymbolKind::Class | SymbolKind::Interface)
            && !s.declarations.is_empty()
            && self.heritage.insert(ty)
        {
            self.link_heritage(ty);
        }
        self.chain
            .graph
            .targets(ty, LinkKind::Extends)
            .into_iter()
            .collect()
    }

    /// Resolve the heritage clauses of every declaration of `ty` into
    /// `Extends` and `Implements` links.
    fn link_heritage(&mut self, ty: SymbolId) {
        let declarations = self
            .chain
            .graph
            .get(ty)
            .map(|s| s.declarations.to_vec())
            .unwrap_or_default();
        let saved = self.enter_declaration();
        for decl in declarations {
            let Some(site) = self.site(decl) else {
                continue;
            };
            let Some(arena) = self.arena(site.unit) else {
                continue;
            };
            match arena.get(site.node).map(|n| &n.data) {
                Some(NodeData::Class {
                    extends, implements, ..
                }) => {
                    if extends.is_some() {
                        self.link_base(ty, site.unit, *extends, LinkKind::Extends);
                    }
                    for node in implements.iter() {
                        self.link_base(ty, site.unit, node, LinkKind::Implements);
                    }
                }
                Some(NodeData::Interface { extends, .. }) => {
                    for node in extends.iter() {
                        self.link_base(ty, site.unit, node, LinkKind::Extends);
                    }
                }
                _ => {}
            }
        }
        self.leave_declaration(saved);
    }

    fn link_base(&mut self, ty: SymbolId, unit: UnitId, node: NodeIndex, kind: LinkKind) {
        let target = self.resolve_type_node(unit, node);
        let target = resolve_alias(self, target);
        if target == ty || !self.chain.graph.kind(target).is_object_like() {
            return;
        }
        if kind == LinkKind::Extends && self.derives_from(target, ty) {
            let name = self.chain.graph.name(ty).to_string();
            self.report(unit, node, DiagnosticKind::CircularReference, vec![name]);
            return;
        }
        if self.chain.graph.targets(ty, kind).contains(&target) {
            return;
        }
        debug!(ty = ty.0, base = target.0, ?kind, "heritage linked");
        self.chain.graph.link(ty, target, kind);
    }

    /// Whether `ty` already reaches `ancestor` through `Extends` links.
    fn derives_from(&self, ty: SymbolId, ancestor: SymbolId) -> bool {
        let mut pending = vec![ty];
        let mut seen = FxHashSet::default();
        while let Some(current) = pending.pop() {
            if current == ancestor {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            let root = self
                .chain
                .graph
                .get(current)
                .and_then(|s| s.specialization.as_ref())
                .map_or(current, |spec| spec.root);
            pending.extend(self.chain.graph.targets(root, LinkKind::Extends));
        }
        false
    }

    pub(crate) fn constraint(&mut self, tp: SymbolId) -> Option<SymbolId> {
        let s = self.chain.graph.get(tp)?;
        if s.state.is_done() || s.declarations.is_empty() {
            return s.constraint;
        }
        if s.state == ResolutionState::Resolving {
            return None;
        }
        self.set_state(tp, ResolutionState::Resolving);
        let saved = self.enter_declaration();
        let constraint = self.first_site(tp).and_then(|site| {
            let arena = self.arena(site.unit)?;
            match arena.get(site.node).map(|n| &n.data) {
                Some(NodeData::TypeParameter { constraint, .. }) if constraint.is_some() => {
                    Some(self.resolve_type_node(site.unit, *constraint))
                }
                _ => None,
            }
        });
        self.leave_declaration(saved);
        if let Some(s) = self.chain.graph.get_mut(tp) {
            s.constraint = constraint;
            s.state = ResolutionState::Resolved;
        }
        constraint
    }

    // =========================================================================
    // State machine
    // =========================================================================

    fn set_state(&mut self, sym: SymbolId, state: ResolutionState) {
        if let Some(s) = self.chain.graph.get_mut(sym) {
            s.state = state;
        }
    }

    /// Settle a computation: a symbol that was reached from its own
    /// resolution becomes the error type and is reported once.
    fn finish(&mut self, sym: SymbolId, ty: SymbolId) -> SymbolId {
        if self.circular.remove(&sym) {
            debug!(sym = sym.0, "circular reference");
            self.set_state(sym, ResolutionState::Error);
            self.report_circular(sym);
            return SymbolId::ERROR;
        }
        self.set_state(sym, ResolutionState::Resolved);
        ty
    }

    fn report_circular(&mut self, sym: SymbolId) {
        let Some(site) = self.first_site(sym) else {
            return;
        };
        let name = self.chain.graph.name(sym).to_string();
        let at = if site.name_node.is_some() {
            site.name_node
        } else {
            site.node
        };
        let saved = self.enter_declaration();
        self.report(site.unit, at, DiagnosticKind::CircularReference, vec![name]);
        self.leave_declaration(saved);
    }
}

/// `return` expressions of a function body, not descending into nested
/// functions or classes.
fn return_expressions(arena: &NodeArena, body: NodeIndex) -> Vec<NodeIndex> {
    let mut out = Vec::new();
    let mut pending = vec![body];
    while let Some(current) = pending.pop() {
        let Some(node) = arena.get(current) else {
            continue;
        };
        if current != body
            && (node.kind.is_function_like() || node.kind == SyntaxKind::ClassDeclaration)
        {
            continue;
        }
        if let NodeData::Return { expression } = &node.data {
            if expression.is_some() {
                out.push(*expression);
            }
            continue;
        }
        let mut children = arena.children(current);
        children.reverse();
        pending.extend(children);
    }
    out
}
