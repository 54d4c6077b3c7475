//! Call and `new` expressions, and contextually typed function expressions.

use smallvec::SmallVec;
use tracing::{debug, trace};
use tsb_binder::{
    DeclFlags, LinkKind, ResolutionState, SignatureKind, SymbolFlags, SymbolGraph, SymbolId,
    SymbolKind, UnitId,
};
use tsb_common::{AnalysisOptions, DiagnosticKind};
use tsb_solver::objects::{parameter_type_at, signatures_of};
use tsb_solver::{
    CallArguments, OverloadError, RelationCache, SymbolResolver, resolve_call, signature_to_string,
    type_to_string,
};
use tsb_syntax::{NodeData, NodeIndex};

use crate::state::CheckerState;

/// Arguments of one call site, resolved speculatively on demand.
struct CallSite<'s, 'a> {
    state: &'s mut CheckerState<'a>,
    unit: UnitId,
    arguments: &'s [NodeIndex],
}

impl SymbolResolver for CallSite<'_, '_> {
    fn graph(&self) -> &SymbolGraph {
        self.state.graph()
    }

    fn graph_mut(&mut self) -> &mut SymbolGraph {
        self.state.graph_mut()
    }

    fn options(&self) -> &AnalysisOptions {
        self.state.options
    }

    fn relation_cache(&mut self) -> &mut RelationCache {
        self.state.relation_cache()
    }

    fn type_of_symbol(&mut self, sym: SymbolId) -> SymbolId {
        self.state.declared_type(sym)
    }

    fn return_type_of(&mut self, signature: SymbolId) -> SymbolId {
        self.state.return_type(signature)
    }

    fn base_types(&mut self, ty: SymbolId) -> SmallVec<[SymbolId; 2]> {
        self.state.bases_of(ty)
    }

    fn constraint_of(&mut self, type_parameter: SymbolId) -> Option<SymbolId> {
        self.state.constraint(type_parameter)
    }
}

impl CallArguments for CallSite<'_, '_> {
    fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    fn argument_type(&mut self, index: usize, contextual: Option<SymbolId>) -> SymbolId {
        match self.arguments.get(index) {
            Some(&arg) => self.state.resolve_expression(self.unit, arg, contextual),
            None => SymbolId::ANY,
        }
    }
}

impl<'a> CheckerState<'a> {
    pub(crate) fn resolve_call_expression(
        &mut self,
        unit: UnitId,
        node: NodeIndex,
        kind: SignatureKind,
    ) -> SymbolId {
        let Some(arena) = self.arena(unit) else {
            return SymbolId::ERROR;
        };
        let Some(NodeData::Call {
            expression,
            type_arguments,
            arguments,
        }) = arena.get(node).map(|n| &n.data)
        else {
            return SymbolId::ERROR;
        };
        let arguments: SmallVec<[NodeIndex; 8]> = arguments.iter().collect();

        let callee = self.resolve_expression(unit, *expression, None);
        if callee == SymbolId::ANY || callee == SymbolId::ERROR {
            for &arg in &arguments {
                self.resolve_expression(unit, arg, None);
            }
            return callee;
        }

        let apparent = self.apparent_type(callee);
        let signatures = self.callable_signatures(apparent, kind);
        if signatures.is_empty() {
            for &arg in &arguments {
                self.resolve_expression(unit, arg, None);
            }
            let diagnostic = match kind {
                SignatureKind::Construct => DiagnosticKind::NotConstructable,
                _ => DiagnosticKind::NotCallable,
            };
            let name = type_to_string(&self.chain.graph, callee);
            self.report(unit, *expression, diagnostic, vec![name]);
            return SymbolId::ERROR;
        }

        let explicit: SmallVec<[SymbolId; 4]> = type_arguments
            .iter()
            .map(|t| self.resolve_type_node(unit, t))
            .collect();
        let explicit = (!explicit.is_empty()).then_some(explicit);

        let resolution = self.speculate(|state| {
            let mut site = CallSite {
                state,
                unit,
                arguments: &arguments[..],
            };
            resolve_call(&mut site, &signatures, explicit.as_deref())
        });
        debug!(
            node = node.0,
            candidates = signatures.len(),
            chosen = ?resolution.chosen_index,
            "call resolved"
        );

        if self.speculative == 0
            && let Some(info) = self.info_mut(unit)
        {
            info.call_resolutions
                .insert(node, resolution.to_call_resolution());
        }

        for (i, &arg) in arguments.iter().enumerate() {
            let expected = resolution.parameter_types.get(i).copied();
            self.resolve_expression(unit, arg, expected);
        }

        match &resolution.error {
            Some(OverloadError::NoMatch { nearest }) => {
                let nearest = nearest
                    .and_then(|i| signatures.get(i))
                    .map(|&sig| signature_to_string(&self.chain.graph, sig))
                    .unwrap_or_default();
                self.report(unit, node, DiagnosticKind::NoMatchingOverload, vec![nearest]);
            }
            Some(OverloadError::Ambiguous { tied }) => {
                let tied = tied
                    .iter()
                    .filter_map(|&i| signatures.get(i))
                    .map(|&sig| signature_to_string(&self.chain.graph, sig))
                    .collect::<Vec<_>>()
                    .join(" | ");
                self.report(unit, node, DiagnosticKind::AmbiguousOverload, vec![tied]);
            }
            None => {}
        }
        resolution.return_type
    }

    /// Signatures a call may select. Implementation signatures are hidden
    /// behind their overloads.
    pub(crate) fn callable_signatures(&mut self, ty: SymbolId, kind: SignatureKind) -> Vec<SymbolId> {
        let all = signatures_of(self, ty, kind);
        let has_body: SmallVec<[bool; 4]> = all
            .iter()
            .map(|&sig| self.signature_has_body(sig))
            .collect();
        if has_body.iter().all(|&b| b) {
            return all;
        }
        all.into_iter()
            .zip(has_body)
            .filter(|&(_, body)| !body)
            .map(|(sig, _)| sig)
            .collect()
    }

    pub(crate) fn signature_has_body(&self, sig: SymbolId) -> bool {
        self.declaration_has_flag(sig, DeclFlags::HAS_BODY)
    }

    pub(crate) fn declaration_has_flag(&self, sym: SymbolId, flag: DeclFlags) -> bool {
        self.chain
            .graph
            .get(sym)
            .and_then(|s| s.first_declaration())
            .and_then(|d| self.chain.decl(d))
            .is_some_and(|d| d.has_flag(flag))
    }

    // =========================================================================
    // Function expressions
    // =========================================================================

    /// A function or arrow expression. Under a contextual call signature,
    /// unannotated parameters take the contextual parameter types and the
    /// result is a fresh signature built from them.
    pub(crate) fn resolve_function_expression(
        &mut self,
        unit: UnitId,
        node: NodeIndex,
        contextual: Option<SymbolId>,
    ) -> SymbolId {
        let Some(bound) = self.bound_symbol_of_node(unit, node) else {
            return SymbolId::ERROR;
        };
        let Some(sig) = self
            .chain
            .graph
            .get(bound)
            .and_then(|s| s.call_signatures.first().copied())
        else {
            return bound;
        };
        let generic = self.chain.graph.get(sig).is_some_and(|s| s.is_generic());
        let contextual_sig = match contextual {
            Some(c) if !generic => {
                let c = self.apparent_type(c);
                signatures_of(self, c, SignatureKind::Call).first().copied()
            }
            _ => None,
        };

        let parameters: SmallVec<[SymbolId; 4]> = self
            .chain
            .graph
            .get(sig)
            .map(|s| s.parameters.iter().copied().collect())
            .unwrap_or_default();
        let mut overrides: SmallVec<[(SymbolId, SymbolId); 4]> = SmallVec::new();
        if let Some(ctx) = contextual_sig {
            for (i, &param) in parameters.iter().enumerate() {
                if !self.declaration_has_flag(param, DeclFlags::ANNOTATED) {
                    overrides.push((param, parameter_type_at(self, ctx, i)));
                }
            }
        }

        if overrides.is_empty() {
            if self.speculative == 0 {
                if contextual_sig.is_none() {
                    self.report_implicit_any(unit, sig);
                }
                self.check_function_body(unit, node);
            }
            return bound;
        }

        let return_type = if self.declaration_has_flag(sig, DeclFlags::ANNOTATED) {
            self.return_type(sig)
        } else {
            self.with_overrides(&overrides, |state| state.contextual_body_type(unit, node))
        };
        let instantiated = self.contextual_signature(unit, sig, &parameters, &overrides, return_type);
        trace!(node = node.0, sig = instantiated.0, "contextually typed function expression");

        if self.speculative == 0 {
            self.with_overrides(&overrides, |state| state.check_function_body(unit, node));
        }
        instantiated
    }

    fn contextual_body_type(&mut self, unit: UnitId, node: NodeIndex) -> SymbolId {
        let Some(arena) = self.arena(unit) else {
            return SymbolId::ERROR;
        };
        let body = match arena.get(node).map(|n| &n.data) {
            Some(NodeData::FunctionLike { body, .. }) => *body,
            _ => return SymbolId::ANY,
        };
        if body.is_none() {
            return SymbolId::ANY;
        }
        self.infer_body_type(unit, &arena, node, body)
    }

    /// A transient object type with one call signature whose parameters carry
    /// the contextual types.
    fn contextual_signature(
        &mut self,
        unit: UnitId,
        sig: SymbolId,
        parameters: &[SymbolId],
        overrides: &[(SymbolId, SymbolId)],
        return_type: SymbolId,
    ) -> SymbolId {
        let mut params = Vec::with_capacity(parameters.len());
        for &param in parameters {
            let ty = match overrides.iter().find(|(p, _)| *p == param) {
                Some(&(_, ty)) => ty,
                None => self.declared_type(param),
            };
            let (name, flags) = self
                .chain
                .graph
                .get(param)
                .map(|s| (s.name.clone(), s.flags))
                .unwrap_or_default();
            let copy = self.chain.graph.alloc(SymbolKind::Parameter, name);
            if let Some(s) = self.chain.graph.get_mut(copy) {
                s.flags = (flags & (SymbolFlags::OPTIONAL | SymbolFlags::REST)) | SymbolFlags::TRANSIENT;
                s.type_of = Some(ty);
                s.state = ResolutionState::Resolved;
            }
            self.chain.graph.link(copy, ty, LinkKind::TypeOf);
            self.record_transient(unit, copy);
            params.push(copy);
        }

        let new_sig = self.chain.graph.alloc(SymbolKind::Signature(SignatureKind::Call), "");
        let object = self.chain.graph.alloc(SymbolKind::ObjectType, "");
        for &param in &params {
            self.chain.graph.link(param, new_sig, LinkKind::ParameterOf);
        }
        if let Some(s) = self.chain.graph.get_mut(new_sig) {
            s.flags |= SymbolFlags::TRANSIENT;
            s.parameters = params;
            s.return_type = Some(return_type);
            s.state = ResolutionState::Resolved;
        }
        self.chain.graph.link(new_sig, return_type, LinkKind::ReturnTypeOf);
        self.chain.graph.link(new_sig, object, LinkKind::MemberOf);
        self.chain.graph.link(new_sig, sig, LinkKind::SpecializedFrom);
        if let Some(s) = self.chain.graph.get_mut(object) {
            s.flags |= SymbolFlags::TRANSIENT;
            s.call_signatures.push(new_sig);
            s.state = ResolutionState::Resolved;
        }
        self.record_transient(unit, new_sig);
        self.record_transient(unit, object);
        object
    }

    /// Report unannotated parameters of `sig` when implicit `any` is disallowed.
    pub(crate) fn report_implicit_any(&mut self, unit: UnitId, sig: SymbolId) {
        if !self.options.no_implicit_any {
            return;
        }
        let parameters: SmallVec<[SymbolId; 4]> = self
            .chain
            .graph
            .get(sig)
            .map(|s| s.parameters.iter().copied().collect())
            .unwrap_or_default();
        for param in parameters {
            if self.declaration_has_flag(param, DeclFlags::ANNOTATED) {
                continue;
            }
            let Some(site) = self.first_site(param) else {
                continue;
            };
            let name = self.chain.graph.name(param).to_string();
            self.report(unit, site.name_node, DiagnosticKind::ImplicitAnyParameter, vec![name]);
        }
    }
}

#[cfg(test)]
#[path = "../tests/calls_tests.rs"]
mod tests;
