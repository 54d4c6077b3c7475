//! Type-argument inference for generic calls.
//!
//! Argument types are walked in parallel with parameter types; wherever a
//! parameter mentions one of the signature's type parameters, the matching
//! piece of the argument becomes a candidate. [`InferenceContext::fix`] then
//! picks one type per parameter.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::trace;
use tsb_binder::{SignatureKind, SymbolId, SymbolKind};

use crate::instantiate::{TypeMapping, substitute};
use crate::objects::{all_members, find_member, member_type, parameter_type_at, resolve_alias, signatures_of};
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::relation::{is_assignable, is_subtype};
use crate::resolver::SymbolResolver;

#[derive(Debug)]
pub struct InferenceContext {
    type_parameters: SmallVec<[SymbolId; 4]>,
    candidates: Vec<SmallVec<[SymbolId; 2]>>,
    visited: FxHashSet<(SymbolId, SymbolId)>,
    depth: DepthCounter,
}

impl InferenceContext {
    pub fn new(type_parameters: &[SymbolId]) -> Self {
        Self {
            type_parameters: type_parameters.iter().copied().collect(),
            candidates: vec![SmallVec::new(); type_parameters.len()],
            visited: FxHashSet::default(),
            depth: DepthCounter::with_profile(RecursionProfile::Inference),
        }
    }

    pub fn type_parameters(&self) -> &[SymbolId] {
        &self.type_parameters
    }

    /// Candidates collected so far for `type_parameter`, in discovery order.
    pub fn candidates(&self, type_parameter: SymbolId) -> &[SymbolId] {
        self.type_parameters
            .iter()
            .position(|&tp| tp == type_parameter)
            .map_or(&[], |i| self.candidates[i].as_slice())
    }

    /// Forget the pairs already walked so a later round can revisit them
    /// with refined argument types. Candidates are kept.
    pub fn start_round(&mut self) {
        self.visited.clear();
    }

    /// Collect candidates by matching `source` (an argument type) against
    /// `target` (a parameter type).
    pub fn infer<R: SymbolResolver + ?Sized>(&mut self, resolver: &mut R, source: SymbolId, target: SymbolId) {
        let source = resolve_alias(resolver, source);
        let target = resolve_alias(resolver, target);
        if source == SymbolId::ERROR {
            return;
        }
        if let Some(i) = self.type_parameters.iter().position(|&tp| tp == target) {
            if !self.candidates[i].contains(&source) {
                self.candidates[i].push(source);
            }
            return;
        }
        if !self.visited.insert((source, target)) || !self.depth.enter() {
            return;
        }
        self.infer_structure(resolver, source, target);
        self.depth.leave();
    }

    fn infer_structure<R: SymbolResolver + ?Sized>(&mut self, resolver: &mut R, source: SymbolId, target: SymbolId) {
        let graph = resolver.graph();
        let (Some(s), Some(t)) = (graph.get(source), graph.get(target)) else {
            return;
        };

        if s.kind == SymbolKind::Array && t.kind == SymbolKind::Array {
            if let (Some(se), Some(te)) = (s.element_type, t.element_type) {
                self.infer(resolver, se, te);
            }
            return;
        }

        if let (Some(ss), Some(ts)) = (&s.specialization, &t.specialization)
            && ss.root == ts.root
        {
            let pairs: SmallVec<[(SymbolId, SymbolId); 4]> =
                ss.args.iter().copied().zip(ts.args.iter().copied()).collect();
            for (sa, ta) in pairs {
                self.infer(resolver, sa, ta);
            }
            return;
        }

        if !(s.kind.is_object_like() && t.kind.is_object_like()) {
            return;
        }
        for (name, target_member) in all_members(resolver, target) {
            if let Some(source_member) = find_member(resolver, source, &name) {
                let st = member_type(resolver, source_member);
                let tt = member_type(resolver, target_member);
                self.infer(resolver, st, tt);
            }
        }
        for kind in [SignatureKind::Call, SignatureKind::Construct] {
            let sources = signatures_of(resolver, source, kind);
            let targets = signatures_of(resolver, target, kind);
            if let (Some(&ss), Some(&ts)) = (sources.first(), targets.first()) {
                self.infer_signature(resolver, ss, ts);
            }
        }
    }

    fn infer_signature<R: SymbolResolver + ?Sized>(&mut self, resolver: &mut R, source: SymbolId, target: SymbolId) {
        let count = |r: &R, s: SymbolId| r.graph().get(s).map_or(0, |s| s.parameters.len());
        let shared = count(&*resolver, source).min(count(&*resolver, target));
        for index in 0..shared {
            let st = parameter_type_at(resolver, source, index);
            let tt = parameter_type_at(resolver, target, index);
            self.infer(resolver, st, tt);
        }
        let sr = resolver.return_type_of(source);
        let tr = resolver.return_type_of(target);
        self.infer(resolver, sr, tr);
    }

    /// One type per type parameter.
    ///
    /// `null`, `undefined` and `any` candidates only count when nothing else
    /// was found. Otherwise the first candidate that every other candidate is
    /// a subtype of wins, or else the first candidate. A choice that violates
    /// the parameter's constraint is replaced by the constraint.
    pub fn fix<R: SymbolResolver + ?Sized>(&self, resolver: &mut R) -> SmallVec<[SymbolId; 4]> {
        let mut fixed: SmallVec<[SymbolId; 4]> = SmallVec::new();
        for candidates in &self.candidates {
            let usable: SmallVec<[SymbolId; 2]> = candidates
                .iter()
                .copied()
                .filter(|&c| !c.is_widening() && c != SymbolId::ANY)
                .collect();
            let best = usable
                .iter()
                .copied()
                .find(|&c| usable.iter().all(|&other| is_subtype(resolver, other, c)))
                .or_else(|| usable.first().copied())
                .unwrap_or(SymbolId::ANY);
            fixed.push(best);
        }

        let mapping = TypeMapping::new(&self.type_parameters, &fixed);
        for (i, &tp) in self.type_parameters.iter().enumerate() {
            let Some(constraint) = resolver.constraint_of(tp) else {
                continue;
            };
            let constraint = substitute(resolver, constraint, &mapping);
            if !is_assignable(resolver, fixed[i], constraint) {
                trace!(type_parameter = tp.0, chosen = fixed[i].0, constraint = constraint.0, "inferred type violates constraint");
                fixed[i] = constraint;
            }
        }
        fixed
    }
}

#[cfg(test)]
#[path = "../tests/infer_tests.rs"]
mod tests;
