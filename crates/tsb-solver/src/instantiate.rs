//! Generic specialization.
//!
//! A specialization is a symbol of the root's kind, registered in the graph
//! under `(root, args)` so that identical instantiations share one symbol.
//! Creating one is cheap: members and signatures are copied with substituted
//! types only when something first looks inside ([`ensure_materialized`]).
//!
//! Anonymous object types have no declared type parameters. They are
//! specialized over their *free* type parameters (those referenced but not
//! bound by one of their own signatures), which lets `{ value: T }` inside a
//! generic function share specializations the same way `Box<T>` does.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{debug, trace};
use tsb_binder::{
    LinkKind, ResolutionState, SignatureKind, Specialization, SymbolFlags, SymbolGraph, SymbolId,
    SymbolKind,
};

use crate::recursion::{DepthCounter, RecursionProfile};
use crate::resolver::SymbolResolver;

/// Substitution from type parameters to type arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeMapping {
    pairs: SmallVec<[(SymbolId, SymbolId); 4]>,
}

impl TypeMapping {
    pub fn new(params: &[SymbolId], args: &[SymbolId]) -> Self {
        Self {
            pairs: params.iter().copied().zip(args.iter().copied()).collect(),
        }
    }

    pub fn get(&self, param: SymbolId) -> Option<SymbolId> {
        self.pairs
            .iter()
            .find(|(p, _)| *p == param)
            .map(|&(_, arg)| arg)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn params(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.pairs.iter().map(|&(p, _)| p)
    }
}

/// Pad with `any` or truncate so that `args` lines up with `params`.
fn align_args(params: &[SymbolId], args: &[SymbolId]) -> SmallVec<[SymbolId; 4]> {
    let mut out: SmallVec<[SymbolId; 4]> = args.iter().copied().take(params.len()).collect();
    out.resize(params.len(), SymbolId::ANY);
    out
}

/// How deeply specializations are nested inside `ty`, looking at most
/// `remaining` levels down.
fn nesting_depth(graph: &SymbolGraph, ty: SymbolId, remaining: u32) -> u32 {
    if remaining == 0 {
        return 0;
    }
    let Some(sym) = graph.get(ty) else {
        return 0;
    };
    if let Some(spec) = &sym.specialization {
        return 1 + spec
            .args
            .iter()
            .map(|&arg| nesting_depth(graph, arg, remaining - 1))
            .max()
            .unwrap_or(0);
    }
    match sym.element_type {
        Some(element) => nesting_depth(graph, element, remaining - 1),
        None => 0,
    }
}

/// Find or create the specialization of `root` for `args`. Returns `ERROR`
/// when nesting would exceed the instantiation depth limit.
fn intern_specialization<R: SymbolResolver + ?Sized>(
    resolver: &mut R,
    root: SymbolId,
    args: &[SymbolId],
) -> SymbolId {
    if let Some(existing) = resolver.graph().find_specialization(root, args) {
        return existing;
    }
    let limit = resolver.options().max_instantiation_depth;
    let depth = 1 + args
        .iter()
        .map(|&arg| nesting_depth(resolver.graph(), arg, limit + 1))
        .max()
        .unwrap_or(0);
    if depth > limit {
        debug!(root = root.0, depth, limit, "instantiation depth exceeded");
        return SymbolId::ERROR;
    }
    let graph = resolver.graph_mut();
    let spec = graph.create_specialization(root, args);
    let owner = graph.get(root).and_then(|s| s.owner);
    if let Some(sym) = graph.get_mut(spec) {
        sym.owner = owner;
    }
    trace!(root = root.0, spec = spec.0, ?args, "created specialization");
    spec
}

/// Type parameters a specialization of `root` is keyed over.
fn specialization_params<R: SymbolResolver + ?Sized>(
    resolver: &mut R,
    root: SymbolId,
) -> SmallVec<[SymbolId; 4]> {
    let Some(sym) = resolver.graph().get(root) else {
        return SmallVec::new();
    };
    if !sym.type_parameters.is_empty() {
        return sym.type_parameters.iter().copied().collect();
    }
    if sym.kind == SymbolKind::ObjectType {
        return free_type_parameters(resolver, root);
    }
    SmallVec::new()
}

/// `root<args>`. Arguments are padded with `any` or truncated to the
/// root's parameter count; supplying the root's own parameters yields the
/// root itself.
pub fn specialize<R: SymbolResolver + ?Sized>(resolver: &mut R, root: SymbolId, args: &[SymbolId]) -> SymbolId {
    let Some(sym) = resolver.graph().get(root) else {
        return SymbolId::ERROR;
    };
    if sym.specialization.is_some() {
        return root;
    }
    if sym.kind == SymbolKind::TypeAlias {
        let params = sym.type_parameters.clone();
        let aliased = resolver.type_of_symbol(root);
        if params.is_empty() {
            return aliased;
        }
        let mapping = TypeMapping::new(&params, &align_args(&params, args));
        return substitute(resolver, aliased, &mapping);
    }
    let params = specialization_params(resolver, root);
    if params.is_empty() {
        return root;
    }
    let args = align_args(&params, args);
    if args == params {
        return root;
    }
    intern_specialization(resolver, root, &args)
}

/// `signature<args>` with parameters and return type filled in immediately.
pub fn specialize_signature<R: SymbolResolver + ?Sized>(
    resolver: &mut R,
    signature: SymbolId,
    args: &[SymbolId],
) -> SymbolId {
    let params: SmallVec<[SymbolId; 4]> = match resolver.graph().get(signature) {
        Some(sym) => sym.type_parameters.iter().copied().collect(),
        None => return SymbolId::ERROR,
    };
    if params.is_empty() {
        return signature;
    }
    let args = align_args(&params, args);
    if args == params {
        return signature;
    }
    let spec = intern_specialization(resolver, signature, &args);
    if spec != SymbolId::ERROR {
        ensure_materialized(resolver, spec);
    }
    spec
}

/// The signature with every type parameter replaced by `any`.
pub fn erase_signature<R: SymbolResolver + ?Sized>(resolver: &mut R, signature: SymbolId) -> SymbolId {
    let count = resolver
        .graph()
        .get(signature)
        .map_or(0, |s| s.type_parameters.len());
    if count == 0 {
        return signature;
    }
    let anys: SmallVec<[SymbolId; 4]> = SmallVec::from_elem(SymbolId::ANY, count);
    specialize_signature(resolver, signature, &anys)
}

/// Apply `mapping` to `ty`.
pub fn substitute<R: SymbolResolver + ?Sized>(resolver: &mut R, ty: SymbolId, mapping: &TypeMapping) -> SymbolId {
    if mapping.is_empty() {
        return ty;
    }
    let Some(sym) = resolver.graph().get(ty) else {
        return ty;
    };
    let kind = sym.kind;

    if let Some(spec) = &sym.specialization {
        if kind.is_signature() {
            return ty;
        }
        let (root, args) = (spec.root, spec.args.clone());
        let new_args: SmallVec<[SymbolId; 4]> = args
            .iter()
            .map(|&arg| substitute(resolver, arg, mapping))
            .collect();
        if new_args == args {
            return ty;
        }
        return specialize(resolver, root, &new_args);
    }

    match kind {
        SymbolKind::TypeParameter => mapping.get(ty).unwrap_or(ty),
        SymbolKind::Array => {
            let element = sym.element_type.unwrap_or(SymbolId::ANY);
            let new_element = substitute(resolver, element, mapping);
            if new_element == element {
                ty
            } else {
                resolver.graph_mut().array_of(new_element)
            }
        }
        SymbolKind::TypeAlias if sym.type_parameters.is_empty() => {
            let aliased = resolver.type_of_symbol(ty);
            if aliased == ty {
                return ty;
            }
            substitute(resolver, aliased, mapping)
        }
        // A generic class or interface named inside its own body stands for
        // itself applied to its own parameters.
        SymbolKind::Class | SymbolKind::Interface if sym.is_generic() => {
            let params = sym.type_parameters.clone();
            let args: SmallVec<[SymbolId; 4]> = params
                .iter()
                .map(|&p| mapping.get(p).unwrap_or(p))
                .collect();
            specialize(resolver, ty, &args)
        }
        SymbolKind::ObjectType => {
            let free = free_type_parameters(resolver, ty);
            if !free.iter().any(|&p| mapping.get(p).is_some()) {
                return ty;
            }
            let args: SmallVec<[SymbolId; 4]> = free
                .iter()
                .map(|&p| mapping.get(p).unwrap_or(p))
                .collect();
            specialize(resolver, ty, &args)
        }
        _ => ty,
    }
}

/// Type parameters referenced by `ty` that none of its own signatures bind,
/// in order of first occurrence.
pub fn free_type_parameters<R: SymbolResolver + ?Sized>(resolver: &mut R, ty: SymbolId) -> SmallVec<[SymbolId; 4]> {
    let mut walk = FreeParams {
        out: SmallVec::new(),
        bound: Vec::new(),
        visited: FxHashSet::default(),
        depth: DepthCounter::with_profile(RecursionProfile::ShallowTraversal),
    };
    let Some(sym) = resolver.graph().get(ty) else {
        return SmallVec::new();
    };
    // Walk the root's own shape, not its parameter list.
    if sym.kind == SymbolKind::ObjectType {
        walk.visited.insert(ty);
        walk.shape(resolver, ty);
    } else {
        walk.visit(resolver, ty);
    }
    walk.out
}

struct FreeParams {
    out: SmallVec<[SymbolId; 4]>,
    bound: Vec<SymbolId>,
    visited: FxHashSet<SymbolId>,
    depth: DepthCounter,
}

impl FreeParams {
    fn visit<R: SymbolResolver + ?Sized>(&mut self, resolver: &mut R, ty: SymbolId) {
        if !self.depth.enter() {
            return;
        }
        self.visit_inner(resolver, ty);
        self.depth.leave();
    }

    fn visit_inner<R: SymbolResolver + ?Sized>(&mut self, resolver: &mut R, ty: SymbolId) {
        let Some(sym) = resolver.graph().get(ty) else {
            return;
        };
        if let Some(spec) = &sym.specialization {
            let args = spec.args.clone();
            for arg in args {
                self.visit(resolver, arg);
            }
            return;
        }
        match sym.kind {
            SymbolKind::TypeParameter => {
                if !self.bound.contains(&ty) && !self.out.contains(&ty) {
                    self.out.push(ty);
                }
            }
            SymbolKind::Array => {
                if let Some(element) = sym.element_type {
                    self.visit(resolver, element);
                }
            }
            SymbolKind::Class | SymbolKind::Interface if sym.is_generic() => {
                let params = sym.type_parameters.clone();
                for p in params {
                    self.visit(resolver, p);
                }
            }
            SymbolKind::TypeAlias if sym.type_parameters.is_empty() => {
                let aliased = resolver.type_of_symbol(ty);
                if aliased != ty {
                    self.visit(resolver, aliased);
                }
            }
            SymbolKind::ObjectType => {
                if self.visited.insert(ty) {
                    self.shape(resolver, ty);
                }
            }
            _ => {}
        }
    }

    fn shape<R: SymbolResolver + ?Sized>(&mut self, resolver: &mut R, ty: SymbolId) {
        let Some(sym) = resolver.graph().get(ty) else {
            return;
        };
        let members: SmallVec<[SymbolId; 8]> = sym.members.values().copied().collect();
        let mut signatures: SmallVec<[SymbolId; 4]> = SmallVec::new();
        for kind in [SignatureKind::Call, SignatureKind::Construct, SignatureKind::Index] {
            signatures.extend(sym.signatures(kind).iter().copied());
        }
        for member in members {
            let member_signatures: SmallVec<[SymbolId; 2]> = resolver
                .graph()
                .get(member)
                .map(|m| m.call_signatures.iter().copied().collect())
                .unwrap_or_default();
            if resolver.graph().kind(member) == SymbolKind::Accessor {
                for sig in member_signatures {
                    self.signature(resolver, sig);
                }
                continue;
            }
            let member_type = resolver.type_of_symbol(member);
            self.visit(resolver, member_type);
        }
        for sig in signatures {
            self.signature(resolver, sig);
        }
    }

    fn signature<R: SymbolResolver + ?Sized>(&mut self, resolver: &mut R, sig: SymbolId) {
        let Some(s) = resolver.graph().get(sig) else {
            return;
        };
        let own = s.type_parameters.clone();
        let params = s.parameters.clone();
        let bound_before = self.bound.len();
        self.bound.extend(own);
        for p in params {
            let ty = resolver.type_of_symbol(p);
            self.visit(resolver, ty);
        }
        let ret = resolver.return_type_of(sig);
        self.visit(resolver, ret);
        self.bound.truncate(bound_before);
    }
}

/// Fill in a specialization's members, signatures and bases from its root.
/// Does nothing unless the specialization is `Unresolved`.
pub fn ensure_materialized<R: SymbolResolver + ?Sized>(resolver: &mut R, spec: SymbolId) {
    let Some(sym) = resolver.graph().get(spec) else {
        return;
    };
    let Some(Specialization { root, args }) = sym.specialization.clone() else {
        return;
    };
    if sym.state != ResolutionState::Unresolved {
        return;
    }
    let kind = sym.kind;
    set_state(resolver, spec, ResolutionState::Resolving);

    if kind.is_signature() {
        let params: SmallVec<[SymbolId; 4]> = resolver
            .graph()
            .get(root)
            .map(|s| s.type_parameters.iter().copied().collect())
            .unwrap_or_default();
        let mapping = TypeMapping::new(&params, &args);
        fill_signature(resolver, spec, root, &mapping);
        return;
    }

    let params = specialization_params(resolver, root);
    let mapping = TypeMapping::new(&params, &args);

    let members: Vec<(String, SymbolId)> = resolver
        .graph()
        .get(root)
        .map(|s| s.members.iter().map(|(n, &m)| (n.clone(), m)).collect())
        .unwrap_or_default();
    for (name, member) in members {
        let copy = copy_member(resolver, spec, member, &args, &mapping);
        if let Some(s) = resolver.graph_mut().get_mut(spec) {
            s.members.insert(name, copy);
        }
    }

    for sig_kind in [SignatureKind::Call, SignatureKind::Construct, SignatureKind::Index] {
        let signatures: SmallVec<[SymbolId; 2]> = resolver
            .graph()
            .get(root)
            .map(|s| s.signatures(sig_kind).iter().copied().collect())
            .unwrap_or_default();
        for sig in signatures {
            let instantiated = instantiate_signature(resolver, sig, &mapping);
            resolver.graph_mut().link(instantiated, spec, LinkKind::MemberOf);
            if let Some(s) = resolver.graph_mut().get_mut(spec) {
                s.signatures_mut(sig_kind).push(instantiated);
            }
        }
    }

    if resolver.graph().kind(root).is_object_like() {
        for base in resolver.base_types(root) {
            let base = substitute(resolver, base, &mapping);
            resolver.graph_mut().link(spec, base, LinkKind::Extends);
        }
    }

    set_state(resolver, spec, ResolutionState::Resolved);
    trace!(spec = spec.0, root = root.0, "materialized specialization");
}

fn set_state<R: SymbolResolver + ?Sized>(resolver: &mut R, sym: SymbolId, state: ResolutionState) {
    if let Some(s) = resolver.graph_mut().get_mut(sym) {
        s.state = state;
    }
}

fn copy_member<R: SymbolResolver + ?Sized>(
    resolver: &mut R,
    owner: SymbolId,
    member: SymbolId,
    args: &[SymbolId],
    mapping: &TypeMapping,
) -> SymbolId {
    let (kind, name, flags, getters) = match resolver.graph().get(member) {
        Some(m) => (m.kind, m.name.clone(), m.flags, m.call_signatures.clone()),
        None => (SymbolKind::Error, String::new(), SymbolFlags::empty(), Vec::new()),
    };
    let member_type = if kind == SymbolKind::Accessor {
        None
    } else {
        let declared = resolver.type_of_symbol(member);
        Some(substitute(resolver, declared, mapping))
    };
    let accessor_signatures: Vec<SymbolId> = getters
        .into_iter()
        .map(|sig| instantiate_signature(resolver, sig, mapping))
        .collect();

    let graph = resolver.graph_mut();
    let copy = graph.alloc(kind, name);
    if let Some(s) = graph.get_mut(copy) {
        s.flags = flags | SymbolFlags::TRANSIENT;
        s.owner = Some(owner);
        s.type_of = member_type;
        s.call_signatures = accessor_signatures.clone();
        s.specialization = Some(Specialization {
            root: member,
            args: args.iter().copied().collect(),
        });
        s.state = ResolutionState::Resolved;
    }
    graph.link(copy, owner, LinkKind::MemberOf);
    graph.link(copy, member, LinkKind::SpecializedFrom);
    if let Some(ty) = member_type {
        graph.link(copy, ty, LinkKind::TypeOf);
    }
    for sig in accessor_signatures {
        graph.link(sig, copy, LinkKind::MemberOf);
    }
    copy
}

/// Copy `signature` with `mapping` applied. The copy is not registered as a
/// content-keyed specialization; it belongs to whichever type owns it.
pub fn instantiate_signature<R: SymbolResolver + ?Sized>(
    resolver: &mut R,
    signature: SymbolId,
    mapping: &TypeMapping,
) -> SymbolId {
    let (kind, name, flags) = match resolver.graph().get(signature) {
        Some(s) => (s.kind, s.name.clone(), s.flags),
        None => return SymbolId::ERROR,
    };
    let graph = resolver.graph_mut();
    let copy = graph.alloc(kind, name);
    if let Some(s) = graph.get_mut(copy) {
        s.flags = flags | SymbolFlags::TRANSIENT;
    }
    graph.link(copy, signature, LinkKind::SpecializedFrom);
    fill_signature(resolver, copy, signature, mapping);
    copy
}

/// Populate `target` with the parameters, return type and remaining type
/// parameters of `source` under `mapping`.
fn fill_signature<R: SymbolResolver + ?Sized>(
    resolver: &mut R,
    target: SymbolId,
    source: SymbolId,
    mapping: &TypeMapping,
) {
    let (params, type_params) = match resolver.graph().get(source) {
        Some(s) => (s.parameters.clone(), s.type_parameters.clone()),
        None => (Vec::new(), Vec::new()),
    };
    let mut new_params = Vec::with_capacity(params.len());
    for param in params {
        let declared = resolver.type_of_symbol(param);
        let ty = substitute(resolver, declared, mapping);
        let (name, flags) = match resolver.graph().get(param) {
            Some(p) => (p.name.clone(), p.flags),
            None => (String::new(), SymbolFlags::empty()),
        };
        let graph = resolver.graph_mut();
        let copy = graph.alloc(SymbolKind::Parameter, name);
        if let Some(p) = graph.get_mut(copy) {
            p.flags = flags | SymbolFlags::TRANSIENT;
            p.type_of = Some(ty);
            p.owner = Some(target);
            p.state = ResolutionState::Resolved;
        }
        graph.link(copy, target, LinkKind::ParameterOf);
        graph.link(copy, ty, LinkKind::TypeOf);
        new_params.push(copy);
    }

    let declared_return = resolver.return_type_of(source);
    let return_type = substitute(resolver, declared_return, mapping);
    let remaining: Vec<SymbolId> = type_params
        .into_iter()
        .filter(|&tp| mapping.get(tp).is_none())
        .collect();

    let graph = resolver.graph_mut();
    graph.link(target, return_type, LinkKind::ReturnTypeOf);
    if let Some(s) = graph.get_mut(target) {
        s.parameters = new_params;
        s.return_type = Some(return_type);
        s.type_parameters = remaining;
        s.state = ResolutionState::Resolved;
    }
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;
