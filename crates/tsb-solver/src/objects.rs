//! Shape queries over object-like types: members, signatures and bases,
//! with specializations materialized on first access.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tsb_binder::{LinkKind, SignatureKind, SymbolFlags, SymbolId, SymbolKind};

use crate::instantiate::ensure_materialized;
use crate::resolver::SymbolResolver;

const MAX_ALIAS_HOPS: usize = 16;

/// Follow type aliases to the type they name.
pub fn resolve_alias<R: SymbolResolver + ?Sized>(resolver: &mut R, ty: SymbolId) -> SymbolId {
    let mut current = ty;
    for _ in 0..MAX_ALIAS_HOPS {
        if resolver.graph().kind(current) != SymbolKind::TypeAlias {
            return current;
        }
        current = resolver.type_of_symbol(current);
    }
    SymbolId::ERROR
}

/// The type a member contributes to its container's shape.
pub fn member_type<R: SymbolResolver + ?Sized>(resolver: &mut R, member: SymbolId) -> SymbolId {
    resolver.type_of_symbol(member)
}

fn materialize<R: SymbolResolver + ?Sized>(resolver: &mut R, ty: SymbolId) {
    if resolver
        .graph()
        .get(ty)
        .is_some_and(|s| s.specialization.is_some())
    {
        ensure_materialized(resolver, ty);
    }
}

/// Direct base types; for a specialization, the substituted bases of its root.
pub fn bases<R: SymbolResolver + ?Sized>(resolver: &mut R, ty: SymbolId) -> SmallVec<[SymbolId; 2]> {
    if !resolver.graph().kind(ty).is_object_like() {
        return SmallVec::new();
    }
    if resolver
        .graph()
        .get(ty)
        .is_some_and(|s| s.specialization.is_some())
    {
        ensure_materialized(resolver, ty);
        return resolver
            .graph()
            .targets(ty, LinkKind::Extends)
            .into_iter()
            .collect();
    }
    resolver.base_types(ty)
}

/// Members declared directly on `ty`, in declaration order.
pub fn own_members<R: SymbolResolver + ?Sized>(resolver: &mut R, ty: SymbolId) -> Vec<(String, SymbolId)> {
    materialize(resolver, ty);
    resolver
        .graph()
        .get(ty)
        .map(|s| s.members.iter().map(|(n, &m)| (n.clone(), m)).collect())
        .unwrap_or_default()
}

/// Own members followed by inherited members not shadowed by a nearer one.
pub fn all_members<R: SymbolResolver + ?Sized>(resolver: &mut R, ty: SymbolId) -> Vec<(String, SymbolId)> {
    let mut out: Vec<(String, SymbolId)> = Vec::new();
    let mut seen_names: FxHashSet<String> = FxHashSet::default();
    let mut visited: FxHashSet<SymbolId> = FxHashSet::default();
    let mut pending = vec![ty];
    while let Some(current) = pending.pop() {
        let current = resolve_alias(resolver, current);
        if !visited.insert(current) {
            continue;
        }
        for (name, member) in own_members(resolver, current) {
            if seen_names.insert(name.clone()) {
                out.push((name, member));
            }
        }
        let mut next = bases(resolver, current);
        next.reverse();
        pending.extend(next);
    }
    out
}

/// Find a member by name on `ty` or its bases.
pub fn find_member<R: SymbolResolver + ?Sized>(
    resolver: &mut R,
    ty: SymbolId,
    name: &str,
) -> Option<SymbolId> {
    let mut visited: FxHashSet<SymbolId> = FxHashSet::default();
    let mut pending = vec![ty];
    while let Some(current) = pending.pop() {
        let current = resolve_alias(resolver, current);
        if !visited.insert(current) {
            continue;
        }
        materialize(resolver, current);
        if let Some(&member) = resolver
            .graph()
            .get(current)
            .and_then(|s| s.members.get(name))
        {
            return Some(member);
        }
        let mut next = bases(resolver, current);
        next.reverse();
        pending.extend(next);
    }
    None
}

/// Signatures of `kind` on `ty`; inherited from the first base that has
/// some when `ty` declares none itself.
pub fn signatures_of<R: SymbolResolver + ?Sized>(
    resolver: &mut R,
    ty: SymbolId,
    kind: SignatureKind,
) -> Vec<SymbolId> {
    let mut visited: FxHashSet<SymbolId> = FxHashSet::default();
    let mut pending = vec![ty];
    while let Some(current) = pending.pop() {
        let current = resolve_alias(resolver, current);
        if !visited.insert(current) {
            continue;
        }
        materialize(resolver, current);
        let own = resolver
            .graph()
            .get(current)
            .map(|s| s.signatures(kind).to_vec())
            .unwrap_or_default();
        if !own.is_empty() {
            return own;
        }
        let mut next = bases(resolver, current);
        next.reverse();
        pending.extend(next);
    }
    Vec::new()
}

/// `{}`: an object type with no members and no signatures.
pub fn is_empty_object<R: SymbolResolver + ?Sized>(resolver: &mut R, ty: SymbolId) -> bool {
    let ty = resolve_alias(resolver, ty);
    if !resolver.graph().kind(ty).is_object_like() {
        return false;
    }
    all_members(resolver, ty).is_empty()
        && [SignatureKind::Call, SignatureKind::Construct, SignatureKind::Index]
            .into_iter()
            .all(|kind| signatures_of(resolver, ty, kind).is_empty())
}

// =============================================================================
// Signature helpers
// =============================================================================

/// Parameter counts of a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arity {
    /// Parameters that are neither optional nor rest.
    pub required: usize,
    /// Parameters excluding a trailing rest parameter.
    pub fixed: usize,
    pub has_rest: bool,
}

impl Arity {
    pub fn accepts(self, argument_count: usize) -> bool {
        argument_count >= self.required && (self.has_rest || argument_count <= self.fixed)
    }
}

pub fn arity<R: SymbolResolver + ?Sized>(resolver: &R, signature: SymbolId) -> Arity {
    let graph = resolver.graph();
    let params = graph
        .get(signature)
        .map(|s| s.parameters.as_slice())
        .unwrap_or_default();
    let mut arity = Arity {
        required: 0,
        fixed: 0,
        has_rest: false,
    };
    for &p in params {
        let flags = graph.flags(p);
        if flags.contains(SymbolFlags::REST) {
            arity.has_rest = true;
            continue;
        }
        arity.fixed += 1;
        if !flags.contains(SymbolFlags::OPTIONAL) {
            arity.required += 1;
        }
    }
    arity
}

/// Type expected for argument `index`; arguments past a rest parameter take
/// its element type.
pub fn parameter_type_at<R: SymbolResolver + ?Sized>(
    resolver: &mut R,
    signature: SymbolId,
    index: usize,
) -> SymbolId {
    let (param, in_range) = {
        let Some(s) = resolver.graph().get(signature) else {
            return SymbolId::ERROR;
        };
        match (s.parameters.get(index), s.parameters.last()) {
            (Some(&p), _) => (p, true),
            (None, Some(&p)) => (p, false),
            (None, None) => return SymbolId::ANY,
        }
    };
    if !resolver.graph().flags(param).contains(SymbolFlags::REST) {
        return if in_range {
            resolver.type_of_symbol(param)
        } else {
            SymbolId::ANY
        };
    }
    let ty = resolver.type_of_symbol(param);
    let ty = resolve_alias(resolver, ty);
    resolver
        .graph()
        .get(ty)
        .and_then(|s| s.element_type)
        .unwrap_or(SymbolId::ANY)
}

#[cfg(test)]
#[path = "../tests/objects_tests.rs"]
mod tests;
