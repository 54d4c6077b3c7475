//! Identity, subtype and assignability.
//!
//! All three judgments share one engine and one cache keyed by
//! `(source, target, relation)`. A pair that is already being compared is
//! assumed related, which makes comparison of recursive structural types
//! terminate (coinductive semantics). A success that leaned on such an
//! assumption is only provisional: it is cached once the assumed pair itself
//! succeeds and dropped if that pair fails. Failures are final, since
//! assumptions can only make more pairs related. The error type relates both
//! ways to everything so that one root cause yields one diagnostic.
//!
//! | source \ target          | rule                                                 |
//! |--------------------------|------------------------------------------------------|
//! | anything -> `any`        | related                                              |
//! | `any` -> anything        | assignable only                                      |
//! | `null`, `undefined`      | related to everything                                |
//! | enum <-> `number`        | enum -> number always; number -> enum assignable only|
//! | type parameter           | through its constraint                               |
//! | array -> array           | covariant element                                    |
//! | object-like              | structural over own and inherited members            |

use rustc_hash::FxHashMap;
use tracing::trace;
use tsb_binder::{SignatureKind, SymbolFlags, SymbolId, SymbolKind};

use crate::instantiate::erase_signature;
use crate::objects::{
    all_members, arity, find_member, is_empty_object, member_type, parameter_type_at,
    resolve_alias, signatures_of,
};
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::resolver::SymbolResolver;
use crate::tracer::{ComparisonFailure, ComparisonInfo};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Identical,
    /// Strict: used for `implements` and `extends` checks and for ranking.
    Subtype,
    /// Relaxed: used at assignments, returns and call arguments.
    Assignable,
}

type RelationKey = (SymbolId, SymbolId, RelationKind);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CacheEntry {
    InProgress,
    Done(bool),
}

/// Cache of relation results, purged of stale symbols after every edit.
#[derive(Debug, Default)]
pub struct RelationCache {
    entries: FxHashMap<RelationKey, CacheEntry>,
}

impl RelationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A finished result, if one is cached.
    pub fn lookup(&self, source: SymbolId, target: SymbolId, kind: RelationKind) -> Option<bool> {
        match self.entries.get(&(source, target, kind)) {
            Some(CacheEntry::Done(related)) => Some(*related),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every result whose source or target is `stale`.
    pub fn purge(&mut self, mut stale: impl FnMut(SymbolId) -> bool) {
        let before = self.entries.len();
        self.entries
            .retain(|&(source, target, _), _| !stale(source) && !stale(target));
        trace!(before, after = self.entries.len(), "purged relation cache");
    }
}

pub fn is_identical<R: SymbolResolver + ?Sized>(resolver: &mut R, source: SymbolId, target: SymbolId) -> bool {
    is_related_with(resolver, source, target, RelationKind::Identical, None)
}

pub fn is_subtype<R: SymbolResolver + ?Sized>(resolver: &mut R, source: SymbolId, target: SymbolId) -> bool {
    is_related_with(resolver, source, target, RelationKind::Subtype, None)
}

pub fn is_assignable<R: SymbolResolver + ?Sized>(resolver: &mut R, source: SymbolId, target: SymbolId) -> bool {
    is_related_with(resolver, source, target, RelationKind::Assignable, None)
}

/// Relate `source` to `target`; on failure, record the first mismatch in `info`.
pub fn is_related_with<R: SymbolResolver + ?Sized>(
    resolver: &mut R,
    source: SymbolId,
    target: SymbolId,
    kind: RelationKind,
    info: Option<&mut ComparisonInfo>,
) -> bool {
    let explain = info.is_some();
    let mut checker = RelationChecker::new(resolver, explain);
    let related = checker.relate(source, target, kind);
    if let Some(info) = info
        && !related
    {
        let failure = checker
            .failure
            .take()
            .unwrap_or(ComparisonFailure::TypeMismatch { source, target });
        info.record(failure);
    }
    related
}

/// No assumption is live.
const NO_ASSUMPTION: u32 = u32::MAX;

struct RelationChecker<'r, R: SymbolResolver + ?Sized> {
    resolver: &'r mut R,
    guard: RecursionGuard<RelationKey>,
    explain: bool,
    failure: Option<ComparisonFailure>,
    /// Shallowest stack depth whose pair was assumed related inside the
    /// comparison currently running.
    assumed_depth: u32,
    /// Successes that rest on a pair still on the stack.
    provisional: Vec<RelationKey>,
    /// A pair owned by an enclosing query was assumed related; nothing this
    /// query proves may be cached.
    assumed_foreign: bool,
}

impl<'r, R: SymbolResolver + ?Sized> RelationChecker<'r, R> {
    fn new(resolver: &'r mut R, explain: bool) -> Self {
        let profile = RecursionProfile::Custom {
            max_depth: resolver.options().max_relation_depth,
            max_iterations: RecursionProfile::Relation.max_iterations(),
        };
        Self {
            resolver,
            guard: RecursionGuard::with_profile(profile),
            explain,
            failure: None,
            assumed_depth: NO_ASSUMPTION,
            provisional: Vec::new(),
            assumed_foreign: false,
        }
    }

    fn assume(&mut self, depth: u32) -> bool {
        self.assumed_depth = self.assumed_depth.min(depth);
        true
    }

    /// Record `reason` when explaining; always returns `false`.
    fn fail(&mut self, reason: impl FnOnce() -> ComparisonFailure) -> bool {
        if self.explain && self.failure.is_none() {
            self.failure = Some(reason());
        }
        false
    }

    /// Run `f` without recording failures.
    fn quietly(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        let explain = self.explain;
        self.explain = false;
        let related = f(self);
        self.explain = explain;
        related
    }

    fn take_nested(&mut self) -> Option<Box<ComparisonFailure>> {
        self.failure.take().map(Box::new)
    }

    fn relate(&mut self, source: SymbolId, target: SymbolId, kind: RelationKind) -> bool {
        let source = resolve_alias(self.resolver, source);
        let target = resolve_alias(self.resolver, target);
        if source == target || source == SymbolId::ERROR || target == SymbolId::ERROR {
            return true;
        }
        if kind == RelationKind::Identical {
            return self.identical(source, target);
        }
        if target == SymbolId::ANY {
            return true;
        }
        if source == SymbolId::ANY {
            return kind == RelationKind::Assignable
                || self.fail(|| ComparisonFailure::TypeMismatch { source, target });
        }
        if source.is_widening() {
            return true;
        }
        if source == SymbolId::VOID || target == SymbolId::VOID {
            return self.fail(|| ComparisonFailure::TypeMismatch { source, target });
        }

        let graph = self.resolver.graph();
        let (source_kind, target_kind) = (graph.kind(source), graph.kind(target));
        match (source_kind, target_kind) {
            (SymbolKind::Enum, _) if target == SymbolId::NUMBER => true,
            (_, SymbolKind::Enum) if source == SymbolId::NUMBER => {
                kind == RelationKind::Assignable
                    || self.fail(|| ComparisonFailure::TypeMismatch { source, target })
            }
            (SymbolKind::TypeParameter, _) => match self.resolver.constraint_of(source) {
                Some(constraint) if constraint != source => self.relate(constraint, target, kind),
                _ => {
                    is_empty_object(self.resolver, target)
                        || self.fail(|| ComparisonFailure::TypeMismatch { source, target })
                }
            },
            (SymbolKind::Array, SymbolKind::Array) => {
                let element = |s: SymbolId| {
                    graph
                        .get(s)
                        .and_then(|a| a.element_type)
                        .unwrap_or(SymbolId::ANY)
                };
                let (source_type, target_type) = (element(source), element(target));
                if self.relate(source_type, target_type, kind) {
                    return true;
                }
                let nested = self.take_nested();
                self.fail(|| ComparisonFailure::ElementTypeMismatch {
                    source_type,
                    target_type,
                    nested,
                })
            }
            (s, t) if s.is_object_like() && t.is_object_like() => {
                self.structural(source, target, kind)
            }
            (_, t) if t.is_object_like() => {
                is_empty_object(self.resolver, target)
                    || self.fail(|| ComparisonFailure::TypeMismatch { source, target })
            }
            _ => self.fail(|| ComparisonFailure::TypeMismatch { source, target }),
        }
    }

    /// Cached, cycle-safe structural comparison of two object-like types.
    fn structural(&mut self, source: SymbolId, target: SymbolId, kind: RelationKind) -> bool {
        let key = (source, target, kind);
        if let Some(depth) = self.guard.entered_at(&key) {
            return self.assume(depth);
        }
        match self.resolver.relation_cache().entries.get(&key) {
            Some(CacheEntry::Done(true)) => return true,
            // Recompute cached failures when the caller wants the reason.
            Some(CacheEntry::Done(false)) if !self.explain => return false,
            Some(CacheEntry::InProgress) => {
                self.assumed_foreign = true;
                return true;
            }
            _ => {}
        }
        let depth = self.guard.depth();
        match self.guard.enter(key) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => return self.assume(0),
            denied @ (RecursionResult::DepthExceeded | RecursionResult::IterationExceeded) => {
                trace!(source = source.0, target = target.0, ?denied, "relation limit reached, assuming related");
                return self.assume(0);
            }
        }
        self.resolver
            .relation_cache()
            .entries
            .insert(key, CacheEntry::InProgress);
        let outer_assumption = std::mem::replace(&mut self.assumed_depth, NO_ASSUMPTION);
        let first_provisional = self.provisional.len();

        let related = if kind == RelationKind::Identical {
            self.identical_members(source, target)
                && self.identical_signatures(source, target)
        } else {
            self.members_related(source, target, kind)
                && self.signatures_related(source, target, SignatureKind::Call, kind)
                && self.signatures_related(source, target, SignatureKind::Construct, kind)
                && self.index_related(source, target, kind)
        };

        self.guard.leave(key);
        self.settle(key, depth, related, outer_assumption, first_provisional);
        trace!(source = source.0, target = target.0, ?kind, related, "structural relation");
        related
    }

    /// Record the result of the pair entered at `depth`.
    fn settle(
        &mut self,
        key: RelationKey,
        depth: u32,
        related: bool,
        outer_assumption: u32,
        first_provisional: usize,
    ) {
        let inner_assumption = self.assumed_depth;
        if !related {
            self.provisional.truncate(first_provisional);
            self.assumed_depth = outer_assumption;
            self.resolver
                .relation_cache()
                .entries
                .insert(key, CacheEntry::Done(false));
            return;
        }
        if inner_assumption < depth {
            // Holds only if some pair further up the stack does.
            self.resolver.relation_cache().entries.remove(&key);
            self.provisional.push(key);
            self.assumed_depth = outer_assumption.min(inner_assumption);
            return;
        }
        self.assumed_depth = outer_assumption;
        let proven: Vec<RelationKey> = self.provisional.drain(first_provisional..).collect();
        if self.assumed_foreign {
            self.resolver.relation_cache().entries.remove(&key);
            return;
        }
        let cache = self.resolver.relation_cache();
        for proven in proven {
            cache.entries.insert(proven, CacheEntry::Done(true));
        }
        cache.entries.insert(key, CacheEntry::Done(true));
    }

    fn members_related(&mut self, source: SymbolId, target: SymbolId, kind: RelationKind) -> bool {
        for (name, target_member) in all_members(self.resolver, target) {
            let target_optional = self
                .resolver
                .graph()
                .flags(target_member)
                .contains(SymbolFlags::OPTIONAL);
            let Some(source_member) = find_member(self.resolver, source, &name) else {
                if target_optional {
                    continue;
                }
                return self.fail(|| ComparisonFailure::MissingMember {
                    name,
                    source,
                    target,
                });
            };
            let source_optional = self
                .resolver
                .graph()
                .flags(source_member)
                .contains(SymbolFlags::OPTIONAL);
            if source_optional && !target_optional {
                return self.fail(|| ComparisonFailure::OptionalMemberRequired { name });
            }
            let source_type = member_type(self.resolver, source_member);
            let target_type = member_type(self.resolver, target_member);
            if !self.relate(source_type, target_type, kind) {
                let nested = self.take_nested();
                return self.fail(|| ComparisonFailure::MemberTypeMismatch {
                    name,
                    source_type,
                    target_type,
                    nested,
                });
            }
        }
        true
    }

    /// Every target signature of `sig_kind` is satisfied by some source signature.
    fn signatures_related(
        &mut self,
        source: SymbolId,
        target: SymbolId,
        sig_kind: SignatureKind,
        kind: RelationKind,
    ) -> bool {
        let targets = signatures_of(self.resolver, target, sig_kind);
        if targets.is_empty() {
            return true;
        }
        let sources = signatures_of(self.resolver, source, sig_kind);
        for target_sig in targets {
            let matched = sources.iter().any(|&source_sig| {
                self.quietly(|c| c.signature_related(source_sig, target_sig, kind))
            });
            if matched {
                continue;
            }
            // With a single candidate the specific mismatch is worth reporting.
            let nested = match sources.as_slice() {
                [only] if self.explain => {
                    self.signature_related(*only, target_sig, kind);
                    self.take_nested()
                }
                _ => None,
            };
            return self.fail(|| ComparisonFailure::MissingSignature {
                kind: sig_kind,
                source,
                target,
                nested,
            });
        }
        true
    }

    fn signature_related(&mut self, source: SymbolId, target: SymbolId, kind: RelationKind) -> bool {
        let source = erase_signature(self.resolver, source);
        let target = erase_signature(self.resolver, target);
        let source_arity = arity(&*self.resolver, source);
        let target_arity = arity(&*self.resolver, target);
        if source_arity.required > target_arity.fixed && !target_arity.has_rest {
            return self.fail(|| ComparisonFailure::ParameterCount {
                source_required: source_arity.required,
                target_count: target_arity.fixed,
            });
        }
        let param_count = |r: &R, s: SymbolId| r.graph().get(s).map_or(0, |s| s.parameters.len());
        let shared = param_count(&*self.resolver, source).min(param_count(&*self.resolver, target));
        for index in 0..shared {
            let source_type = parameter_type_at(self.resolver, source, index);
            let target_type = parameter_type_at(self.resolver, target, index);
            let related = match kind {
                RelationKind::Assignable => self.quietly(|c| {
                    c.relate(source_type, target_type, kind) || c.relate(target_type, source_type, kind)
                }),
                _ => self.quietly(|c| c.relate(target_type, source_type, kind)),
            };
            if !related {
                return self.fail(|| ComparisonFailure::ParameterTypeMismatch {
                    index,
                    source_type,
                    target_type,
                });
            }
        }
        let target_type = self.resolver.return_type_of(target);
        if resolve_alias(self.resolver, target_type) == SymbolId::VOID {
            return true;
        }
        let source_type = self.resolver.return_type_of(source);
        if self.relate(source_type, target_type, kind) {
            return true;
        }
        let nested = self.take_nested();
        self.fail(|| ComparisonFailure::ReturnTypeMismatch {
            source_type,
            target_type,
            nested,
        })
    }

    fn index_related(&mut self, source: SymbolId, target: SymbolId, kind: RelationKind) -> bool {
        for target_sig in signatures_of(self.resolver, target, SignatureKind::Index) {
            let target_type = self.resolver.return_type_of(target_sig);
            let target_key = parameter_type_at(self.resolver, target_sig, 0);
            let sources = signatures_of(self.resolver, source, SignatureKind::Index);
            let mut source_sig = None;
            for &candidate in &sources {
                if parameter_type_at(self.resolver, candidate, 0) == target_key {
                    source_sig = Some(candidate);
                    break;
                }
            }
            match source_sig.or_else(|| sources.first().copied()) {
                Some(source_sig) => {
                    let source_type = self.resolver.return_type_of(source_sig);
                    if !self.relate(source_type, target_type, kind) {
                        let nested = self.take_nested();
                        return self.fail(|| ComparisonFailure::ReturnTypeMismatch {
                            source_type,
                            target_type,
                            nested,
                        });
                    }
                }
                // Object literals are checked member by member against the index type.
                None if self
                    .resolver
                    .graph()
                    .flags(source)
                    .contains(SymbolFlags::OBJECT_LITERAL) =>
                {
                    for (name, member) in all_members(self.resolver, source) {
                        let source_type = member_type(self.resolver, member);
                        if !self.relate(source_type, target_type, kind) {
                            let nested = self.take_nested();
                            return self.fail(|| ComparisonFailure::MemberTypeMismatch {
                                name,
                                source_type,
                                target_type,
                                nested,
                            });
                        }
                    }
                }
                None => return self.fail(|| ComparisonFailure::MissingIndexSignature { target }),
            }
        }
        true
    }

    // =========================================================================
    // Identity
    // =========================================================================

    fn identical(&mut self, source: SymbolId, target: SymbolId) -> bool {
        let graph = self.resolver.graph();
        match (graph.kind(source), graph.kind(target)) {
            (SymbolKind::Array, SymbolKind::Array) => {
                let element = |s: SymbolId| graph.get(s).and_then(|a| a.element_type);
                match (element(source), element(target)) {
                    (Some(a), Some(b)) => self.relate(a, b, RelationKind::Identical),
                    _ => false,
                }
            }
            (s, t) if s.is_object_like() && t.is_object_like() => {
                self.structural(source, target, RelationKind::Identical)
            }
            _ => self.fail(|| ComparisonFailure::TypeMismatch { source, target }),
        }
    }

    fn identical_members(&mut self, source: SymbolId, target: SymbolId) -> bool {
        let source_members = all_members(self.resolver, source);
        let target_members = all_members(self.resolver, target);
        if source_members.len() != target_members.len() {
            return self.fail(|| ComparisonFailure::TypeMismatch { source, target });
        }
        for (name, target_member) in target_members {
            let Some(source_member) = source_members
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, m)| *m)
            else {
                return self.fail(|| ComparisonFailure::MissingMember {
                    name,
                    source,
                    target,
                });
            };
            let optional = |r: &R, m: SymbolId| r.graph().flags(m).contains(SymbolFlags::OPTIONAL);
            if optional(&*self.resolver, source_member) != optional(&*self.resolver, target_member) {
                return self.fail(|| ComparisonFailure::OptionalMemberRequired { name });
            }
            let source_type = member_type(self.resolver, source_member);
            let target_type = member_type(self.resolver, target_member);
            if !self.relate(source_type, target_type, RelationKind::Identical) {
                let nested = self.take_nested();
                return self.fail(|| ComparisonFailure::MemberTypeMismatch {
                    name,
                    source_type,
                    target_type,
                    nested,
                });
            }
        }
        true
    }

    fn identical_signatures(&mut self, source: SymbolId, target: SymbolId) -> bool {
        for sig_kind in [SignatureKind::Call, SignatureKind::Construct, SignatureKind::Index] {
            let sources = signatures_of(self.resolver, source, sig_kind);
            let targets = signatures_of(self.resolver, target, sig_kind);
            if sources.len() != targets.len() {
                return self.fail(|| ComparisonFailure::MissingSignature {
                    kind: sig_kind,
                    source,
                    target,
                    nested: None,
                });
            }
            for (s, t) in sources.into_iter().zip(targets) {
                if !self.signature_identical(s, t) {
                    return self.fail(|| ComparisonFailure::MissingSignature {
                        kind: sig_kind,
                        source,
                        target,
                        nested: None,
                    });
                }
            }
        }
        true
    }

    fn signature_identical(&mut self, source: SymbolId, target: SymbolId) -> bool {
        let type_param_count =
            |r: &R, s: SymbolId| r.graph().get(s).map_or(0, |s| s.type_parameters.len());
        if type_param_count(&*self.resolver, source) != type_param_count(&*self.resolver, target) {
            return false;
        }
        let source = erase_signature(self.resolver, source);
        let target = erase_signature(self.resolver, target);
        if arity(&*self.resolver, source) != arity(&*self.resolver, target) {
            return false;
        }
        let count = self
            .resolver
            .graph()
            .get(source)
            .map_or(0, |s| s.parameters.len());
        for index in 0..count {
            let a = parameter_type_at(self.resolver, source, index);
            let b = parameter_type_at(self.resolver, target, index);
            if !self.relate(a, b, RelationKind::Identical) {
                return false;
            }
        }
        let a = self.resolver.return_type_of(source);
        let b = self.resolver.return_type_of(target);
        self.relate(a, b, RelationKind::Identical)
    }
}

#[cfg(test)]
#[path = "../tests/relation_tests.rs"]
mod tests;
