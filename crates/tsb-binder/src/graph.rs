//! The symbol graph: an arena of symbols plus typed links between them.
//!
//! Symbols are addressed by stable [`SymbolId`]s and never hold references
//! to one another. Links are `(source, target, kind)` records indexed from
//! both endpoints, so removing a symbol is a pure data operation: every link
//! touching it is severed and the slot becomes a tombstone.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::trace;

use crate::links::{Link, LinkId, LinkKind};
use crate::symbols::{ResolutionState, Specialization, Symbol, SymbolFlags, SymbolId, SymbolKind};

/// Content key of a specialization: generic root plus canonical type arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpecializationKey {
    pub root: SymbolId,
    pub args: SmallVec<[SymbolId; 4]>,
}

#[derive(Debug)]
pub struct SymbolGraph {
    symbols: Vec<Option<Symbol>>,
    links: Vec<Option<Link>>,
    arrays: FxHashMap<SymbolId, SymbolId>,
    specializations: FxHashMap<SpecializationKey, SymbolId>,
}

impl Default for SymbolGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolGraph {
    pub fn new() -> Self {
        let mut graph = Self {
            symbols: Vec::with_capacity(64),
            links: Vec::new(),
            arrays: FxHashMap::default(),
            specializations: FxHashMap::default(),
        };
        for (id, name) in SymbolId::INTRINSICS {
            let kind = match id {
                SymbolId::ERROR => SymbolKind::Error,
                SymbolId::GLOBAL => SymbolKind::Module,
                _ => SymbolKind::Primitive,
            };
            let allocated = graph.alloc(kind, name);
            debug_assert_eq!(allocated, id);
            if let Some(sym) = graph.get_mut(allocated) {
                sym.state = ResolutionState::Resolved;
            }
        }
        graph
    }

    pub fn alloc(&mut self, kind: SymbolKind, name: impl Into<String>) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Some(Symbol::new(kind, name)));
        id
    }

    #[inline]
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    #[inline]
    pub fn contains(&self, id: SymbolId) -> bool {
        self.get(id).is_some()
    }

    /// Kind of a live symbol; removed symbols read as the error kind.
    pub fn kind(&self, id: SymbolId) -> SymbolKind {
        self.get(id).map_or(SymbolKind::Error, |s| s.kind)
    }

    pub fn name(&self, id: SymbolId) -> &str {
        self.get(id).map_or("", |s| s.name.as_str())
    }

    pub fn flags(&self, id: SymbolId) -> SymbolFlags {
        self.get(id).map_or(SymbolFlags::empty(), |s| s.flags)
    }

    /// Number of live symbols, intrinsics included.
    pub fn len(&self) -> usize {
        self.symbols.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (SymbolId(i as u32), s)))
    }

    // =========================================================================
    // Links
    // =========================================================================

    /// Add a link; an identical existing link is returned instead of duplicated.
    pub fn link(&mut self, source: SymbolId, target: SymbolId, kind: LinkKind) -> LinkId {
        if let Some(existing) = self.get(source).and_then(|s| {
            s.outgoing.iter().copied().find(|&l| {
                self.link_data(l)
                    .is_some_and(|link| link.target == target && link.kind == kind)
            })
        }) {
            return existing;
        }
        let id = LinkId(self.links.len() as u32);
        self.links.push(Some(Link {
            source,
            target,
            kind,
        }));
        if let Some(s) = self.get_mut(source) {
            s.outgoing.push(id);
        }
        if let Some(t) = self.get_mut(target) {
            t.incoming.push(id);
        }
        id
    }

    #[inline]
    pub fn link_data(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn unlink(&mut self, id: LinkId) {
        let Some(link) = self.links.get_mut(id.0 as usize).and_then(Option::take) else {
            return;
        };
        if let Some(s) = self.get_mut(link.source) {
            s.outgoing.retain(|l| *l != id);
        }
        if let Some(t) = self.get_mut(link.target) {
            t.incoming.retain(|l| *l != id);
        }
    }

    /// Sever every outgoing link of `kind` from `source`.
    pub fn unlink_outgoing(&mut self, source: SymbolId, kind: LinkKind) {
        let ids: SmallVec<[LinkId; 4]> = self
            .outgoing_links(source)
            .filter(|(_, l)| l.kind == kind)
            .map(|(id, _)| id)
            .collect();
        for id in ids {
            self.unlink(id);
        }
    }

    pub fn outgoing_links(&self, id: SymbolId) -> impl Iterator<Item = (LinkId, &Link)> {
        self.get(id)
            .into_iter()
            .flat_map(|s| s.outgoing.iter().copied())
            .filter_map(|l| self.link_data(l).map(|link| (l, link)))
    }

    pub fn incoming_links(&self, id: SymbolId) -> impl Iterator<Item = (LinkId, &Link)> {
        self.get(id)
            .into_iter()
            .flat_map(|s| s.incoming.iter().copied())
            .filter_map(|l| self.link_data(l).map(|link| (l, link)))
    }

    /// Targets of outgoing links of `kind`.
    pub fn targets(&self, id: SymbolId, kind: LinkKind) -> SmallVec<[SymbolId; 4]> {
        self.outgoing_links(id)
            .filter(|(_, l)| l.kind == kind)
            .map(|(_, l)| l.target)
            .collect()
    }

    /// Sources of incoming links of `kind`.
    pub fn sources(&self, id: SymbolId, kind: LinkKind) -> SmallVec<[SymbolId; 4]> {
        self.incoming_links(id)
            .filter(|(_, l)| l.kind == kind)
            .map(|(_, l)| l.source)
            .collect()
    }

    /// Follow dependency links from `pending` and add everything reached to
    /// `seen`: every symbol whose resolved state was computed from one of
    /// the starting symbols, transitively. Intrinsics are never collected.
    pub fn collect_dependents(&self, mut pending: Vec<SymbolId>, seen: &mut FxHashSet<SymbolId>) {
        while let Some(sym) = pending.pop() {
            if sym.is_intrinsic() || !seen.insert(sym) {
                continue;
            }
            for (_, link) in self.incoming_links(sym) {
                if link.kind.source_depends_on_target() {
                    pending.push(link.source);
                }
            }
            for (_, link) in self.outgoing_links(sym) {
                if link.kind.target_depends_on_source() {
                    pending.push(link.target);
                }
            }
        }
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove a symbol: sever all of its links, drop cache entries that
    /// mention it and leave a tombstone. Intrinsics are never removed.
    pub fn remove_symbol(&mut self, id: SymbolId) -> Option<Symbol> {
        if id.is_intrinsic() {
            return None;
        }
        let (outgoing, incoming) = {
            let sym = self.get(id)?;
            (sym.outgoing.clone(), sym.incoming.clone())
        };
        for link in outgoing.into_iter().chain(incoming) {
            self.unlink(link);
        }
        self.arrays.retain(|elem, arr| *elem != id && *arr != id);
        self.specializations
            .retain(|key, spec| *spec != id && key.root != id && !key.args.contains(&id));
        trace!(symbol = id.0, "removed symbol");
        self.symbols.get_mut(id.0 as usize).and_then(Option::take)
    }

    // =========================================================================
    // Structural caches
    // =========================================================================

    /// The array type with element `element`, shared per element type.
    pub fn array_of(&mut self, element: SymbolId) -> SymbolId {
        if let Some(&arr) = self.arrays.get(&element) {
            return arr;
        }
        let arr = self.alloc(SymbolKind::Array, "");
        if let Some(sym) = self.get_mut(arr) {
            sym.element_type = Some(element);
            sym.flags |= SymbolFlags::TRANSIENT;
            sym.state = ResolutionState::Resolved;
        }
        self.link(element, arr, LinkKind::TypeArgumentOf);
        self.arrays.insert(element, arr);
        arr
    }

    pub fn find_specialization(&self, root: SymbolId, args: &[SymbolId]) -> Option<SymbolId> {
        let key = SpecializationKey {
            root,
            args: args.iter().copied().collect(),
        };
        self.specializations.get(&key).copied()
    }

    /// Allocate a specialization of `root` and register it under its content key.
    pub fn create_specialization(&mut self, root: SymbolId, args: &[SymbolId]) -> SymbolId {
        let (kind, name, flags) = match self.get(root) {
            Some(sym) => (sym.kind, sym.name.clone(), sym.flags),
            None => (SymbolKind::Error, String::new(), SymbolFlags::empty()),
        };
        let spec = self.alloc(kind, name);
        let args: SmallVec<[SymbolId; 4]> = args.iter().copied().collect();
        if let Some(sym) = self.get_mut(spec) {
            sym.flags = flags | SymbolFlags::TRANSIENT;
            sym.specialization = Some(Specialization {
                root,
                args: args.clone(),
            });
        }
        self.link(spec, root, LinkKind::SpecializedFrom);
        for &arg in &args {
            self.link(arg, spec, LinkKind::TypeArgumentOf);
        }
        self.specializations
            .insert(SpecializationKey { root, args }, spec);
        spec
    }

    /// Number of cached specializations; used by tests and tracing.
    pub fn specialization_count(&self) -> usize {
        self.specializations.len()
    }
}

#[cfg(test)]
#[path = "../tests/graph_tests.rs"]
mod tests;
