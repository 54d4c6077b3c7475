//! Decl differ.
//!
//! Walks an old and a new decl tree in lock-step. Siblings are paired by
//! (name, kind, occurrence index among same-named siblings of that kind), so
//! pairing follows the scope path. Each pair is unchanged or changed by
//! comparing header fingerprints; unpaired decls are added or removed
//! together with their whole subtree.

use rustc_hash::FxHashMap;

use crate::decls::{DeclId, DeclKind, DeclTree};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclChange {
    Unchanged,
    /// Same name and kind in the same scope, different shape.
    Changed,
    Added,
    Removed,
}

#[derive(Clone, Debug, Default)]
pub struct DeclDiff {
    /// Paired decls: `(old, new, Unchanged | Changed)`.
    pub pairs: Vec<(DeclId, DeclId, DeclChange)>,
    /// Decls of the new tree without a counterpart.
    pub added: Vec<DeclId>,
    /// Decls of the old tree without a counterpart.
    pub removed: Vec<DeclId>,
}

impl DeclDiff {
    pub fn changed(&self) -> impl Iterator<Item = (DeclId, DeclId)> + '_ {
        self.pairs
            .iter()
            .filter(|(_, _, c)| *c == DeclChange::Changed)
            .map(|(o, n, _)| (*o, *n))
    }

    pub fn count(&self, change: DeclChange) -> usize {
        match change {
            DeclChange::Added => self.added.len(),
            DeclChange::Removed => self.removed.len(),
            _ => self.pairs.iter().filter(|(_, _, c)| *c == change).count(),
        }
    }

    /// Classification of an old decl.
    pub fn old_change(&self, old: DeclId) -> DeclChange {
        self.pairs
            .iter()
            .find(|(o, _, _)| *o == old)
            .map_or(DeclChange::Removed, |(_, _, c)| *c)
    }

    /// Whether the new tree is equivalent to the old one.
    pub fn is_identity(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.pairs.iter().all(|(_, _, c)| *c == DeclChange::Unchanged)
    }
}

pub fn diff_decl_trees(old: &DeclTree, new: &DeclTree) -> DeclDiff {
    let mut diff = DeclDiff::default();
    diff_children(old, new, None, None, &mut diff);
    diff
}

type PairKey<'a> = (&'a str, DeclKind, usize);

fn keyed<'a>(tree: &'a DeclTree, children: &[DeclId]) -> Vec<(PairKey<'a>, DeclId)> {
    let mut seen: FxHashMap<(&str, DeclKind), usize> = FxHashMap::default();
    children
        .iter()
        .filter_map(|&id| {
            let decl = tree.get(id)?;
            let occurrence = seen.entry((decl.name.as_str(), decl.kind)).or_insert(0);
            let key = (decl.name.as_str(), decl.kind, *occurrence);
            *occurrence += 1;
            Some((key, id))
        })
        .collect()
}

fn diff_children(
    old: &DeclTree,
    new: &DeclTree,
    old_parent: Option<DeclId>,
    new_parent: Option<DeclId>,
    diff: &mut DeclDiff,
) {
    let old_keyed = keyed(old, old.children_of(old_parent));
    let new_keyed = keyed(new, new.children_of(new_parent));
    let mut unmatched: FxHashMap<PairKey<'_>, DeclId> = old_keyed.iter().copied().collect();

    for (key, new_id) in new_keyed {
        match unmatched.remove(&key) {
            Some(old_id) => {
                let same_shape = old
                    .get(old_id)
                    .zip(new.get(new_id))
                    .is_some_and(|(o, n)| o.shape == n.shape);
                let change = if same_shape {
                    DeclChange::Unchanged
                } else {
                    DeclChange::Changed
                };
                diff.pairs.push((old_id, new_id, change));
                diff_children(old, new, Some(old_id), Some(new_id), diff);
            }
            None => collect_subtree(new, new_id, &mut diff.added),
        }
    }

    for (key, old_id) in old_keyed {
        if unmatched.contains_key(&key) {
            collect_subtree(old, old_id, &mut diff.removed);
        }
    }
}

fn collect_subtree(tree: &DeclTree, id: DeclId, out: &mut Vec<DeclId>) {
    out.push(id);
    for &child in tree.children_of(Some(id)) {
        collect_subtree(tree, child, out);
    }
}

#[cfg(test)]
#[path = "../tests/differ_tests.rs"]
mod tests;
