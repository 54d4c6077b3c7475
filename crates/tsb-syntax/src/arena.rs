//! Node storage and read-only queries.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tsb_common::Span;

use crate::base::NodeIndex;
use crate::node::{Node, NodeData, Slot};

/// Arena holding every node of one compilation unit.
///
/// The arena is immutable once handed to the semantic core; the core shares it
/// behind an `Arc` and only reads positions and structure from it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeArena {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeIndex,
    #[serde(skip)]
    pub(crate) parents: Vec<NodeIndex>,
}

impl NodeArena {
    /// Build an arena from raw nodes, e.g. as produced by an external parser.
    pub fn from_nodes(nodes: Vec<Node>, root: NodeIndex) -> Self {
        let mut arena = Self {
            nodes,
            root,
            parents: Vec::new(),
        };
        arena.rebuild_parents();
        arena
    }

    /// Decode an arena from its JSON form.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let mut arena: NodeArena = serde_json::from_str(text)?;
        arena.rebuild_parents();
        Ok(arena)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub(crate) fn rebuild_parents(&mut self) {
        self.parents = vec![NodeIndex::NONE; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            let parent = NodeIndex(i as u32);
            let parents = &mut self.parents;
            node.for_each_child(|child| {
                if let Some(slot) = parents.get_mut(child.0 as usize) {
                    *slot = parent;
                }
            });
        }
    }

    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    #[inline]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn parent(&self, index: NodeIndex) -> NodeIndex {
        if index.is_none() {
            return NodeIndex::NONE;
        }
        self.parents
            .get(index.0 as usize)
            .copied()
            .unwrap_or(NodeIndex::NONE)
    }

    pub fn span(&self, index: NodeIndex) -> Span {
        self.get(index).map(|n| n.span).unwrap_or_default()
    }

    /// Walk from `index` (inclusive) up to the root.
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(index.to_option(), move |&idx| self.parent(idx).to_option())
    }

    /// Text of an identifier node.
    pub fn identifier_text(&self, index: NodeIndex) -> Option<&str> {
        match &self.get(index)?.data {
            NodeData::Identifier { text } => Some(text),
            _ => None,
        }
    }

    /// Declared name of a declaration node.
    pub fn name_text(&self, index: NodeIndex) -> Option<&str> {
        let node = self.get(index)?;
        match &node.data {
            NodeData::Identifier { text } | NodeData::StringLiteral { text } => Some(text),
            _ => self.name_text_of_name(node.name()),
        }
    }

    fn name_text_of_name(&self, name: NodeIndex) -> Option<&str> {
        match &self.get(name)?.data {
            NodeData::Identifier { text } | NodeData::StringLiteral { text } => Some(text),
            _ => None,
        }
    }

    /// Segments of an entity name: `A.B.C` yields `["A", "B", "C"]`.
    pub fn entity_name_parts(&self, index: NodeIndex) -> SmallVec<[&str; 4]> {
        let mut parts = SmallVec::new();
        self.collect_entity_name_parts(index, &mut parts);
        parts
    }

    fn collect_entity_name_parts<'a>(&'a self, index: NodeIndex, parts: &mut SmallVec<[&'a str; 4]>) {
        match self.get(index).map(|n| &n.data) {
            Some(NodeData::Identifier { text }) => parts.push(text),
            Some(NodeData::QualifiedName { left, right }) => {
                self.collect_entity_name_parts(*left, parts);
                self.collect_entity_name_parts(*right, parts);
            }
            _ => {}
        }
    }

    /// Present children of `index` in source order.
    pub fn children(&self, index: NodeIndex) -> SmallVec<[NodeIndex; 8]> {
        let mut out = SmallVec::new();
        if let Some(node) = self.get(index) {
            node.for_each_child(|c| out.push(c));
        }
        out
    }

    /// Deepest node whose span contains `offset`.
    pub fn node_at_offset(&self, offset: u32) -> NodeIndex {
        let mut current = self.root;
        if !self.span(current).contains(offset) {
            return NodeIndex::NONE;
        }
        loop {
            let next = self
                .children(current)
                .into_iter()
                .filter(|&c| self.span(c).contains(offset))
                .min_by_key(|&c| self.span(c).len());
            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Position-independent fingerprint of the subtree rooted at `index`.
    ///
    /// Two subtrees with the same kinds, modifiers, names and literal values
    /// in the same shape produce the same fingerprint regardless of where they
    /// sit in the text.
    pub fn structural_hash(&self, index: NodeIndex) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash_subtree(index, &mut hasher);
        hasher.finish()
    }

    /// Feed the fingerprint of `index` into an existing hasher.
    pub fn hash_subtree(&self, index: NodeIndex, state: &mut impl Hasher) {
        let Some(node) = self.get(index) else {
            state.write_u8(0);
            return;
        };
        state.write_u8(1);
        node.kind.hash(state);
        node.modifiers.bits().hash(state);
        match &node.data {
            NodeData::Identifier { text } | NodeData::StringLiteral { text } => text.hash(state),
            NodeData::NumericLiteral { value } => value.to_bits().hash(state),
            NodeData::Binary { operator, .. } => operator.hash(state),
            _ => {}
        }
        node.for_each_slot(|slot| match slot {
            Slot::One(child) => self.hash_subtree(child, state),
            Slot::List(list) => {
                state.write_usize(list.len());
                for child in list.iter() {
                    self.hash_subtree(child, state);
                }
            }
        });
    }
}
