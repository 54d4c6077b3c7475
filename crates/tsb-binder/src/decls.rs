//! Declaration records extracted from syntax.
//!
//! A [`Decl`] is the structural record of one physical declaration site. Decls
//! are created once per parse and never mutated afterwards; a new parse yields
//! a new [`DeclTree`]. Several decls may share a *declaration group* (same
//! parent scope, name and kind), e.g. overload signatures or a reopened
//! interface. Groups are recorded by position, never flattened, so
//! diagnostics can always point at the exact physical declaration.

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use tsb_common::Span;
use tsb_syntax::NodeIndex;

/// Index of a compilation unit in the semantic info chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnitId(pub u32);

/// Index of a decl inside one [`DeclTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId(pub u32);

/// Globally unique decl address. Ordering is declaration order across units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclRef {
    pub unit: UnitId,
    pub decl: DeclId,
}

impl DeclRef {
    pub const fn new(unit: UnitId, decl: DeclId) -> Self {
        Self { unit, decl }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DeclKind {
    Module,
    Class,
    Interface,
    Enum,
    EnumMember,
    TypeAlias,
    Function,
    Variable,
    Parameter,
    Property,
    Method,
    Constructor,
    GetAccessor,
    SetAccessor,
    CallSignature,
    ConstructSignature,
    IndexSignature,
    TypeParameter,
    TypeLiteral,
    FunctionType,
    ConstructorType,
    FunctionExpression,
    ArrowFunction,
    Catch,
    With,
}

impl DeclKind {
    /// Decls that own a call/construct/index signature.
    pub const fn is_signature_owner(self) -> bool {
        matches!(
            self,
            Self::Function
                | Self::Method
                | Self::Constructor
                | Self::GetAccessor
                | Self::SetAccessor
                | Self::CallSignature
                | Self::ConstructSignature
                | Self::IndexSignature
                | Self::FunctionType
                | Self::ConstructorType
                | Self::FunctionExpression
                | Self::ArrowFunction
        )
    }

    /// Decls whose children are scoped locals rather than members.
    pub const fn has_locals(self) -> bool {
        self.is_signature_owner()
            || matches!(
                self,
                Self::Class | Self::Interface | Self::TypeAlias | Self::Catch | Self::With
            )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Enum => "enum",
            Self::EnumMember => "enum member",
            Self::TypeAlias => "type alias",
            Self::Function => "function",
            Self::Variable => "variable",
            Self::Parameter => "parameter",
            Self::Property => "property",
            Self::Method => "method",
            Self::Constructor => "constructor",
            Self::GetAccessor => "get accessor",
            Self::SetAccessor => "set accessor",
            Self::CallSignature => "call signature",
            Self::ConstructSignature => "construct signature",
            Self::IndexSignature => "index signature",
            Self::TypeParameter => "type parameter",
            Self::TypeLiteral => "type literal",
            Self::FunctionType => "function type",
            Self::ConstructorType => "constructor type",
            Self::FunctionExpression => "function expression",
            Self::ArrowFunction => "arrow function",
            Self::Catch => "catch clause",
            Self::With => "with block",
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
    pub struct DeclFlags: u32 {
        const EXPORTED = 1 << 0;
        /// `declare` on the decl or any ancestor.
        const AMBIENT = 1 << 1;
        const PUBLIC = 1 << 2;
        const PRIVATE = 1 << 3;
        const STATIC = 1 << 4;
        const OPTIONAL = 1 << 5;
        const REST = 1 << 6;
        /// Function-like decl with a body (an implementation, not an overload).
        const HAS_BODY = 1 << 7;
        /// Declared type annotation present.
        const ANNOTATED = 1 << 8;
    }
}

#[derive(Clone, Debug)]
pub struct Decl {
    pub kind: DeclKind,
    /// Empty for anonymous decls (signatures, type literals, function expressions).
    pub name: String,
    pub flags: DeclFlags,
    pub node: NodeIndex,
    pub name_node: NodeIndex,
    pub span: Span,
    pub name_span: Span,
    /// Enclosing decl. A lookup relation; the tree owns every decl.
    pub parent: Option<DeclId>,
    pub children: SmallVec<[DeclId; 4]>,
    /// Fingerprint of the header: modifiers, annotations, parameters, type
    /// parameters and heritage. Members are separate decls and not included.
    pub shape: u64,
}

impl Decl {
    #[inline]
    pub fn has_flag(&self, flag: DeclFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

/// All decls of one unit, in creation (pre-order) order.
#[derive(Clone, Debug, Default)]
pub struct DeclTree {
    pub(crate) decls: Vec<Decl>,
    pub(crate) roots: Vec<DeclId>,
    pub(crate) node_to_decl: FxHashMap<NodeIndex, DeclId>,
}

impl DeclTree {
    #[inline]
    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.0 as usize)
    }

    pub fn roots(&self) -> &[DeclId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (DeclId(i as u32), d))
    }

    /// Children of `parent`, or the roots when `parent` is `None`.
    pub fn children_of(&self, parent: Option<DeclId>) -> &[DeclId] {
        match parent {
            Some(id) => self.get(id).map_or(&[][..], |d| d.children.as_slice()),
            None => &self.roots,
        }
    }

    pub fn decl_of_node(&self, node: NodeIndex) -> Option<DeclId> {
        self.node_to_decl.get(&node).copied()
    }

    /// Walk from `id` (inclusive) up through enclosing decls.
    pub fn ancestors(&self, id: DeclId) -> impl Iterator<Item = DeclId> + '_ {
        std::iter::successors(Some(id), move |&d| self.get(d).and_then(|decl| decl.parent))
    }

    /// Siblings of `id` sharing its parent, name and kind, in order (including `id`).
    pub fn group_of(&self, id: DeclId) -> SmallVec<[DeclId; 2]> {
        let Some(decl) = self.get(id) else {
            return SmallVec::new();
        };
        self.children_of(decl.parent)
            .iter()
            .copied()
            .filter(|&sib| {
                self.get(sib)
                    .is_some_and(|s| s.kind == decl.kind && s.name == decl.name)
            })
            .collect()
    }

    /// Names of the enclosing decls from the root down to `id`.
    pub fn scope_path(&self, id: DeclId) -> Vec<&str> {
        let mut path: Vec<&str> = self
            .ancestors(id)
            .filter_map(|d| self.get(d).map(|decl| decl.name.as_str()))
            .collect();
        path.reverse();
        path
    }

    /// Deepest decl whose node span contains `offset`.
    pub fn innermost_at(&self, offset: u32) -> Option<DeclId> {
        let mut current: Option<DeclId> = None;
        loop {
            let next = self
                .children_of(current)
                .iter()
                .copied()
                .filter(|&c| self.get(c).is_some_and(|d| d.span.contains(offset)))
                .min_by_key(|&c| self.get(c).map_or(u32::MAX, |d| d.span.len()));
            match next {
                Some(child) => current = Some(child),
                None => return current,
            }
        }
    }
}
