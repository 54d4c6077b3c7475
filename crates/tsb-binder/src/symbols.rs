//! Symbols, type symbols and signature symbols.
//!
//! All three live in one arena ([`crate::SymbolGraph`]) and are addressed by
//! [`SymbolId`]. The variant is a closed tag ([`SymbolKind`]); which payload
//! fields are meaningful depends on it:
//!
//! | kind                          | payload                                                  |
//! |-------------------------------|----------------------------------------------------------|
//! | value symbols                 | `type_of` (resolved lazily)                              |
//! | class / interface / object    | `members`, signatures, `type_parameters`, heritage links |
//! | module, global scope          | `exports`                                                |
//! | array                         | `element_type`                                           |
//! | type parameter                | `constraint`                                             |
//! | type alias                    | `type_of` holds the aliased type once resolved           |
//! | signature                     | `parameters`, `return_type`, `type_parameters`           |
//!
//! Relationships between symbols are never stored as ownership; they are
//! [`Link`](crate::Link)s plus the lookup tables above.

use bitflags::bitflags;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::Serialize;
use smallvec::SmallVec;

use crate::decls::DeclRef;
use crate::links::LinkId;

/// Name -> symbol table with deterministic iteration order.
pub type SymbolTable = IndexMap<String, SymbolId, FxBuildHasher>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const ANY: Self = Self(0);
    pub const NUMBER: Self = Self(1);
    pub const STRING: Self = Self(2);
    pub const BOOLEAN: Self = Self(3);
    pub const VOID: Self = Self(4);
    pub const NULL: Self = Self(5);
    pub const UNDEFINED: Self = Self(6);
    /// The error type: assignable to and from everything.
    pub const ERROR: Self = Self(7);
    /// Container of all top-level declarations of every unit.
    pub const GLOBAL: Self = Self(8);

    pub(crate) const INTRINSICS: [(Self, &'static str); 9] = [
        (Self::ANY, "any"),
        (Self::NUMBER, "number"),
        (Self::STRING, "string"),
        (Self::BOOLEAN, "boolean"),
        (Self::VOID, "void"),
        (Self::NULL, "null"),
        (Self::UNDEFINED, "undefined"),
        (Self::ERROR, "error"),
        (Self::GLOBAL, "global"),
    ];

    #[inline]
    pub const fn is_intrinsic(self) -> bool {
        self.0 < Self::INTRINSICS.len() as u32
    }

    /// `null` and `undefined`: types that widen to `any` when inferred.
    #[inline]
    pub const fn is_widening(self) -> bool {
        self.0 == Self::NULL.0 || self.0 == Self::UNDEFINED.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SignatureKind {
    Call,
    Construct,
    Index,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    // Types
    Primitive,
    #[default]
    Error,
    Class,
    Interface,
    /// Anonymous structural type: type literals, function types, object
    /// literal types, and the value side of classes, functions, enums and modules.
    ObjectType,
    Enum,
    Array,
    TypeParameter,
    TypeAlias,
    // Containers
    Module,
    // Values
    Variable,
    Parameter,
    Property,
    Method,
    Function,
    Accessor,
    EnumMember,
    Signature(SignatureKind),
}

impl SymbolKind {
    /// Kinds usable in a type position.
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            Self::Primitive
                | Self::Error
                | Self::Class
                | Self::Interface
                | Self::ObjectType
                | Self::Enum
                | Self::Array
                | Self::TypeParameter
                | Self::TypeAlias
        )
    }

    /// Kinds usable in a value position.
    pub const fn is_value(self) -> bool {
        matches!(
            self,
            Self::Error
                | Self::Class
                | Self::Enum
                | Self::Module
                | Self::Variable
                | Self::Parameter
                | Self::Property
                | Self::Method
                | Self::Function
                | Self::Accessor
                | Self::EnumMember
        )
    }

    /// Types compared member-by-member.
    pub const fn is_object_like(self) -> bool {
        matches!(self, Self::Class | Self::Interface | Self::ObjectType)
    }

    /// Kinds whose `type_of` is computed by the resolver (and cleared on invalidation).
    pub const fn has_resolved_type(self) -> bool {
        matches!(
            self,
            Self::Variable | Self::Parameter | Self::Property | Self::Accessor | Self::TypeAlias
        )
    }

    pub const fn is_signature(self) -> bool {
        matches!(self, Self::Signature(_))
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Primitive => "primitive",
            Self::Error => "error",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::ObjectType => "object type",
            Self::Enum => "enum",
            Self::Array => "array",
            Self::TypeParameter => "type parameter",
            Self::TypeAlias => "type alias",
            Self::Module => "module",
            Self::Variable => "variable",
            Self::Parameter => "parameter",
            Self::Property => "property",
            Self::Method => "method",
            Self::Function => "function",
            Self::Accessor => "accessor",
            Self::EnumMember => "enum member",
            Self::Signature(SignatureKind::Call) => "call signature",
            Self::Signature(SignatureKind::Construct) => "construct signature",
            Self::Signature(SignatureKind::Index) => "index signature",
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
    pub struct SymbolFlags: u32 {
        const EXPORTED = 1 << 0;
        const OPTIONAL = 1 << 1;
        const REST = 1 << 2;
        const STATIC = 1 << 3;
        const PRIVATE = 1 << 4;
        const AMBIENT = 1 << 5;
        /// Created during resolution (specializations, literal types); has no declarations.
        const TRANSIENT = 1 << 6;
        /// Value side of a class: construct signatures and static members.
        const CONSTRUCTOR_TYPE = 1 << 7;
        /// Object type synthesized from an object literal expression.
        const OBJECT_LITERAL = 1 << 8;
        /// Declared with a duplicate name; not reachable through any table.
        const ORPHAN = 1 << 9;
    }
}

/// Lazy resolution state machine. `Resolving` is the cycle guard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ResolutionState {
    #[default]
    Unresolved,
    Resolving,
    Resolved,
    Error,
}

impl ResolutionState {
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Resolved | Self::Error)
    }
}

/// Back-link from a specialization to its generic root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Specialization {
    pub root: SymbolId,
    pub args: SmallVec<[SymbolId; 4]>,
}

#[derive(Clone, Debug, Default)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub flags: SymbolFlags,
    /// Every physical declaration behind this symbol, in declaration order.
    pub declarations: SmallVec<[DeclRef; 1]>,
    pub state: ResolutionState,
    pub type_of: Option<SymbolId>,
    pub constraint: Option<SymbolId>,
    pub members: SymbolTable,
    pub exports: SymbolTable,
    pub call_signatures: Vec<SymbolId>,
    pub construct_signatures: Vec<SymbolId>,
    pub index_signatures: Vec<SymbolId>,
    pub type_parameters: Vec<SymbolId>,
    pub parameters: Vec<SymbolId>,
    pub return_type: Option<SymbolId>,
    pub element_type: Option<SymbolId>,
    pub specialization: Option<Specialization>,
    /// Declaring symbol of a value-side object type, or the container of a member.
    pub owner: Option<SymbolId>,
    pub(crate) outgoing: SmallVec<[LinkId; 4]>,
    pub(crate) incoming: SmallVec<[LinkId; 4]>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    #[inline]
    pub fn has_flag(&self, flag: SymbolFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_generic(&self) -> bool {
        !self.type_parameters.is_empty() && self.specialization.is_none()
    }

    pub fn signatures(&self, kind: SignatureKind) -> &[SymbolId] {
        match kind {
            SignatureKind::Call => &self.call_signatures,
            SignatureKind::Construct => &self.construct_signatures,
            SignatureKind::Index => &self.index_signatures,
        }
    }

    pub fn signatures_mut(&mut self, kind: SignatureKind) -> &mut Vec<SymbolId> {
        match kind {
            SignatureKind::Call => &mut self.call_signatures,
            SignatureKind::Construct => &mut self.construct_signatures,
            SignatureKind::Index => &mut self.index_signatures,
        }
    }

    /// First declaration, used as the primary diagnostic location.
    pub fn first_declaration(&self) -> Option<DeclRef> {
        self.declarations.first().copied()
    }

    /// Insert a declaration keeping declaration order.
    pub fn add_declaration(&mut self, decl: DeclRef) {
        if let Err(pos) = self.declarations.binary_search(&decl) {
            self.declarations.insert(pos, decl);
        }
    }
}
