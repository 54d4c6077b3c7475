//! Typed, bidirectional edges between symbols.

use serde::Serialize;

use crate::symbols::SymbolId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LinkId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LinkKind {
    /// Member or signature -> owning type.
    MemberOf,
    /// Class or interface -> base type.
    Extends,
    /// Class -> implemented interface.
    Implements,
    /// Parameter -> signature.
    ParameterOf,
    /// Signature -> return type.
    ReturnTypeOf,
    /// Type alias -> aliased type.
    Aliases,
    /// Named symbol -> enclosing module, scope or value-side type.
    ContainedBy,
    /// Specialization -> generic root.
    SpecializedFrom,
    /// Type argument -> specialization using it.
    TypeArgumentOf,
    /// Value symbol -> its resolved type.
    TypeOf,
}

impl LinkKind {
    /// Whether invalidating the link's *target* invalidates its source.
    ///
    /// The source's resolved state was computed from the target.
    pub const fn source_depends_on_target(self) -> bool {
        matches!(
            self,
            Self::Extends
                | Self::Implements
                | Self::ReturnTypeOf
                | Self::Aliases
                | Self::SpecializedFrom
                | Self::TypeOf
        )
    }

    /// Whether invalidating the link's *source* invalidates its target.
    ///
    /// The target's structure includes the source.
    pub const fn target_depends_on_source(self) -> bool {
        matches!(self, Self::MemberOf | Self::ParameterOf | Self::TypeArgumentOf)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Link {
    pub source: SymbolId,
    pub target: SymbolId,
    pub kind: LinkKind,
}
