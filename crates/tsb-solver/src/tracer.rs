//! Comparison-info sink for relation failures.
//!
//! A relation query normally answers yes or no. When the caller passes a
//! [`ComparisonInfo`], the engine also records *why* the first mismatch
//! happened, so a diagnostic can name the failing member or signature
//! instead of saying "types incompatible".

use tsb_binder::{SignatureKind, SymbolId};

/// Detailed reason for a failed relation.
///
/// `nested` carries the reason one level down, e.g. why two property types
/// are unrelated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComparisonFailure {
    /// A required member of the target is absent from the source.
    MissingMember {
        name: String,
        source: SymbolId,
        target: SymbolId,
    },
    /// The source declares the member optional but the target requires it.
    OptionalMemberRequired { name: String },
    MemberTypeMismatch {
        name: String,
        source_type: SymbolId,
        target_type: SymbolId,
        nested: Option<Box<ComparisonFailure>>,
    },
    /// No source signature of `kind` satisfies a target signature.
    MissingSignature {
        kind: SignatureKind,
        source: SymbolId,
        target: SymbolId,
        nested: Option<Box<ComparisonFailure>>,
    },
    /// The source requires more arguments than the target supplies.
    ParameterCount {
        source_required: usize,
        target_count: usize,
    },
    ParameterTypeMismatch {
        index: usize,
        source_type: SymbolId,
        target_type: SymbolId,
    },
    ReturnTypeMismatch {
        source_type: SymbolId,
        target_type: SymbolId,
        nested: Option<Box<ComparisonFailure>>,
    },
    ElementTypeMismatch {
        source_type: SymbolId,
        target_type: SymbolId,
        nested: Option<Box<ComparisonFailure>>,
    },
    MissingIndexSignature { target: SymbolId },
    /// Nothing more specific applies.
    TypeMismatch { source: SymbolId, target: SymbolId },
}

impl ComparisonFailure {
    /// Name of the outermost member involved, used as a diagnostic argument.
    pub fn member_name(&self) -> Option<&str> {
        match self {
            Self::MissingMember { name, .. }
            | Self::OptionalMemberRequired { name }
            | Self::MemberTypeMismatch { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Innermost recorded reason.
    pub fn innermost(&self) -> &ComparisonFailure {
        match self {
            Self::MemberTypeMismatch {
                nested: Some(inner),
                ..
            }
            | Self::MissingSignature {
                nested: Some(inner),
                ..
            }
            | Self::ReturnTypeMismatch {
                nested: Some(inner),
                ..
            }
            | Self::ElementTypeMismatch {
                nested: Some(inner),
                ..
            } => inner.innermost(),
            _ => self,
        }
    }
}

/// Sink that keeps the first failure reported to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComparisonInfo {
    failure: Option<ComparisonFailure>,
}

impl ComparisonInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure(&self) -> Option<&ComparisonFailure> {
        self.failure.as_ref()
    }

    pub fn take_failure(&mut self) -> Option<ComparisonFailure> {
        self.failure.take()
    }

    pub fn has_failure(&self) -> bool {
        self.failure.is_some()
    }

    pub(crate) fn record(&mut self, failure: ComparisonFailure) {
        if self.failure.is_none() {
            self.failure = Some(failure);
        }
    }
}
