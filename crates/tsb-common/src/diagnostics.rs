//! Diagnostic types handed to the external diagnostics reporter.
//!
//! The textual message catalog is not part of the semantic core. A diagnostic
//! carries a unit path, a byte span, a numeric code and positional arguments;
//! the reporter owns turning those into localized text. Codes follow the
//! TypeScript numbering wherever an equivalent diagnostic exists.

use serde::Serialize;

use crate::span::Span;

// =============================================================================
// Diagnostic Codes
// =============================================================================

pub mod diagnostic_codes {
    pub const DUPLICATE_IDENTIFIER: u32 = 2300;
    pub const NAME_NOT_FOUND: u32 = 2304;
    pub const GENERIC_TYPE_ARITY: u32 = 2314;
    pub const TYPE_NOT_ASSIGNABLE: u32 = 2322;
    pub const PROPERTY_NOT_FOUND: u32 = 2339;
    pub const NOT_CALLABLE: u32 = 2349;
    pub const NOT_CONSTRUCTABLE: u32 = 2351;
    pub const NO_BEST_COMMON_TYPE: u32 = 2354;
    pub const DUPLICATE_FUNCTION_IMPLEMENTATION: u32 = 2393;
    pub const OVERLOAD_NOT_COMPATIBLE: u32 = 2394;
    pub const CLASS_INCORRECTLY_IMPLEMENTS: u32 = 2420;
    pub const CONFLICTING_TYPE_PARAMETERS: u32 = 2428;
    pub const INTERFACE_INCORRECTLY_EXTENDS: u32 = 2430;
    pub const CIRCULAR_REFERENCE: u32 = 2502;
    pub const WRONG_SYMBOL_KIND: u32 = 2693;
    pub const AMBIGUOUS_OVERLOAD: u32 = 2758;
    pub const NO_MATCHING_OVERLOAD: u32 = 2769;
    pub const IMPLICIT_ANY_PARAMETER: u32 = 7006;
}

/// Closed set of diagnostics the core can produce.
///
/// Grouped by the error taxonomy: binding, resolution, relational and
/// overload errors. Syntactic carry-over never produces a diagnostic here;
/// malformed input simply resolves to the error type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    // Binding errors
    DuplicateIdentifier,
    ConflictingTypeParameters,
    DuplicateFunctionImplementation,
    // Resolution errors
    NameNotFound,
    WrongSymbolKind,
    CircularReference,
    GenericTypeArity,
    PropertyNotFound,
    NotCallable,
    NotConstructable,
    ImplicitAnyParameter,
    // Relational errors
    TypeNotAssignable,
    NoBestCommonType,
    ClassIncorrectlyImplements,
    InterfaceIncorrectlyExtends,
    OverloadNotCompatible,
    // Overload errors
    NoMatchingOverload,
    AmbiguousOverload,
}

impl DiagnosticKind {
    pub const fn code(self) -> u32 {
        use diagnostic_codes::*;
        match self {
            Self::DuplicateIdentifier => DUPLICATE_IDENTIFIER,
            Self::ConflictingTypeParameters => CONFLICTING_TYPE_PARAMETERS,
            Self::DuplicateFunctionImplementation => DUPLICATE_FUNCTION_IMPLEMENTATION,
            Self::NameNotFound => NAME_NOT_FOUND,
            Self::WrongSymbolKind => WRONG_SYMBOL_KIND,
            Self::CircularReference => CIRCULAR_REFERENCE,
            Self::GenericTypeArity => GENERIC_TYPE_ARITY,
            Self::PropertyNotFound => PROPERTY_NOT_FOUND,
            Self::NotCallable => NOT_CALLABLE,
            Self::NotConstructable => NOT_CONSTRUCTABLE,
            Self::ImplicitAnyParameter => IMPLICIT_ANY_PARAMETER,
            Self::TypeNotAssignable => TYPE_NOT_ASSIGNABLE,
            Self::NoBestCommonType => NO_BEST_COMMON_TYPE,
            Self::ClassIncorrectlyImplements => CLASS_INCORRECTLY_IMPLEMENTS,
            Self::InterfaceIncorrectlyExtends => INTERFACE_INCORRECTLY_EXTENDS,
            Self::OverloadNotCompatible => OVERLOAD_NOT_COMPATIBLE,
            Self::NoMatchingOverload => NO_MATCHING_OVERLOAD,
            Self::AmbiguousOverload => AMBIGUOUS_OVERLOAD,
        }
    }

    /// Stable machine-readable identifier, used by tooling and the CLI.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DuplicateIdentifier => "duplicate-identifier",
            Self::ConflictingTypeParameters => "conflicting-type-parameters",
            Self::DuplicateFunctionImplementation => "duplicate-function-implementation",
            Self::NameNotFound => "name-not-found",
            Self::WrongSymbolKind => "wrong-symbol-kind",
            Self::CircularReference => "unresolvable-circular-reference",
            Self::GenericTypeArity => "generic-type-arity",
            Self::PropertyNotFound => "property-not-found",
            Self::NotCallable => "not-callable",
            Self::NotConstructable => "not-constructable",
            Self::ImplicitAnyParameter => "implicit-any-parameter",
            Self::TypeNotAssignable => "type-mismatch",
            Self::NoBestCommonType => "no-best-common-type",
            Self::ClassIncorrectlyImplements => "class-incorrectly-implements",
            Self::InterfaceIncorrectlyExtends => "interface-incorrectly-extends",
            Self::OverloadNotCompatible => "overload-not-compatible",
            Self::NoMatchingOverload => "no-matching-overload",
            Self::AmbiguousOverload => "ambiguous-overload",
        }
    }

    pub const fn category(self) -> DiagnosticCategory {
        match self {
            Self::AmbiguousOverload => DiagnosticCategory::Warning,
            _ => DiagnosticCategory::Error,
        }
    }
}

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

/// Related information for a diagnostic (e.g. the member that failed a
/// structural comparison, or the first declaration of a duplicate name).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub kind: DiagnosticKind,
    pub args: Vec<String>,
}

/// A semantic diagnostic with positional message arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub kind: DiagnosticKind,
    pub code: u32,
    pub category: DiagnosticCategory,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Create a diagnostic of `kind` covering `span` in `file`.
    #[must_use]
    pub fn new(file: impl Into<String>, span: Span, kind: DiagnosticKind, args: Vec<String>) -> Self {
        Self {
            file: file.into(),
            start: span.start,
            length: span.len(),
            kind,
            code: kind.code(),
            category: kind.category(),
            args,
            related_information: Vec::new(),
        }
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(
        mut self,
        file: impl Into<String>,
        span: Span,
        kind: DiagnosticKind,
        args: Vec<String>,
    ) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file: file.into(),
            start: span.start,
            length: span.len(),
            kind,
            args,
        });
        self
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.start + self.length)
    }

    /// Fallback rendering used when no message catalog is attached,
    /// e.g. `TS2304 name-not-found (Foo)`.
    pub fn render_fallback(&self) -> String {
        if self.args.is_empty() {
            format!("TS{} {}", self.code, self.kind.name())
        } else {
            format!("TS{} {} ({})", self.code, self.kind.name(), self.args.join(", "))
        }
    }
}

/// Sort diagnostics into reporter order: by file, then start, then code.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.start.cmp(&b.start))
            .then(a.code.cmp(&b.code))
            .then(a.args.cmp(&b.args))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_carries_code_and_span() {
        let diag = Diagnostic::new(
            "a.ts",
            Span::new(10, 13),
            DiagnosticKind::NameNotFound,
            vec!["Foo".to_string()],
        );
        assert_eq!(diag.code, diagnostic_codes::NAME_NOT_FOUND);
        assert_eq!(diag.start, 10);
        assert_eq!(diag.length, 3);
        assert_eq!(diag.category, DiagnosticCategory::Error);
        assert_eq!(diag.render_fallback(), "TS2304 name-not-found (Foo)");
    }

    #[test]
    fn sort_orders_by_position() {
        let mut diags = vec![
            Diagnostic::new("a.ts", Span::new(20, 21), DiagnosticKind::NameNotFound, vec![]),
            Diagnostic::new("a.ts", Span::new(5, 6), DiagnosticKind::TypeNotAssignable, vec![]),
        ];
        sort_diagnostics(&mut diags);
        assert_eq!(diags[0].start, 5);
    }
}
