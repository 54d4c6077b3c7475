//! Centralized limits and thresholds for the semantic core.
//!
//! Every recursive algorithm in the binder, resolver and relational engine
//! already has an explicit cycle marker (the symbol resolution state or the
//! relation in-progress cache). These limits are the second line: they bound
//! depth for shapes that keep growing without ever repeating a key, such as
//! `interface Foo<T> { next: Foo<Foo<T>> }`.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum depth for generic type instantiation.
///
/// Each nested specialization created while substituting type arguments adds
/// one level. When exceeded the specialization resolves to the error type.
///
/// ```typescript
/// interface Foo<T> { value: Foo<Foo<T>> }
/// var boom: Foo<string>;
/// //        ~~~~~~~~~~~ expands forever without a depth bound
/// ```
pub const MAX_INSTANTIATION_DEPTH: u32 = 50;

/// Maximum nesting depth of a single relation query (identity, subtype or
/// assignability). Structural comparison of recursive types legitimately
/// nests before the in-progress cache catches the cycle, so this is deeper
/// than the instantiation limit.
pub const MAX_RELATION_DEPTH: u32 = 100;

/// Maximum total relation steps for one top-level query.
pub const MAX_RELATION_ITERATIONS: u32 = 100_000;

/// Maximum depth for expression resolution.
///
/// ```typescript
/// f(f(f(f(f(f(f(f(/* ... hundreds of levels ... */))))))));
/// ```
pub const MAX_EXPRESSION_DEPTH: u32 = 500;

/// Maximum number of rounds the inference engine spends re-checking
/// arguments after fixing type-parameter candidates.
pub const MAX_INFERENCE_ROUNDS: u32 = 2;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Inline capacity for per-symbol declaration lists. Most symbols have one.
pub const INLINE_DECLARATIONS: usize = 1;

/// Inline capacity for per-symbol link lists.
pub const INLINE_LINKS: usize = 4;
