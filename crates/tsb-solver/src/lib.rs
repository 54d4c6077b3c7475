//! Type relations and generics over the tsb symbol graph.
//!
//! The solver answers questions about types that are already symbols:
//!
//! - **Relations**: identity, subtype and assignability with coinductive
//!   handling of recursive types ([`relation`])
//! - **Specialization**: content-keyed generic instantiation with lazy
//!   member materialization ([`instantiate`])
//! - **Inference and overloads**: type-argument inference and overload
//!   ranking for call sites ([`infer`], [`overload`])
//!
//! It never reads syntax. Whatever it needs to know about declarations it
//! asks through [`SymbolResolver`].

pub mod format;
pub mod infer;
pub mod instantiate;
pub mod objects;
pub mod overload;
pub mod recursion;
pub mod relation;
mod resolver;
pub mod tracer;

pub use format::{signature_to_string, type_to_string};
pub use infer::InferenceContext;
pub use instantiate::{
    TypeMapping, ensure_materialized, erase_signature, specialize, specialize_signature, substitute,
};
pub use overload::{CallArguments, OverloadError, OverloadResolution, resolve_call};
pub use recursion::{RecursionGuard, RecursionProfile, RecursionResult};
pub use relation::{RelationCache, RelationKind, is_assignable, is_identical, is_related_with, is_subtype};
pub use resolver::{GraphResolver, SymbolResolver};
pub use tracer::{ComparisonFailure, ComparisonInfo};

#[cfg(test)]
#[path = "../tests/fixture.rs"]
mod fixture;
