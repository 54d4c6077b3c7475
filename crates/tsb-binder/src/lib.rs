//! Declarations, symbols and binding for the tsb semantic core.
//!
//! Pipeline for one unit: [`build_decl_tree`] extracts a [`DeclTree`] from
//! syntax, the binder turns decls into symbols inside the session's
//! [`SymbolGraph`] (merging declarations that share a name), and the result
//! is recorded in the unit's [`SemanticInfo`]. After an edit,
//! [`SemanticInfoChain::update_unit`] diffs the decl trees and rebinds the
//! unit in place, invalidating only what depends on the change.

mod binder;
mod decl_builder;
mod decls;
mod differ;
mod graph;
mod links;
mod semantic_info;
mod symbols;
mod updater;

pub use binder::{MergeAction, merge_action, name_span};
pub use decl_builder::build_decl_tree;
pub use decls::{Decl, DeclFlags, DeclId, DeclKind, DeclRef, DeclTree, UnitId};
pub use differ::{DeclChange, DeclDiff, diff_decl_trees};
pub use graph::{SpecializationKey, SymbolGraph};
pub use links::{Link, LinkId, LinkKind};
pub use semantic_info::{AttachedDiagnostic, CallResolution, SemanticInfo, SemanticInfoChain, Unit};
pub use symbols::{
    ResolutionState, SignatureKind, Specialization, Symbol, SymbolFlags, SymbolId, SymbolKind,
    SymbolTable,
};
pub use updater::{DiffSummary, UpdateOutcome};
