//! Resolver and checker for the tsb semantic core.
//!
//! The binder leaves every type that depends on another declaration
//! unresolved. This crate resolves them on demand:
//! - `state` - `CheckerState`, one resolution session over the chain
//! - `resolver` - lazy declaration types behind the solver's `SymbolResolver`
//! - `scope` - name lookup through locals, module exports and globals
//! - `type_nodes` - type annotations to type symbols
//! - `expressions` - expression typing with contextual types
//! - `calls` - call sites, overload resolution and contextual functions
//! - `checking` - the check pass that reports semantic diagnostics
//! - `program` - `Program`, the session entry point (units, edits, checks)
//! - `query` - position-based queries for tooling

mod calls;
mod checking;
mod expressions;
mod program;
mod query;
mod resolver;
mod scope;
mod state;
mod type_nodes;

pub use program::Program;
pub use query::{ScopeSymbol, SignatureHelp, SymbolAtPosition, VisibleSymbols};
