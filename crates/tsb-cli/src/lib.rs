//! Command-line driver for tsb.
//!
//! The semantic core has no parser: `tsb check` reads syntax trees encoded as
//! JSON (the serialized `NodeArena` form), binds and checks them as one
//! program, optionally replays edits through the incremental updater, and
//! prints the resulting diagnostics.

pub mod args;
pub mod driver;
pub mod reporter;
pub mod tracing_config;
