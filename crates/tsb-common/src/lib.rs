//! Common types and utilities for the tsb semantic core.
//!
//! This crate provides foundational types used across all tsb crates:
//! - Source spans (`Span`) measured in byte offsets
//! - Diagnostics (`Diagnostic`, `DiagnosticKind`, `diagnostic_codes`)
//! - Centralized recursion and instantiation limits
//! - Analysis options shared by the checker and the CLI

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostics handed to the external reporter
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticKind, DiagnosticRelatedInformation,
    diagnostic_codes, sort_diagnostics,
};

// Centralized limits and thresholds
pub mod limits;

// Options controlling analysis policy
pub mod options;
pub use options::AnalysisOptions;
