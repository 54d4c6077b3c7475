//! Analysis options.
//!
//! Options are read by the checker (policy knobs for overload ambiguity and
//! implicit-any reporting) and by the solver (depth limits). The CLI loads them
//! from a JSON file with camelCase keys; every field has a default so partial
//! files are accepted.

use serde::{Deserialize, Serialize};

use crate::limits;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Report `ambiguous-overload` when several best-ranked candidates tie on
    /// a call whose arguments include `any`.
    pub report_ambiguous_overloads: bool,
    /// Report parameters that have neither an annotation nor a contextual type.
    pub no_implicit_any: bool,
    /// Depth bound for nested generic instantiation.
    pub max_instantiation_depth: u32,
    /// Depth bound for a single relation query.
    pub max_relation_depth: u32,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            report_ambiguous_overloads: false,
            no_implicit_any: false,
            max_instantiation_depth: limits::MAX_INSTANTIATION_DEPTH,
            max_relation_depth: limits::MAX_RELATION_DEPTH,
        }
    }
}

impl AnalysisOptions {
    /// Parse options from JSON text.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts = AnalysisOptions::from_json_str(r#"{ "noImplicitAny": true }"#)
            .expect("valid options");
        assert!(opts.no_implicit_any);
        assert!(!opts.report_ambiguous_overloads);
        assert_eq!(opts.max_instantiation_depth, limits::MAX_INSTANTIATION_DEPTH);
    }

    #[test]
    fn unknown_shape_is_rejected() {
        assert!(AnalysisOptions::from_json_str(r#"{ "noImplicitAny": 3 }"#).is_err());
    }
}
