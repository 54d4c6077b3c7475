//! `tsb check`: load units, replay edits, check.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, info_span};
use tsb_binder::UnitId;
use tsb_checker::Program;
use tsb_common::{AnalysisOptions, Diagnostic, DiagnosticCategory};
use tsb_syntax::NodeArena;

use crate::args::CheckArgs;

/// Result of one `tsb check` run.
#[derive(Debug)]
pub struct CheckReport {
    pub diagnostics: Vec<Diagnostic>,
    pub units: usize,
    pub edits: usize,
}

impl CheckReport {
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.category == DiagnosticCategory::Error)
            .count()
    }
}

/// Unit path reported in diagnostics: the file name without a trailing
/// `.json`, so `main.ts.json` reports as `main.ts`.
pub fn unit_path(file: &Path) -> String {
    let text = file.to_string_lossy();
    text.strip_suffix(".json").unwrap_or(&text).to_string()
}

pub fn load_options(path: Option<&Path>) -> Result<AnalysisOptions> {
    let Some(path) = path else {
        return Ok(AnalysisOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    AnalysisOptions::from_json_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

pub fn load_tree(path: &Path) -> Result<NodeArena> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    NodeArena::from_json(&text).with_context(|| format!("failed to parse syntax tree {}", path.display()))
}

pub fn check(args: &CheckArgs) -> Result<CheckReport> {
    let options = load_options(args.config.as_deref())?;
    debug!(?options, "analysis options");
    let mut program = Program::with_options(options);

    let mut units: Vec<(PathBuf, UnitId)> = Vec::with_capacity(args.files.len());
    for file in &args.files {
        if units.iter().any(|(seen, _)| seen == file) {
            bail!("{} given more than once", file.display());
        }
        let arena = load_tree(file)?;
        let unit = program.add_unit(unit_path(file), arena);
        debug!(unit = unit.0, file = %file.display(), "unit added");
        units.push((file.clone(), unit));
    }

    for edit in &args.edits {
        let _span = info_span!("edit", target = %edit.target.display()).entered();
        let Some(&(_, unit)) = units.iter().find(|(file, _)| *file == edit.target) else {
            bail!("--edit target {} is not one of the checked files", edit.target.display());
        };
        // Check before the edit so the update invalidates real caches.
        program.check_unit(unit);
        let arena = load_tree(&edit.replacement)?;
        let outcome = program
            .update_unit(unit, arena)
            .with_context(|| format!("unit {} disappeared", edit.target.display()))?;
        info!(
            changed = outcome.diff.changed,
            added = outcome.diff.added,
            removed = outcome.diff.removed,
            invalidated = outcome.invalidated.len(),
            dependent_units = outcome.dependent_units.len(),
            "edit applied"
        );
    }

    let diagnostics = program.check_all();
    info!(units = units.len(), diagnostics = diagnostics.len(), "check finished");
    Ok(CheckReport {
        diagnostics,
        units: units.len(),
        edits: args.edits.len(),
    })
}
