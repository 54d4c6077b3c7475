//! Diagnostic output for `tsb check`.

use colored::Colorize;
use serde::Serialize;
use tsb_common::{Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation};

use crate::driver::CheckReport;

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// One line per diagnostic plus indented related locations, then a
    /// summary line.
    pub fn render(&self, report: &CheckReport) -> String {
        let mut out = String::new();
        for diagnostic in &report.diagnostics {
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push('\n');
        }
        out.push_str(&self.format_summary(report));
        out
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let mut output = format!(
            "{}:{}:{} - {} {}: {}",
            diagnostic.file,
            diagnostic.start,
            diagnostic.length,
            self.format_category(diagnostic.category),
            self.format_code(diagnostic.code),
            message(diagnostic),
        );
        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
        }
        output
    }

    fn format_related(&self, related: &DiagnosticRelatedInformation) -> String {
        let location = format!("{}:{}:{}", related.file, related.start, related.length);
        let location = if self.color {
            location.cyan().to_string()
        } else {
            location
        };
        let mut text = related.kind.name().to_string();
        if !related.args.is_empty() {
            text.push_str(&format!(" ({})", related.args.join(", ")));
        }
        format!("    {location} - {text}")
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        let label = format!("TS{code}");
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }

    fn format_summary(&self, report: &CheckReport) -> String {
        let errors = report.error_count();
        let noun = if errors == 1 { "error" } else { "errors" };
        let summary = format!(
            "Found {errors} {noun} in {} unit{}.",
            report.units,
            if report.units == 1 { "" } else { "s" }
        );
        match (self.color, errors) {
            (false, _) => summary,
            (true, 0) => summary.green().to_string(),
            (true, _) => summary.red().to_string(),
        }
    }
}

/// Machine identifier and arguments; the message catalog lives outside tsb.
fn message(diagnostic: &Diagnostic) -> String {
    if diagnostic.args.is_empty() {
        diagnostic.kind.name().to_string()
    } else {
        format!("{} ({})", diagnostic.kind.name(), diagnostic.args.join(", "))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    units: usize,
    edits: usize,
    error_count: usize,
    diagnostics: &'a [Diagnostic],
}

pub fn render_json(report: &CheckReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        units: report.units,
        edits: report.edits,
        error_count: report.error_count(),
        diagnostics: &report.diagnostics,
    })
}
