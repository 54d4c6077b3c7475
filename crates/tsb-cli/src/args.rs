use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// CLI arguments for the tsb binary.
#[derive(Parser, Debug)]
#[command(
    name = "tsb",
    version,
    about = "Bind and check syntax trees with the tsb semantic core"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bind and check a set of units, printing their diagnostics.
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Syntax trees in JSON form, one unit per file.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format for diagnostics.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Analysis options as JSON (camelCase keys, all optional).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Replace a unit's tree after the initial bind, as `unit=replacement`.
    /// May be repeated; edits apply in order.
    #[arg(long = "edit", value_parser = parse_edit)]
    pub edits: Vec<Edit>,

    /// Disable colored output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One `--edit` argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    /// File naming the unit to replace, as given on the command line.
    pub target: PathBuf,
    /// File holding the new tree.
    pub replacement: PathBuf,
}

fn parse_edit(value: &str) -> Result<Edit, String> {
    match value.split_once('=') {
        Some((target, replacement)) if !target.is_empty() && !replacement.is_empty() => Ok(Edit {
            target: PathBuf::from(target),
            replacement: PathBuf::from(replacement),
        }),
        _ => Err(format!("expected UNIT=REPLACEMENT, got '{value}'")),
    }
}
