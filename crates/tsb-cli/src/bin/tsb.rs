use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tsb_cli::args::{CheckArgs, CliArgs, Command, OutputFormat};
use tsb_cli::reporter::{Reporter, render_json};
use tsb_cli::{driver, tracing_config};

fn run_check(args: &CheckArgs) -> Result<ExitCode> {
    let report = driver::check(args)?;
    let output = match args.format {
        OutputFormat::Json => render_json(&report).context("failed to encode diagnostics")?,
        OutputFormat::Text => Reporter::new(!args.no_color).render(&report),
    };
    println!("{output}");
    Ok(if report.error_count() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[allow(clippy::print_stderr)]
fn main() -> ExitCode {
    tracing_config::init_tracing();
    let args = CliArgs::parse();
    let result = match &args.command {
        Command::Check(check) => run_check(check),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
