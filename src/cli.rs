//! pactsmith command line
//!
//! Inspect and check contract files written by [`Pact::verify`](crate::Pact::verify).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;

use crate::contract::Contract;
use crate::errors::PactError;
use crate::observability::{init_tracing, init_tracing_verbose};

#[derive(Parser, Debug)]
#[command(name = "pactsmith")]
#[command(about = "Inspect and validate consumer-driven contract files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose logging (same as RUST_LOG=info)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the interactions recorded in a contract file
    Show {
        /// Contract file to read
        #[arg(value_name = "FILE")]
        pact_file: PathBuf,

        /// Print the canonical JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Check a contract file for structural problems
    Validate {
        /// Contract file to read
        #[arg(value_name = "FILE")]
        pact_file: PathBuf,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        init_tracing_verbose();
    } else {
        init_tracing();
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &mut out)
}

/// Run one command, writing its report to `out`.
pub fn execute<W: Write>(command: &Commands, out: &mut W) -> Result<()> {
    match command {
        Commands::Show { pact_file, json } => {
            let contract = Contract::from_file(pact_file)?;
            if *json {
                writeln!(out, "{}", contract.to_json()?)?;
            } else {
                render_summary(&contract, out)?;
            }
        }
        Commands::Validate { pact_file } => {
            let contract = Contract::from_file(pact_file)?;
            let issues = contract.validation_issues();
            if issues.is_empty() {
                writeln!(
                    out,
                    "{} {} ({} interactions)",
                    "valid".green().bold(),
                    pact_file.display(),
                    contract.interactions.len()
                )?;
            } else {
                for issue in &issues {
                    writeln!(out, "{} {}", "error".red().bold(), issue)?;
                }
                return Err(PactError::InvalidContract { issues })
                    .with_context(|| format!("{} is not a valid contract", pact_file.display()));
            }
        }
    }
    Ok(())
}

fn render_summary<W: Write>(contract: &Contract, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "{} {} {} {}",
        "Consumer:".bold(),
        contract.consumer.name,
        "Provider:".bold(),
        contract.provider.name
    )?;
    writeln!(
        out,
        "Pact specification {}",
        contract.metadata.pact_specification.version
    )?;
    writeln!(out)?;

    for (i, interaction) in contract.interactions.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, interaction.description.cyan())?;
        if let Some(state) = &interaction.provider_state {
            writeln!(out, "   Given: {}", state)?;
        }
        writeln!(
            out,
            "   {} {} -> {}",
            interaction.request.method.to_uppercase(),
            interaction.request.path,
            interaction.response.status
        )?;
    }
    Ok(())
}
