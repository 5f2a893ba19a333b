//! Cashflow Simulator CLI
//!
//! Builds every transaction of a scenario file and prints where each one
//! fires as JSON.
//!
//! Usage: `cashflow-sim <scenario.json> [--pretty]`
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr so
//! stdout stays machine-readable.

use anyhow::{Context, Result};
use cashflow_simulator_core_rs::{Cell, ScenarioConfig, Transaction, TransactionType};
use clap::{Parser, ValueHint};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "cashflow-sim",
    version,
    about = "Build a cashflow scenario and report where each transaction fires"
)]
struct Args {
    /// Scenario JSON file
    #[arg(value_hint = ValueHint::FilePath)]
    scenario: PathBuf,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

/// One line of the report
#[derive(Debug, Serialize)]
struct TransactionReport<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    seed: u64,
    firing_count: usize,
    cells: &'a [Cell],
}

impl<'a> From<&'a Transaction> for TransactionReport<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            name: tx.name(),
            transaction_type: tx.transaction_type(),
            seed: tx.effective_seed(),
            firing_count: tx.firing_count(),
            cells: tx.presence().cells(),
        }
    }
}

fn run(args: Args) -> Result<()> {
    let text = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("Failed to read {}", args.scenario.display()))?;

    let scenario = ScenarioConfig::from_json_str(&text)
        .with_context(|| format!("Failed to parse {}", args.scenario.display()))?;
    debug!(
        length = scenario.simulation_length,
        width = scenario.simulation_width,
        entries = scenario.transactions.len(),
        "loaded scenario"
    );

    let transactions = scenario.build().context("Failed to build scenario")?;
    let report: Vec<TransactionReport<'_>> = transactions.iter().map(Into::into).collect();

    let out = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", out);

    info!(
        scenario = %args.scenario.display(),
        transactions = report.len(),
        "wrote presence report"
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    run(Args::parse())
}
