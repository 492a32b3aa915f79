use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use log::{error, warn};
use shardline_pipeline::{ShardPool, verify};
use shardline_store::{SqliteBackend, SqliteConnection};

use super::ShardArgs;
use crate::printer::{OutputFormat, Printer};

#[derive(Debug, Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub shards: ShardArgs,

    /// Print rows as newline-delimited JSON
    #[arg(long)]
    pub json: bool,
}

impl VerifyArgs {
    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

pub fn run(args: VerifyArgs) -> ExitCode {
    match execute(args) {
        Ok(code) => code,
        Err(e) => {
            error!("[error] {e:#}");
            eprintln!("[verify] {e:#}");
            ExitCode::from(2)
        }
    }
}

fn execute(args: VerifyArgs) -> Result<ExitCode> {
    let backend = SqliteBackend::existing(args.shards.targets()?);
    let mut pool: ShardPool<SqliteConnection> = ShardPool::new();

    // Shards opened before a failure are still closed below.
    let report = pool
        .open_all(&backend, args.shards.shards)
        .map(|()| verify(&mut pool));

    let closed = pool.close_all();
    for e in &closed {
        warn!("{e}");
        eprintln!("[verify] {e}");
    }

    let report = report.context("failed to open shards")?;

    let mut printer = Printer::stdout();
    match args.format() {
        OutputFormat::Human => printer.verification(&report)?,
        OutputFormat::Json => printer.verification_json(&report)?,
    }
    eprintln!(
        "[verify] {} rows across {} shards",
        report.total_rows(),
        report.shard_count()
    );

    if report.is_complete() && closed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
