use std::process::ExitCode;

use clap::Args;
use log::{error, info};
use shardline_runtime::history::{HistoryStore, RunOutcome};

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Number of entries to display
    #[arg(long, short = 'n', default_value = "20")]
    pub limit: usize,

    /// Clear all history
    #[arg(long)]
    pub clear: bool,
}

pub fn run(args: HistoryArgs) -> ExitCode {
    let Some(store) = HistoryStore::new() else {
        info!("History is disabled");
        println!("History is disabled.");
        return ExitCode::SUCCESS;
    };

    if args.clear {
        return match store.clear() {
            Ok(()) => {
                println!("History cleared");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("[error] Failed to clear history: {e}");
                ExitCode::from(1)
            }
        };
    }

    let loads = store.recent_loads(args.limit);
    if loads.is_empty() {
        println!("No history yet.");
        return ExitCode::SUCCESS;
    }

    println!(
        "{:<20}  {:>6}  {:>8}  {:>8}  {:<6}  INPUT",
        "TIMESTAMP", "SHARDS", "ROWS", "TIME", "RESULT"
    );
    println!("{}", "-".repeat(80));

    for load in &loads {
        let ts = load.timestamp.format("%Y-%m-%d %H:%M:%S");
        let result = match load.outcome {
            RunOutcome::Ok => "ok",
            RunOutcome::Failed => "failed",
        };

        println!(
            "{:<20}  {:>6}  {:>8}  {:>6}ms  {:<6}  {}",
            ts.to_string(),
            load.shard_count,
            load.total_rows(),
            load.duration_ms,
            result,
            load.input
        );
        if let Some(err) = &load.error {
            println!("{:>22}{err}", "");
        }
    }

    let total = store.count();
    if total > args.limit {
        println!(
            "\n({} more entries, use --limit to show more)",
            total - args.limit
        );
    }

    ExitCode::SUCCESS
}
