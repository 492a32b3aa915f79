use std::process::ExitCode;

use clap::Parser;

mod commands;
mod printer;

use commands::Command;
use shardline_runtime::logging;

#[derive(Debug, Parser)]
#[command(
    name = "shardline",
    version,
    about = "Load CSV rows into hash-partitioned SQLite shards",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

fn main() -> ExitCode {
    logging::init().ok();

    let cli = Cli::parse();
    match cli.command {
        Command::Load(args) => commands::load::run(args),
        Command::Verify(args) => commands::verify::run(args),
        Command::Route(args) => commands::route::run(args),
        Command::History(args) => commands::history::run(args),
    }
}
