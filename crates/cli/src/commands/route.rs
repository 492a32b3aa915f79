use std::process::ExitCode;

use clap::Args;
use log::error;
use shardline_pipeline::{key_hash, resolve};
use shardline_runtime::DEFAULT_SHARD_COUNT;

use super::positive;
use crate::printer::Printer;

#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Partition keys to resolve
    #[arg(required = true)]
    pub keys: Vec<String>,

    /// Number of shards
    #[arg(long, short = 's', default_value_t = DEFAULT_SHARD_COUNT, value_parser = positive)]
    pub shards: usize,
}

pub fn run(args: RouteArgs) -> ExitCode {
    let mut printer = Printer::stdout();

    for key in &args.keys {
        if let Err(e) = printer.route(key, key_hash(key), resolve(key, args.shards)) {
            error!("[error] {e}");
            return ExitCode::from(2);
        }
    }

    ExitCode::SUCCESS
}
