pub mod history;
pub mod load;
pub mod route;
pub mod verify;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
pub use history::HistoryArgs;
pub use load::LoadArgs;
pub use route::RouteArgs;
use shardline_runtime::{DEFAULT_SHARD_COUNT, default_shard_template};
use shardline_store::ShardTargets;
pub use verify::VerifyArgs;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a CSV file into the shard databases.
    ///
    /// Example:
    ///   shardline load users.csv
    ///   shardline load --shards 5 --db '/tmp/users-{shard}.db' users.csv
    Load(LoadArgs),

    /// Read every shard back and list its rows.
    Verify(VerifyArgs),

    /// Show which shard each partition key resolves to.
    ///
    /// Example:
    ///   shardline route USA Canada Germany
    Route(RouteArgs),

    /// Show past loads.
    History(HistoryArgs),
}

/// Where the shard databases live, shared by `load` and `verify`.
#[derive(Debug, Args)]
pub struct ShardArgs {
    /// Number of shards
    #[arg(long, short = 's', default_value_t = DEFAULT_SHARD_COUNT, value_parser = positive)]
    pub shards: usize,

    /// Database path template; `{shard}` is replaced by the shard index
    /// (`:memory:` for throwaway in-memory shards)
    #[arg(long, value_name = "TEMPLATE", conflicts_with = "shard_db")]
    pub db: Option<String>,

    /// Explicit database path for each shard, in shard order
    #[arg(long = "shard-db", value_name = "PATH")]
    pub shard_db: Vec<String>,
}

impl ShardArgs {
    pub fn targets(&self) -> Result<ShardTargets> {
        if !self.shard_db.is_empty() {
            if self.shard_db.len() != self.shards {
                bail!(
                    "{} --shard-db paths given for {} shards",
                    self.shard_db.len(),
                    self.shards
                );
            }
            return Ok(ShardTargets::explicit(self.shard_db.clone())?);
        }

        let template = self.db.clone().unwrap_or_else(default_shard_template);
        Ok(ShardTargets::template(template)?)
    }
}

/// Parse a count that must be at least 1.
pub fn positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be greater than zero".to_owned()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
