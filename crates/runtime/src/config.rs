use std::path::PathBuf;

pub const PROGRAM_NAME: &str = "shardline";
pub const PROGRAM_LOG_LEVEL: &str = "SHARDLINE_LOG_LEVEL";
pub const PROGRAM_LOG_FILE: &str = "SHARDLINE_LOG_FILE";

/// Number of shards a run distributes into unless told otherwise.
pub const DEFAULT_SHARD_COUNT: usize = 3;

/// Rows buffered per shard before an implicit flush.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Placeholder substituted with the shard index in connection templates.
pub const SHARD_PLACEHOLDER: &str = "{shard}";

/// Connection target that opens a private in-memory database per shard.
pub const MEMORY_TARGET: &str = ":memory:";

pub const SHARD_FILE_TEMPLATE: &str = "shard{shard}.db";

pub fn xdg_or_home(xdg_var: &str, home_suffix: &str) -> PathBuf {
    if let Some(dir) = std::env::var_os(xdg_var)
        && !dir.is_empty()
    {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(home_suffix)
    }
}

/// Directory holding the default shard databases
pub fn data_dir() -> PathBuf {
    xdg_or_home("XDG_DATA_HOME", ".local/share").join(PROGRAM_NAME)
}

/// Default connection template, one SQLite file per shard under [`data_dir`].
pub fn default_shard_template() -> String {
    data_dir()
        .join(SHARD_FILE_TEMPLATE)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
