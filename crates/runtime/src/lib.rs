mod config;
pub mod history;
pub mod logging;

pub use config::{
    DEFAULT_BATCH_SIZE, DEFAULT_SHARD_COUNT, MEMORY_TARGET, PROGRAM_LOG_FILE, PROGRAM_LOG_LEVEL,
    PROGRAM_NAME, SHARD_PLACEHOLDER, data_dir, default_shard_template,
};

pub use logging::init;
