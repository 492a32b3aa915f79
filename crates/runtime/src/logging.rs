use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::{Mutex, OnceLock},
};

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::config::{PROGRAM_LOG_FILE, PROGRAM_LOG_LEVEL};

enum LogTarget {
    Stderr,
    /// Append-only log file, shared by every thread of a run.
    File(Mutex<File>),
}

pub struct Logger {
    level: Level,
    target: LogTarget,
}

impl Logger {
    fn format_line(record: &Record<'_>) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        format!(
            "{} {} [{}] {}",
            timestamp,
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = Self::format_line(record);
        match &self.target {
            LogTarget::Stderr => eprintln!("{line}"),
            LogTarget::File(file) => {
                // A poisoned lock only means another thread panicked mid-write.
                let mut file = file.lock().unwrap_or_else(|e| e.into_inner());
                let _ = writeln!(file, "{line}");
            }
        }
    }

    fn flush(&self) {
        if let LogTarget::File(file) = &self.target {
            let mut file = file.lock().unwrap_or_else(|e| e.into_inner());
            let _ = file.flush();
        }
    }
}

fn get_level_from_env() -> Level {
    std::env::var(PROGRAM_LOG_LEVEL)
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .and_then(|filter| filter.to_level())
        .unwrap_or(Level::Warn)
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Target from `SHARDLINE_LOG_FILE`, falling back to stderr when unset or unopenable.
fn get_target_from_env() -> LogTarget {
    let Some(path) = std::env::var_os(PROGRAM_LOG_FILE).filter(|p| !p.is_empty()) else {
        return LogTarget::Stderr;
    };

    match open_log_file(Path::new(&path)) {
        Ok(file) => LogTarget::File(Mutex::new(file)),
        Err(e) => {
            eprintln!(
                "[logging] cannot open {}: {e}, logging to stderr",
                Path::new(&path).display()
            );
            LogTarget::Stderr
        }
    }
}

pub fn init() -> Result<(), SetLoggerError> {
    install(get_level_from_env(), get_target_from_env)
}

pub fn init_with_level(level: Level) -> Result<(), SetLoggerError> {
    install(level, || LogTarget::Stderr)
}

fn install(level: Level, target: impl FnOnce() -> LogTarget) -> Result<(), SetLoggerError> {
    static LOGGER: OnceLock<Logger> = OnceLock::new();

    // Only the first caller installs the logger; later calls keep the
    // level picked at that point so max_level never disagrees with it.
    let init_call = LOGGER.get().is_none();

    let logger = LOGGER.get_or_init(|| Logger {
        level,
        target: target(),
    });

    if init_call {
        log::set_logger(logger)?;
        log::set_max_level(logger.level.to_level_filter());
    }

    Ok(())
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
