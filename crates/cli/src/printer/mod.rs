use std::io::{self, Write};

use serde::Serialize;
use shardline_input::Record;
use shardline_pipeline::{RunError, RunReport, VerifyReport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonLine<'a> {
    Row {
        shard: usize,
        #[serde(flatten)]
        row: &'a Record,
    },
    Error {
        shard: usize,
        error: String,
    },
}

/// Human-readable output for load and verify results.
pub struct Printer<W: Write> {
    out: W,
}

impl Printer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Printer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Per-shard counts of a finished load.
    pub fn run_report(&mut self, report: &RunReport) -> io::Result<()> {
        writeln!(
            self.out,
            "{:<6}  {:>8}  {:>8}  {:>8}  {:>8}",
            "SHARD", "ROUTED", "WRITTEN", "DRAINED", "DROPPED"
        )?;

        for shard in 0..report.routed.len() {
            writeln!(
                self.out,
                "{:<6}  {:>8}  {:>8}  {:>8}  {:>8}",
                shard,
                report.routed[shard],
                report.written[shard],
                report.drained[shard],
                report.dropped[shard]
            )?;
        }

        writeln!(
            self.out,
            "{} rows routed, {} written",
            report.total_routed(),
            report.total_written()
        )?;

        for err in &report.write_errors {
            writeln!(self.out, "write error: {err}")?;
        }

        Ok(())
    }

    /// Every row of every shard, in shard order.
    pub fn verification(&mut self, report: &VerifyReport) -> io::Result<()> {
        for contents in &report.shards {
            writeln!(self.out, "--- Shard {} ---", contents.shard)?;

            match &contents.rows {
                Ok(rows) if rows.is_empty() => writeln!(self.out, "No data found in this shard.")?,
                Ok(rows) => {
                    for r in rows {
                        writeln!(
                            self.out,
                            "ID: {}, Name: {}, Email: {}, Country: {}",
                            r.id, r.name, r.email, r.partition_key
                        )?;
                    }
                }
                Err(e) => writeln!(self.out, "Error reading shard: {e}")?,
            }
        }

        let misrouted = report.misrouted();
        if !misrouted.is_empty() {
            writeln!(self.out, "{} rows in the wrong shard:", misrouted.len())?;
            for (shard, r) in misrouted {
                writeln!(
                    self.out,
                    "  ID: {} ('{}') found in shard {shard}",
                    r.id, r.partition_key
                )?;
            }
        }

        Ok(())
    }

    /// Same content as [`Printer::verification`] as NDJSON, without the
    /// misrouted summary.
    pub fn verification_json(&mut self, report: &VerifyReport) -> io::Result<()> {
        for contents in &report.shards {
            let shard = contents.shard;
            match &contents.rows {
                Ok(rows) => {
                    for row in rows {
                        self.json_line(&JsonLine::Row { shard, row })?;
                    }
                }
                Err(e) => self.json_line(&JsonLine::Error {
                    shard,
                    error: e.to_string(),
                })?,
            }
        }
        Ok(())
    }

    fn json_line(&mut self, line: &JsonLine<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, line).map_err(io::Error::other)?;
        writeln!(self.out)
    }

    pub fn route(&mut self, key: &str, hash: i32, shard: usize) -> io::Result<()> {
        writeln!(self.out, "{key:?}\t{hash}\t-> shard {shard}")
    }

    pub fn run_error(&mut self, err: &RunError) -> io::Result<()> {
        writeln!(self.out, "[load] {err}")?;
        for failure in &err.cleanup {
            writeln!(self.out, "[load] during cleanup: {failure}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "printer_tests.rs"]
mod tests;
