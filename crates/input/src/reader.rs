use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};

use crate::{
    error::InputError,
    record::{FIELD_COUNT, Record},
};

/// What to do with a row whose fields cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedRowPolicy {
    /// Surface the row error and let the caller abort.
    #[default]
    Abort,
    /// Log the row, count it and move on.
    Skip,
}

/// Sequential decoder turning CSV rows into [`Record`]s.
///
/// The first row is treated as a header and never yielded. Columns are
/// positional: `id, name, email, partition key`; trailing extra columns are
/// ignored.
pub struct RecordReader<R: Read> {
    inner: csv::Reader<R>,
    row: StringRecord,
    policy: MalformedRowPolicy,
    skipped: usize,
    done: bool,
}

impl RecordReader<File> {
    pub fn open(path: &Path, policy: MalformedRowPolicy) -> Result<Self, InputError> {
        let file = File::open(path)?;
        debug!("[input] reading {}", path.display());
        Ok(Self::from_reader(file, policy))
    }
}

impl<R: Read> RecordReader<R> {
    pub fn from_reader(reader: R, policy: MalformedRowPolicy) -> Self {
        let inner = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        Self {
            inner,
            row: StringRecord::new(),
            policy,
            skipped: 0,
            done: false,
        }
    }

    /// Rows dropped under [`MalformedRowPolicy::Skip`] so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn next_row(&mut self) -> Option<Result<Record, InputError>> {
        loop {
            match self.inner.read_record(&mut self.row) {
                Ok(false) => return None,
                Ok(true) => {}
                Err(e) => {
                    // Stream-level failures cannot be skipped past.
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }

            match parse_row(&self.row) {
                Ok(record) => return Some(Ok(record)),
                Err(e) if self.policy == MalformedRowPolicy::Skip => {
                    warn!("[input] skipping row: {e}");
                    self.skipped += 1;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_row();
        if item.is_none() {
            self.done = true;
        }
        item
    }
}

fn parse_row(row: &StringRecord) -> Result<Record, InputError> {
    let line = row.position().map(|p| p.line()).unwrap_or(0);

    if row.len() < FIELD_COUNT {
        return Err(InputError::Shape {
            line,
            expected: FIELD_COUNT,
            found: row.len(),
        });
    }

    let raw_id = &row[0];
    // Ids are 32-bit on the wire; wider values are rejected, not widened.
    let id = raw_id
        .parse::<i32>()
        .map(i64::from)
        .map_err(|_| InputError::Parse {
            line,
            field: "id",
            value: raw_id.to_owned(),
        })?;

    Ok(Record::new(id, &row[1], &row[2], &row[3]))
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
