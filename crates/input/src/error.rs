use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    /// A field failed to parse into its declared type.
    #[error("line {line}: invalid {field} {value:?}")]
    Parse {
        line: u64,
        field: &'static str,
        value: String,
    },

    /// Row has fewer columns than a record needs.
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    Shape {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot read input: {0}")]
    Io(#[from] std::io::Error),
}

impl InputError {
    /// Errors confined to a single row, as opposed to the input stream itself.
    pub fn is_row_error(&self) -> bool {
        matches!(self, InputError::Parse { .. } | InputError::Shape { .. })
    }
}
