mod error;
mod reader;
mod record;

pub use error::InputError;
pub use reader::{MalformedRowPolicy, RecordReader};
pub use record::{FIELD_COUNT, Record};
