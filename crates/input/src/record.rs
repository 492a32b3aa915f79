use serde::Serialize;

/// Number of leading columns a row must carry: `id, name, email, partition key`.
pub const FIELD_COUNT: usize = 4;

/// One input row. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Caller supplied, only unique within a shard
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Field the shard is resolved from (`country` column in storage)
    #[serde(rename = "country")]
    pub partition_key: String,
}

impl Record {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        email: impl Into<String>,
        partition_key: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            partition_key: partition_key.into(),
        }
    }
}
