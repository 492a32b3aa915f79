mod backend;
mod error;
mod schema;
mod sqlite;
mod targets;

pub use backend::{ShardBackend, ShardConnection};
pub use error::BackendError;
pub use schema::{
    CREATE_TABLE_IF_MISSING_SQL, CREATE_TABLE_SQL, INSERT_SQL, SELECT_ALL_SQL, TABLE_NAME,
    schema_ddl,
};
pub use sqlite::{SqliteBackend, SqliteConnection};
pub use targets::ShardTargets;
