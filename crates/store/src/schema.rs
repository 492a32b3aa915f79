pub const TABLE_NAME: &str = "users";

/// Strict form: fails if the table already exists.
pub const CREATE_TABLE_SQL: &str = "CREATE TABLE users (\
    id INT PRIMARY KEY, \
    name VARCHAR(255), \
    email VARCHAR(255), \
    country VARCHAR(255))";

pub const CREATE_TABLE_IF_MISSING_SQL: &str = "CREATE TABLE IF NOT EXISTS users (\
    id INT PRIMARY KEY, \
    name VARCHAR(255), \
    email VARCHAR(255), \
    country VARCHAR(255))";

pub const INSERT_SQL: &str = "INSERT INTO users (id, name, email, country) VALUES (?1, ?2, ?3, ?4)";

// `id INT` is not a rowid alias, so rowid keeps insertion order.
pub const SELECT_ALL_SQL: &str = "SELECT id, name, email, country FROM users ORDER BY rowid";

pub fn schema_ddl(reuse_existing: bool) -> &'static str {
    if reuse_existing {
        CREATE_TABLE_IF_MISSING_SQL
    } else {
        CREATE_TABLE_SQL
    }
}
