use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

pub mod queries;
pub mod schema;

pub fn init_database(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;

    // Enable WAL mode
    conn.pragma_update(None, "journal_mode", &"WAL")?;
    conn.pragma_update(None, "synchronous", &"NORMAL")?;
    conn.pragma_update(None, "foreign_keys", &"ON")?;

    // Create schema
    schema::create_tables(&conn)?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_schema_on_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let conn = init_database(&dir.path().join("memory.db")).unwrap();
        queries::set_profile_fact(&conn, "name", "Sam").unwrap();
        let facts = queries::get_profile(&conn).unwrap();
        assert_eq!(facts, vec![("name".to_string(), "Sam".to_string())]);
    }
}
