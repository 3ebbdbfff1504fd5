use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;

pub fn set_profile_fact(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO profile (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
        rusqlite::params![key, value, Local::now().timestamp()],
    )?;
    Ok(())
}

pub fn get_profile(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT key, value FROM profile ORDER BY key")?;
    let facts = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(facts)
}

pub fn add_exchange(conn: &Connection, user_message: &str, reply: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO exchanges (created_at, user_message, reply) VALUES (?1, ?2, ?3)",
        rusqlite::params![Local::now().timestamp(), user_message, reply],
    )?;
    Ok(())
}

/// Most recent exchanges, oldest first so they read as a transcript.
pub fn recent_exchanges(conn: &Connection, limit: u32) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT user_message, reply FROM (
            SELECT id, user_message, reply FROM exchanges ORDER BY id DESC LIMIT ?1
         ) ORDER BY id ASC",
    )?;
    let rows = stmt
        .query_map([limit], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_database;

    #[test]
    fn exchanges_come_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let conn = init_database(&dir.path().join("memory.db")).unwrap();

        add_exchange(&conn, "first", "reply one").unwrap();
        add_exchange(&conn, "second", "reply two").unwrap();
        add_exchange(&conn, "third", "reply three").unwrap();

        let recent = recent_exchanges(&conn, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].0, "second");
        assert_eq!(recent[1].0, "third");
    }

    #[test]
    fn profile_upserts() {
        let dir = tempfile::tempdir().unwrap();
        let conn = init_database(&dir.path().join("memory.db")).unwrap();
        set_profile_fact(&conn, "name", "Sam").unwrap();
        set_profile_fact(&conn, "name", "Alex").unwrap();
        let facts = get_profile(&conn).unwrap();
        assert_eq!(facts, vec![("name".to_string(), "Alex".to_string())]);
    }
}
