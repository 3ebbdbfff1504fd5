use anyhow::Result;
use rusqlite::Connection;

pub fn create_tables(conn: &Connection) -> Result<()> {
    // Durable user facts ("name" => "Sam", "likes" => "coffee")
    conn.execute(
        "CREATE TABLE IF NOT EXISTS profile (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Conversation history, one row per user/assistant exchange
    conn.execute(
        "CREATE TABLE IF NOT EXISTS exchanges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at INTEGER NOT NULL,
            user_message TEXT NOT NULL,
            reply TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_exchanges_created_at ON exchanges(created_at)",
        [],
    )?;

    Ok(())
}
