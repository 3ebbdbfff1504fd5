//! Conversation memory: durable user facts plus a rolling transcript, both
//! in SQLite, summarized into a context block for the chat prompt.

use crate::database::{self, queries};
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:my name is|i am|i'm|call me)\s+([a-zA-Z]+)").unwrap());
static LIKES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"i (?:really )?(?:like|love|enjoy)\s+([a-z0-9 ]{2,40})").unwrap());

pub struct ConversationMemory {
    conn: Mutex<Connection>,
    context_exchanges: u32,
}

impl ConversationMemory {
    pub fn open(db_path: &Path, context_exchanges: u32) -> Result<Self> {
        let conn = database::init_database(db_path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            context_exchanges,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("memory lock poisoned"))
    }

    pub fn record_exchange(&self, user_message: &str, reply: &str) -> Result<()> {
        let conn = self.lock()?;
        queries::add_exchange(&conn, user_message, reply)?;
        Ok(())
    }

    pub fn remember_fact(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        queries::set_profile_fact(&conn, key, value)?;
        Ok(())
    }

    /// Scrape self-descriptions out of a message ("my name is Sam",
    /// "i love coffee") and persist them.
    pub fn learn_from(&self, message: &str) {
        let lowered = message.to_lowercase();
        if let Some(caps) = NAME_RE.captures(&lowered) {
            if let Err(e) = self.remember_fact("name", caps[1].trim()) {
                log::warn!("could not store name fact: {}", e);
            }
        }
        if let Some(caps) = LIKES_RE.captures(&lowered) {
            if let Err(e) = self.remember_fact("likes", caps[1].trim()) {
                log::warn!("could not store likes fact: {}", e);
            }
        }
    }

    /// Profile facts plus the last N exchanges as plain text for the LLM
    /// prompt. Errors degrade to an empty context.
    pub fn build_context(&self) -> String {
        match self.context_text() {
            Ok(text) => text,
            Err(e) => {
                log::warn!("could not build memory context: {}", e);
                String::new()
            }
        }
    }

    fn context_text(&self) -> Result<String> {
        let conn = self.lock()?;
        let mut lines = Vec::new();
        for (key, value) in queries::get_profile(&conn)? {
            lines.push(format!("- {}: {}", key, value));
        }
        let recent = queries::recent_exchanges(&conn, self.context_exchanges)?;
        if !recent.is_empty() {
            lines.push("Recent conversation:".to_string());
            for (user, reply) in recent {
                lines.push(format!("User: {}", user));
                lines.push(format!("Assistant: {}", reply));
            }
        }
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> (tempfile::TempDir, ConversationMemory) {
        let dir = tempfile::tempdir().unwrap();
        let mem = ConversationMemory::open(&dir.path().join("memory.db"), 3).unwrap();
        (dir, mem)
    }

    #[test]
    fn learns_name_and_likes() {
        let (_dir, mem) = memory();
        mem.learn_from("Hey, my name is Sam and I love coffee");
        let context = mem.build_context();
        assert!(context.contains("name: sam"));
        assert!(context.contains("likes: coffee"));
    }

    #[test]
    fn context_keeps_only_recent_exchanges() {
        let (_dir, mem) = memory();
        for i in 0..5 {
            mem.record_exchange(&format!("question {}", i), "answer").unwrap();
        }
        let context = mem.build_context();
        assert!(!context.contains("question 0"));
        assert!(context.contains("question 4"));
    }
}
