//! Session CRUD operations

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::database::Database;
use crate::ai::{ChatMessage, Role};

/// Session metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Workspace root the session was started in
    pub working_dir: Option<String>,
    pub message_count: usize,
}

/// A session with its full transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub info: SessionInfo,
    pub messages: Vec<ChatMessage>,
}

/// Persistent chat transcripts
pub struct SessionStore {
    db: Database,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open (or create) the store at `path`
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let db = Database::new(path)
            .with_context(|| format!("Failed to open session database {}", path.display()))?;
        Ok(Self::new(db))
    }

    /// Get reference to underlying database
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Create an empty session and return its id
    pub fn create_session(&self, title: &str, working_dir: Option<&str>) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();

        self.db.conn().execute(
            "INSERT INTO sessions (id, title, created_at, updated_at, working_dir)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, title, now, now, working_dir],
        )?;

        tracing::info!(session = %id, "Created session");
        Ok(id)
    }

    /// Session metadata and transcript, or `None` if it does not exist
    pub fn get_session(&self, id: &str) -> Result<Option<StoredSession>> {
        let Some(info) = self
            .db
            .conn()
            .query_row(
                &format!("{} WHERE s.id = ?1 GROUP BY s.id", SESSION_SELECT),
                params![id],
                map_session_row,
            )
            .optional()?
        else {
            return Ok(None);
        };

        let mut stmt = self.db.conn().prepare(
            "SELECT role, content FROM messages WHERE session_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (role, content) = row?;
            let Some(role) = Role::parse(&role) else {
                bail!("Session {} has a message with unknown role '{}'", id, role);
            };
            messages.push(ChatMessage { role, content });
        }

        Ok(Some(StoredSession { info, messages }))
    }

    /// Replace the stored transcript and bump `updated_at`
    pub fn save_session(&self, id: &str, messages: &[ChatMessage]) -> Result<()> {
        let tx = self.db.conn().unchecked_transaction()?;

        let updated = tx.execute(
            "UPDATE sessions SET updated_at = ?1 WHERE id = ?2",
            params![now_timestamp(), id],
        )?;
        if updated == 0 {
            bail!("Session not found: {}", id);
        }

        tx.execute("DELETE FROM messages WHERE session_id = ?1", params![id])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO messages (session_id, position, role, content)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, message) in messages.iter().enumerate() {
                insert.execute(params![
                    id,
                    position as i64,
                    message.role.as_str(),
                    message.content
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(session = %id, messages = messages.len(), "Saved session");
        Ok(())
    }

    pub fn update_title(&self, id: &str, title: &str) -> Result<()> {
        self.db.conn().execute(
            "UPDATE sessions SET title = ?1 WHERE id = ?2",
            params![title, id],
        )?;
        Ok(())
    }

    /// Delete a session and its messages. Returns false if it did not exist.
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        let deleted = self
            .db
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// All sessions, most recently updated first
    pub fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        let mut stmt = self.db.conn().prepare(&format!(
            "{} GROUP BY s.id ORDER BY s.updated_at DESC",
            SESSION_SELECT
        ))?;
        let sessions = stmt
            .query_map([], map_session_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }
}

const SESSION_SELECT: &str =
    "SELECT s.id, s.title, s.created_at, s.updated_at, s.working_dir, COUNT(m.id)
     FROM sessions s LEFT JOIN messages m ON m.session_id = s.id";

/// Fixed-width so timestamps sort correctly as text
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Helper to map a row to SessionInfo
fn map_session_row(row: &rusqlite::Row) -> rusqlite::Result<SessionInfo> {
    let created_at: String = row.get(2)?;
    let updated_at: String = row.get(3)?;
    let message_count: i64 = row.get(5)?;
    Ok(SessionInfo {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
        working_dir: row.get(4)?,
        message_count: message_count.max(0) as usize,
    })
}
