//! Persistence layer
//!
//! SQLite-based storage for chat sessions and their transcripts.

mod database;
mod sessions;

pub use database::Database;
pub use sessions::{SessionInfo, SessionStore, StoredSession};
