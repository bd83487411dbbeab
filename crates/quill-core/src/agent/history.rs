//! Bounded conversation history

use crate::ai::types::ChatMessage;
use crate::constants::agent::{HISTORY_KEEP_RECENT, HISTORY_PRUNE_THRESHOLD};

/// Collapse to `[system prompt, ..last 10]` once history exceeds 20 entries.
///
/// The first entry is assumed to be the system prompt. Relevance is not
/// weighed: older tool output is simply dropped.
pub fn prune_history(history: &mut Vec<ChatMessage>) {
    if history.len() <= HISTORY_PRUNE_THRESHOLD {
        return;
    }
    let before = history.len();
    let recent_start = history.len() - HISTORY_KEEP_RECENT;
    history.drain(1..recent_start);
    tracing::debug!(before, after = history.len(), "Pruned agent history");
}
