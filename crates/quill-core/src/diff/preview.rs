//! Review of staged changes before they touch the workspace

use async_trait::async_trait;
use similar::TextDiff;

use super::change_set::{ChangeAction, DriftReport, FileChange};

/// One reviewable file in a preview session
#[derive(Debug, Clone)]
pub struct PreviewEntry {
    /// Unique across sessions: `<timestamp>-<index>-<path>`
    pub key: String,
    pub relative_path: String,
    pub action: ChangeAction,
    pub before: String,
    pub after: String,
    /// Unified diff of `before` against `after`
    pub rendered: String,
}

/// Navigable, one-file-at-a-time view of a change set
#[derive(Debug, Clone)]
pub struct PreviewSession {
    pub title: String,
    entries: Vec<PreviewEntry>,
    cursor: usize,
}

impl PreviewSession {
    pub fn new(title: impl Into<String>, changes: &[FileChange]) -> Self {
        let stamp = chrono::Utc::now().timestamp_millis();
        let entries = changes
            .iter()
            .enumerate()
            .map(|(index, change)| PreviewEntry {
                key: format!("{}-{}-{}", stamp, index, change.relative_path),
                relative_path: change.relative_path.clone(),
                action: change.action(),
                before: change.before_content.clone(),
                after: change.after_content.clone(),
                rendered: render_diff(change),
            })
            .collect();
        Self {
            title: title.into(),
            entries,
            cursor: 0,
        }
    }

    pub fn entries(&self) -> &[PreviewEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<&PreviewEntry> {
        self.entries.get(self.cursor)
    }

    /// Advance to the next file; stays on the last one
    pub fn next(&mut self) -> Option<&PreviewEntry> {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
        self.current()
    }

    /// Step back to the previous file; stays on the first one
    pub fn prev(&mut self) -> Option<&PreviewEntry> {
        self.cursor = self.cursor.saturating_sub(1);
        self.current()
    }

    /// 1-based position and total, for "file 2 of 5" displays
    pub fn position(&self) -> (usize, usize) {
        if self.entries.is_empty() {
            (0, 0)
        } else {
            (self.cursor + 1, self.entries.len())
        }
    }
}

fn render_diff(change: &FileChange) -> String {
    let old_header = if change.existed_before {
        format!("a/{}", change.relative_path)
    } else {
        "/dev/null".to_string()
    };
    let new_header = if change.existed_after {
        format!("b/{}", change.relative_path)
    } else {
        "/dev/null".to_string()
    };
    TextDiff::from_lines(&change.before_content, &change.after_content)
        .unified_diff()
        .context_radius(3)
        .header(&old_header, &new_header)
        .to_string()
}

/// Operator verdict on a previewed change set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Apply,
    Cancel,
}

/// Operator verdict when files drifted since they were snapshotted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftDecision {
    Override,
    Cancel,
}

/// Human (or policy) in the loop for mutating operations
#[async_trait]
pub trait Operator: Send + Sync {
    /// Review a staged change set
    async fn review(&self, preview: &mut PreviewSession) -> ReviewDecision;

    /// Decide whether to proceed over files changed externally
    async fn resolve_drift(&self, reports: &[DriftReport]) -> DriftDecision;

    /// Approve a shell command before it runs
    async fn confirm_command(&self, command: &str) -> bool;
}

/// Approves everything without prompting
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl Operator for AutoApprove {
    async fn review(&self, _preview: &mut PreviewSession) -> ReviewDecision {
        ReviewDecision::Apply
    }

    async fn resolve_drift(&self, _reports: &[DriftReport]) -> DriftDecision {
        DriftDecision::Override
    }

    async fn confirm_command(&self, _command: &str) -> bool {
        true
    }
}
