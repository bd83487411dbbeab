//! Multi-file change sets built from parsed patches

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::apply::apply_file_patch;
use super::error::DiffError;
use super::model::UnifiedDiffFile;
use crate::workspace::{Workspace, WorkspaceEdit};

/// Fully staged before/after state of one file in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Absolute path inside the workspace
    pub path: PathBuf,
    pub relative_path: String,
    pub before_content: String,
    pub after_content: String,
    pub existed_before: bool,
    pub existed_after: bool,
}

/// What a change does to its file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Created,
    Modified,
    Deleted,
}

impl ChangeAction {
    pub fn label(self) -> &'static str {
        match self {
            ChangeAction::Created => "created",
            ChangeAction::Modified => "modified",
            ChangeAction::Deleted => "deleted",
        }
    }
}

impl FileChange {
    pub fn action(&self) -> ChangeAction {
        match (self.existed_before, self.existed_after) {
            (false, true) => ChangeAction::Created,
            (true, false) => ChangeAction::Deleted,
            _ => ChangeAction::Modified,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.existed_before == self.existed_after && self.before_content == self.after_content
    }
}

/// Stage every patch against current workspace state.
///
/// Nothing on disk is touched. Patches hitting the same path are folded in
/// order: each applies to the previous result while the first occurrence's
/// `before` state is kept. No-op changes are dropped.
pub async fn build_file_changes(
    patches: &[UnifiedDiffFile],
    workspace: &Workspace,
) -> Result<Vec<FileChange>, DiffError> {
    let mut changes: Vec<FileChange> = Vec::new();

    for patch in patches {
        if patch.is_rename() {
            return Err(DiffError::Unsupported {
                path: patch.old_path.clone(),
                detail: format!("rename to {} is not supported", patch.new_path),
            });
        }

        let (relative_path, path) = workspace.locate(patch.target_path())?;
        let staged = changes.iter().position(|c| c.relative_path == relative_path);

        let (base, exists) = match staged {
            Some(index) => (
                changes[index].after_content.clone(),
                changes[index].existed_after,
            ),
            None => match workspace.read_state(&path).await? {
                Some(content) => (content, true),
                None => (String::new(), false),
            },
        };

        if patch.is_new_file && exists {
            return Err(DiffError::state(
                &relative_path,
                "patch creates the file but it already exists",
            ));
        }
        if !patch.is_new_file && !exists {
            return Err(DiffError::state(
                &relative_path,
                "patch modifies the file but it does not exist",
            ));
        }

        let mut after = apply_file_patch(&base, patch)?;
        if patch.is_deleted_file {
            if !after.is_empty() {
                return Err(DiffError::conflict(
                    &relative_path,
                    "deletion patch does not remove all file content",
                ));
            }
            after.clear();
        }
        let existed_after = !patch.is_deleted_file;

        tracing::debug!(
            path = %relative_path,
            hunks = patch.hunks.len(),
            folded = staged.is_some(),
            "Staged file patch"
        );

        match staged {
            Some(index) => {
                changes[index].after_content = after;
                changes[index].existed_after = existed_after;
            }
            None => changes.push(FileChange {
                path,
                relative_path,
                before_content: base,
                after_content: after,
                existed_before: exists,
                existed_after,
            }),
        }
    }

    changes.retain(|c| !c.is_noop());
    Ok(changes)
}

/// Stage a whole-file write as a one-entry change set
pub async fn build_write_change(
    file_path: &str,
    content: &str,
    workspace: &Workspace,
) -> Result<Vec<FileChange>, DiffError> {
    let (relative_path, path) = workspace.locate(file_path)?;
    let current = workspace.read_state(&path).await?;
    let change = FileChange {
        path,
        relative_path,
        existed_before: current.is_some(),
        before_content: current.unwrap_or_default(),
        after_content: content.to_string(),
        existed_after: true,
    };
    Ok(if change.is_noop() { Vec::new() } else { vec![change] })
}

/// Which recorded side a drift check compares against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftBaseline {
    /// Before applying: disk should still match the `before` snapshot
    BeforeApply,
    /// Before undoing: disk should still match the applied `after` state
    BeforeUndo,
}

/// How a file differs from the state recorded for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftKind {
    Modified,
    Appeared,
    Disappeared,
}

/// A file whose on-disk state changed since it was snapshotted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    pub relative_path: String,
    pub kind: DriftKind,
}

impl std::fmt::Display for DriftReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self.kind {
            DriftKind::Modified => "was modified",
            DriftKind::Appeared => "now exists",
            DriftKind::Disappeared => "was removed",
        };
        write!(f, "{} {}", self.relative_path, what)
    }
}

/// Re-read every target and report those that no longer match the baseline
pub async fn detect_drift(
    changes: &[FileChange],
    baseline: DriftBaseline,
    workspace: &Workspace,
) -> Result<Vec<DriftReport>, DiffError> {
    let mut reports = Vec::new();
    for change in changes {
        let (expected_exists, expected) = match baseline {
            DriftBaseline::BeforeApply => (change.existed_before, &change.before_content),
            DriftBaseline::BeforeUndo => (change.existed_after, &change.after_content),
        };
        let kind = match (workspace.read_state(&change.path).await?, expected_exists) {
            (Some(current), true) if &current != expected => Some(DriftKind::Modified),
            (Some(_), false) => Some(DriftKind::Appeared),
            (None, true) => Some(DriftKind::Disappeared),
            _ => None,
        };
        if let Some(kind) = kind {
            tracing::warn!(path = %change.relative_path, ?kind, "File drifted since snapshot");
            reports.push(DriftReport {
                relative_path: change.relative_path.clone(),
                kind,
            });
        }
    }
    Ok(reports)
}

/// Edit that moves every file to its `after` state
pub fn forward_edit(changes: &[FileChange]) -> WorkspaceEdit {
    let mut edit = WorkspaceEdit::new();
    for change in changes {
        if change.existed_after {
            edit.write(change.path.clone(), change.after_content.clone());
        } else {
            edit.delete(change.path.clone());
        }
    }
    edit
}

/// Edit that restores every file to its recorded `before` state
pub fn revert_edit(changes: &[FileChange]) -> WorkspaceEdit {
    let mut edit = WorkspaceEdit::new();
    for change in changes {
        if change.existed_before {
            edit.write(change.path.clone(), change.before_content.clone());
        } else {
            edit.delete(change.path.clone());
        }
    }
    edit
}
