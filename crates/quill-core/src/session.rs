//! Explicit edit session: undo history, pinned files and the apply protocol
//!
//! One session is shared by every tool call and CLI command acting on a
//! workspace. Apply and undo are serialized through a single async lock.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::diff::{
    build_file_changes, build_write_change, detect_drift, forward_edit, parse_unified_diff,
    revert_edit, AppliedChangeBatch, DiffError, DriftBaseline, DriftDecision, DriftReport,
    FileChange, Operator, PreviewSession, ReviewDecision, UndoStack,
};
use crate::workspace::Workspace;

/// Per-file line in an apply or undo summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub relative_path: String,
    pub action: &'static str,
}

impl FileSummary {
    fn from_changes(files: &[FileChange]) -> Vec<Self> {
        files
            .iter()
            .map(|f| FileSummary {
                relative_path: f.relative_path.clone(),
                action: f.action().label(),
            })
            .collect()
    }
}

/// Result of a two-phase apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied {
        title: String,
        files: Vec<FileSummary>,
    },
    /// Every patch was a no-op against current content
    NoChanges,
    /// Operator rejected the preview
    Cancelled,
    /// Files drifted since staging and the operator declined to override
    Aborted { drifted: Vec<DriftReport> },
}

impl ApplyOutcome {
    pub fn summary(&self) -> String {
        match self {
            ApplyOutcome::Applied { title, files } => {
                let mut out = format!("{}: {} file(s) changed", title, files.len());
                for file in files {
                    out.push_str(&format!("\n  {} {}", file.action, file.relative_path));
                }
                out
            }
            ApplyOutcome::NoChanges => "No changes to apply".to_string(),
            ApplyOutcome::Cancelled => "Apply cancelled by user".to_string(),
            ApplyOutcome::Aborted { drifted } => format!(
                "Apply aborted, files changed on disk since the patch was staged: {}",
                join_reports(drifted)
            ),
        }
    }
}

/// Result of undoing the most recent batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    Reverted {
        title: String,
        files: Vec<FileSummary>,
    },
    NothingToUndo,
    Aborted { drifted: Vec<DriftReport> },
}

impl UndoOutcome {
    pub fn summary(&self) -> String {
        match self {
            UndoOutcome::Reverted { title, files } => {
                format!("Reverted '{}' ({} file(s))", title, files.len())
            }
            UndoOutcome::NothingToUndo => "Nothing to undo".to_string(),
            UndoOutcome::Aborted { drifted } => format!(
                "Undo aborted, files changed since they were applied: {}",
                join_reports(drifted)
            ),
        }
    }
}

fn join_reports(reports: &[DriftReport]) -> String {
    reports
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Workspace-scoped mutable state shared by tools and commands
pub struct EditSession {
    workspace: Workspace,
    operator: Arc<dyn Operator>,
    undo: Mutex<UndoStack>,
    pinned: RwLock<Vec<String>>,
    apply_lock: tokio::sync::Mutex<()>,
}

impl EditSession {
    pub fn new(workspace: Workspace, operator: Arc<dyn Operator>) -> Self {
        Self {
            workspace,
            operator,
            undo: Mutex::new(UndoStack::default()),
            pinned: RwLock::new(Vec::new()),
            apply_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn operator(&self) -> &Arc<dyn Operator> {
        &self.operator
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.lock().len()
    }

    /// Pin a file so it is included in every message's context.
    /// Returns false when it was already pinned.
    pub fn pin(&self, path: &str) -> Result<bool, DiffError> {
        let rel = self.workspace.relative(path)?;
        let mut pinned = self.pinned.write();
        if pinned.contains(&rel) {
            return Ok(false);
        }
        pinned.push(rel);
        Ok(true)
    }

    pub fn unpin(&self, path: &str) -> bool {
        let Ok(rel) = self.workspace.relative(path) else {
            return false;
        };
        let mut pinned = self.pinned.write();
        let before = pinned.len();
        pinned.retain(|p| p != &rel);
        pinned.len() != before
    }

    pub fn pinned(&self) -> Vec<String> {
        self.pinned.read().clone()
    }

    /// Parse, stage, preview, drift-check and atomically apply a diff.
    pub async fn apply_patch_text(&self, diff_text: &str) -> Result<ApplyOutcome, DiffError> {
        let _guard = self.apply_lock.lock().await;
        let patches = parse_unified_diff(diff_text)?;
        let changes = build_file_changes(&patches, &self.workspace).await?;
        let title = format!("Apply diff ({} file(s))", changes.len());
        self.commit_changes(title, changes).await
    }

    /// Stage a whole-file write through the same protocol as a diff
    pub async fn apply_file_write(
        &self,
        file_path: &str,
        content: &str,
    ) -> Result<ApplyOutcome, DiffError> {
        let _guard = self.apply_lock.lock().await;
        let changes = build_write_change(file_path, content, &self.workspace).await?;
        let title = match changes.first() {
            Some(change) => format!("Write {}", change.relative_path),
            None => "Write".to_string(),
        };
        self.commit_changes(title, changes).await
    }

    async fn commit_changes(
        &self,
        title: String,
        changes: Vec<FileChange>,
    ) -> Result<ApplyOutcome, DiffError> {
        if changes.is_empty() {
            return Ok(ApplyOutcome::NoChanges);
        }

        let mut preview = PreviewSession::new(&title, &changes);
        if self.operator.review(&mut preview).await == ReviewDecision::Cancel {
            tracing::info!(title = %title, "Apply cancelled at preview");
            return Ok(ApplyOutcome::Cancelled);
        }

        let drifted = detect_drift(&changes, DriftBaseline::BeforeApply, &self.workspace).await?;
        if !drifted.is_empty()
            && self.operator.resolve_drift(&drifted).await == DriftDecision::Cancel
        {
            return Ok(ApplyOutcome::Aborted { drifted });
        }

        self.workspace.apply_edit(&forward_edit(&changes)).await?;
        let files = FileSummary::from_changes(&changes);
        tracing::info!(title = %title, files = files.len(), "Applied change batch");
        self.undo
            .lock()
            .push(AppliedChangeBatch::new(title.clone(), changes));
        Ok(ApplyOutcome::Applied { title, files })
    }

    /// Revert the most recent batch; it is popped only once the revert lands.
    pub async fn undo_last(&self) -> Result<UndoOutcome, DiffError> {
        let _guard = self.apply_lock.lock().await;
        let Some(batch) = self.undo.lock().peek().cloned() else {
            return Ok(UndoOutcome::NothingToUndo);
        };

        let drifted = detect_drift(&batch.files, DriftBaseline::BeforeUndo, &self.workspace).await?;
        if !drifted.is_empty()
            && self.operator.resolve_drift(&drifted).await == DriftDecision::Cancel
        {
            return Ok(UndoOutcome::Aborted { drifted });
        }

        self.workspace.apply_edit(&revert_edit(&batch.files)).await?;
        self.undo.lock().pop();
        tracing::info!(title = %batch.title, "Reverted change batch");
        Ok(UndoOutcome::Reverted {
            title: batch.title,
            files: FileSummary::from_changes(&batch.files),
        })
    }
}
