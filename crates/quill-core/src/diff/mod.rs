//! Unified diff engine
//!
//! Parse git-style unified diffs, apply them strictly, stage multi-file
//! change sets against the workspace and keep content-exact undo history.

pub mod apply;
pub mod change_set;
pub mod error;
pub mod model;
pub mod parser;
pub mod preview;
pub mod undo;

pub use apply::apply_file_patch;
pub use change_set::{
    build_file_changes, build_write_change, detect_drift, forward_edit, revert_edit,
    ChangeAction, DriftBaseline, DriftKind, DriftReport, FileChange,
};
pub use error::DiffError;
pub use model::{LineKind, UnifiedDiffFile, UnifiedDiffHunk, UnifiedDiffLine, DEV_NULL};
pub use parser::{parse_unified_diff, sanitize};
pub use preview::{AutoApprove, DriftDecision, Operator, PreviewEntry, PreviewSession, ReviewDecision};
pub use undo::{AppliedChangeBatch, UndoStack};
