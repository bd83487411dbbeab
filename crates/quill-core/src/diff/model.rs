//! Parsed unified diff model
//!
//! Values here are produced by the parser, consumed once by the applier or
//! the change-set builder, then dropped.

use serde::{Deserialize, Serialize};

/// Path marker used by git for the missing side of a creation or deletion
pub const DEV_NULL: &str = "/dev/null";

/// Classification of a single hunk body line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Context,
    Add,
    Remove,
}

/// One body line of a hunk, without its marker character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedDiffLine {
    pub kind: LineKind,
    pub content: String,
}

impl UnifiedDiffLine {
    pub fn context(content: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Context,
            content: content.into(),
        }
    }

    pub fn add(content: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Add,
            content: content.into(),
        }
    }

    pub fn remove(content: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Remove,
            content: content.into(),
        }
    }

    /// Whether the line is present in the old file (context or remove)
    pub fn in_old(&self) -> bool {
        matches!(self.kind, LineKind::Context | LineKind::Remove)
    }

    /// Whether the line is present in the new file (context or add)
    pub fn in_new(&self) -> bool {
        matches!(self.kind, LineKind::Context | LineKind::Add)
    }
}

/// A `@@ -old_start,old_lines +new_start,new_lines @@` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedDiffHunk {
    pub old_start: usize,
    pub old_lines: usize,
    pub new_start: usize,
    pub new_lines: usize,
    pub lines: Vec<UnifiedDiffLine>,
}

impl UnifiedDiffHunk {
    /// Net change in line count this hunk produces
    pub fn line_delta(&self) -> isize {
        self.new_lines as isize - self.old_lines as isize
    }

    /// The same hunk with add/remove swapped and the header sides exchanged
    pub fn inverted(&self) -> Self {
        Self {
            old_start: self.new_start,
            old_lines: self.new_lines,
            new_start: self.old_start,
            new_lines: self.old_lines,
            lines: self
                .lines
                .iter()
                .map(|line| UnifiedDiffLine {
                    kind: match line.kind {
                        LineKind::Add => LineKind::Remove,
                        LineKind::Remove => LineKind::Add,
                        LineKind::Context => LineKind::Context,
                    },
                    content: line.content.clone(),
                })
                .collect(),
        }
    }
}

/// All hunks targeting one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedDiffFile {
    pub old_path: String,
    pub new_path: String,
    pub is_new_file: bool,
    pub is_deleted_file: bool,
    /// Ordered by ascending `old_start`; the applier relies on this.
    pub hunks: Vec<UnifiedDiffHunk>,
    /// `Some(false)` when a `\ No newline at end of file` marker followed
    /// the new side's last line.
    pub new_file_has_trailing_newline: Option<bool>,
}

impl UnifiedDiffFile {
    /// The path the patch acts on: the old path for deletions, otherwise the new one
    pub fn target_path(&self) -> &str {
        if self.is_deleted_file {
            &self.old_path
        } else {
            &self.new_path
        }
    }

    /// Whether the header declares a rename (distinct paths, neither side /dev/null)
    pub fn is_rename(&self) -> bool {
        !self.is_new_file && !self.is_deleted_file && self.old_path != self.new_path
    }

    /// Inverse patch: applying it to this patch's output restores its input
    pub fn inverted(&self) -> Self {
        Self {
            old_path: self.new_path.clone(),
            new_path: self.old_path.clone(),
            is_new_file: self.is_deleted_file,
            is_deleted_file: self.is_new_file,
            hunks: self.hunks.iter().map(UnifiedDiffHunk::inverted).collect(),
            new_file_has_trailing_newline: None,
        }
    }
}
