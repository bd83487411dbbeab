//! Workspace-rooted file access
//!
//! All paths handed to tools and the diff engine are resolved here. Lexical
//! `..` escapes and symlinks pointing outside the root are rejected, and
//! multi-file edits are committed as one unit with rollback.

use std::path::{Component, Path, PathBuf};

use crate::diff::DiffError;

/// A single file operation inside a [`WorkspaceEdit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    /// Create or replace `path` with `content`
    Write { path: PathBuf, content: String },
    /// Remove `path`
    Delete { path: PathBuf },
}

impl FileOperation {
    pub fn path(&self) -> &Path {
        match self {
            FileOperation::Write { path, .. } | FileOperation::Delete { path } => path,
        }
    }
}

/// Ordered set of file operations committed all-or-nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceEdit {
    pub operations: Vec<FileOperation>,
}

impl WorkspaceEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, path: PathBuf, content: impl Into<String>) {
        self.operations.push(FileOperation::Write {
            path,
            content: content.into(),
        });
    }

    pub fn delete(&mut self, path: PathBuf) {
        self.operations.push(FileOperation::Delete { path });
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Root directory every tool and patch operation is confined to
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open a workspace; the root is canonicalized so containment checks
    /// compare real paths.
    pub fn open(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalize `path` to a forward-slash path relative to the root.
    ///
    /// Absolute paths are accepted only when they lie under the root.
    pub fn relative(&self, path: &str) -> Result<String, DiffError> {
        let cleaned = path.trim().replace('\\', "/");
        let candidate = Path::new(&cleaned);
        let rel = if candidate.is_absolute() {
            candidate.strip_prefix(&self.root).map_err(|_| DiffError::Security {
                path: path.to_string(),
            })?
        } else {
            candidate
        };

        let mut parts: Vec<String> = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir => {
                    if parts.pop().is_none() {
                        return Err(DiffError::Security {
                            path: path.to_string(),
                        });
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(DiffError::Security {
                        path: path.to_string(),
                    })
                }
            }
        }

        if parts.is_empty() {
            return Err(DiffError::state(path, "path does not name a file"));
        }
        Ok(parts.join("/"))
    }

    /// Absolute path for a normalized relative path, rejecting symlink escapes
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, DiffError> {
        let joined = self.root.join(relative);

        // The deepest existing ancestor decides where the path really lands
        let mut probe = joined.as_path();
        loop {
            if probe.exists() {
                let canonical = probe.canonicalize()?;
                if !canonical.starts_with(&self.root) {
                    return Err(DiffError::Security {
                        path: relative.to_string(),
                    });
                }
                break;
            }
            match probe.parent() {
                Some(parent) => probe = parent,
                None => break,
            }
        }
        Ok(joined)
    }

    /// Normalize then resolve a user- or model-supplied path
    pub fn locate(&self, path: &str) -> Result<(String, PathBuf), DiffError> {
        let rel = self.relative(path)?;
        let abs = self.resolve(&rel)?;
        Ok((rel, abs))
    }

    /// Current content of a file, `None` when it does not exist.
    ///
    /// Content must be valid UTF-8; lossy decoding would rewrite untouched
    /// lines on the next write.
    pub async fn read_state(&self, path: &Path) -> Result<Option<String>, DiffError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        String::from_utf8(bytes).map(Some).map_err(|_| {
            let shown = path.strip_prefix(&self.root).unwrap_or(path);
            DiffError::state(
                shown.to_string_lossy().replace('\\', "/"),
                "file is not valid UTF-8",
            )
        })
    }

    /// Commit every operation in `edit` or none of them.
    ///
    /// Writes are staged to temp files beside their targets first; the commit
    /// phase only renames and removes. A failure during commit restores every
    /// already-touched file from its snapshot.
    pub async fn apply_edit(&self, edit: &WorkspaceEdit) -> Result<(), DiffError> {
        for op in &edit.operations {
            if !op.path().starts_with(&self.root) {
                return Err(DiffError::Security {
                    path: op.path().display().to_string(),
                });
            }
        }

        let mut snapshots = Vec::with_capacity(edit.operations.len());
        for op in &edit.operations {
            let previous = match tokio::fs::read(op.path()).await {
                Ok(bytes) => Some(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => return Err(e.into()),
            };
            snapshots.push(Snapshot {
                path: op.path().to_path_buf(),
                previous,
            });
        }

        let mut created_dirs = Vec::new();
        let mut staged: Vec<Option<PathBuf>> = Vec::with_capacity(edit.operations.len());
        for op in &edit.operations {
            match op {
                FileOperation::Write { path, content } => {
                    match stage_write(path, content, &mut created_dirs).await {
                        Ok(temp) => staged.push(Some(temp)),
                        Err(e) => {
                            discard_staged(&staged).await;
                            remove_created_dirs(&created_dirs).await;
                            return Err(e.into());
                        }
                    }
                }
                FileOperation::Delete { .. } => staged.push(None),
            }
        }

        for (index, op) in edit.operations.iter().enumerate() {
            let result = match (op, &staged[index]) {
                (FileOperation::Write { path, .. }, Some(temp)) => {
                    tokio::fs::rename(temp, path).await
                }
                (FileOperation::Delete { path }, _) => match tokio::fs::remove_file(path).await {
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    other => other,
                },
                (FileOperation::Write { path, .. }, None) => Err(std::io::Error::other(format!(
                    "no staged content for {}",
                    path.display()
                ))),
            };

            if let Err(e) = result {
                tracing::warn!(
                    path = %op.path().display(),
                    error = %e,
                    "Workspace edit failed, rolling back"
                );
                rollback(&snapshots[..index]).await;
                discard_staged(&staged[index..]).await;
                remove_created_dirs(&created_dirs).await;
                return Err(e.into());
            }
        }

        tracing::info!(
            operations = edit.operations.len(),
            "Workspace edit committed"
        );
        Ok(())
    }
}

struct Snapshot {
    path: PathBuf,
    previous: Option<Vec<u8>>,
}

async fn stage_write(
    path: &Path,
    content: &str,
    created_dirs: &mut Vec<PathBuf>,
) -> std::io::Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::other(format!("{} has no parent", path.display())))?;

    // Remember which directories we create so a failed edit leaves no trace
    let mut missing = Vec::new();
    let mut probe = Some(parent);
    while let Some(dir) = probe {
        if tokio::fs::try_exists(dir).await? {
            break;
        }
        missing.push(dir.to_path_buf());
        probe = dir.parent();
    }
    if !missing.is_empty() {
        tokio::fs::create_dir_all(parent).await?;
        missing.reverse();
        created_dirs.extend(missing);
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4().simple()));
    tokio::fs::write(&temp, content).await?;
    Ok(temp)
}

async fn discard_staged(staged: &[Option<PathBuf>]) {
    for temp in staged.iter().flatten() {
        let _ = tokio::fs::remove_file(temp).await;
    }
}

async fn rollback(snapshots: &[Snapshot]) {
    for snapshot in snapshots.iter().rev() {
        let result = match &snapshot.previous {
            Some(bytes) => tokio::fs::write(&snapshot.path, bytes).await,
            None => match tokio::fs::remove_file(&snapshot.path).await {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(e) = result {
            tracing::warn!(path = %snapshot.path.display(), error = %e, "Rollback step failed");
        }
    }
}

async fn remove_created_dirs(created_dirs: &[PathBuf]) {
    // Deepest first; remove_dir refuses non-empty directories
    for dir in created_dirs.iter().rev() {
        let _ = tokio::fs::remove_dir(dir).await;
    }
}
