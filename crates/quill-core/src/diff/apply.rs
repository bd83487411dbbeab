//! Strict unified diff application
//!
//! Every context and remove line must match the base text byte-for-byte.
//! There is no fuzz or offset search: stale base content surfaces as a
//! conflict instead of a silently misplaced edit.
//!
//! Hunks are placed by their old-file start line, as git emits them. The
//! running line offset of earlier hunks is not added to that position; it
//! only locates a mismatch in the new file for conflict messages.

use super::error::DiffError;
use super::model::{LineKind, UnifiedDiffFile};

/// Line-ending convention detected in the base text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewlineStyle {
    Lf,
    CrLf,
}

impl NewlineStyle {
    /// CRLF when the text contains any `\r\n`, LF otherwise
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            NewlineStyle::CrLf
        } else {
            NewlineStyle::Lf
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NewlineStyle::Lf => "\n",
            NewlineStyle::CrLf => "\r\n",
        }
    }
}

/// Base text split into logical lines
struct SourceText<'a> {
    lines: Vec<&'a str>,
    trailing_newline: bool,
    style: NewlineStyle,
}

impl<'a> SourceText<'a> {
    fn split(text: &'a str) -> Self {
        let style = NewlineStyle::detect(text);
        let trailing_newline = text.ends_with('\n');
        let mut lines: Vec<&str> = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line))
                .collect()
        };
        if trailing_newline {
            lines.pop();
        }
        Self {
            lines,
            trailing_newline,
            style,
        }
    }
}

/// Apply one file patch to `original`, returning the patched text.
pub fn apply_file_patch(original: &str, patch: &UnifiedDiffFile) -> Result<String, DiffError> {
    let path = patch.target_path();
    let source = SourceText::split(original);
    let mut output: Vec<&str> = Vec::with_capacity(source.lines.len());
    let mut cursor = 0usize;
    let mut line_offset: isize = 0;

    for (index, hunk) in patch.hunks.iter().enumerate() {
        // A zero-length old side means "insert after old line N"
        let start = if hunk.old_lines == 0 {
            hunk.old_start
        } else {
            hunk.old_start.saturating_sub(1)
        };

        if start < cursor {
            return Err(DiffError::conflict(
                path,
                format!(
                    "hunk {} (@@ -{},{} @@) starts at line {} which overlaps the previous hunk ending at line {}",
                    index + 1,
                    hunk.old_start,
                    hunk.old_lines,
                    start + 1,
                    cursor
                ),
            ));
        }
        if start > source.lines.len() {
            return Err(DiffError::conflict(
                path,
                format!(
                    "hunk {} starts at line {} but the file has only {} lines",
                    index + 1,
                    start + 1,
                    source.lines.len()
                ),
            ));
        }

        output.extend_from_slice(&source.lines[cursor..start]);
        cursor = start;

        for line in &hunk.lines {
            match line.kind {
                LineKind::Add => output.push(&line.content),
                LineKind::Context | LineKind::Remove => {
                    let Some(actual) = source.lines.get(cursor) else {
                        return Err(DiffError::conflict(
                            path,
                            format!(
                                "expected {:?} at line {} but the file ends at line {}",
                                line.content,
                                cursor + 1,
                                source.lines.len()
                            ),
                        ));
                    };
                    if *actual != line.content {
                        return Err(DiffError::conflict(
                            path,
                            format!(
                                "hunk {} line {} (new line {}) expected {:?}, found {:?}",
                                index + 1,
                                cursor + 1,
                                cursor as isize + 1 + line_offset,
                                line.content,
                                actual
                            ),
                        ));
                    }
                    if line.kind == LineKind::Context {
                        output.push(*actual);
                    }
                    cursor += 1;
                }
            }
        }

        line_offset += hunk.line_delta();
        tracing::debug!(path, hunk = index + 1, line_offset, "Applied hunk");
    }

    output.extend_from_slice(&source.lines[cursor..]);

    let trailing_newline = if patch.new_file_has_trailing_newline == Some(false) {
        false
    } else if patch.is_new_file || original.is_empty() {
        !output.is_empty()
    } else {
        source.trailing_newline
    };

    let separator = source.style.as_str();
    let mut result = output.join(separator);
    if trailing_newline && !output.is_empty() {
        result.push_str(separator);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::model::{UnifiedDiffHunk, UnifiedDiffLine, DEV_NULL};
    use crate::diff::parser::parse_unified_diff;

    fn single(diff: &str) -> UnifiedDiffFile {
        parse_unified_diff(diff).unwrap().remove(0)
    }

    #[test]
    fn test_apply_simple_replacement() {
        let patch = single("--- a/f.js\n+++ b/f.js\n@@ -1 +1 @@\n-const a = 1;\n+const a = 2;\n");
        let result = apply_file_patch("const a = 1;\n", &patch).unwrap();
        assert_eq!(result, "const a = 2;\n");
    }

    #[test]
    fn test_conflict_on_context_mismatch() {
        let patch = single("--- a/f.js\n+++ b/f.js\n@@ -1 +1 @@\n-const b = 1;\n+const b = 2;\n");
        let err = apply_file_patch("const a = 1;\n", &patch).unwrap_err();
        match err {
            DiffError::Conflict { path, detail } => {
                assert_eq!(path, "f.js");
                assert!(detail.contains("const b = 1;"));
                assert!(detail.contains("const a = 1;"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_conflict_reports_new_file_position_after_earlier_hunks() {
        let diff = "--- a/f
+++ b/f
@@ -1 +1,2 @@
 a
+a2
@@ -3 +4 @@
-stale
+fresh
";
        let err = apply_file_patch("a\nb\nc\n", &single(diff)).unwrap_err();
        let detail = err.to_string();
        assert!(detail.contains("hunk 2 line 3 (new line 4)"), "{detail}");
        assert!(detail.contains("\"stale\""));
    }

    #[test]
    fn test_creation_from_empty() {
        let patch = UnifiedDiffFile {
            old_path: DEV_NULL.to_string(),
            new_path: "new.txt".to_string(),
            is_new_file: true,
            is_deleted_file: false,
            hunks: vec![UnifiedDiffHunk {
                old_start: 0,
                old_lines: 0,
                new_start: 1,
                new_lines: 2,
                lines: vec![UnifiedDiffLine::add("line1"), UnifiedDiffLine::add("line2")],
            }],
            new_file_has_trailing_newline: None,
        };
        assert_eq!(apply_file_patch("", &patch).unwrap(), "line1\nline2\n");
    }

    #[test]
    fn test_creation_without_trailing_newline() {
        let patch = single(
            "--- /dev/null\n+++ b/new.txt\n@@ -0,0 +1,2 @@\n+line1\n+line2\n\\ No newline at end of file\n",
        );
        assert!(patch.is_new_file);
        assert_eq!(apply_file_patch("", &patch).unwrap(), "line1\nline2");
    }

    #[test]
    fn test_deletion_empties_file() {
        let patch = single("--- a/old.txt\n+++ /dev/null\n@@ -1,2 +0,0 @@\n-first\n-second\n");
        assert_eq!(apply_file_patch("first\nsecond\n", &patch).unwrap(), "");
    }

    #[test]
    fn test_multiple_hunks_use_old_file_coordinates() {
        let original = "1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n";
        let diff = "--- a/n.txt
+++ b/n.txt
@@ -1,2 +1,4 @@
 1
+1a
+1b
 2
@@ -8,2 +10,1 @@
 8
-9
";
        let result = apply_file_patch(original, &single(diff)).unwrap();
        assert_eq!(result, "1\n1a\n1b\n2\n3\n4\n5\n6\n7\n8\n10\n");
    }

    #[test]
    fn test_insertion_after_line() {
        let patch = single("--- a/f\n+++ b/f\n@@ -2,0 +3,1 @@\n+inserted\n");
        assert_eq!(apply_file_patch("a\nb\nc\n", &patch).unwrap(), "a\nb\ninserted\nc\n");
    }

    #[test]
    fn test_overlapping_hunks_conflict() {
        let diff = "--- a/f
+++ b/f
@@ -2,2 +2,2 @@
-b
+B
 c
@@ -2,1 +2,1 @@
-b
+x
";
        let err = apply_file_patch("a\nb\nc\n", &single(diff)).unwrap_err();
        assert!(err.to_string().contains("overlaps"));
    }

    #[test]
    fn test_hunk_past_end_of_file_conflicts() {
        let patch = single("--- a/f\n+++ b/f\n@@ -10 +10 @@\n-x\n+y\n");
        let err = apply_file_patch("a\nb\n", &patch).unwrap_err();
        assert!(matches!(err, DiffError::Conflict { .. }));
        assert!(err.to_string().contains("only 2 lines"));
    }

    #[test]
    fn test_preserves_crlf_line_endings() {
        let patch = single("--- a/f\n+++ b/f\n@@ -1,2 +1,2 @@\n one\n-two\n+deux\n");
        assert_eq!(
            apply_file_patch("one\r\ntwo\r\n", &patch).unwrap(),
            "one\r\ndeux\r\n"
        );
    }

    #[test]
    fn test_preserves_missing_trailing_newline() {
        let patch = single("--- a/f\n+++ b/f\n@@ -1,2 +1,2 @@\n one\n-two\n+deux\n");
        assert_eq!(apply_file_patch("one\ntwo", &patch).unwrap(), "one\ndeux");
    }

    #[test]
    fn test_explicit_no_newline_drops_trailing_newline() {
        let patch = single(
            "--- a/f\n+++ b/f\n@@ -1 +1 @@\n-one\n+uno\n\\ No newline at end of file\n",
        );
        assert_eq!(apply_file_patch("one\n", &patch).unwrap(), "uno");
    }

    #[test]
    fn test_untouched_tail_is_copied() {
        let patch = single("--- a/f\n+++ b/f\n@@ -1 +1 @@\n-a\n+A\n");
        assert_eq!(apply_file_patch("a\nb\nc\n", &patch).unwrap(), "A\nb\nc\n");
    }

    #[test]
    fn test_apply_then_inverse_restores_original() {
        let original = "fn main() {\n    println!(\"hi\");\n}\n\nfn other() {}\n";
        let diff = "--- a/main.rs
+++ b/main.rs
@@ -1,3 +1,4 @@
 fn main() {
-    println!(\"hi\");
+    println!(\"hello\");
+    println!(\"world\");
 }
@@ -5 +6,2 @@
-fn other() {}
+fn other() {
+}
";
        let patch = single(diff);
        let patched = apply_file_patch(original, &patch).unwrap();
        assert_eq!(
            patched,
            "fn main() {\n    println!(\"hello\");\n    println!(\"world\");\n}\n\nfn other() {\n}\n"
        );
        let restored = apply_file_patch(&patched, &patch.inverted()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_context_only_at_end_of_file_reports_eof() {
        let patch = single("--- a/f\n+++ b/f\n@@ -1,2 +1,2 @@\n a\n-b\n+c\n");
        let err = apply_file_patch("a\n", &patch).unwrap_err();
        assert!(err.to_string().contains("file ends"));
    }
}
