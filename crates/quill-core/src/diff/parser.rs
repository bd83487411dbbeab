//! Unified diff parser
//!
//! Accepts git-style diffs (`diff --git` sections with optional mode and
//! rename metadata) as well as bare `---`/`+++` pairs, optionally wrapped in
//! a single ```` ```diff ```` / ```` ```patch ```` fence.

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::DiffError;
use super::model::{LineKind, UnifiedDiffFile, UnifiedDiffHunk, UnifiedDiffLine, DEV_NULL};

static HUNK_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@ -(\d+)(,(\d+))? \+(\d+)(,(\d+))? @@").unwrap());

static OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\A```(?:diff|patch)[^\n]*\n(.*?)\n?```\s*\z").unwrap());

/// Strip one outer ```` ```diff ```` / ```` ```patch ```` fence, if present.
///
/// Unfenced input only loses leading whitespace and trailing line breaks, so
/// a final blank context line (a lone space) survives.
pub fn sanitize(diff_text: &str) -> &str {
    if let Some(inner) = OUTER_FENCE
        .captures(diff_text.trim())
        .and_then(|caps| caps.get(1))
    {
        return inner.as_str();
    }
    diff_text
        .trim_start()
        .trim_end_matches(|c: char| c == '\r' || c == '\n')
}

/// Parse diff text into per-file patches, in the order they appear.
pub fn parse_unified_diff(diff_text: &str) -> Result<Vec<UnifiedDiffFile>, DiffError> {
    let body = sanitize(diff_text);
    if body.trim().is_empty() {
        return Err(DiffError::parse(0, "diff is empty"));
    }

    let lines: Vec<&str> = body
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut parser = Parser {
        lines,
        pos: 0,
        files: Vec::new(),
    };
    parser.run()?;
    if parser.files.is_empty() {
        return Err(DiffError::parse(0, "no file headers (---/+++) found"));
    }

    tracing::debug!(files = parser.files.len(), "Parsed unified diff");
    Ok(parser.files)
}

/// File section being accumulated
struct FileBuilder {
    header_line: usize,
    old_path: Option<String>,
    new_path: Option<String>,
    new_file_mode: bool,
    deleted_file_mode: bool,
    hunks: Vec<UnifiedDiffHunk>,
    trailing_newline: Option<bool>,
}

impl FileBuilder {
    fn new(header_line: usize) -> Self {
        Self {
            header_line,
            old_path: None,
            new_path: None,
            new_file_mode: false,
            deleted_file_mode: false,
            hunks: Vec::new(),
            trailing_newline: None,
        }
    }

    fn finish(self) -> Result<UnifiedDiffFile, DiffError> {
        let old = self.old_path.filter(|p| !p.is_empty());
        let new = self.new_path.filter(|p| !p.is_empty());

        let is_new_file = self.new_file_mode || old.as_deref() == Some(DEV_NULL);
        let is_deleted_file = self.deleted_file_mode || new.as_deref() == Some(DEV_NULL);

        if is_new_file && is_deleted_file {
            return Err(DiffError::parse(
                self.header_line,
                "file section is marked as both created and deleted",
            ));
        }

        let (old_path, new_path) = match (old, new) {
            (None, None) => {
                return Err(DiffError::parse(
                    self.header_line,
                    "could not determine the file path for this section",
                ))
            }
            (Some(old), None) => {
                let new = if is_deleted_file {
                    DEV_NULL.to_string()
                } else {
                    old.clone()
                };
                (old, new)
            }
            (None, Some(new)) => {
                let old = if is_new_file {
                    DEV_NULL.to_string()
                } else {
                    new.clone()
                };
                (old, new)
            }
            (Some(old), Some(new)) => (old, new),
        };

        // Creation and deletion always carry /dev/null on the missing side
        let old_path = if is_new_file {
            DEV_NULL.to_string()
        } else {
            old_path
        };
        let new_path = if is_deleted_file {
            DEV_NULL.to_string()
        } else {
            new_path
        };

        let target = if is_deleted_file { &old_path } else { &new_path };
        if target == DEV_NULL {
            return Err(DiffError::parse(
                self.header_line,
                "could not determine the file path for this section",
            ));
        }

        Ok(UnifiedDiffFile {
            old_path,
            new_path,
            is_new_file,
            is_deleted_file,
            hunks: self.hunks,
            new_file_has_trailing_newline: self.trailing_newline,
        })
    }
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    files: Vec<UnifiedDiffFile>,
}

impl<'a> Parser<'a> {
    fn run(&mut self) -> Result<(), DiffError> {
        let mut current: Option<FileBuilder> = None;

        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            let line_no = self.pos + 1;

            if let Some(rest) = line.strip_prefix("diff --git ") {
                self.flush(current.take())?;
                let (old, new) = parse_git_header_paths(rest);
                let mut builder = FileBuilder::new(line_no);
                builder.old_path = old;
                builder.new_path = new;
                current = Some(builder);
                self.pos += 1;
                continue;
            }

            if self.at_file_header_pair() {
                // A second ---/+++ pair after hunks belongs to the next file
                let mut builder = match current.take() {
                    Some(builder) if builder.hunks.is_empty() => builder,
                    other => {
                        self.flush(other)?;
                        FileBuilder::new(line_no)
                    }
                };
                builder.old_path = Some(header_path(&line[4..]));
                builder.new_path = Some(header_path(&self.lines[self.pos + 1][4..]));
                current = Some(builder);
                self.pos += 2;
                continue;
            }

            if HUNK_HEADER.is_match(line) {
                let Some(builder) = current.as_mut() else {
                    return Err(DiffError::parse(
                        line_no,
                        "hunk header appears before any file header",
                    ));
                };
                let hunk = self.parse_hunk(builder)?;
                builder.hunks.push(hunk);
                continue;
            }

            if let Some(builder) = current.as_mut() {
                if line.starts_with("new file mode ") {
                    builder.new_file_mode = true;
                } else if line.starts_with("deleted file mode ") {
                    builder.deleted_file_mode = true;
                } else if let Some(path) = line.strip_prefix("rename from ") {
                    builder.old_path = Some(normalize_path(path));
                } else if let Some(path) = line.strip_prefix("rename to ") {
                    builder.new_path = Some(normalize_path(path));
                }
                // index/mode/similarity lines carry nothing the applier needs
            }
            self.pos += 1;
        }

        self.flush(current)
    }

    fn at_file_header_pair(&self) -> bool {
        self.lines[self.pos].starts_with("--- ")
            && self
                .lines
                .get(self.pos + 1)
                .is_some_and(|next| next.starts_with("+++ "))
    }

    fn flush(&mut self, builder: Option<FileBuilder>) -> Result<(), DiffError> {
        if let Some(builder) = builder {
            self.files.push(builder.finish()?);
        }
        Ok(())
    }

    /// Consume a hunk header and exactly as many body lines as it declares.
    fn parse_hunk(&mut self, builder: &mut FileBuilder) -> Result<UnifiedDiffHunk, DiffError> {
        let header_no = self.pos + 1;
        let header = self.lines[self.pos];
        let caps = HUNK_HEADER
            .captures(header)
            .ok_or_else(|| DiffError::parse(header_no, "invalid hunk header"))?;

        let number = |idx: usize| -> Result<Option<usize>, DiffError> {
            caps.get(idx)
                .map(|m| {
                    m.as_str().parse::<usize>().map_err(|_| {
                        DiffError::parse(header_no, format!("hunk header number out of range: {}", header))
                    })
                })
                .transpose()
        };
        let old_start = number(1)?.unwrap_or(0);
        let old_lines = number(3)?.unwrap_or(1);
        let new_start = number(4)?.unwrap_or(0);
        let new_lines = number(6)?.unwrap_or(1);
        self.pos += 1;

        let mut lines = Vec::new();
        let mut old_seen = 0usize;
        let mut new_seen = 0usize;
        let mut last_kind: Option<LineKind> = None;

        while old_seen < old_lines || new_seen < new_lines {
            let Some(raw) = self.lines.get(self.pos).copied() else {
                return Err(DiffError::parse(
                    header_no,
                    format!(
                        "hunk ended early: header declares -{} +{} but the body has -{} +{}",
                        old_lines, new_lines, old_seen, new_seen
                    ),
                ));
            };
            let line_no = self.pos + 1;

            let (kind, content) = match raw.as_bytes().first() {
                // Editors strip the lone space of blank context lines
                None => (LineKind::Context, ""),
                Some(b' ') => (LineKind::Context, &raw[1..]),
                Some(b'+') => (LineKind::Add, &raw[1..]),
                Some(b'-') => (LineKind::Remove, &raw[1..]),
                Some(b'\\') => {
                    mark_no_newline(builder, last_kind);
                    self.pos += 1;
                    continue;
                }
                Some(_) => {
                    return Err(DiffError::parse(
                        line_no,
                        format!("unexpected line in hunk body: {:?}", raw),
                    ))
                }
            };

            match kind {
                LineKind::Context => {
                    old_seen += 1;
                    new_seen += 1;
                }
                LineKind::Add => new_seen += 1,
                LineKind::Remove => old_seen += 1,
            }
            if old_seen > old_lines || new_seen > new_lines {
                return Err(DiffError::parse(
                    line_no,
                    format!(
                        "hunk body does not match its header: declared -{} +{}, found at least -{} +{}",
                        old_lines, new_lines, old_seen, new_seen
                    ),
                ));
            }

            lines.push(UnifiedDiffLine {
                kind,
                content: content.to_string(),
            });
            last_kind = Some(kind);
            self.pos += 1;
        }

        // Trailing "\ No newline at end of file" markers
        while let Some(raw) = self.lines.get(self.pos) {
            if !raw.starts_with('\\') {
                break;
            }
            mark_no_newline(builder, last_kind);
            self.pos += 1;
        }

        // Extra +/- lines past the declared counts would otherwise be skipped
        if let Some(raw) = self.lines.get(self.pos) {
            // "-- " opens a format-patch signature
            let extra = (raw.starts_with('+') || raw.starts_with('-')) && *raw != "-- ";
            if extra && !self.at_file_header_pair() {
                return Err(DiffError::parse(
                    self.pos + 1,
                    format!(
                        "hunk body does not match its header: declared -{} +{}, found more lines",
                        old_lines, new_lines
                    ),
                ));
            }
        }

        Ok(UnifiedDiffHunk {
            old_start,
            old_lines,
            new_start,
            new_lines,
            lines,
        })
    }
}

/// A no-newline marker only concerns the new file when it follows a line the
/// new file contains.
fn mark_no_newline(builder: &mut FileBuilder, last_kind: Option<LineKind>) {
    if matches!(last_kind, Some(LineKind::Add) | Some(LineKind::Context)) {
        builder.trailing_newline = Some(false);
    }
}

/// Normalize a header path: strip quotes, convert backslashes, drop one `a/` or `b/`.
pub fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    let path = unquoted.replace('\\', "/");
    if path == DEV_NULL {
        return path;
    }
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .map(str::to_string)
        .unwrap_or(path)
}

/// Path from a `--- ` / `+++ ` line, without any trailing timestamp.
fn header_path(raw: &str) -> String {
    let raw = raw.trim_end();
    if raw.starts_with('"') {
        if let Some((path, _)) = take_quoted(raw) {
            return normalize_path(&path);
        }
    }
    let path = raw.split('\t').next().unwrap_or(raw);
    normalize_path(path)
}

/// Split the two path tokens of a `diff --git` line.
fn parse_git_header_paths(rest: &str) -> (Option<String>, Option<String>) {
    let rest = rest.trim();
    if rest.is_empty() {
        return (None, None);
    }

    if rest.starts_with('"') {
        return match take_quoted(rest) {
            Some((old, remainder)) => {
                let new = second_token(remainder.trim_start());
                (Some(normalize_path(&old)), new.map(|p| normalize_path(&p)))
            }
            None => (None, None),
        };
    }

    // Unquoted first token followed by a quoted second one
    if let Some(idx) = rest.find(" \"") {
        let new = second_token(rest[idx + 1..].trim_start());
        return (
            Some(normalize_path(&rest[..idx])),
            new.map(|p| normalize_path(&p)),
        );
    }

    // "a/x y b/x y": git writes identical halves when the path is unchanged
    let bytes = rest.as_bytes();
    if bytes.len() % 2 == 1 {
        let mid = bytes.len() / 2;
        if bytes[mid] == b' ' {
            let (left, right) = (&rest[..mid], &rest[mid + 1..]);
            if normalize_path(left) == normalize_path(right) {
                return (Some(normalize_path(left)), Some(normalize_path(right)));
            }
        }
    }

    if let Some(idx) = rest.find(" b/") {
        return (
            Some(normalize_path(&rest[..idx])),
            Some(normalize_path(&rest[idx + 1..])),
        );
    }

    match rest.split_once(char::is_whitespace) {
        Some((old, new)) => (Some(normalize_path(old)), Some(normalize_path(new))),
        None => (Some(normalize_path(rest)), None),
    }
}

fn second_token(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with('"') {
        return take_quoted(raw).map(|(path, _)| path);
    }
    Some(raw.to_string())
}

/// Read a C-style quoted token; returns the unescaped text and the remainder.
fn take_quoted(raw: &str) -> Option<(String, &str)> {
    let mut chars = raw.char_indices();
    if chars.next().map(|(_, c)| c) != Some('"') {
        return None;
    }
    let mut out = String::new();
    let mut escaped = false;
    for (idx, c) in chars {
        if escaped {
            out.push(match c {
                'n' => '\n',
                't' => '\t',
                other => other,
            });
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Some((out, &raw[idx + 1..]));
        } else {
            out.push(c);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODIFY: &str = "diff --git a/src/app.ts b/src/app.ts
index 83db48f..bf269f4 100644
--- a/src/app.ts
+++ b/src/app.ts
@@ -1,3 +1,3 @@
 import x from 'x';
-const a = 1;
+const a = 2;
 export default a;
";

    #[test]
    fn test_parse_modification() {
        let files = parse_unified_diff(MODIFY).unwrap();
        assert_eq!(files.len(), 1);
        let file = &files[0];
        assert_eq!(file.old_path, "src/app.ts");
        assert_eq!(file.new_path, "src/app.ts");
        assert!(!file.is_new_file);
        assert!(!file.is_deleted_file);
        assert_eq!(file.hunks.len(), 1);

        let hunk = &file.hunks[0];
        assert_eq!((hunk.old_start, hunk.old_lines), (1, 3));
        assert_eq!((hunk.new_start, hunk.new_lines), (1, 3));
        assert_eq!(hunk.lines.len(), 4);
        assert_eq!(hunk.lines[1], UnifiedDiffLine::remove("const a = 1;"));
        assert_eq!(hunk.lines[2], UnifiedDiffLine::add("const a = 2;"));
    }

    #[test]
    fn test_hunk_counts_match_header() {
        let files = parse_unified_diff(MODIFY).unwrap();
        let hunk = &files[0].hunks[0];
        assert_eq!(hunk.lines.iter().filter(|l| l.in_old()).count(), hunk.old_lines);
        assert_eq!(hunk.lines.iter().filter(|l| l.in_new()).count(), hunk.new_lines);
    }

    #[test]
    fn test_parse_creation() {
        let diff = "diff --git a/notes.txt b/notes.txt
new file mode 100644
--- /dev/null
+++ b/notes.txt
@@ -0,0 +1,2 @@
+line1
+line2
";
        let files = parse_unified_diff(diff).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].is_new_file);
        assert_eq!(files[0].old_path, DEV_NULL);
        assert_eq!(files[0].new_path, "notes.txt");
    }

    #[test]
    fn test_parse_deletion() {
        let diff = "--- a/old.txt
+++ /dev/null
@@ -1,2 +0,0 @@
-first
-second
";
        let files = parse_unified_diff(diff).unwrap();
        assert!(files[0].is_deleted_file);
        assert_eq!(files[0].old_path, "old.txt");
        assert_eq!(files[0].new_path, DEV_NULL);
        assert_eq!(files[0].target_path(), "old.txt");
    }

    #[test]
    fn test_fenced_diff_parses_identically() {
        let fenced = format!("Here is the change:\n```diff\n{}```\n", MODIFY);
        // Prose before the fence disables fence stripping; the parser skips it anyway
        assert_eq!(
            parse_unified_diff(&fenced).unwrap(),
            parse_unified_diff(MODIFY).unwrap()
        );

        let wrapped = format!("```DIFF\n{}```", MODIFY);
        assert_eq!(sanitize(&wrapped), MODIFY.trim_end_matches('\n'));
        assert_eq!(
            parse_unified_diff(&wrapped).unwrap(),
            parse_unified_diff(MODIFY).unwrap()
        );

        let patch_fence = format!("```patch\n{}\n```", MODIFY.trim_end());
        assert_eq!(
            parse_unified_diff(&patch_fence).unwrap(),
            parse_unified_diff(MODIFY).unwrap()
        );
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        assert!(matches!(
            parse_unified_diff("   \n\t"),
            Err(DiffError::Parse { .. })
        ));
        assert!(matches!(
            parse_unified_diff("```diff\n\n```"),
            Err(DiffError::Parse { .. })
        ));
    }

    #[test]
    fn test_text_without_headers_is_parse_error() {
        assert!(matches!(
            parse_unified_diff("I changed the file for you."),
            Err(DiffError::Parse { line: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_marker_is_parse_error() {
        let diff = "--- a/f.txt
+++ b/f.txt
@@ -1,2 +1,2 @@
 keep
*bogus
";
        let err = parse_unified_diff(diff).unwrap_err();
        match err {
            DiffError::Parse { line, message } => {
                assert_eq!(line, 5);
                assert!(message.contains("unexpected line"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_hunk_is_parse_error() {
        let diff = "--- a/f.txt
+++ b/f.txt
@@ -1,3 +1,3 @@
 one
-two
";
        let err = parse_unified_diff(diff).unwrap_err();
        assert!(err.to_string().contains("hunk ended early"));
    }

    #[test]
    fn test_overfull_hunk_is_parse_error() {
        let diff = "--- a/f.txt
+++ b/f.txt
@@ -1 +1 @@
-one
-two
+uno
";
        assert!(matches!(
            parse_unified_diff(diff),
            Err(DiffError::Parse { line: 5, .. })
        ));
    }

    #[test]
    fn test_undercounted_hunk_is_parse_error() {
        let diff = "--- a/f.txt
+++ b/f.txt
@@ -1 +1 @@
-a
+b
+c
";
        assert!(matches!(
            parse_unified_diff(diff),
            Err(DiffError::Parse { line: 6, .. })
        ));
    }

    #[test]
    fn test_next_file_header_after_full_hunk_is_accepted() {
        let diff = "--- a/f.txt
+++ b/f.txt
@@ -1 +1 @@
-a
+b
--- a/g.txt
+++ b/g.txt
@@ -1 +1 @@
-x
+y
";
        let files = parse_unified_diff(diff).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].hunks[0].lines.len(), 2);
    }

    #[test]
    fn test_hunk_without_file_header_is_parse_error() {
        let diff = "@@ -1 +1 @@\n-a\n+b\n";
        assert!(matches!(
            parse_unified_diff(diff),
            Err(DiffError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_missing_counts_default_to_one() {
        let diff = "--- a/f.txt\n+++ b/f.txt\n@@ -3 +3 @@\n-old\n+new\n";
        let hunk = &parse_unified_diff(diff).unwrap()[0].hunks[0];
        assert_eq!((hunk.old_start, hunk.old_lines, hunk.new_start, hunk.new_lines), (3, 1, 3, 1));
    }

    #[test]
    fn test_no_newline_marker_after_add() {
        let diff = "--- a/f.txt
+++ b/f.txt
@@ -1 +1 @@
-old
\\ No newline at end of file
+new
\\ No newline at end of file
";
        let files = parse_unified_diff(diff).unwrap();
        assert_eq!(files[0].new_file_has_trailing_newline, Some(false));
        assert_eq!(files[0].hunks[0].lines.len(), 2);
    }

    #[test]
    fn test_no_newline_marker_after_remove_only() {
        let diff = "--- a/f.txt
+++ b/f.txt
@@ -1 +1 @@
+new
-old
\\ No newline at end of file
";
        let files = parse_unified_diff(diff).unwrap();
        assert_eq!(files[0].new_file_has_trailing_newline, None);
    }

    #[test]
    fn test_multiple_files_with_bare_headers() {
        let diff = "--- a/one.txt
+++ b/one.txt
@@ -1 +1 @@
-a
+b
--- a/two.txt
+++ b/two.txt
@@ -1 +1 @@
-c
+d
";
        let files = parse_unified_diff(diff).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].new_path, "one.txt");
        assert_eq!(files[1].new_path, "two.txt");
    }

    #[test]
    fn test_removed_line_resembling_header_stays_in_hunk() {
        // "--- x" inside a hunk body is a removed "-- x" line, not a new section
        let diff = "--- a/doc.md
+++ b/doc.md
@@ -1,2 +1,1 @@
--- x
-++ y
+z
";
        let files = parse_unified_diff(diff).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].hunks[0].lines[0], UnifiedDiffLine::remove("-- x"));
    }

    #[test]
    fn test_quoted_paths_with_spaces() {
        let diff = "diff --git \"a/my dir/file name.txt\" \"b/my dir/file name.txt\"
--- \"a/my dir/file name.txt\"
+++ \"b/my dir/file name.txt\"
@@ -1 +1 @@
-x
+y
";
        let files = parse_unified_diff(diff).unwrap();
        assert_eq!(files[0].old_path, "my dir/file name.txt");
        assert_eq!(files[0].new_path, "my dir/file name.txt");
    }

    #[test]
    fn test_unquoted_paths_with_spaces_in_git_header() {
        let diff = "diff --git a/my file.txt b/my file.txt
new file mode 100644
";
        let files = parse_unified_diff(diff).unwrap();
        assert_eq!(files[0].new_path, "my file.txt");
        assert!(files[0].is_new_file);
        assert_eq!(files[0].old_path, DEV_NULL);
        assert!(files[0].hunks.is_empty());
    }

    #[test]
    fn test_backslash_paths_are_normalized() {
        let diff = "--- a/src\\lib.rs\n+++ b/src\\lib.rs\n@@ -1 +1 @@\n-a\n+b\n";
        let files = parse_unified_diff(diff).unwrap();
        assert_eq!(files[0].new_path, "src/lib.rs");
    }

    #[test]
    fn test_timestamp_after_tab_is_ignored() {
        let diff = "--- a/f.txt\t2024-01-01 00:00:00\n+++ b/f.txt\t2024-01-02 00:00:00\n@@ -1 +1 @@\n-a\n+b\n";
        let files = parse_unified_diff(diff).unwrap();
        assert_eq!(files[0].old_path, "f.txt");
    }

    #[test]
    fn test_rename_lines_update_paths() {
        let diff = "diff --git a/old.rs b/new.rs
similarity index 90%
rename from old.rs
rename to new.rs
";
        let files = parse_unified_diff(diff).unwrap();
        assert_eq!(files[0].old_path, "old.rs");
        assert_eq!(files[0].new_path, "new.rs");
        assert!(files[0].is_rename());
    }

    #[test]
    fn test_crlf_patch_lines() {
        let diff = "--- a/f.txt\r\n+++ b/f.txt\r\n@@ -1 +1 @@\r\n-a\r\n+b\r\n";
        let files = parse_unified_diff(diff).unwrap();
        assert_eq!(files[0].hunks[0].lines[0], UnifiedDiffLine::remove("a"));
        assert_eq!(files[0].hunks[0].lines[1], UnifiedDiffLine::add("b"));
    }

    #[test]
    fn test_blank_context_line_without_space() {
        let diff = "--- a/f.txt\n+++ b/f.txt\n@@ -1,3 +1,3 @@\n a\n\n-b\n+c\n";
        let hunk = &parse_unified_diff(diff).unwrap()[0].hunks[0];
        assert_eq!(hunk.lines[1], UnifiedDiffLine::context(""));
    }

    #[test]
    fn test_trailing_blank_context_line_survives_unfenced_input() {
        let diff = "--- a/f.txt\n+++ b/f.txt\n@@ -1,2 +1,2 @@\n-a\n+b\n \n";
        let hunk = &parse_unified_diff(diff).unwrap()[0].hunks[0];
        assert_eq!(hunk.lines.len(), 3);
        assert_eq!(hunk.lines[2], UnifiedDiffLine::context(""));
    }
}
