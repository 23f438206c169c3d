// Distributed under the MIT software license

//! Unified-diff parsing for the patch applier and merge analyzer (§4.I,
//! §4.J). Hand-written rather than shelled out to `git apply`: the engine
//! never assumes a `git` binary or `git2` checkout is available (a relay
//! or browser backend may drive [`nostr_git_objects::ObjectStore`]
//! without one), so the diff itself has to be the source of truth for
//! both "can this apply" and "does this conflict" decisions.

use std::fmt;

/// A single `@@ -a,b +c,d @@` hunk plus its body lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// First line number the hunk touches in the old file (1-based).
    pub old_start: u32,
    /// Line count the hunk spans in the old file.
    pub old_lines: u32,
    /// First line number the hunk touches in the new file (1-based).
    pub new_start: u32,
    /// Line count the hunk spans in the new file.
    pub new_lines: u32,
    /// Body lines, each prefixed with its original `+`/`-`/` ` marker.
    pub lines: Vec<String>,
}

impl Hunk {
    /// Body lines that add or remove content (drops context lines),
    /// i.e. the lines a conflict-marker range is computed over (§4.I).
    pub fn changed_lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter(|l| l.starts_with('+') || l.starts_with('-')).map(String::as_str)
    }

    /// `[min, max]` old-file line range this hunk could conflict over.
    pub fn old_range(&self) -> (u32, u32) {
        let span = self.old_lines.max(1);
        (self.old_start, self.old_start + span - 1)
    }
}

/// One file's worth of diff: the operation kind plus its hunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Path as it appears in the `+++`/`---` headers (`a/`, `b/` stripped).
    pub path: String,
    /// What kind of change this is.
    pub kind: FileDiffKind,
    /// Hunks, in document order. Empty for a pure add/delete of an empty file.
    pub hunks: Vec<Hunk>,
}

/// The operation a file's diff section represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDiffKind {
    /// Existing file modified in place.
    Modify,
    /// New file created (`new file mode`).
    Add,
    /// File removed (`deleted file mode`).
    Delete,
}

/// A diff feature this parser refuses to apply (§4.J step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedKind {
    /// `rename from`/`rename to` header pair.
    Rename,
    /// `copy from`/`copy to` header pair.
    Copy,
    /// `GIT binary patch` payload.
    Binary,
    /// `old mode`/`new mode` with no content hunks.
    ModeOnly,
    /// `Subproject commit` gitlink marker.
    Submodule,
}

impl fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rename => "rename",
            Self::Copy => "copy",
            Self::Binary => "binary",
            Self::ModeOnly => "mode-only",
            Self::Submodule => "submodule",
        };
        f.write_str(s)
    }
}

/// Diff-parsing error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DiffError {
    /// The patch contains a change type the applier does not support.
    #[error("unsupported change in {path}: {kind}")]
    Unsupported {
        /// File the unsupported change touches.
        path: String,
        /// Which feature was rejected.
        kind: UnsupportedKind,
    },
    /// A `@@ ... @@` hunk header did not parse.
    #[error("malformed hunk header: {0}")]
    MalformedHunkHeader(String),
    /// The patch had no recognizable `diff --git` sections.
    #[error("no file sections found in patch")]
    Empty,
}

/// Parse a unified diff (`git diff`/`git format-patch` body) into one
/// [`FileDiff`] per `diff --git` section, rejecting the unsupported
/// change types named in §4.J step 2.
pub fn parse_unified_diff(content: &str) -> Result<Vec<FileDiff>, DiffError> {
    let mut out = Vec::new();
    let lines: Vec<&str> = content.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        if !lines[i].starts_with("diff --git ") {
            i += 1;
            continue;
        }
        let section_start = i;
        i += 1;
        let mut section_end = lines.len();
        while i < lines.len() {
            if lines[i].starts_with("diff --git ") {
                section_end = i;
                break;
            }
            i += 1;
        }
        out.push(parse_file_section(&lines[section_start..section_end])?);
    }
    if out.is_empty() {
        return Err(DiffError::Empty);
    }
    Ok(out)
}

fn strip_prefix(path: &str) -> String {
    path.strip_prefix("a/").or_else(|| path.strip_prefix("b/")).unwrap_or(path).to_string()
}

fn parse_file_section(lines: &[&str]) -> Result<FileDiff, DiffError> {
    let header = lines[0];
    // `diff --git a/path b/path` — the trailing `b/path` is authoritative for renames.
    let mut parts = header.trim_start_matches("diff --git ").splitn(2, " b/");
    let a_side = parts.next().unwrap_or_default();
    let path = strip_prefix(parts.next().unwrap_or(a_side));

    let mut kind = FileDiffKind::Modify;
    let mut saw_mode_change = false;
    let mut hunks = Vec::new();
    let mut idx = 1;

    while idx < lines.len() {
        let line = lines[idx];
        if let Some(rest) = line.strip_prefix("rename from ") {
            let _ = rest;
            return Err(DiffError::Unsupported { path, kind: UnsupportedKind::Rename });
        }
        if line.starts_with("copy from ") {
            return Err(DiffError::Unsupported { path, kind: UnsupportedKind::Copy });
        }
        if line.starts_with("GIT binary patch") || line.starts_with("Binary files ") {
            return Err(DiffError::Unsupported { path, kind: UnsupportedKind::Binary });
        }
        if line.starts_with("Subproject commit") {
            return Err(DiffError::Unsupported { path, kind: UnsupportedKind::Submodule });
        }
        if line.starts_with("new file mode") {
            kind = FileDiffKind::Add;
        } else if line.starts_with("deleted file mode") {
            kind = FileDiffKind::Delete;
        } else if line.starts_with("old mode") || line.starts_with("new mode") {
            saw_mode_change = true;
        } else if line.starts_with("@@ ") {
            let (hunk, consumed) = parse_hunk(&lines[idx..])?;
            hunks.push(hunk);
            idx += consumed;
            continue;
        }
        idx += 1;
    }

    if saw_mode_change && hunks.is_empty() && kind == FileDiffKind::Modify {
        return Err(DiffError::Unsupported { path, kind: UnsupportedKind::ModeOnly });
    }

    Ok(FileDiff { path, kind, hunks })
}

fn parse_hunk(lines: &[&str]) -> Result<(Hunk, usize), DiffError> {
    let header = lines[0];
    let body = header
        .strip_prefix("@@ ")
        .and_then(|s| s.split(" @@").next())
        .ok_or_else(|| DiffError::MalformedHunkHeader(header.to_string()))?;
    let mut ranges = body.split_whitespace();
    let old_range = ranges.next().ok_or_else(|| DiffError::MalformedHunkHeader(header.to_string()))?;
    let new_range = ranges.next().ok_or_else(|| DiffError::MalformedHunkHeader(header.to_string()))?;
    let (old_start, old_lines) = parse_range(old_range, '-')?;
    let (new_start, new_lines) = parse_range(new_range, '+')?;

    let mut body_lines = Vec::new();
    let mut consumed = 1;
    for &line in &lines[1..] {
        if line.starts_with("@@ ") || line.starts_with("diff --git ") {
            break;
        }
        body_lines.push(line.to_string());
        consumed += 1;
    }

    Ok((
        Hunk {
            old_start,
            old_lines,
            new_start,
            new_lines,
            lines: body_lines,
        },
        consumed,
    ))
}

fn parse_range(token: &str, marker: char) -> Result<(u32, u32), DiffError> {
    let stripped = token.strip_prefix(marker).ok_or_else(|| DiffError::MalformedHunkHeader(token.to_string()))?;
    let mut parts = stripped.splitn(2, ',');
    let start: u32 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| DiffError::MalformedHunkHeader(token.to_string()))?;
    let count: u32 = match parts.next() {
        Some(s) => s.parse().map_err(|_| DiffError::MalformedHunkHeader(token.to_string()))?,
        None => 1,
    };
    Ok((start, count))
}

/// Reconstruct a file's full new content by applying `diff`'s hunks to
/// its old content, as plain text. Used by the patch applier (§4.J step
/// 3) for `Modify`/`Add`.
pub fn apply_hunks(old_content: &str, diff: &FileDiff) -> String {
    let old_lines: Vec<&str> = if old_content.is_empty() { Vec::new() } else { old_content.lines().collect() };
    let mut out: Vec<String> = Vec::new();
    let mut cursor = 0usize;

    for hunk in &diff.hunks {
        let hunk_start = hunk.old_start.saturating_sub(1) as usize;
        while cursor < hunk_start && cursor < old_lines.len() {
            out.push(old_lines[cursor].to_string());
            cursor += 1;
        }
        for line in &hunk.lines {
            match line.chars().next() {
                Some('+') => out.push(line[1..].to_string()),
                Some('-') => {
                    cursor += 1;
                }
                Some(' ') => {
                    out.push(line[1..].to_string());
                    cursor += 1;
                }
                _ => {}
            }
        }
    }
    while cursor < old_lines.len() {
        out.push(old_lines[cursor].to_string());
        cursor += 1;
    }

    let mut text = out.join("\n");
    if !out.is_empty() {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "diff --git a/file.txt b/file.txt\n\
index aaaaaaa..bbbbbbb 100644\n\
--- a/file.txt\n\
+++ b/file.txt\n\
@@ -1,2 +1,2 @@\n\
-line1\n\
+line1 patched\n\
 line2\n";

    #[test]
    fn parses_single_modify_hunk() {
        let diffs = parse_unified_diff(SAMPLE).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "file.txt");
        assert_eq!(diffs[0].kind, FileDiffKind::Modify);
        assert_eq!(diffs[0].hunks.len(), 1);
        assert_eq!(diffs[0].hunks[0].old_range(), (1, 2));
    }

    #[test]
    fn rejects_rename() {
        let content = "diff --git a/old.txt b/new.txt\n\
similarity index 100%\n\
rename from old.txt\n\
rename to new.txt\n";
        let err = parse_unified_diff(content).unwrap_err();
        assert_eq!(err, DiffError::Unsupported { path: "new.txt".to_string(), kind: UnsupportedKind::Rename });
    }

    #[test]
    fn rejects_binary() {
        let content = "diff --git a/image.png b/image.png\n\
index 1111111..2222222 100644\n\
GIT binary patch\n\
literal 10\n";
        let err = parse_unified_diff(content).unwrap_err();
        assert_eq!(err, DiffError::Unsupported { path: "image.png".to_string(), kind: UnsupportedKind::Binary });
    }

    #[test]
    fn rejects_mode_only_change() {
        let content = "diff --git a/run.sh b/run.sh\n\
old mode 100644\n\
new mode 100755\n";
        let err = parse_unified_diff(content).unwrap_err();
        assert_eq!(err, DiffError::Unsupported { path: "run.sh".to_string(), kind: UnsupportedKind::ModeOnly });
    }

    #[test]
    fn apply_hunks_produces_patched_content() {
        let diffs = parse_unified_diff(SAMPLE).unwrap();
        let patched = apply_hunks("line1\nline2\n", &diffs[0]);
        assert_eq!(patched, "line1 patched\nline2\n");
    }

    #[test]
    fn add_file_diff_has_no_old_content_dependency() {
        let content = "diff --git a/new.txt b/new.txt\n\
new file mode 100644\n\
index 0000000..aaaaaaa\n\
--- /dev/null\n\
+++ b/new.txt\n\
@@ -0,0 +1,2 @@\n\
+hello\n\
+world\n";
        let diffs = parse_unified_diff(content).unwrap();
        assert_eq!(diffs[0].kind, FileDiffKind::Add);
        assert_eq!(apply_hunks("", &diffs[0]), "hello\nworld\n");
    }
}
