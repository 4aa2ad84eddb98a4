//! Heuristic extraction of a before/after edit from a patch blob.
//!
//! The worker describes file edits as free-form text in an
//! `apply_patch`-style convention:
//!
//! ```text
//! *** Begin Patch
//! *** Update File: src/a.py
//! @@ def main():
//! -old line
//! +new line
//! *** End Patch
//! ```
//!
//! Extraction never fails. Anything that does not look like a patch yields
//! an empty [`PatchResult`], which callers treat as "nothing to show".

/// Markers that may appear anywhere in a line and name the target path.
const EMBEDDED_PATH_MARKERS: &[&str] = &["*** Update File:", "*** Add File:"];

/// Marker that names the target path only when it starts the line.
const LEADING_PATH_MARKER: &str = "Update File:";

/// Structured edit recovered from a patch blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchResult {
    /// Target file path; empty when no path marker was found.
    pub path: String,
    /// Removed lines (`-` prefix stripped), joined with `\n`.
    pub before: String,
    /// Added lines (`+` prefix stripped), joined with `\n`.
    pub after: String,
}

impl PatchResult {
    /// Whether the blob named a target file.
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        !self.path.is_empty()
    }
}

/// Extract the target path and the removed/added lines from `text`.
///
/// Rules, applied per line:
/// - a path marker sets the target path (first match wins, trimmed);
/// - lines whose trimmed form starts with `***` or `@@` are skipped;
/// - `-` lines feed the before text, `+` lines feed the after text;
/// - context lines are dropped.
///
/// When no path marker is present the result is entirely empty.
#[must_use]
pub fn extract_patch(text: &str) -> PatchResult {
    let mut path: Option<String> = None;
    let mut before: Vec<&str> = Vec::new();
    let mut after: Vec<&str> = Vec::new();

    for line in text.lines() {
        if let Some(candidate) = marker_path(line) {
            let candidate = candidate.trim();
            if path.is_none() && !candidate.is_empty() {
                path = Some(candidate.to_owned());
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.starts_with("***") || trimmed.starts_with("@@") {
            continue;
        }

        if let Some(removed) = line.strip_prefix('-') {
            before.push(removed);
        } else if let Some(added) = line.strip_prefix('+') {
            after.push(added);
        }
    }

    match path {
        Some(path) => PatchResult {
            path,
            before: before.join("\n"),
            after: after.join("\n"),
        },
        None => PatchResult::default(),
    }
}

fn marker_path(line: &str) -> Option<&str> {
    for marker in EMBEDDED_PATH_MARKERS {
        if let Some(idx) = line.find(marker) {
            return Some(&line[idx + marker.len()..]);
        }
    }
    line.strip_prefix(LEADING_PATH_MARKER)
}
