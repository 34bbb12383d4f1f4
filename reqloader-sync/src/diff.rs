//! Line-level summary of a manifest change, for logging.

use similar::{ChangeTag, TextDiff};

/// Requirement lines added and removed between two manifest versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ManifestDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Diff `old` against `new`, ignoring blank lines.
pub fn summarize(old: &str, new: &str) -> ManifestDiff {
    let diff = TextDiff::from_lines(old, new);
    let mut summary = ManifestDiff::default();

    for change in diff.iter_all_changes() {
        let line = change.value().trim();
        if line.is_empty() {
            continue;
        }
        match change.tag() {
            ChangeTag::Insert => summary.added.push(line.to_string()),
            ChangeTag::Delete => summary.removed.push(line.to_string()),
            ChangeTag::Equal => {}
        }
    }

    summary
}
