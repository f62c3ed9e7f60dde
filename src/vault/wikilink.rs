use std::collections::HashMap;

use super::graph::parent_dir;

/// Extract `[[name]]` markers from markdown text, in document order.
/// Unterminated or empty markers are skipped. Each occurrence is reported,
/// duplicates included.
pub(super) fn extract_markers(text: &str) -> Vec<&str> {
    let mut markers = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("[[") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("]]") else {
            break;
        };

        let body = &after_open[..close];
        if let Some(inner) = body.find("[[") {
            // restart from the inner opening bracket
            rest = &after_open[inner..];
            continue;
        }

        let name = body.trim();
        if !name.is_empty() {
            markers.push(name);
        }
        rest = &after_open[close + 2..];
    }

    markers
}

/// Best-effort marker-name resolution, built once per scan as an indexed
/// lookup instead of a per-marker scan over all nodes.
///
/// Candidates are markdown file ids. A marker may carry a path and may or
/// may not carry the `.md` extension. When several files share a bare name
/// the policy is: exact path match, then a sibling of the referencing note,
/// else the first candidate in traversal order.
pub(super) struct LinkResolver {
    by_stem: HashMap<String, Vec<String>>,
    markdown_ids: Vec<String>,
}

impl LinkResolver {
    pub(super) fn new() -> Self {
        Self {
            by_stem: HashMap::new(),
            markdown_ids: Vec::new(),
        }
    }

    /// Register a markdown file id (`/notes/a.md`) in traversal order.
    pub(super) fn insert(&mut self, id: &str) {
        let name = id.rsplit('/').next().unwrap_or(id);
        let stem = name.strip_suffix(".md").unwrap_or(name);
        self.by_stem
            .entry(stem.to_string())
            .or_default()
            .push(id.to_string());
        self.markdown_ids.push(id.to_string());
    }

    pub(super) fn resolve(&self, marker: &str, referencing_id: &str) -> Option<&str> {
        let want = marker.trim().trim_matches('/');
        if want.is_empty() {
            return None;
        }
        let want = want.strip_suffix(".md").unwrap_or(want);

        if want.contains('/') {
            let suffix = format!("/{want}.md");
            return self
                .markdown_ids
                .iter()
                .find(|id| id.ends_with(&suffix))
                .map(String::as_str);
        }

        let candidates = self.by_stem.get(want)?;
        let own_dir = parent_dir(referencing_id);
        candidates
            .iter()
            .find(|id| parent_dir(id) == own_dir)
            .or_else(|| candidates.first())
            .map(String::as_str)
    }
}
