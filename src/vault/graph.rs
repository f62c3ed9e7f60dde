use std::collections::HashMap;

/// Reserved id/path of the vault root node.
pub const ROOT_ID: &str = "/";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Folder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkKind {
    ParentChild,
    Reference,
}

impl LinkKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::ParentChild => "folder",
            Self::Reference => "wikilink",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// Canonical slash-delimited path from the root; equals `id`.
    pub path: String,
    /// Bytes for a file; recursively aggregated bytes for a folder.
    pub size: u64,
    /// Nesting level derived from `path`; the root is 0.
    pub depth: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub kind: LinkKind,
}

/// Immutable snapshot of a scanned vault. Layout state (positions,
/// velocities, pins) is owned by the app's render session, never stored here.
#[derive(Clone, Debug)]
pub struct VaultGraph {
    pub root_id: String,
    pub nodes: HashMap<String, Node>,
    pub links: Vec<Link>,
}

impl VaultGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Count of links of any kind touching `id`. Duplicate reference links
    /// each count once per occurrence.
    pub fn degree(&self, id: &str) -> usize {
        self.links
            .iter()
            .filter(|link| link.source == id || link.target == id)
            .count()
    }

    /// Degree for every node in one pass over the link list.
    pub fn degrees(&self) -> HashMap<&str, usize> {
        let mut degrees: HashMap<&str, usize> =
            self.nodes.keys().map(|id| (id.as_str(), 0)).collect();
        for link in &self.links {
            if let Some(count) = degrees.get_mut(link.source.as_str()) {
                *count += 1;
            }
            if let Some(count) = degrees.get_mut(link.target.as_str()) {
                *count += 1;
            }
        }
        degrees
    }

    /// Source ids of reference links pointing at `id`, in link order.
    pub fn backlinks(&self, id: &str) -> Vec<&str> {
        self.links
            .iter()
            .filter(|link| link.kind == LinkKind::Reference && link.target == id)
            .map(|link| link.source.as_str())
            .collect()
    }

    /// Target ids of reference links leaving `id`, in link order.
    pub fn outgoing_references(&self, id: &str) -> Vec<&str> {
        self.links
            .iter()
            .filter(|link| link.kind == LinkKind::Reference && link.source == id)
            .map(|link| link.target.as_str())
            .collect()
    }

    /// Direct children of a folder via parent-child links, in link order.
    pub fn children(&self, id: &str) -> Vec<&str> {
        self.links
            .iter()
            .filter(|link| link.kind == LinkKind::ParentChild && link.source == id)
            .map(|link| link.target.as_str())
            .collect()
    }

    pub fn top_by_size(&self, limit: usize) -> Vec<String> {
        let mut ids = self.nodes.keys().cloned().collect::<Vec<_>>();
        ids.sort_by(|a, b| {
            let a_size = self.nodes.get(a).map(|node| node.size).unwrap_or(0);
            let b_size = self.nodes.get(b).map(|node| node.size).unwrap_or(0);
            b_size.cmp(&a_size).then_with(|| a.cmp(b))
        });
        ids.truncate(limit);
        ids
    }

    pub fn top_by_degree(&self, limit: usize) -> Vec<String> {
        let degrees = self.degrees();
        let mut ids = self.nodes.keys().cloned().collect::<Vec<_>>();
        ids.sort_by(|a, b| {
            let a_degree = degrees.get(a.as_str()).copied().unwrap_or(0);
            let b_degree = degrees.get(b.as_str()).copied().unwrap_or(0);
            b_degree.cmp(&a_degree).then_with(|| a.cmp(b))
        });
        ids.truncate(limit);
        ids
    }
}

/// Depth is a pure function of the path string: non-empty segment count
/// minus one, with the root fixed at 0. Stable under rescans regardless of
/// enumeration order.
pub fn depth_from_path(path: &str) -> usize {
    if path == ROOT_ID {
        return 0;
    }
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .count()
        .saturating_sub(1)
}

/// Directory part of a node id; the root for top-level entries.
pub fn parent_dir(id: &str) -> &str {
    match id.rsplit_once('/') {
        Some(("", _)) | None => ROOT_ID,
        Some((dir, _)) => dir,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: NodeKind, size: u64) -> Node {
        Node {
            id: id.to_string(),
            name: id.rsplit('/').next().unwrap_or(id).to_string(),
            kind,
            path: id.to_string(),
            size,
            depth: depth_from_path(id),
        }
    }

    fn link(source: &str, target: &str, kind: LinkKind) -> Link {
        Link {
            source: source.to_string(),
            target: target.to_string(),
            kind,
        }
    }

    fn sample_graph() -> VaultGraph {
        let nodes = [
            node(ROOT_ID, NodeKind::Folder, 30),
            node("/a.md", NodeKind::File, 10),
            node("/b.md", NodeKind::File, 20),
        ]
        .into_iter()
        .map(|n| (n.id.clone(), n))
        .collect();

        VaultGraph {
            root_id: ROOT_ID.to_string(),
            nodes,
            links: vec![
                link(ROOT_ID, "/a.md", LinkKind::ParentChild),
                link(ROOT_ID, "/b.md", LinkKind::ParentChild),
                link("/a.md", "/b.md", LinkKind::Reference),
                link("/a.md", "/b.md", LinkKind::Reference),
            ],
        }
    }

    #[test]
    fn depth_is_pure_function_of_path() {
        assert_eq!(depth_from_path("/"), 0);
        assert_eq!(depth_from_path("/a.md"), 0);
        assert_eq!(depth_from_path("/src/App.md"), 1);
        assert_eq!(depth_from_path("/a/b/c/d/e/f.md"), 5);
    }

    #[test]
    fn parent_dir_of_top_level_entry_is_root() {
        assert_eq!(parent_dir("/a.md"), "/");
        assert_eq!(parent_dir("/src/App.md"), "/src");
        assert_eq!(parent_dir("/src/hooks/data.md"), "/src/hooks");
    }

    #[test]
    fn degree_counts_duplicate_reference_occurrences() {
        let graph = sample_graph();
        // one parent-child plus two reference occurrences
        assert_eq!(graph.degree("/a.md"), 3);
        assert_eq!(graph.degree("/b.md"), 3);
        assert_eq!(graph.degree(ROOT_ID), 2);

        let degrees = graph.degrees();
        for (id, count) in degrees {
            assert_eq!(count, graph.degree(id));
        }
    }

    #[test]
    fn backlinks_report_reference_sources_only() {
        let graph = sample_graph();
        assert_eq!(graph.backlinks("/b.md"), vec!["/a.md", "/a.md"]);
        assert!(graph.backlinks("/a.md").is_empty());
        // parent-child links never show up as backlinks
        assert!(graph.backlinks(ROOT_ID).is_empty());
    }

    #[test]
    fn rankings_are_size_and_degree_ordered() {
        let graph = sample_graph();
        assert_eq!(graph.top_by_size(2), vec!["/".to_string(), "/b.md".to_string()]);
        let by_degree = graph.top_by_degree(1);
        assert_eq!(by_degree, vec!["/a.md".to_string()]);
    }
}
