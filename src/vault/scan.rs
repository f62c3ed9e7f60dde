use std::collections::HashMap;

use anyhow::{Context, Result};
use log::{info, warn};

use super::graph::{depth_from_path, Link, LinkKind, Node, NodeKind, VaultGraph, ROOT_ID};
use super::source::{join_path, EntryKind, VaultSource};
use super::wikilink::{extract_markers, LinkResolver};

/// Nominal size assigned to folders whose aggregated size is zero, so
/// size-based scaling never produces an invisible node.
pub const EMPTY_FOLDER_SIZE: u64 = 100;

const MARKDOWN_SUFFIX: &str = ".md";

#[derive(Clone, Debug)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

/// Outcome of a vault scan. `skipped` lists entries that could not be read
/// and were left out of the graph; the graph itself always satisfies the
/// structural invariants (single rooted tree, resolved link endpoints).
#[derive(Clone, Debug)]
pub struct ScanResult {
    pub graph: VaultGraph,
    pub skipped: Vec<SkippedEntry>,
}

/// Build a `VaultGraph` from a hierarchical file source.
///
/// Only an unreadable root is fatal. Unreadable entries are skipped and
/// reported through `ScanResult::skipped`; a markdown file whose content
/// cannot be fetched simply contributes no reference links.
pub fn scan_vault(source: &dyn VaultSource) -> Result<ScanResult> {
    let root_entries = source
        .list(ROOT_ID)
        .context("vault root is unreadable")?;

    let mut scan = Scan::default();
    scan.push_node(Node {
        id: ROOT_ID.to_string(),
        name: source.display_name(),
        kind: NodeKind::Folder,
        path: ROOT_ID.to_string(),
        size: 0,
        depth: 0,
    });

    scan.visit_entries(source, ROOT_ID, root_entries);
    scan.resolve_references(source);

    let Scan {
        mut nodes,
        links,
        skipped,
        ..
    } = scan;

    aggregate_sizes(&mut nodes, &links);

    info!(
        "scanned vault '{}': {} nodes, {} links, {} skipped entries",
        source.display_name(),
        nodes.len(),
        links.len(),
        skipped.len()
    );

    Ok(ScanResult {
        graph: VaultGraph {
            root_id: ROOT_ID.to_string(),
            nodes,
            links,
        },
        skipped,
    })
}

#[derive(Default)]
struct Scan {
    nodes: HashMap<String, Node>,
    links: Vec<Link>,
    markdown_files: Vec<String>,
    skipped: Vec<SkippedEntry>,
}

impl Scan {
    fn push_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    fn skip(&mut self, path: String, reason: impl ToString) {
        let reason = reason.to_string();
        warn!("skipping {path}: {reason}");
        self.skipped.push(SkippedEntry { path, reason });
    }

    fn visit_entries(
        &mut self,
        source: &dyn VaultSource,
        dir: &str,
        entries: Vec<super::source::SourceEntry>,
    ) {
        for entry in entries {
            let path = join_path(dir, &entry.name);
            match entry.kind {
                EntryKind::Directory => {
                    self.push_node(Node {
                        id: path.clone(),
                        name: entry.name,
                        kind: NodeKind::Folder,
                        path: path.clone(),
                        size: 0,
                        depth: depth_from_path(&path),
                    });
                    self.links.push(Link {
                        source: dir.to_string(),
                        target: path.clone(),
                        kind: LinkKind::ParentChild,
                    });

                    match source.list(&path) {
                        Ok(children) => self.visit_entries(source, &path, children),
                        // the folder stays in the graph as an empty node
                        Err(error) => self.skip(path, error),
                    }
                }
                EntryKind::File => {
                    let size = match source.file_len(&path) {
                        Ok(size) => size,
                        Err(error) => {
                            self.skip(path, error);
                            continue;
                        }
                    };

                    self.push_node(Node {
                        id: path.clone(),
                        name: entry.name.clone(),
                        kind: NodeKind::File,
                        path: path.clone(),
                        size,
                        depth: depth_from_path(&path),
                    });
                    self.links.push(Link {
                        source: dir.to_string(),
                        target: path.clone(),
                        kind: LinkKind::ParentChild,
                    });

                    if entry.name.ends_with(MARKDOWN_SUFFIX) {
                        self.markdown_files.push(path);
                    }
                }
            }
        }
    }

    /// Second pass: scan markdown contents for `[[name]]` markers. Each
    /// marker occurrence that resolves emits its own reference link, so
    /// duplicates are preserved; unresolved markers are dropped without
    /// error. Self-references are kept.
    fn resolve_references(&mut self, source: &dyn VaultSource) {
        let mut resolver = LinkResolver::new();
        for id in &self.markdown_files {
            resolver.insert(id);
        }

        for id in &self.markdown_files {
            let text = match source.read_text(id) {
                Ok(text) => text,
                Err(error) => {
                    // content unavailable: zero references from this file
                    warn!("no reference scan for {id}: {error}");
                    continue;
                }
            };

            for marker in extract_markers(&text) {
                if let Some(target) = resolver.resolve(marker, id) {
                    self.links.push(Link {
                        source: id.clone(),
                        target: target.to_string(),
                        kind: LinkKind::Reference,
                    });
                }
            }
        }
    }
}

/// Single memoized pass over the parent-child tree: a file keeps its byte
/// size, a folder gets the sum of its resolved children, floored at
/// `EMPTY_FOLDER_SIZE` when that sum is zero.
fn aggregate_sizes(nodes: &mut HashMap<String, Node>, links: &[Link]) {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for link in links {
        if link.kind == LinkKind::ParentChild {
            children
                .entry(link.source.as_str())
                .or_default()
                .push(link.target.as_str());
        }
    }

    let mut memo: HashMap<String, u64> = HashMap::new();
    resolve_size(ROOT_ID, nodes, &children, &mut memo);

    for (id, size) in memo {
        if let Some(node) = nodes.get_mut(&id) {
            node.size = size;
        }
    }
}

fn resolve_size(
    id: &str,
    nodes: &HashMap<String, Node>,
    children: &HashMap<&str, Vec<&str>>,
    memo: &mut HashMap<String, u64>,
) -> u64 {
    if let Some(&size) = memo.get(id) {
        return size;
    }

    let size = match nodes.get(id).map(|node| node.kind) {
        Some(NodeKind::File) => nodes.get(id).map(|node| node.size).unwrap_or(0),
        Some(NodeKind::Folder) => {
            let mut total = 0u64;
            if let Some(child_ids) = children.get(id) {
                for child in child_ids.clone() {
                    total = total.saturating_add(resolve_size(child, nodes, children, memo));
                }
            }
            if total == 0 {
                EMPTY_FOLDER_SIZE
            } else {
                total
            }
        }
        None => 0,
    };

    memo.insert(id.to_string(), size);
    size
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use super::super::source::{EntryKind, FsSource, SourceEntry, SourceError};
    use super::*;

    /// In-memory source with failure injection.
    struct MapSource {
        dirs: HashMap<String, Vec<SourceEntry>>,
        files: HashMap<String, (u64, Option<String>)>,
        unreadable: Vec<String>,
    }

    impl MapSource {
        fn new() -> Self {
            Self {
                dirs: HashMap::from([(ROOT_ID.to_string(), Vec::new())]),
                files: HashMap::new(),
                unreadable: Vec::new(),
            }
        }

        fn dir(mut self, path: &str) -> Self {
            let parent = super::super::graph::parent_dir(path).to_string();
            let name = path.rsplit('/').next().unwrap_or(path).to_string();
            self.dirs.entry(parent).or_default().push(SourceEntry {
                name,
                kind: EntryKind::Directory,
            });
            self.dirs.entry(path.to_string()).or_default();
            self
        }

        fn file(mut self, path: &str, size: u64, content: Option<&str>) -> Self {
            let parent = super::super::graph::parent_dir(path).to_string();
            let name = path.rsplit('/').next().unwrap_or(path).to_string();
            self.dirs.entry(parent).or_default().push(SourceEntry {
                name,
                kind: EntryKind::File,
            });
            self.files
                .insert(path.to_string(), (size, content.map(str::to_string)));
            self
        }

        fn unreadable(mut self, path: &str) -> Self {
            self.unreadable.push(path.to_string());
            self
        }

        fn denied(&self, path: &str) -> Option<SourceError> {
            self.unreadable
                .iter()
                .any(|entry| entry == path)
                .then(|| SourceError::PermissionDenied {
                    path: path.to_string(),
                })
        }
    }

    impl VaultSource for MapSource {
        fn display_name(&self) -> String {
            "vault".to_string()
        }

        fn list(&self, dir: &str) -> Result<Vec<SourceEntry>, SourceError> {
            if let Some(error) = self.denied(dir) {
                return Err(error);
            }
            self.dirs
                .get(dir)
                .cloned()
                .ok_or_else(|| SourceError::NotFound {
                    path: dir.to_string(),
                })
        }

        fn file_len(&self, path: &str) -> Result<u64, SourceError> {
            if let Some(error) = self.denied(path) {
                return Err(error);
            }
            self.files
                .get(path)
                .map(|(size, _)| *size)
                .ok_or_else(|| SourceError::NotFound {
                    path: path.to_string(),
                })
        }

        fn read_text(&self, path: &str) -> Result<String, SourceError> {
            if let Some(error) = self.denied(path) {
                return Err(error);
            }
            match self.files.get(path) {
                Some((_, Some(content))) => Ok(content.clone()),
                Some((_, None)) => Err(SourceError::Io {
                    path: path.to_string(),
                    source: std::io::Error::other("binary content"),
                }),
                None => Err(SourceError::NotFound {
                    path: path.to_string(),
                }),
            }
        }
    }

    fn assert_invariants(graph: &VaultGraph) {
        // referential integrity
        for link in &graph.links {
            assert!(graph.nodes.contains_key(&link.source), "{:?}", link);
            assert!(graph.nodes.contains_key(&link.target), "{:?}", link);
        }

        // exactly one root at depth 0 with the sentinel path
        let root = graph.nodes.get(&graph.root_id).expect("root exists");
        assert_eq!(root.path, ROOT_ID);
        assert_eq!(root.depth, 0);

        // every non-root node has exactly one parent-child in-edge
        for id in graph.nodes.keys() {
            let parents = graph
                .links
                .iter()
                .filter(|link| link.kind == LinkKind::ParentChild && &link.target == id)
                .count();
            if id == &graph.root_id {
                assert_eq!(parents, 0);
            } else {
                assert_eq!(parents, 1, "node {id} has {parents} parents");
            }
        }

        // depth re-derives from the path
        for node in graph.nodes.values() {
            assert_eq!(node.depth, depth_from_path(&node.path));
        }
    }

    #[test]
    fn folder_size_is_sum_of_children() {
        let source = MapSource::new()
            .dir("/docs")
            .file("/docs/x.md", 10, Some(""))
            .file("/docs/y.md", 20, Some(""));

        let result = scan_vault(&source).expect("scan");
        assert_invariants(&result.graph);
        assert!(result.skipped.is_empty());
        assert_eq!(result.graph.nodes["/docs"].size, 30);
        assert_eq!(result.graph.nodes[ROOT_ID].size, 30);
    }

    #[test]
    fn empty_folder_gets_nominal_size() {
        let source = MapSource::new().dir("/empty");
        let result = scan_vault(&source).expect("scan");
        assert_invariants(&result.graph);
        assert_eq!(result.graph.nodes["/empty"].size, EMPTY_FOLDER_SIZE);
    }

    #[test]
    fn self_reference_resolves_to_itself_and_is_kept() {
        let source = MapSource::new().file("/a.md", 5, Some("about [[a]]"));
        let result = scan_vault(&source).expect("scan");
        assert_invariants(&result.graph);

        let references = result
            .graph
            .links
            .iter()
            .filter(|link| link.kind == LinkKind::Reference)
            .collect::<Vec<_>>();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].source, "/a.md");
        assert_eq!(references[0].target, "/a.md");
    }

    #[test]
    fn duplicate_markers_emit_duplicate_links() {
        let source = MapSource::new()
            .file("/a.md", 5, Some("[[b]] and [[b]] again"))
            .file("/b.md", 5, Some(""));
        let result = scan_vault(&source).expect("scan");

        let to_b = result
            .graph
            .links
            .iter()
            .filter(|link| link.kind == LinkKind::Reference && link.target == "/b.md")
            .count();
        assert_eq!(to_b, 2);
        assert_eq!(result.graph.degree("/b.md"), 3);
    }

    #[test]
    fn unresolved_markers_are_dropped_without_placeholder_nodes() {
        let source = MapSource::new().file("/a.md", 5, Some("see [[missing note]]"));
        let result = scan_vault(&source).expect("scan");
        assert_invariants(&result.graph);
        assert_eq!(result.graph.node_count(), 2);
        assert!(!result
            .graph
            .links
            .iter()
            .any(|link| link.kind == LinkKind::Reference));
    }

    #[test]
    fn unreadable_entry_is_skipped_without_aborting() {
        let source = MapSource::new()
            .file("/ok.md", 7, Some(""))
            .file("/locked.bin", 9, None)
            .unreadable("/locked.bin");

        let result = scan_vault(&source).expect("scan");
        assert_invariants(&result.graph);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].path, "/locked.bin");
        assert!(result.graph.nodes.contains_key("/ok.md"));
        assert!(!result.graph.nodes.contains_key("/locked.bin"));
    }

    #[test]
    fn unreadable_subdirectory_keeps_folder_node() {
        let source = MapSource::new().dir("/private").unreadable("/private");
        let result = scan_vault(&source).expect("scan");
        assert_invariants(&result.graph);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.graph.nodes["/private"].size, EMPTY_FOLDER_SIZE);
    }

    #[test]
    fn unreadable_content_means_zero_references() {
        let source = MapSource::new()
            .file("/a.md", 5, None)
            .file("/b.md", 5, Some("[[a]]"));
        let result = scan_vault(&source).expect("scan");

        let from_a = result
            .graph
            .links
            .iter()
            .filter(|link| link.kind == LinkKind::Reference && link.source == "/a.md")
            .count();
        assert_eq!(from_a, 0);
        // b still resolves into a
        assert_eq!(result.graph.backlinks("/a.md"), vec!["/b.md"]);
    }

    #[test]
    fn unreadable_root_is_fatal() {
        let source = MapSource::new().unreadable(ROOT_ID);
        assert!(scan_vault(&source).is_err());
    }

    #[test]
    fn scan_over_real_filesystem() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("notes")).expect("mkdir");
        fs::write(dir.path().join("notes/alpha.md"), "link to [[beta]]").expect("write");
        fs::write(dir.path().join("beta.md"), "plain").expect("write");
        fs::write(dir.path().join("image.png"), [0u8; 64]).expect("write");

        let source = FsSource::new(dir.path());
        let result = scan_vault(&source).expect("scan");
        assert_invariants(&result.graph);

        assert_eq!(result.graph.node_count(), 5);
        assert_eq!(result.graph.nodes["/image.png"].size, 64);
        assert_eq!(result.graph.nodes["/notes"].size, 16);
        assert_eq!(result.graph.backlinks("/beta.md"), vec!["/notes/alpha.md"]);
        assert_eq!(result.graph.nodes["/notes/alpha.md"].depth, 1);
    }
}
