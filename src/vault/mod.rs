mod graph;
mod scan;
mod source;
mod wikilink;

pub use graph::{Link, LinkKind, Node, NodeKind, VaultGraph, depth_from_path, parent_dir, ROOT_ID};
pub use scan::{scan_vault, ScanResult, SkippedEntry, EMPTY_FOLDER_SIZE};
pub use source::{EntryKind, FsSource, SourceEntry, SourceError, VaultSource};
