use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::graph::ROOT_ID;

/// Failure reading from a vault source. Permission problems are kept
/// distinct from missing entries so the scanner can report them apart.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("permission denied reading {path}")]
    PermissionDenied { path: String },
    #[error("no such entry {path}")]
    NotFound { path: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    fn from_io(path: &str, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_string(),
            },
            io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_string(),
            },
            _ => Self::Io {
                path: path.to_string(),
                source: error,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Clone, Debug)]
pub struct SourceEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// A hierarchical file source. Paths are slash-delimited vault paths
/// (`/notes/a.md`) with `/` as the root directory.
pub trait VaultSource {
    /// Display name of the source root, used as the root node label.
    fn display_name(&self) -> String;

    /// Immediate entries of a directory, in whatever order the source
    /// provides. Entries that are neither files nor directories are omitted.
    fn list(&self, dir: &str) -> Result<Vec<SourceEntry>, SourceError>;

    /// Byte length of a file.
    fn file_len(&self, path: &str) -> Result<u64, SourceError>;

    /// Full text content of a file.
    fn read_text(&self, path: &str) -> Result<String, SourceError>;
}

/// `VaultSource` over a local directory via std::fs.
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let mut resolved = self.root.clone();
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            resolved.push(segment);
        }
        resolved
    }
}

impl VaultSource for FsSource {
    fn display_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    fn list(&self, dir: &str) -> Result<Vec<SourceEntry>, SourceError> {
        let resolved = self.resolve(dir);
        let read_dir =
            fs::read_dir(&resolved).map_err(|error| SourceError::from_io(dir, error))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|error| SourceError::from_io(dir, error))?;
            let file_type = entry
                .file_type()
                .map_err(|error| SourceError::from_io(dir, error))?;

            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                // symlinks and other special entries are not part of the tree
                continue;
            };

            entries.push(SourceEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        Ok(entries)
    }

    fn file_len(&self, path: &str) -> Result<u64, SourceError> {
        let metadata = fs::metadata(self.resolve(path))
            .map_err(|error| SourceError::from_io(path, error))?;
        Ok(metadata.len())
    }

    fn read_text(&self, path: &str) -> Result<String, SourceError> {
        fs::read_to_string(self.resolve(path)).map_err(|error| SourceError::from_io(path, error))
    }
}

/// Join a parent vault path and an entry name into a child vault path.
pub(super) fn join_path(dir: &str, name: &str) -> String {
    if dir == ROOT_ID {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

#[allow(dead_code)]
fn _assert_object_safe(_: &dyn VaultSource) {}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn join_path_handles_root_and_nested_dirs() {
        assert_eq!(join_path("/", "a.md"), "/a.md");
        assert_eq!(join_path("/src", "App.md"), "/src/App.md");
    }

    #[test]
    fn fs_source_lists_and_reads() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("docs")).expect("mkdir");
        fs::write(dir.path().join("a.md"), "hello [[b]]").expect("write");

        let source = FsSource::new(dir.path());
        let mut names = source
            .list("/")
            .expect("list root")
            .into_iter()
            .map(|entry| (entry.name, entry.kind))
            .collect::<Vec<_>>();
        names.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            names,
            vec![
                ("a.md".to_string(), EntryKind::File),
                ("docs".to_string(), EntryKind::Directory),
            ]
        );

        assert_eq!(source.file_len("/a.md").expect("len"), 11);
        assert_eq!(source.read_text("/a.md").expect("text"), "hello [[b]]");
    }

    #[test]
    fn missing_entries_are_distinguished_from_io_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = FsSource::new(dir.path());
        match source.read_text("/nope.md") {
            Err(SourceError::NotFound { path }) => assert_eq!(path, "/nope.md"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
