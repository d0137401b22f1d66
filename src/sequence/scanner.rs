//! Directory scanning into an ordered sequence of file identifiers.

use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::volume::{Readability, VolumeDecoder};

/// Name of one member file, relative to the sequence directory.
///
/// Ordering is plain string comparison, which is what defines sequence
/// position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(String);

impl FileId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Directory scan failure.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Failed to open directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Ordered, immutable list of the readable files in one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    directory: PathBuf,
    ids: Vec<FileId>,
}

impl Sequence {
    /// Build a sequence from arbitrary names; duplicates collapse and order is normalized.
    pub fn from_ids<P, I>(directory: P, ids: I) -> Self
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = FileId>,
    {
        let ids: BTreeSet<FileId> = ids.into_iter().collect();
        Self {
            directory: directory.into(),
            ids: ids.into_iter().collect(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of elements (N).
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FileId> {
        self.ids.get(index)
    }

    /// Position of `id` in the sequence.
    pub fn position(&self, id: &FileId) -> Option<usize> {
        self.ids.binary_search(id).ok()
    }

    /// Full path of a member file.
    pub fn path_of(&self, id: &FileId) -> PathBuf {
        self.directory.join(id.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileId> {
        self.ids.iter()
    }

    pub fn ids(&self) -> &[FileId] {
        &self.ids
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a FileId;
    type IntoIter = std::slice::Iter<'a, FileId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

/// Enumerates a directory and admits the files a decoder can fully read.
pub struct DirectoryScanner;

impl DirectoryScanner {
    /// Scan `directory`, probing every entry with `decoder`.
    ///
    /// Fails only if the directory itself cannot be opened; an empty or
    /// unreadable-content directory yields an empty sequence.
    pub fn scan<P, D>(directory: P, decoder: &D) -> Result<Sequence, ScanError>
    where
        P: AsRef<Path>,
        D: VolumeDecoder + ?Sized,
    {
        let directory = directory.as_ref();
        let entries = std::fs::read_dir(directory).map_err(|source| ScanError::Directory {
            path: directory.to_path_buf(),
            source,
        })?;

        let mut admitted = BTreeSet::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry in {}: {}", directory.display(), e);
                    continue;
                }
            };
            // read_dir never yields "." or "..", `admit` rejects them regardless
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                log::warn!("Skipping non UTF-8 file name {:?}", name);
                continue;
            };
            if let Some(id) = Self::admit(directory, name, decoder) {
                admitted.insert(id);
            }
        }

        log::info!(
            "Scanned {}: {} readable files",
            directory.display(),
            admitted.len()
        );
        Ok(Sequence {
            directory: directory.to_path_buf(),
            ids: admitted.into_iter().collect(),
        })
    }

    /// Probe one directory entry; `Some` only for fully readable files.
    pub fn admit<D>(directory: &Path, name: &str, decoder: &D) -> Option<FileId>
    where
        D: VolumeDecoder + ?Sized,
    {
        if name == "." || name == ".." {
            return None;
        }
        let path = directory.join(name);
        match decoder.probe(&path) {
            Readability::FullyReadable => {
                log::debug!("Adding {} to sequence", path.display());
                Some(FileId::new(name))
            }
            other => {
                log::debug!("{} - probe returned {:?}", path.display(), other);
                None
            }
        }
    }
}
