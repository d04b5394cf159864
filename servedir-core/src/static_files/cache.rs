use std::path::{Path, PathBuf};
use std::time::SystemTime;

use dashmap::DashMap;

/// Process-wide map of content hashes keyed by file path.
///
/// Entries are checked against the file's mtime on every lookup and replaced
/// when it changed. Two requests hashing the same file at once both compute
/// it; the last insert wins.
#[derive(Debug, Default)]
pub struct EtagCache {
    entries: DashMap<PathBuf, (SystemTime, String)>,
}

impl EtagCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Cached hash for `path`, if it was computed for this exact mtime.
    pub fn get(&self, path: &Path, modified: SystemTime) -> Option<String> {
        self.entries
            .get(path)
            .filter(|entry| entry.0 == modified)
            .map(|entry| entry.1.clone())
    }

    pub fn insert(&self, path: PathBuf, modified: SystemTime, hash: String) {
        self.entries.insert(path, (modified, hash));
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
