//! Temporary files created during one submission run

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Ordered set of scratch paths owned by one run
///
/// Every registered path is deleted exactly once: by [`WorkingFiles::cleanup`]
/// or, if the run unwinds before reaching it, on drop. Deletion failures are
/// logged and never reported to the caller.
#[derive(Debug, Default)]
pub struct WorkingFiles {
    paths: Vec<PathBuf>,
}

impl WorkingFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `path`; it will be removed when the run ends
    pub fn register(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Delete every registered path
    pub fn cleanup(mut self) {
        self.remove_all();
    }

    fn remove_all(&mut self) {
        for path in self.paths.drain(..) {
            remove_quietly(&path);
        }
    }
}

impl Drop for WorkingFiles {
    fn drop(&mut self) {
        self.remove_all();
    }
}

fn remove_quietly(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Removed temporary file {:?}", path),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => log::error!("Failed to remove temporary file {:?}: {}", path, e),
    }
}
