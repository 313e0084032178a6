//! Bare filename → absolute path index
//!
//! addr2line sometimes reports only a file name (`logging.cc:42`). When that
//! name is unique across the source tree it can be mapped back to its full
//! path. Names found in more than one directory are dropped: an unresolved
//! location is better than a wrong one.

use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::layout::ProjectLayout;
use crate::domain::AnalysisError;

/// Lowercased suffixes of files worth indexing
const SOURCE_SUFFIXES: &[&str] =
    &[".c", ".cc", ".h", ".cp", ".cpp", ".cxx", ".c++", ".asm", ".inc", ".s", ".hxx"];

/// Build subdirectories holding generated sources
const GENERATED_DIRS: &[&str] = &["gen", "obj"];

/// Immutable once built; share it behind an `Arc`
#[derive(Debug, Default)]
pub struct DisambiguationTable {
    by_name: HashMap<String, PathBuf>,
}

impl DisambiguationTable {
    /// Index the project tree plus the build's generated directories
    ///
    /// # Errors
    /// Returns an error if the project root cannot be read
    pub fn build(layout: &ProjectLayout) -> Result<Self, AnalysisError> {
        let generated: Vec<PathBuf> = GENERATED_DIRS
            .iter()
            .map(|dir| layout.build_dir().join(dir))
            .filter(|dir| dir.is_dir())
            .collect();

        Self::build_from(layout.project_root(), &[layout.output_root()], &generated).map_err(
            |source| AnalysisError::DisambiguationFailed {
                root: layout.project_root().to_path_buf(),
                source,
            },
        )
    }

    /// Index `root` (minus `excluded` directories) and each of `extra_roots`
    ///
    /// # Errors
    /// Returns an error if `root` itself cannot be read
    pub fn build_from(
        root: &Path,
        excluded: &[&Path],
        extra_roots: &[PathBuf],
    ) -> io::Result<Self> {
        let mut index = IndexBuilder::default();
        // The root must be readable, everything below is best effort
        drop(fs::read_dir(root)?);
        index.walk(root, excluded);
        for extra in extra_roots {
            index.walk(extra, &[]);
        }
        Ok(index.finish())
    }

    /// Absolute path for a bare file name, case-insensitive
    #[must_use]
    pub fn lookup(&self, file_name: &str) -> Option<&Path> {
        self.by_name.get(&file_name.to_lowercase()).map(PathBuf::as_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[derive(Default)]
struct IndexBuilder {
    entries: HashMap<String, PathBuf>,
    duplicates: HashSet<String>,
    files_seen: usize,
}

impl IndexBuilder {
    fn walk(&mut self, start: &Path, excluded: &[&Path]) {
        let mut pending = vec![start.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Skipping unreadable directory {}: {e}", dir.display());
                    continue;
                }
            };

            for entry in entries.flatten() {
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };
                let name = entry.file_name().to_string_lossy().into_owned();
                let path = entry.path();

                if file_type.is_dir() {
                    if !name.starts_with('.') && !excluded.contains(&path.as_path()) {
                        pending.push(path);
                    }
                } else if file_type.is_file() {
                    self.add(&name, path);
                }
            }
        }
    }

    fn add(&mut self, name: &str, path: PathBuf) {
        let key = name.to_lowercase();
        if !SOURCE_SUFFIXES.iter().any(|suffix| key.ends_with(suffix)) {
            return;
        }
        self.files_seen += 1;
        if let Some(previous) = self.entries.insert(key.clone(), path) {
            debug!("Ambiguous file name {name} (also at {})", previous.display());
            self.duplicates.insert(key);
        }
    }

    fn finish(mut self) -> DisambiguationTable {
        for name in &self.duplicates {
            self.entries.remove(name);
        }
        info!(
            "Disambiguation table: {} unique names from {} source files \
             ({} ambiguous names dropped)",
            self.entries.len(),
            self.files_seen,
            self.duplicates.len()
        );
        DisambiguationTable { by_name: self.entries }
    }
}
