//! Project directory layout derived from the library path
//!
//! Libraries live at `<root>/<out>/<config>/lib/<library>`, e.g.
//! `src/out/Release/lib/libchrome.so`. The build directory is
//! `<root>/<out>/<config>` and the project root is two levels above it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::AnalysisError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    library: PathBuf,
    build_dir: PathBuf,
    project_root: PathBuf,
    root_prefix: String,
}

impl ProjectLayout {
    /// Canonicalize `library` and derive the build directory and project root
    ///
    /// # Errors
    /// Returns an error if the library cannot be canonicalized or sits too
    /// close to the filesystem root to have a project root above it
    pub fn locate(library: &Path) -> Result<Self, AnalysisError> {
        let library = fs::canonicalize(library).map_err(|source| {
            AnalysisError::LibraryUnreadable { path: library.to_path_buf(), source }
        })?;

        let not_found = || AnalysisError::ProjectRootNotFound(library.clone());
        let grandparent = |path: &Path| path.parent().and_then(Path::parent).map(Path::to_path_buf);
        let build_dir = grandparent(&library).ok_or_else(not_found)?;
        let project_root = grandparent(&build_dir).ok_or_else(not_found)?;
        // Stripping "/" would turn every absolute location into a relative one
        if project_root.parent().is_none() {
            return Err(not_found());
        }

        let root_prefix = format!("{}/", project_root.to_string_lossy());
        Ok(Self { library, build_dir, project_root, root_prefix })
    }

    /// Canonical path of the analyzed library
    #[must_use]
    pub fn library(&self) -> &Path {
        &self.library
    }

    /// Build output directory (`<root>/out/Release`)
    #[must_use]
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Directory holding every build configuration (`<root>/out`)
    #[must_use]
    pub fn output_root(&self) -> &Path {
        self.build_dir.parent().unwrap_or(&self.build_dir)
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Remove the project root prefix from `location`, if present
    #[must_use]
    pub fn strip_root<'a>(&self, location: &'a str) -> &'a str {
        location.strip_prefix(self.root_prefix.as_str()).unwrap_or(location)
    }
}
