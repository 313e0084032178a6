//! Pre-flight checks for binsize
//!
//! Validates inputs before any nm or addr2line process is started.
//! Provides clear, actionable error messages when requirements aren't met.

use anyhow::{bail, Context, Result};
use log::warn;
use object::{Object, ObjectSection};
use std::fs::File;
use std::path::Path;

use crate::domain::AnalysisError;
use crate::pipeline::PipelineConfig;
use crate::resolution::ProjectLayout;
use crate::symbols::SymbolSource;

/// Run all pre-flight checks
///
/// # Errors
/// Returns an error if the library or pre-dumped symbol file is unusable, the
/// library is not inside a build tree, or an output file's directory does not
/// exist
pub fn run_preflight_checks(config: &PipelineConfig) -> Result<()> {
    check_library_readable(&config.pool.library)?;
    ProjectLayout::locate(&config.pool.library)?;
    if let SymbolSource::File(ref path) = config.source {
        check_input_file(path)?;
    }
    let outputs = [Some(&config.outfile), config.failfile.as_ref(), config.skipfile.as_ref()];
    for output in outputs.into_iter().flatten() {
        check_output_dir(output)?;
    }
    check_debug_info(&config.pool.library);
    Ok(())
}

/// Check if the library exists and can be opened
fn check_library_readable(library: &Path) -> Result<()> {
    if library.is_dir() {
        bail!(
            "Not a file: {}\n\n\
             --library must point to a compiled library, not a directory.",
            library.display()
        );
    }
    File::open(library).map_err(|source| AnalysisError::LibraryUnreadable {
        path: library.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn check_input_file(path: &Path) -> Result<()> {
    File::open(path).with_context(|| {
        format!(
            "Cannot read symbol dump {}\n\n\
             --nm-infile must point to saved `nm -C -S` output.",
            path.display()
        )
    })?;
    Ok(())
}

fn check_output_dir(path: &Path) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    if !parent.is_dir() {
        bail!("Output directory {} does not exist (for {})", parent.display(), path.display());
    }
    Ok(())
}

/// Warn when the library has no line tables, since every lookup would fail
fn check_debug_info(library: &Path) {
    let Ok(data) = std::fs::read(library) else {
        return;
    };
    // Not a valid object file, let nm report it
    let Ok(obj) = object::File::parse(&*data) else {
        return;
    };

    let has_line_info = obj.section_by_name(".debug_line").is_some_and(|s| s.size() > 0);
    let has_symtab = obj.section_by_name(".symtab").is_some_and(|s| s.size() > 0);

    if !has_symtab {
        warn!("{} is stripped, nm will list dynamic symbols only", library.display());
    }
    if !has_line_info {
        warn!(
            "{} has no DWARF line info, addr2line will not find source locations",
            library.display()
        );
    }
}
