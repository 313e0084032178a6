//! Symbol table dump via nm
//!
//! nm runs once over the whole library; its output is spooled to a temp file
//! and read back line by line so very large tables never sit in memory.

use log::info;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::domain::AnalysisError;

/// Where the symbol table text comes from
#[derive(Debug, Clone)]
pub enum SymbolSource {
    /// Run `nm -C -S <library>`
    Nm { nm: PathBuf, library: PathBuf },
    /// Pre-dumped nm output
    File(PathBuf),
}

/// Line-oriented symbol table text
pub struct SymbolDump {
    reader: BufReader<File>,
}

impl SymbolDump {
    /// Produce the dump described by `source`
    ///
    /// # Errors
    /// Returns an error if nm cannot be run or exits unsuccessfully, or if the
    /// pre-dumped file cannot be opened
    pub fn open(source: &SymbolSource) -> Result<Self, AnalysisError> {
        match source {
            SymbolSource::Nm { nm, library } => Self::run_nm(nm, library),
            SymbolSource::File(path) => {
                info!("Using pre-dumped symbol table {}", path.display());
                let file = File::open(path).map_err(|e| {
                    AnalysisError::SymbolDumpFailed(format!("cannot open {}: {e}", path.display()))
                })?;
                Ok(Self { reader: BufReader::new(file) })
            }
        }
    }

    fn run_nm(nm: &Path, library: &Path) -> Result<Self, AnalysisError> {
        // Anonymous temp file, removed by the OS once the last handle closes
        let mut spool = tempfile::tempfile()?;
        info!("Running {} -C -S {}", nm.display(), library.display());

        let status = Command::new(nm)
            .arg("-C")
            .arg("-S")
            .arg(library)
            .stdin(Stdio::null())
            .stdout(Stdio::from(spool.try_clone()?))
            .status()
            .map_err(|e| {
                AnalysisError::SymbolDumpFailed(format!("cannot run {}: {e}", nm.display()))
            })?;
        if !status.success() {
            let message = format!("{} exited with {status}", nm.display());
            return Err(AnalysisError::SymbolDumpFailed(message));
        }

        spool.seek(SeekFrom::Start(0))?;
        Ok(Self { reader: BufReader::new(spool) })
    }

    /// Iterate over the dump's lines. Invalid UTF-8 is replaced rather than
    /// rejected since symbol names are only ever echoed back out.
    pub fn lines(self) -> impl Iterator<Item = io::Result<String>> {
        self.reader
            .split(b'\n')
            .map(|line| line.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }
}
