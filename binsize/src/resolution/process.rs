//! One interactive addr2line process
//!
//! addr2line started without addresses on its command line reads them from
//! stdin, one per line, and answers each with exactly two lines: the function
//! name (`-f`) and `file:line`. Keeping the process alive avoids re-reading the
//! library's debug info for every lookup.

use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::domain::AnalysisError;

pub struct ResolverProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Function name and location printed for one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub name: String,
    pub location: String,
}

impl ResolverProcess {
    /// Start `program -f -C -e <library>` with piped stdin/stdout
    ///
    /// # Errors
    /// Returns an error if the process cannot be started
    pub fn spawn(program: &Path, library: &Path) -> Result<Self, AnalysisError> {
        let spawn_failed =
            |source| AnalysisError::ResolverSpawnFailed { program: program.to_path_buf(), source };

        let mut child = Command::new(program)
            .arg("-f")
            .arg("-C")
            .arg("-e")
            .arg(library)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(spawn_failed)?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        match (stdin, stdout) {
            (Some(stdin), Some(stdout)) => {
                Ok(Self { child, stdin, stdout: BufReader::new(stdout) })
            }
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                Err(spawn_failed(io::Error::new(io::ErrorKind::BrokenPipe, "missing stdio pipe")))
            }
        }
    }

    /// Send one address and read back its two answer lines.
    ///
    /// `Ok(None)` means the process closed its output or answered with an
    /// empty line; it has nothing more to say.
    ///
    /// # Errors
    /// Returns an error if writing the address or reading the answer fails
    pub fn lookup(&mut self, address: &str) -> io::Result<Option<Answer>> {
        writeln!(self.stdin, "{address}")?;
        self.stdin.flush()?;

        let Some(name) = self.read_answer_line()? else {
            return Ok(None);
        };
        let Some(location) = self.read_answer_line()? else {
            return Ok(None);
        };
        Ok(Some(Answer { name, location }))
    }

    fn read_answer_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        self.stdout.read_line(&mut line)?;
        let line = line.trim_end_matches(['\r', '\n']);
        Ok((!line.is_empty()).then(|| line.to_string()))
    }

    /// Bytes already read from the process but not consumed by a lookup.
    /// Anything left over after a complete answer means requests and answers
    /// no longer line up.
    #[must_use]
    pub fn pending_bytes(&self) -> usize {
        self.stdout.buffer().len()
    }

    #[must_use]
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for ResolverProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Resolver command line, shared by every worker for respawning
#[derive(Debug, Clone)]
pub struct ResolverCommand {
    pub program: PathBuf,
    pub library: PathBuf,
}

impl ResolverCommand {
    /// # Errors
    /// Returns an error if the process cannot be started
    pub fn spawn(&self) -> Result<ResolverProcess, AnalysisError> {
        ResolverProcess::spawn(&self.program, &self.library)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-addr2line");
        fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_interactive_lookups() {
        let tmp = tempfile::tempdir().unwrap();
        let program = script(
            tmp.path(),
            "while read addr; do echo \"fn_$addr\"; echo \"/src/$addr.c:1\"; done\n",
        );
        let mut process = ResolverProcess::spawn(&program, Path::new("/lib.so")).unwrap();

        for addr in ["00001000", "00002000"] {
            let answer = process.lookup(addr).unwrap().unwrap();
            assert_eq!(answer.name, format!("fn_{addr}"));
            assert_eq!(answer.location, format!("/src/{addr}.c:1"));
            assert_eq!(process.pending_bytes(), 0);
        }
    }

    #[test]
    fn test_eof_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let program = script(tmp.path(), "read addr\nexit 0\n");
        let mut process = ResolverProcess::spawn(&program, Path::new("/lib.so")).unwrap();
        assert_eq!(process.lookup("00001000").unwrap(), None);
    }

    #[test]
    fn test_spawn_missing_program() {
        let result =
            ResolverProcess::spawn(Path::new("/nonexistent/addr2line"), Path::new("/lib.so"));
        assert!(matches!(result, Err(AnalysisError::ResolverSpawnFailed { .. })));
    }
}
