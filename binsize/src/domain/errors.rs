//! Structured error types for binsize
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Cannot read library {path}: {source}")]
    LibraryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot locate project root from {0}: expected <root>/<out>/<config>/<dir>/<library>")]
    ProjectRootNotFound(PathBuf),

    #[error("Failed to build disambiguation table under {root}: {source}")]
    DisambiguationFailed {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn resolver {program}: {source}")]
    ResolverSpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Resolver output desynchronized on worker {worker} after address {address} \
         ({pending} bytes pending)"
    )]
    Desynchronized { worker: usize, address: String, pending: usize },

    #[error("All resolver workers exited before input was fully submitted")]
    AllWorkersExited,

    #[error("Record submitted after input was closed")]
    InputClosed,

    #[error("Worker pool did not terminate within {0:?}")]
    PoolStalled(std::time::Duration),

    #[error("Symbol dump failed: {0}")]
    SymbolDumpFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
