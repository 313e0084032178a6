//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::pipeline::{PipelineConfig, DEFAULT_PROGRESS_INTERVAL, DEFAULT_TERMINATION_TIMEOUT};
use crate::resolution::{PoolConfig, RecyclePolicy};
use crate::symbols::SymbolSource;

#[derive(Parser, Debug)]
#[command(
    name = "binsize",
    version,
    about = "Annotate a native library's symbol table with source locations",
    after_help = "\
EXAMPLES:
    binsize --library out/Release/lib/libchrome.so --outfile symbols.txt --threads 16
    binsize --library out/Release/lib/libchrome.so --outfile symbols.txt \\
            --nm-infile nm.txt --failfile failed.txt --disambiguate"
)]
pub struct Args {
    /// Path to the compiled library
    #[arg(long, value_name = "PATH")]
    pub library: PathBuf,

    /// All results are written here
    #[arg(long, value_name = "PATH")]
    pub outfile: PathBuf,

    /// addr2line executable
    #[arg(long, value_name = "PATH", default_value = "addr2line")]
    pub addr2line: PathBuf,

    /// nm executable
    #[arg(long, value_name = "PATH", default_value = "nm")]
    pub nm: PathBuf,

    /// Use this pre-dumped nm output instead of running nm
    #[arg(long, value_name = "PATH")]
    pub nm_infile: Option<PathBuf>,

    /// Failed lookups are also written here
    #[arg(long, value_name = "PATH")]
    pub failfile: Option<PathBuf>,

    /// Lines that are not symbols are written here
    #[arg(long, value_name = "PATH")]
    pub skipfile: Option<PathBuf>,

    /// Number of addr2line workers
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: u16,

    /// Resolve every symbol, even at addresses already seen
    #[arg(long)]
    pub no_dedupe: bool,

    /// Map bare file names back to full paths using the source tree
    #[arg(long)]
    pub disambiguate: bool,

    /// Don't print interim statistics
    #[arg(long)]
    pub no_progress: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Lookups per addr2line process before it is restarted
    #[arg(long, default_value_t = 2000, value_parser = clap::value_parser!(u32).range(1..))]
    pub recycle_after: u32,

    /// Random spread of the restart point, in percent
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub recycle_jitter: u32,
}

impl Args {
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        let source = match self.nm_infile {
            Some(ref path) => SymbolSource::File(path.clone()),
            None => SymbolSource::Nm { nm: self.nm.clone(), library: self.library.clone() },
        };

        let mut pool = PoolConfig::new(&self.addr2line, &self.library);
        pool.workers = usize::from(self.threads);
        pool.dedupe = !self.no_dedupe;
        pool.disambiguate = self.disambiguate;
        pool.recycle =
            RecyclePolicy { base: self.recycle_after, jitter_percent: self.recycle_jitter };

        PipelineConfig {
            source,
            outfile: self.outfile.clone(),
            failfile: self.failfile.clone(),
            skipfile: self.skipfile.clone(),
            pool,
            progress_interval: (!self.no_progress).then_some(DEFAULT_PROGRESS_INTERVAL),
            termination_timeout: DEFAULT_TERMINATION_TIMEOUT,
        }
    }
}
