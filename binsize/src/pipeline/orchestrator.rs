//! End-to-end run: dump → parse → resolve → write
//!
//! Threads while a run is in flight:
//! - the caller, reading the dump and feeding the pool (blocks on backpressure)
//! - one thread per addr2line worker
//! - the output spooler, draining resolved records into the result files
//! - the progress reporter, unless disabled

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Receiver, TryRecvError};
use log::info;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::progress::{InputStats, ProgressReporter, Summary};
use crate::domain::{AnalysisError, Record};
use crate::output::OutputWriter;
use crate::resolution::{Addr2LineWorkerPool, PoolConfig};
use crate::symbols::{IcuDataRule, LineRecordParser, ParsedLine, SymbolDump, SymbolSource};

/// Upper bound on the final wait for workers once input is exhausted
pub const DEFAULT_TERMINATION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Spooler sleep when no resolved records are waiting
const SPOOL_IDLE: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: SymbolSource,
    pub outfile: PathBuf,
    pub failfile: Option<PathBuf>,
    pub skipfile: Option<PathBuf>,
    pub pool: PoolConfig,
    /// `None` disables interim statistics
    pub progress_interval: Option<Duration>,
    pub termination_timeout: Duration,
}

type SharedWriter = Arc<Mutex<OutputWriter>>;

fn lock(writer: &Mutex<OutputWriter>) -> MutexGuard<'_, OutputWriter> {
    writer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run the whole pipeline and return its statistics
///
/// # Errors
/// Returns an error on configuration problems, symbol dump failure, result
/// file I/O failure, resolver desynchronization, or a stalled pool
pub fn run(config: &PipelineConfig) -> Result<Summary> {
    let started = Instant::now();

    // Locating the project root is a configuration check, so the pool goes
    // first and nm only runs once it has passed
    let mut pool = Addr2LineWorkerPool::new(config.pool.clone())
        .context("Failed to start addr2line workers")?;
    let dump = SymbolDump::open(&config.source).context("Failed to dump symbols")?;
    let icu = IcuDataRule::for_project(pool.layout().project_root());
    let parser = LineRecordParser::new(Some(icu))?;

    let writer = OutputWriter::create(
        &config.outfile,
        config.failfile.as_deref(),
        config.skipfile.as_deref(),
    )
    .with_context(|| format!("Failed to create {}", config.outfile.display()))?;
    let writer: SharedWriter = Arc::new(Mutex::new(writer));
    let input_stats = Arc::new(InputStats::default());

    let spooler = OutputSpooler::start(pool.output(), Arc::clone(&writer))?;
    let mut progress = config
        .progress_interval
        .map(|interval| {
            ProgressReporter::start(interval, Arc::clone(&input_stats), pool.stats(), started)
        })
        .transpose()?;

    info!(
        "Resolving {} with {} workers",
        pool.layout().library().display(),
        config.pool.workers.max(1)
    );
    let spooled = spool_tasks(dump, &parser, &pool, &writer, &input_stats);
    pool.all_records_submitted();
    let terminated = pool.await_termination(config.termination_timeout);
    if let Some(ref mut reporter) = progress {
        reporter.stop();
    }

    // A worker's fatal error explains a failed submit, so report it first
    let terminated = terminated?;
    spooled?;
    if !terminated {
        return Err(AnalysisError::PoolStalled(config.termination_timeout).into());
    }

    let spooled = spooler.join()?;
    {
        let mut writer = lock(&writer);
        writer.flush().context("Failed to flush results")?;
        info!(
            "Wrote {} records ({spooled} from workers, {} failed) to {}",
            writer.records_written(),
            writer.failures_written(),
            config.outfile.display()
        );
    }

    Ok(Summary::capture(&input_stats, &pool.stats(), started.elapsed()))
}

/// Feed every dump line to the pool, or straight to output when no
/// resolution is needed
fn spool_tasks(
    dump: SymbolDump,
    parser: &LineRecordParser,
    pool: &Addr2LineWorkerPool,
    writer: &Mutex<OutputWriter>,
    stats: &InputStats,
) -> Result<()> {
    for line in dump.lines() {
        let line = line.context("Failed to read symbol dump")?;
        match parser.parse_line(&line) {
            ParsedLine::Record(record) => {
                pool.submit(record)?;
                stats.record_queued();
            }
            ParsedLine::Resolved(record) => {
                lock(writer).write_record(&record).context("Failed to write result")?;
                stats.record_synthetic();
            }
            ParsedLine::Skipped(line) => {
                lock(writer).write_skipped(&line).context("Failed to write skipped line")?;
                stats.record_skipped();
            }
        }
    }
    Ok(())
}

/// Drains the pool's unbounded output while input is still being fed
struct OutputSpooler {
    handle: JoinHandle<io::Result<u64>>,
}

impl OutputSpooler {
    fn start(output: Receiver<Record>, writer: SharedWriter) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name("output-spooler".to_string())
            .spawn(move || Self::drain(&output, &writer))?;
        Ok(Self { handle })
    }

    fn drain(output: &Receiver<Record>, writer: &Mutex<OutputWriter>) -> io::Result<u64> {
        let mut spooled = 0u64;
        loop {
            match output.try_recv() {
                Ok(first) => {
                    let mut writer = lock(writer);
                    for record in std::iter::once(first).chain(output.try_iter()) {
                        writer.write_record(&record)?;
                        spooled += 1;
                    }
                }
                Err(TryRecvError::Empty) => thread::sleep(SPOOL_IDLE),
                Err(TryRecvError::Disconnected) => return Ok(spooled),
            }
        }
    }

    fn join(self) -> Result<u64> {
        self.handle
            .join()
            .map_err(|_| anyhow!("Output spooler panicked"))?
            .context("Failed to write results")
    }
}
