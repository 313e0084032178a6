//! # addr2line Worker Pool
//!
//! ```text
//!            bounded(1000)                       unbounded
//! producer ──▶ [ input ] ──▶ worker 0 ⇄ addr2line ──▶ [ output ] ──▶ spooler
//!                      ├─▶ worker 1 ⇄ addr2line ──┤
//!                      └─▶ worker N ⇄ addr2line ──┘
//! ```
//!
//! Each worker owns exactly one resolver process. The bounded input channel
//! pushes back on the producer when resolution falls behind; the output
//! channel never blocks a worker. Output order across workers is unspecified.

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::dedupe::Deduplicator;
use super::disambiguation::DisambiguationTable;
use super::layout::ProjectLayout;
use super::location::LocationNormalizer;
use super::process::{ResolverCommand, ResolverProcess};
use super::recycle::RecyclePolicy;
use super::stats::ResolutionStats;
use crate::domain::{is_unresolved, AnalysisError, Record};

/// Pending records the producer may run ahead of the workers
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// How long an idle worker waits before re-checking for shutdown
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub workers: usize,
    pub addr2line: PathBuf,
    pub library: PathBuf,
    pub disambiguate: bool,
    pub dedupe: bool,
    pub recycle: RecyclePolicy,
    pub queue_capacity: usize,
    pub poll_interval: Duration,
}

impl PoolConfig {
    /// Single worker, dedupe on, disambiguation off
    #[must_use]
    pub fn new(addr2line: impl Into<PathBuf>, library: impl Into<PathBuf>) -> Self {
        Self {
            workers: 1,
            addr2line: addr2line.into(),
            library: library.into(),
            disambiguate: false,
            dedupe: true,
            recycle: RecyclePolicy::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

type WorkerExit = (usize, Result<(), AnalysisError>);

pub struct Addr2LineWorkerPool {
    input: Option<Sender<Record>>,
    output: Receiver<Record>,
    all_submitted: Arc<AtomicBool>,
    exits: Receiver<WorkerExit>,
    running: usize,
    handles: Vec<JoinHandle<()>>,
    stats: Arc<ResolutionStats>,
    layout: ProjectLayout,
}

impl Addr2LineWorkerPool {
    /// Locate the project, build shared state and start every worker with
    /// its own resolver process.
    ///
    /// # Errors
    /// Returns an error if the project root cannot be located, the
    /// disambiguation table cannot be built, or a resolver fails to start
    pub fn new(config: PoolConfig) -> Result<Self, AnalysisError> {
        let layout = ProjectLayout::locate(&config.library)?;
        info!("Project root: {}", layout.project_root().display());

        // Fully built before any worker exists, read-only afterwards
        let table = if config.disambiguate {
            Some(Arc::new(DisambiguationTable::build(&layout)?))
        } else {
            None
        };

        let stats = Arc::new(ResolutionStats::default());
        let dedupe = Arc::new(Deduplicator::new(config.dedupe, Arc::clone(&stats)));
        let normalizer =
            Arc::new(LocationNormalizer::new(layout.clone(), table, Arc::clone(&stats)));
        let command = ResolverCommand {
            program: config.addr2line.clone(),
            library: layout.library().to_path_buf(),
        };

        let workers = config.workers.max(1);
        let processes = (0..workers).map(|_| command.spawn()).collect::<Result<Vec<_>, _>>()?;

        let (input_tx, input_rx) = bounded(config.queue_capacity.max(1));
        let (output_tx, output_rx) = unbounded();
        let (exit_tx, exit_rx) = unbounded();
        let all_submitted = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::with_capacity(workers);
        for (id, process) in processes.into_iter().enumerate() {
            let worker = Worker {
                id,
                input: input_rx.clone(),
                output: output_tx.clone(),
                all_submitted: Arc::clone(&all_submitted),
                dedupe: Arc::clone(&dedupe),
                normalizer: Arc::clone(&normalizer),
                stats: Arc::clone(&stats),
                command: command.clone(),
                process: Some(process),
                recycle: config.recycle,
                poll_interval: config.poll_interval,
                completed: 0,
                threshold: config.recycle.next_threshold(),
            };
            let exit_tx = exit_tx.clone();
            let handle = thread::Builder::new().name(format!("addr2line-{id}")).spawn(move || {
                let result = worker.run();
                let _ = exit_tx.send((id, result));
            })?;
            handles.push(handle);
        }
        info!("Started {workers} addr2line workers");

        Ok(Self {
            input: Some(input_tx),
            output: output_rx,
            all_submitted,
            exits: exit_rx,
            running: workers,
            handles,
            stats,
            layout,
        })
    }

    /// Queue a record, blocking while the input queue is full
    ///
    /// # Errors
    /// Returns [`AnalysisError::AllWorkersExited`] if no worker is left to take
    /// the record, or [`AnalysisError::InputClosed`] after
    /// [`all_records_submitted`](Self::all_records_submitted)
    pub fn submit(&self, record: Record) -> Result<(), AnalysisError> {
        let input = self.input.as_ref().ok_or(AnalysisError::InputClosed)?;
        input.send(record).map_err(|_| AnalysisError::AllWorkersExited)
    }

    /// Tell workers no more input is coming; they exit once the queue drains
    pub fn all_records_submitted(&mut self) {
        self.all_submitted.store(true, Ordering::Release);
        self.input = None;
    }

    /// Wait for every worker to finish.
    ///
    /// Returns `Ok(false)` if `timeout` elapses first.
    ///
    /// # Errors
    /// Returns the first fatal worker error (resolver desynchronization)
    pub fn await_termination(&mut self, timeout: Duration) -> Result<bool, AnalysisError> {
        let deadline = Instant::now() + timeout;
        let mut fatal = None;

        while self.running > 0 {
            match self.exits.recv_deadline(deadline) {
                Ok((id, result)) => {
                    self.running -= 1;
                    if let Err(e) = result {
                        error!("Worker {id} failed: {e}");
                        fatal.get_or_insert(e);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Ok(false),
                Err(RecvTimeoutError::Disconnected) => {
                    error!("{} workers exited without reporting", self.running);
                    self.running = 0;
                }
            }
        }

        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                error!("Worker thread panicked");
            }
        }

        fatal.map_or(Ok(true), Err)
    }

    /// Resolved records. Disconnects once every worker has exited.
    #[must_use]
    pub fn output(&self) -> Receiver<Record> {
        self.output.clone()
    }

    #[must_use]
    pub fn stats(&self) -> Arc<ResolutionStats> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }
}

enum Flow {
    Continue,
    Stop,
}

struct Worker {
    id: usize,
    input: Receiver<Record>,
    output: Sender<Record>,
    all_submitted: Arc<AtomicBool>,
    dedupe: Arc<Deduplicator>,
    normalizer: Arc<LocationNormalizer>,
    stats: Arc<ResolutionStats>,
    command: ResolverCommand,
    process: Option<ResolverProcess>,
    recycle: RecyclePolicy,
    poll_interval: Duration,
    completed: u32,
    threshold: u32,
}

impl Worker {
    fn run(mut self) -> Result<(), AnalysisError> {
        loop {
            let record = match self.input.recv_timeout(self.poll_interval) {
                Ok(record) => record,
                Err(RecvTimeoutError::Timeout) => {
                    if self.all_submitted.load(Ordering::Acquire) {
                        break;
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            };

            if self.dedupe.try_dedupe(&record) {
                continue;
            }
            if let Flow::Stop = self.resolve(record)? {
                break;
            }
        }
        debug!("Worker {} done", self.id);
        Ok(())
    }

    fn resolve(&mut self, mut record: Record) -> Result<Flow, AnalysisError> {
        let Some(process) = self.process.as_mut() else {
            // No resolver since a failed respawn
            self.stats.record_failed();
            self.emit(record);
            return Ok(Flow::Continue);
        };

        let answer = match process.lookup(record.address()) {
            Ok(Some(answer)) => answer,
            Ok(None) => {
                warn!(
                    "Worker {}: addr2line closed its output at {}, stopping",
                    self.id,
                    record.address()
                );
                self.stats.record_lost();
                return Ok(Flow::Stop);
            }
            Err(e) => {
                warn!(
                    "Worker {}: addr2line I/O failed at {}: {e}, stopping",
                    self.id,
                    record.address()
                );
                self.stats.record_lost();
                return Ok(Flow::Stop);
            }
        };

        let pending = process.pending_bytes();
        if pending > 0 {
            return Err(AnalysisError::Desynchronized {
                worker: self.id,
                address: record.address().to_string(),
                pending,
            });
        }

        if is_unresolved(&answer.name, &answer.location) {
            self.stats.record_failed();
        } else {
            record.mark_resolved(self.normalizer.normalize(&answer.location));
            self.stats.record_resolved();
        }
        self.emit(record);

        self.completed += 1;
        if self.completed >= self.threshold {
            self.respawn();
        }
        Ok(Flow::Continue)
    }

    fn emit(&self, record: Record) {
        if self.output.send(record).is_err() {
            debug!("Worker {}: output receiver gone", self.id);
        }
    }

    fn respawn(&mut self) {
        let old_pid = self.process.as_ref().map(ResolverProcess::id);
        // Kill the old process before starting its replacement
        self.process = None;
        match self.command.spawn() {
            Ok(process) => {
                debug!("Worker {}: recycled addr2line {old_pid:?} -> {}", self.id, process.id());
                self.process = Some(process);
                self.stats.record_recycled();
            }
            Err(e) => error!("Worker {}: {e}; further lookups on this worker will fail", self.id),
        }
        self.completed = 0;
        self.threshold = self.recycle.next_threshold();
    }
}
