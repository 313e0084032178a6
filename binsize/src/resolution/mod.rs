//! # Address Resolution
//!
//! Maps symbol addresses to source locations by driving external `addr2line`
//! processes in parallel.
//!
//! ## Flow for one record
//!
//! ```text
//! Record ──▶ Deduplicator ──(first at address)──▶ addr2line ──▶ name + file:line
//!                │                                                  │
//!                └──(seen before)──▶ dropped                        ▼
//!                                              LocationNormalizer: canonicalize,
//!                                              disambiguate bare names, strip root
//! ```
//!
//! ## Module Structure
//!
//! - **`pool`**: worker threads, input/output channels, shutdown
//! - **`process`**: one interactive addr2line child per worker
//! - **`recycle`**: jittered restart schedule bounding addr2line memory
//! - **`dedupe`**: atomic first-claim per address
//! - **`disambiguation`**: bare file name index over the source tree
//! - **`location`**: canonicalization and project-root stripping
//! - **`layout`**: project root and build directory from the library path
//! - **`stats`**: lock-free counters for progress and the final summary

pub mod dedupe;
pub mod disambiguation;
pub mod layout;
pub mod location;
pub mod pool;
pub mod process;
pub mod recycle;
pub mod stats;

pub use dedupe::Deduplicator;
pub use disambiguation::DisambiguationTable;
pub use layout::ProjectLayout;
pub use location::LocationNormalizer;
pub use pool::{Addr2LineWorkerPool, PoolConfig};
pub use process::{ResolverCommand, ResolverProcess};
pub use recycle::RecyclePolicy;
pub use stats::{ResolutionStats, StatsSnapshot};
