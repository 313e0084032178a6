//! # binsize - Parallel Source Location Resolver for Binary Size Analysis
//!
//! binsize annotates every sized symbol of a compiled native library with the
//! source file and line it came from, so size reports can be grouped by
//! directory. Symbol listing is delegated to `nm`, line lookup to `addr2line`;
//! binsize runs many persistent `addr2line` processes in parallel and
//! stitches the results back into nm's output format.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   lines   ┌──────────────┐  Records  ┌──────────────────────┐
//! │ SymbolDump   │──────────▶│ LineRecord   │──────────▶│  Addr2LineWorkerPool │
//! │ (nm -C -S)   │           │ Parser       │ bounded   │  dedupe → addr2line  │
//! └──────────────┘           └──────┬───────┘  (1000)   │  → normalize         │
//!                                   │ skipped /          └──────────┬───────────┘
//!                                   │ synthetic                     │ unbounded
//!                                   ▼                               ▼
//!                            ┌─────────────────────────────────────────────┐
//!                            │ OutputWriter: outfile / failfile / skipfile  │
//!                            └─────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`symbols`]: nm invocation and the line grammar
//! - [`resolution`]: worker pool, addr2line processes, dedupe, disambiguation
//! - [`output`]: result files in nm format
//! - [`pipeline`]: orchestration, progress reporting, final statistics
//! - [`cli`]: command-line arguments
//! - [`domain`]: the symbol [`Record`](domain::Record) and error types
//! - [`preflight`]: input validation before any process is started
//!
//! ## Typical Usage
//!
//! ```bash
//! binsize --library out/Release/lib/libchrome.so --outfile symbols.txt \
//!         --threads 16 --disambiguate --failfile failed.txt
//! ```

pub mod cli;
pub mod domain;
pub mod output;
pub mod pipeline;
pub mod preflight;
pub mod resolution;
pub mod symbols;
