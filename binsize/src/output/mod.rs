//! Result files
//!
//! Records are written back out in nm's own `-S -l` format so existing size
//! tooling can read them.

pub mod writer;

pub use writer::OutputWriter;
