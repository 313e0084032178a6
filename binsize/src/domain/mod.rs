//! Domain model for binsize
//!
//! This module contains core domain types and errors:
//! - The symbol [`Record`] passed between pipeline stages
//! - Structured error handling

pub mod errors;
pub mod record;

pub use errors::AnalysisError;
pub use record::{is_unresolved, Record, UNRESOLVED_LOCATION, UNRESOLVED_NAME};
