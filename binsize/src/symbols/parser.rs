//! nm line grammar
//!
//! Each line of `nm -S` output is either a sized symbol, which becomes a
//! [`Record`], or something else (file headers, blank lines, undefined symbols
//! without an address) that is routed to the skip sink.

use log::{debug, warn};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Record;

/// `<address> <size> [<type>] [<name>][\t<location>]`
///
/// Addresses and sizes are 8 hex digits (32-bit dumps) or 16 (64-bit dumps).
const LINE_PATTERN: &str = concat!(
    r"^(?i)([0-9a-f]{8}(?:[0-9a-f]{8})?)",
    r"[ ]+([0-9a-f]{8}(?:[0-9a-f]{8})?)",
    r"(?:[ ]+(\S))?",
    r"(?:[ ]+([^\t]*))?",
    r"(?:\t(.*))?$",
);

/// Symbol whose nm entry lacks usable size information
pub const ICU_DATA_SYMBOL: &str = "icudt46_dat";
const ICU_DATA_FILE: &str = "third_party/icu/android/icudt46l.dat";
const ICU_DATA_SOURCE: &str = "third_party/icu/android/icudt46l_dat.S";

/// Result of parsing one dump line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Needs resolution through the worker pool
    Record(Record),
    /// Already resolved, goes straight to output
    Resolved(Record),
    /// Not a symbol line
    Skipped(String),
}

/// Synthetic resolution for the ICU data blob.
///
/// The blob is linked in from an assembly wrapper around a data file, so nm
/// reports no useful size and addr2line no useful location. The size is taken
/// from the data file on disk and the location pinned to the wrapper.
#[derive(Debug, Clone)]
pub struct IcuDataRule {
    data_file: PathBuf,
    source_path: String,
}

impl IcuDataRule {
    /// Rule for the standard ICU layout under `project_root`
    #[must_use]
    pub fn for_project(project_root: &Path) -> Self {
        Self {
            data_file: project_root.join(ICU_DATA_FILE),
            source_path: ICU_DATA_SOURCE.to_string(),
        }
    }

    /// Resolve `record` if it is the ICU data symbol. Returns the record back
    /// untouched when the rule does not apply.
    fn apply(&self, mut record: Record) -> Result<Record, Record> {
        if record.symbol_name != ICU_DATA_SYMBOL {
            return Err(record);
        }
        match fs::metadata(&self.data_file) {
            Ok(meta) => {
                record.size = format!("{:08x}", meta.len());
                record.mark_resolved(self.source_path.clone());
                debug!("Synthesized ICU data record: {record}");
                Ok(record)
            }
            Err(e) => {
                warn!("Cannot size ICU data from {}: {e}", self.data_file.display());
                Err(record)
            }
        }
    }
}

/// Parses nm output lines into records
pub struct LineRecordParser {
    pattern: Regex,
    icu: Option<IcuDataRule>,
}

impl LineRecordParser {
    /// # Errors
    /// Returns an error if the line grammar fails to compile
    pub fn new(icu: Option<IcuDataRule>) -> Result<Self, regex::Error> {
        Ok(Self { pattern: Regex::new(LINE_PATTERN)?, icu })
    }

    /// Classify one line of the dump
    #[must_use]
    pub fn parse_line(&self, line: &str) -> ParsedLine {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(caps) = self.pattern.captures(line) else {
            return ParsedLine::Skipped(line.to_string());
        };

        let symbol_type = caps.get(3).and_then(|m| m.as_str().chars().next());
        let name = caps.get(4).map_or("", |m| m.as_str().trim());
        let mut record = Record::new(&caps[1], &caps[2], symbol_type, name);
        if let Some(location) = caps.get(5).map(|m| m.as_str().trim()).filter(|l| !l.is_empty()) {
            record = record.with_location(location);
        }

        match self.icu {
            Some(ref rule) => match rule.apply(record) {
                Ok(resolved) => ParsedLine::Resolved(resolved),
                Err(record) => ParsedLine::Record(record),
            },
            None => ParsedLine::Record(record),
        }
    }
}
