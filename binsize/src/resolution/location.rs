//! Source location normalization
//!
//! Turns what addr2line printed into a stable, root-relative location:
//!
//! ```text
//! /src/out/Release/../../base/logging.cc:42  → base/logging.cc:42   (canonicalized)
//! logging.cc:42                              → base/logging.cc:42   (disambiguated)
//! /usr/include/c++/v1/string:210             → unchanged            (outside the root)
//! ```

use log::debug;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::disambiguation::DisambiguationTable;
use super::layout::ProjectLayout;
use super::stats::ResolutionStats;

pub struct LocationNormalizer {
    layout: ProjectLayout,
    table: Option<Arc<DisambiguationTable>>,
    stats: Arc<ResolutionStats>,
}

impl LocationNormalizer {
    #[must_use]
    pub fn new(
        layout: ProjectLayout,
        table: Option<Arc<DisambiguationTable>>,
        stats: Arc<ResolutionStats>,
    ) -> Self {
        Self { layout, table, stats }
    }

    /// Normalize a resolved location. Same input, same output.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let location = if raw.starts_with('/') {
            canonicalize_location(raw)
        } else if let Some(ref table) = self.table {
            self.disambiguate(table, raw)
        } else {
            raw.to_string()
        };
        self.layout.strip_root(&location).to_string()
    }

    fn disambiguate(&self, table: &DisambiguationTable, raw: &str) -> String {
        let (path, line) = split_line_suffix(raw);
        let file_name = path.rsplit('/').next().unwrap_or(path);
        match table.lookup(file_name) {
            Some(found) => {
                self.stats.record_disambiguation(true);
                format!("{}{line}", found.display())
            }
            None => {
                self.stats.record_disambiguation(false);
                raw.to_string()
            }
        }
    }
}

/// Split `path:line` into (`path`, `:line`). addr2line prints `?` for an
/// unknown line and may append ` (discriminator N)`.
fn split_line_suffix(location: &str) -> (&str, &str) {
    match location.rfind(':') {
        Some(idx) if location[idx + 1..].starts_with(|c: char| c.is_ascii_digit() || c == '?') => {
            location.split_at(idx)
        }
        _ => (location, ""),
    }
}

fn canonicalize_location(raw: &str) -> String {
    let (path, line) = split_line_suffix(raw);
    match fs::canonicalize(Path::new(path)) {
        Ok(canonical) => format!("{}{line}", canonical.display()),
        Err(e) => {
            debug!("Cannot canonicalize {path}: {e}");
            raw.to_string()
        }
    }
}
