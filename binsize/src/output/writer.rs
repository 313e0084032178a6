use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::domain::Record;

/// Main, fail and skip streams
///
/// Every record goes to the main stream; failed records are copied to the
/// fail stream and non-symbol lines to the skip stream when those exist.
pub struct OutputWriter<W: Write = BufWriter<File>> {
    main: W,
    fail: Option<W>,
    skip: Option<W>,
    records: u64,
    failures: u64,
}

impl OutputWriter<BufWriter<File>> {
    /// Create (truncate) the output files
    ///
    /// # Errors
    /// Returns an error if any of the files cannot be created
    pub fn create(
        outfile: &Path,
        failfile: Option<&Path>,
        skipfile: Option<&Path>,
    ) -> io::Result<Self> {
        let open = |path: &Path| File::create(path).map(BufWriter::new);
        let fail = failfile.map(open).transpose()?;
        let skip = skipfile.map(open).transpose()?;
        Ok(Self::new(open(outfile)?, fail, skip))
    }
}

impl<W: Write> OutputWriter<W> {
    pub fn new(main: W, fail: Option<W>, skip: Option<W>) -> Self {
        Self { main, fail, skip, records: 0, failures: 0 }
    }

    /// # Errors
    /// Returns an error if a write fails
    pub fn write_record(&mut self, record: &Record) -> io::Result<()> {
        writeln!(self.main, "{record}")?;
        self.records += 1;
        if !record.resolved_successfully() {
            self.failures += 1;
            if let Some(ref mut fail) = self.fail {
                writeln!(fail, "{record}")?;
            }
        }
        Ok(())
    }

    /// # Errors
    /// Returns an error if the write fails
    pub fn write_skipped(&mut self, line: &str) -> io::Result<()> {
        match self.skip {
            Some(ref mut skip) => writeln!(skip, "{line}"),
            None => Ok(()),
        }
    }

    /// Records written to the main stream so far
    #[must_use]
    pub fn records_written(&self) -> u64 {
        self.records
    }

    #[must_use]
    pub fn failures_written(&self) -> u64 {
        self.failures
    }

    /// # Errors
    /// Returns an error if any stream fails to flush
    pub fn flush(&mut self) -> io::Result<()> {
        self.main.flush()?;
        for stream in [self.fail.as_mut(), self.skip.as_mut()].into_iter().flatten() {
            stream.flush()?;
        }
        Ok(())
    }

    /// Flush and hand back the underlying streams
    ///
    /// # Errors
    /// Returns an error if any stream fails to flush
    pub fn into_inner(mut self) -> io::Result<(W, Option<W>, Option<W>)> {
        self.flush()?;
        Ok((self.main, self.fail, self.skip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(buf: &[u8]) -> &str {
        std::str::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_routes_records() {
        let mut writer = OutputWriter::new(Vec::new(), Some(Vec::new()), Some(Vec::new()));

        let mut ok = Record::new("00001000", "00000010", Some('t'), "ok");
        ok.mark_resolved("base/a.cc:1".to_string());
        let failed = Record::new("00002000", "00000020", Some('d'), "failed");

        writer.write_record(&ok).unwrap();
        writer.write_record(&failed).unwrap();
        writer.write_skipped("libx.so:").unwrap();
        assert_eq!(writer.records_written(), 2);
        assert_eq!(writer.failures_written(), 1);

        let (main, fail, skip) = writer.into_inner().unwrap();
        assert_eq!(
            text(&main),
            "00001000 00000010 t ok\tbase/a.cc:1\n00002000 00000020 d failed\n"
        );
        assert_eq!(text(&fail.unwrap()), "00002000 00000020 d failed\n");
        assert_eq!(text(&skip.unwrap()), "libx.so:\n");
    }

    #[test]
    fn test_optional_streams() {
        let mut writer: OutputWriter<Vec<u8>> = OutputWriter::new(Vec::new(), None, None);
        writer.write_record(&Record::new("00002000", "00000020", Some('d'), "failed")).unwrap();
        writer.write_skipped("ignored").unwrap();
        let (main, fail, skip) = writer.into_inner().unwrap();
        assert_eq!(text(&main), "00002000 00000020 d failed\n");
        assert!(fail.is_none() && skip.is_none());
    }

    #[test]
    fn test_create_files() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out.txt");
        let skip = tmp.path().join("skip.txt");
        let mut writer = OutputWriter::create(&out, None, Some(&skip)).unwrap();
        writer.write_skipped("header").unwrap();
        writer.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&skip).unwrap(), "header\n");
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "");
    }
}
