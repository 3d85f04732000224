use crate::journal::{JournalError, JournalRecord, JournalResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only journal writer
///
/// Records are buffered; terminal records and `close` force a flush. Opening
/// never creates missing parent directories: a crawl configured with a
/// journal must not silently start without one, so a bad path fails loudly
/// at startup.
pub struct Journal {
    writer: BufWriter<File>,
    path: PathBuf,
    records_written: u64,
}

impl Journal {
    /// Opens the journal for appending, creating the file if absent
    pub fn open(path: &Path) -> JournalResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| JournalError::Open {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            records_written: 0,
        })
    }

    /// Appends one record as a JSON line
    pub fn write(&mut self, record: &JournalRecord) -> JournalResult<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.records_written += 1;

        if record.is_terminal() {
            self.writer.flush()?;
        }
        Ok(())
    }

    /// Forces buffered records to the OS
    pub fn flush(&mut self) -> JournalResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and closes the journal
    pub fn close(mut self) -> JournalResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended since this handle was opened
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}
