//! CSV output sink
//!
//! Rows are appended to the file as each member page completes. The header row
//! is written only when the file is new or empty, so repeated runs keep adding
//! to one table.

use crate::output::traits::{OutputRow, OutputSink, SinkError, SinkResult};
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

const SEPARATOR: char = ',';

fn needs_quotes(field: &str) -> bool {
    field.contains(SEPARATOR) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Writes a single CSV row to any writer
pub fn write_row<W: Write>(mut w: W, row: &[&str]) -> std::io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, "{}", SEPARATOR)?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Formats `rows` in memory and hands them to `w` in a single write
///
/// Nothing is buffered between calls, so a failed batch never leaks bytes into
/// the next one.
pub fn write_batch<W: Write>(w: &mut W, rows: &[OutputRow]) -> std::io::Result<()> {
    let mut buf = Vec::new();
    for row in rows {
        write_row(&mut buf, &row.fields())?;
    }
    w.write_all(&buf)?;
    w.flush()
}

/// [`OutputSink`] appending to a CSV file
pub struct CsvSink {
    file: Mutex<File>,
}

impl CsvSink {
    /// Opens `path` for appending, creating it with a header row if needed
    ///
    /// # Returns
    ///
    /// * `Ok(CsvSink)` - The file is open and its header is in place
    /// * `Err(SinkError)` - The file could not be opened or written
    pub fn open(path: &Path) -> SinkResult<Self> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if file.metadata()?.len() == 0 {
            let mut header = Vec::new();
            write_row(&mut header, &OutputRow::HEADER)?;
            file.write_all(&header)?;
        }

        tracing::debug!("Appending rows to {}", path.display());

        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl OutputSink for CsvSink {
    async fn append(&self, rows: &[OutputRow]) -> SinkResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut file = self.file.lock().map_err(|_| SinkError::Poisoned)?;
        write_batch(&mut *file, rows)?;
        Ok(())
    }
}
