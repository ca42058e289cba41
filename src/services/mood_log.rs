use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::models::history::HistoryRow;

pub const HEADER: &str = "Date,Mood,Score";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Mood log I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Mood log format error: {0}")]
    Csv(#[from] csv::Error),
}

/// Append-only history of past submissions.
pub trait MoodLog: Send + Sync {
    fn append(&self, row: &HistoryRow) -> Result<(), StorageError>;

    /// Every row, in the order it was written.
    fn read_all(&self) -> Result<Vec<HistoryRow>, StorageError>;
}

/// Flat `Date,Mood,Score` file.
pub struct CsvMoodLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvMoodLog {
    /// Creates the file with only the header line if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{HEADER}")?;
                tracing::info!(path = %path.display(), "Created empty mood log");
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MoodLog for CsvMoodLog {
    fn append(&self, row: &HistoryRow) -> Result<(), StorageError> {
        // A poisoned lock only means another append panicked; the file is still usable.
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        // Deleted or truncated since startup: restore the header before the first row.
        if file.metadata()?.len() == 0 {
            writeln!(file, "{HEADER}")?;
            tracing::warn!(path = %self.path.display(), "Mood log was empty, rewrote header");
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<HistoryRow>, StorageError> {
        let mut reader = match csv::Reader::from_path(&self.path) {
            Ok(reader) => reader,
            Err(e) => match e.kind() {
                csv::ErrorKind::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
                    return Ok(Vec::new())
                }
                _ => return Err(e.into()),
            },
        };

        reader
            .deserialize()
            .collect::<Result<Vec<HistoryRow>, _>>()
            .map_err(StorageError::from)
    }
}

/// In-memory log for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryMoodLog {
    rows: Mutex<Vec<HistoryRow>>,
}

#[cfg(test)]
impl MemoryMoodLog {
    pub fn with_rows(rows: Vec<HistoryRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }
}

#[cfg(test)]
impl MoodLog for MemoryMoodLog {
    fn append(&self, row: &HistoryRow) -> Result<(), StorageError> {
        self.rows.lock().unwrap().push(row.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<HistoryRow>, StorageError> {
        Ok(self.rows.lock().unwrap().clone())
    }
}
