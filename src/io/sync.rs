// line_channel/src/io/sync.rs

use super::common::{self, join_fields, split_fields, strip_terminator};
use super::OpenError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Take an advisory lock, retrying until `timeout` elapses.
fn acquire_lock(file: &File, timeout: Duration, exclusive: bool) -> Result<(), OpenError> {
    let start = Instant::now();

    loop {
        let attempt = if exclusive {
            FileExt::try_lock_exclusive(file)
        } else {
            FileExt::try_lock_shared(file)
        };

        match attempt {
            Ok(()) => return Ok(()),
            Err(_) => {
                let wait = common::after_failed_lock(start, timeout)?;
                std::thread::sleep(wait);
            }
        }
    }
}

/// Lock a newly opened file and return the descriptor that carries the lock.
///
/// `held` is a descriptor already locked by the same channel on the same
/// file. Its lock is shared through a duplicate instead of contending with
/// it; a writer upgrades it to exclusive.
pub(crate) fn lock_handle(
    file: &File,
    timeout: Duration,
    exclusive: bool,
    held: Option<&File>,
) -> Result<File, OpenError> {
    match held {
        Some(held) => {
            let guard = held.try_clone()?;
            if exclusive {
                acquire_lock(&guard, timeout, true)?;
            }
            Ok(guard)
        }
        None => {
            acquire_lock(file, timeout, exclusive)?;
            Ok(file.try_clone()?)
        }
    }
}

/// Resolve `path` for comparing against files a channel already holds.
pub(crate) fn file_identity(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Sequential line reader over one file.
pub struct LineReader {
    reader: BufReader<File>,
    line: String,
    path: PathBuf,
    lock: Option<File>,
}

impl LineReader {
    /// Open an existing file with the cursor at its first line.
    ///
    /// With a lock timeout, a shared lock is held until the reader is
    /// dropped.
    pub fn open(path: impl AsRef<Path>, lock_timeout: Option<Duration>) -> Result<Self, OpenError> {
        Self::open_sharing(path.as_ref(), lock_timeout, None)
    }

    pub(crate) fn open_sharing(
        path: &Path,
        lock_timeout: Option<Duration>,
        held: Option<&File>,
    ) -> Result<Self, OpenError> {
        let file = OpenOptions::new().read(true).open(path)?;
        let lock = match lock_timeout {
            Some(timeout) => Some(lock_handle(&file, timeout, false, held)?),
            None => None,
        };

        Ok(Self {
            reader: BufReader::new(file),
            line: String::new(),
            path: file_identity(path),
            lock,
        })
    }

    /// Canonical path of the file being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn lock(&self) -> Option<&File> {
        self.lock.as_ref()
    }

    /// Read the next line and split it into fields. `None` at end of file.
    pub fn read_fields(&mut self, separator: &str) -> io::Result<Option<Vec<String>>> {
        self.line.clear();
        match self.reader.read_line(&mut self.line)? {
            0 => Ok(None),
            _ => Ok(Some(split_fields(strip_terminator(&self.line), separator))),
        }
    }
}

/// Sequential line writer over one truncated file.
pub struct LineWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    lock: Option<File>,
}

impl LineWriter {
    /// Create or truncate a file for writing.
    ///
    /// With a lock timeout, the exclusive lock is taken before truncating and
    /// held until the writer is dropped, so a locked file is never emptied.
    pub fn create(path: impl AsRef<Path>, lock_timeout: Option<Duration>) -> Result<Self, OpenError> {
        Self::create_sharing(path.as_ref(), lock_timeout, None)
    }

    pub(crate) fn create_sharing(
        path: &Path,
        lock_timeout: Option<Duration>,
        held: Option<&File>,
    ) -> Result<Self, OpenError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let lock = match lock_timeout {
            Some(timeout) => Some(lock_handle(&file, timeout, true, held)?),
            None => None,
        };
        file.set_len(0)?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: file_identity(path),
            lock,
        })
    }

    /// Canonical path of the file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn lock(&self) -> Option<&File> {
        self.lock.as_ref()
    }

    /// Append one line and flush it.
    pub fn write_fields<S: AsRef<str>>(&mut self, fields: &[S], separator: &str) -> io::Result<()> {
        let line = join_fields(fields, separator);
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()
    }
}
