use super::common::{self, join_fields, split_fields, strip_terminator};
use super::OpenError;
use fs2::FileExt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

async fn acquire_lock(file: &std::fs::File, timeout: Duration, exclusive: bool) -> Result<(), OpenError> {
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
                tokio::time::sleep(wait).await;
            }
        }
    }
}

// Same contract as the sync `lock_handle`.
async fn lock_handle(
    file: &std::fs::File,
    timeout: Duration,
    exclusive: bool,
    held: Option<&std::fs::File>,
) -> Result<std::fs::File, OpenError> {
    match held {
        Some(held) => {
            let guard = held.try_clone()?;
            if exclusive {
                acquire_lock(&guard, timeout, true).await?;
            }
            Ok(guard)
        }
        None => {
            acquire_lock(file, timeout, exclusive).await?;
            Ok(file.try_clone()?)
        }
    }
}

pub(crate) async fn file_identity(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

pub struct AsyncLineReader {
    reader: BufReader<File>,
    line: String,
    path: PathBuf,
    lock: Option<std::fs::File>,
}

impl AsyncLineReader {
    pub async fn open(path: impl AsRef<Path>, lock_timeout: Option<Duration>) -> Result<Self, OpenError> {
        Self::open_sharing(path.as_ref(), lock_timeout, None).await
    }

    pub(crate) async fn open_sharing(
        path: &Path,
        lock_timeout: Option<Duration>,
        held: Option<&std::fs::File>,
    ) -> Result<Self, OpenError> {
        let sync_file = std::fs::OpenOptions::new().read(true).open(path)?;
        let lock = match lock_timeout {
            Some(timeout) => Some(lock_handle(&sync_file, timeout, false, held).await?),
            None => None,
        };

        Ok(Self {
            reader: BufReader::new(File::from_std(sync_file)),
            line: String::new(),
            path: file_identity(path).await,
            lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn lock(&self) -> Option<&std::fs::File> {
        self.lock.as_ref()
    }

    pub async fn read_fields(&mut self, separator: &str) -> io::Result<Option<Vec<String>>> {
        self.line.clear();
        match self.reader.read_line(&mut self.line).await? {
            0 => Ok(None),
            _ => Ok(Some(split_fields(strip_terminator(&self.line), separator))),
        }
    }
}

pub struct AsyncLineWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    lock: Option<std::fs::File>,
}

impl AsyncLineWriter {
    pub async fn create(path: impl AsRef<Path>, lock_timeout: Option<Duration>) -> Result<Self, OpenError> {
        Self::create_sharing(path.as_ref(), lock_timeout, None).await
    }

    pub(crate) async fn create_sharing(
        path: &Path,
        lock_timeout: Option<Duration>,
        held: Option<&std::fs::File>,
    ) -> Result<Self, OpenError> {
        let sync_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let lock = match lock_timeout {
            Some(timeout) => Some(lock_handle(&sync_file, timeout, true, held).await?),
            None => None,
        };
        sync_file.set_len(0)?;

        Ok(Self {
            writer: BufWriter::new(File::from_std(sync_file)),
            path: file_identity(path).await,
            lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn lock(&self) -> Option<&std::fs::File> {
        self.lock.as_ref()
    }

    pub async fn write_fields<S: AsRef<str>>(&mut self, fields: &[S], separator: &str) -> io::Result<()> {
        let line = join_fields(fields, separator);
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await
    }
}
