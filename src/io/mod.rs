mod common;
mod sync;
pub(crate) use sync::file_identity;
pub use sync::{LineReader, LineWriter};

#[cfg(feature = "tokio")]
mod asyncio;
#[cfg(feature = "tokio")]
pub(crate) use asyncio::file_identity as async_file_identity;
#[cfg(feature = "tokio")]
pub use asyncio::{AsyncLineReader, AsyncLineWriter};


use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which side of a channel an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => f.write_str("read"),
            Direction::Write => f.write_str("write"),
        }
    }
}

/// Errors returned by channel operations.
///
/// Contract violations (bad mode, no handle open) and I/O failures on an
/// already open handle. Failing to open a file is not an error here; `open`
/// reports it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("unsupported file mode: {0}")]
    UnsupportedMode(String),

    #[error("no {0} channel open")]
    InvalidState(Direction),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::convert::Infallible> for ChannelError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// Errors while acquiring a file handle.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is already locked by another process")]
    AlreadyLocked,

    #[error("Failed to acquire lock within {0:?}")]
    LockTimeout(Duration),
}
