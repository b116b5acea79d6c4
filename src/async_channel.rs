// line-channel: AsyncLineFileChannel
// ==================================

use crate::io::{async_file_identity, AsyncLineReader, AsyncLineWriter, ChannelError, Direction};
use crate::{ChannelOptions, Mode};
use log::{debug, trace, warn};
use std::path::Path;

/// Async counterpart of [`LineFileChannel`](crate::LineFileChannel).
///
/// Same slots and contracts, with file I/O done through tokio.
///
/// # Examples
///
/// ```rust
/// use line_channel::{AsyncLineFileChannel, Mode};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut channel = AsyncLineFileChannel::with_separator(",");
/// if channel.open("people.csv", Mode::Read).await? {
///     while let Some(fields) = channel.read_line().await? {
///         println!("{:?}", fields);
///     }
/// }
/// channel.close();
/// # Ok(())
/// # }
/// ```
pub struct AsyncLineFileChannel {
    options: ChannelOptions,
    read: Option<AsyncLineReader>,
    write: Option<AsyncLineWriter>,
}

impl Default for AsyncLineFileChannel {
    fn default() -> Self {
        Self::with_options(ChannelOptions::default())
    }
}

impl AsyncLineFileChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self::with_options(ChannelOptions::default().with_separator(separator))
    }

    pub fn with_options(options: ChannelOptions) -> Self {
        Self {
            options,
            read: None,
            write: None,
        }
    }

    pub fn separator(&self) -> &str {
        &self.options.separator
    }

    pub fn set_separator(&mut self, separator: impl Into<String>) {
        self.options.separator = separator.into();
    }

    pub fn is_open(&self, mode: Mode) -> bool {
        match mode {
            Mode::Read => self.read.is_some(),
            Mode::Write => self.write.is_some(),
        }
    }

    /// See [`LineFileChannel::open`](crate::LineFileChannel::open).
    pub async fn open<M>(&mut self, path: impl AsRef<Path>, mode: M) -> Result<bool, ChannelError>
    where
        M: TryInto<Mode>,
        ChannelError: From<<M as TryInto<Mode>>::Error>,
    {
        let mode: Mode = mode.try_into()?;
        let path = path.as_ref();
        let lock_timeout = self.options.lock_timeout;
        let held = match lock_timeout {
            Some(_) => self.held_lock(path).await,
            None => None,
        };

        let opened = match mode {
            Mode::Read => AsyncLineReader::open_sharing(path, lock_timeout, held).await.map(|reader| {
                if self.read.replace(reader).is_some() {
                    debug!("replaced previous read handle");
                }
            }),
            Mode::Write => AsyncLineWriter::create_sharing(path, lock_timeout, held).await.map(|writer| {
                if self.write.replace(writer).is_some() {
                    debug!("replaced previous write handle");
                }
            }),
        };

        match opened {
            Ok(()) => {
                debug!("opened {} for {:?}", path.display(), mode);
                Ok(true)
            }
            Err(e) => {
                warn!("failed to open {} for {:?}: {}", path.display(), mode, e);
                Ok(false)
            }
        }
    }

    async fn held_lock(&self, path: &Path) -> Option<&std::fs::File> {
        let identity = async_file_identity(path).await;
        let writer = self
            .write
            .as_ref()
            .filter(|w| w.path() == identity.as_path())
            .and_then(AsyncLineWriter::lock);
        let reader = self
            .read
            .as_ref()
            .filter(|r| r.path() == identity.as_path())
            .and_then(AsyncLineReader::lock);
        writer.or(reader)
    }

    pub async fn read_line(&mut self) -> Result<Option<Vec<String>>, ChannelError> {
        let reader = self
            .read
            .as_mut()
            .ok_or(ChannelError::InvalidState(Direction::Read))?;

        let fields = reader.read_fields(&self.options.separator).await?;
        trace!("read line: {:?}", fields);
        Ok(fields)
    }

    pub async fn write_line<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<(), ChannelError> {
        let writer = self
            .write
            .as_mut()
            .ok_or(ChannelError::InvalidState(Direction::Write))?;

        writer.write_fields(fields, &self.options.separator).await?;
        trace!("wrote line with {} fields", fields.len());
        Ok(())
    }

    /// Release both handles. Does not need to be awaited; the files close on
    /// drop.
    pub fn close(&mut self) {
        let had_read = self.read.take().is_some();
        let had_write = self.write.take().is_some();
        if had_read || had_write {
            debug!("closed channel (read: {}, write: {})", had_read, had_write);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::{tempdir, NamedTempFile};

    #[tokio::test]
    async fn read_without_handle_is_invalid_state() {
        let mut channel = AsyncLineFileChannel::new();
        assert!(matches!(
            channel.read_line().await,
            Err(ChannelError::InvalidState(Direction::Read))
        ));
        assert!(matches!(
            channel.write_line(&["a"]).await,
            Err(ChannelError::InvalidState(Direction::Write))
        ));
    }

    #[tokio::test]
    async fn missing_file_open_fails_softly() {
        let dir = tempdir().unwrap();
        let mut channel = AsyncLineFileChannel::new();

        assert!(!channel.open(dir.path().join("missing"), Mode::Read).await.unwrap());
        assert!(!channel.is_open(Mode::Read));
    }

    #[tokio::test]
    async fn unsupported_mode_is_rejected() {
        let temp = NamedTempFile::new().unwrap();
        let mut channel = AsyncLineFileChannel::new();

        let result = channel.open(temp.path(), 7u8).await;
        assert!(matches!(result, Err(ChannelError::UnsupportedMode(_))));
        assert!(!channel.is_open(Mode::Read));
        assert!(!channel.is_open(Mode::Write));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let temp = NamedTempFile::new().unwrap();
        let mut channel = AsyncLineFileChannel::new();
        assert!(channel.open(temp.path(), Mode::Write).await.unwrap());

        channel.close();
        channel.close();
        assert!(!channel.is_open(Mode::Write));
    }

    fn file_with(content: &str) -> NamedTempFile {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), content).unwrap();
        temp
    }

    #[tokio::test]
    async fn read_needs_read_handle_even_with_writer_open() {
        let temp = NamedTempFile::new().unwrap();
        let mut channel = AsyncLineFileChannel::new();
        assert!(channel.open(temp.path(), Mode::Write).await.unwrap());

        assert!(matches!(
            channel.read_line().await,
            Err(ChannelError::InvalidState(Direction::Read))
        ));
    }

    #[tokio::test]
    async fn failed_open_keeps_existing_handle() {
        let source = file_with("one\ntwo\n");
        let dir = tempdir().unwrap();
        let mut channel = AsyncLineFileChannel::new();
        assert!(channel.open(source.path(), Mode::Read).await.unwrap());
        assert_eq!(channel.read_line().await.unwrap(), Some(vec!["one".to_string()]));

        assert!(!channel.open(dir.path().join("nope"), Mode::Read).await.unwrap());

        assert_eq!(channel.read_line().await.unwrap(), Some(vec!["two".to_string()]));
    }

    #[tokio::test]
    async fn reopen_read_replaces_handle_and_rewinds() {
        let first = file_with("a\nb\n");
        let second = file_with("c\n");
        let mut channel = AsyncLineFileChannel::new();

        assert!(channel.open(first.path(), Mode::Read).await.unwrap());
        assert_eq!(channel.read_line().await.unwrap(), Some(vec!["a".to_string()]));

        assert!(channel.open(second.path(), Mode::Read).await.unwrap());
        assert_eq!(channel.read_line().await.unwrap(), Some(vec!["c".to_string()]));
        assert_eq!(channel.read_line().await.unwrap(), None);

        assert!(channel.open(first.path(), Mode::Read).await.unwrap());
        assert_eq!(channel.read_line().await.unwrap(), Some(vec!["a".to_string()]));
    }

    #[tokio::test]
    async fn empty_line_is_one_empty_field_then_eof() {
        let temp = file_with("\n");
        let mut channel = AsyncLineFileChannel::new();
        assert!(channel.open(temp.path(), Mode::Read).await.unwrap());

        assert_eq!(channel.read_line().await.unwrap(), Some(vec![String::new()]));
        assert_eq!(channel.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn locked_reopen_for_write_replaces_own_writer() {
        let temp = NamedTempFile::new().unwrap();
        let options = ChannelOptions::default().with_lock_timeout(Duration::ZERO);
        let mut channel = AsyncLineFileChannel::with_options(options.clone());

        assert!(channel.open(temp.path(), Mode::Write).await.unwrap());
        channel.write_line(&["a"]).await.unwrap();
        assert!(channel.open(temp.path(), Mode::Write).await.unwrap());
        channel.write_line(&["b"]).await.unwrap();

        // Lock survives the replaced handle
        let mut other = AsyncLineFileChannel::with_options(options);
        assert!(!other.open(temp.path(), Mode::Write).await.unwrap());

        channel.close();
        assert_eq!(std::fs::read_to_string(temp.path()).unwrap(), "b\n");
    }

    #[tokio::test]
    async fn locked_read_back_while_own_writer_open() {
        let temp = NamedTempFile::new().unwrap();
        let options = ChannelOptions::default().with_lock_timeout(Duration::ZERO);
        let mut channel = AsyncLineFileChannel::with_options(options);

        assert!(channel.open(temp.path(), Mode::Write).await.unwrap());
        channel.write_line(&["k", "v"]).await.unwrap();
        assert!(channel.open(temp.path(), Mode::Read).await.unwrap());
        assert_eq!(
            channel.read_line().await.unwrap(),
            Some(vec!["k".to_string(), "v".to_string()])
        );
    }
}
