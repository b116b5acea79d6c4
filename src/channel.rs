use crate::{
    io::{file_identity, ChannelError, Direction, LineReader, LineWriter},
    ChannelOptions, Mode,
};
use log::{debug, trace, warn};
use std::fs::File;
use std::path::Path;

/// One read handle and one write handle over delimiter-separated files.
///
/// Each mode has its own slot. Opening a mode that is already open replaces
/// the previous handle once the new one is acquired. [`close`](Self::close)
/// releases both.
///
/// Failing to open a file is an expected outcome and is reported as
/// `Ok(false)`. Misuse, such as reading with no read handle open or passing
/// an unknown mode, is an error.
///
/// # Examples
///
/// ```rust
/// use line_channel::{LineFileChannel, Mode};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut channel = LineFileChannel::with_separator(",");
///
/// if channel.open("out.csv", Mode::Write)? {
///     channel.write_line(&["a", "b", "c"])?;
///     channel.write_line(&["", "x", ""])?;
/// }
///
/// if channel.open("out.csv", Mode::Read)? {
///     while let Some(fields) = channel.read_line()? {
///         println!("{:?}", fields);
///     }
/// }
///
/// channel.close();
/// # Ok(())
/// # }
/// ```
pub struct LineFileChannel {
    options: ChannelOptions,
    read: Option<LineReader>,
    write: Option<LineWriter>,
}

impl Default for LineFileChannel {
    fn default() -> Self {
        Self::with_options(ChannelOptions::default())
    }
}

impl LineFileChannel {
    /// A channel using the tab separator.
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

    /// Change the separator used by subsequent reads and writes.
    pub fn set_separator(&mut self, separator: impl Into<String>) {
        self.options.separator = separator.into();
    }

    pub fn options(&self) -> &ChannelOptions {
        &self.options
    }

    /// Whether a handle is currently open for `mode`.
    pub fn is_open(&self, mode: Mode) -> bool {
        match mode {
            Mode::Read => self.read.is_some(),
            Mode::Write => self.write.is_some(),
        }
    }

    /// Open `path` for reading or writing.
    ///
    /// `mode` may be a [`Mode`], a legacy numeric code or a mode name. An
    /// unknown mode fails with [`ChannelError::UnsupportedMode`] before
    /// anything is touched.
    ///
    /// Returns `Ok(false)` when the file can't be opened (missing file,
    /// permission denied, lock held elsewhere); the slot keeps whatever
    /// handle it had.
    ///
    /// With locking enabled, a file this channel already holds is opened
    /// under the channel's existing lock rather than contending with it.
    pub fn open<M>(&mut self, path: impl AsRef<Path>, mode: M) -> Result<bool, ChannelError>
    where
        M: TryInto<Mode>,
        ChannelError: From<<M as TryInto<Mode>>::Error>,
    {
        let mode: Mode = mode.try_into()?;
        let path = path.as_ref();
        let lock_timeout = self.options.lock_timeout;
        let held = match lock_timeout {
            Some(_) => self.held_lock(path),
            None => None,
        };

        let opened = match mode {
            Mode::Read => LineReader::open_sharing(path, lock_timeout, held).map(|reader| {
                if self.read.replace(reader).is_some() {
                    debug!("replaced previous read handle");
                }
            }),
            Mode::Write => LineWriter::create_sharing(path, lock_timeout, held).map(|writer| {
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

    /// Locked descriptor this channel already holds on `path`, if any.
    fn held_lock(&self, path: &Path) -> Option<&File> {
        let identity = file_identity(path);
        let writer = self
            .write
            .as_ref()
            .filter(|w| w.path() == identity.as_path())
            .and_then(LineWriter::lock);
        let reader = self
            .read
            .as_ref()
            .filter(|r| r.path() == identity.as_path())
            .and_then(LineReader::lock);
        writer.or(reader)
    }

    /// Read the next line as fields.
    ///
    /// `Ok(None)` means end of file. An empty line yields a single empty
    /// field.
    pub fn read_line(&mut self) -> Result<Option<Vec<String>>, ChannelError> {
        let reader = self
            .read
            .as_mut()
            .ok_or(ChannelError::InvalidState(Direction::Read))?;

        let fields = reader.read_fields(&self.options.separator)?;
        trace!("read line: {:?}", fields);
        Ok(fields)
    }

    /// Join `fields` with the separator and append them as one line.
    pub fn write_line<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<(), ChannelError> {
        let writer = self
            .write
            .as_mut()
            .ok_or(ChannelError::InvalidState(Direction::Write))?;

        writer.write_fields(fields, &self.options.separator)?;
        trace!("wrote line with {} fields", fields.len());
        Ok(())
    }

    /// Release both handles. Safe to call when nothing is open.
    pub fn close(&mut self) {
        let had_read = self.read.take().is_some();
        let had_write = self.write.take().is_some();
        if had_read || had_write {
            debug!("closed channel (read: {}, write: {})", had_read, had_write);
        }
    }
}
