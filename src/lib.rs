//! Line-at-a-time reading and writing of delimiter-separated text files.
//!
//! A [`LineFileChannel`] holds at most one file open for reading and one
//! open for writing. Lines are split on (and joined with) a literal
//! separator, a tab by default. There is no quoting or escaping.
//!
//! ```rust
//! use line_channel::{LineFileChannel, Mode};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut channel = LineFileChannel::with_separator(",");
//! if channel.open("people.csv", Mode::Read)? {
//!     while let Some(fields) = channel.read_line()? {
//!         println!("{:?}", fields);
//!     }
//! }
//! channel.close();
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "tokio")]
pub mod async_channel;
pub mod channel;
pub mod io;
pub mod options;

#[cfg(feature = "tokio")]
pub use async_channel::AsyncLineFileChannel;
pub use channel::LineFileChannel;
pub use io::{ChannelError, Direction, OpenError};
pub use options::ChannelOptions;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The capability a file is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Read,
    Write,
}

impl Mode {
    /// Numeric code used by older callers (`1` = read, `2` = write).
    pub fn code(self) -> u8 {
        match self {
            Mode::Read => 1,
            Mode::Write => 2,
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = ChannelError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Mode::Read),
            2 => Ok(Mode::Write),
            other => Err(ChannelError::UnsupportedMode(other.to_string())),
        }
    }
}

impl FromStr for Mode {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "r" | "read" => Ok(Mode::Read),
            "w" | "write" => Ok(Mode::Write),
            _ => Err(ChannelError::UnsupportedMode(s.to_string())),
        }
    }
}

impl TryFrom<&str> for Mode {
    type Error = ChannelError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}
