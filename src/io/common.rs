use super::OpenError;
use std::time::{Duration, Instant};

pub(crate) const LINE_TERMINATOR: &str = "\n";
pub(crate) const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Split a decoded line into fields on a literal separator.
///
/// An empty separator keeps the whole line as one field.
pub(crate) fn split_fields(line: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return vec![line.to_string()];
    }
    line.split(separator).map(str::to_string).collect()
}

/// Join fields into one terminated line.
pub(crate) fn join_fields<S: AsRef<str>>(fields: &[S], separator: &str) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push_str(separator);
        }
        line.push_str(field.as_ref());
    }
    line.push_str(LINE_TERMINATOR);
    line
}

/// Remove one trailing `\n` or `\r\n`.
pub(crate) fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Decide what to do after a failed lock attempt, returning how long to
/// wait before the next one.
pub(crate) fn after_failed_lock(start: Instant, timeout: Duration) -> Result<Duration, OpenError> {
    if timeout.is_zero() {
        Err(OpenError::AlreadyLocked)
    } else if start.elapsed() >= timeout {
        Err(OpenError::LockTimeout(timeout))
    } else {
        Ok(LOCK_RETRY_INTERVAL)
    }
}
