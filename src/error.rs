use std::error::Error;
use std::fmt::{self, Display};

/// Typed errors returned by index building, lookup and extraction operations.
///
/// Propagation is fail-fast throughout the crate: no layer retries or swallows
/// a failure, it is always surfaced to the immediate caller.
#[derive(Debug)]
pub enum IndexError {
    /// An open/seek/read/write on the data or index file failed.
    Io(std::io::Error),
    /// An index line did not parse as `key \t start \t end`.
    Parse { line: String, reason: String },
    /// The caller-supplied key function failed; the whole build is abandoned
    /// and the partial index file must not be used.
    KeyFn(anyhow::Error),
    /// An entry's byte range falls outside the current data file, i.e. the
    /// index was built against an older version of the file.
    Stale { start: u64, end: u64, file_len: u64 },
}

impl Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::Io(e) => write!(f, "io error: {}", e),
            IndexError::Parse { line, reason } => {
                write!(f, "malformed index line {:?}: {}", line, reason)
            }
            IndexError::KeyFn(e) => write!(f, "key function error: {}", e),
            IndexError::Stale {
                start,
                end,
                file_len,
            } => write!(
                f,
                "stale index: entry [{}, {}) exceeds data file length {}",
                start, end, file_len
            ),
        }
    }
}

impl Error for IndexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            IndexError::Io(e) => Some(e),
            IndexError::KeyFn(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Io(e)
    }
}
