use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Errors raised by configuration setters, the config file loader and
/// [`Logger::log`](crate::log::Logger::log).
///
/// Write-time failures are deliberately absent: a failed write is reported as
/// `Ok(false)` from `log` and a warning event, never as an `Err`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid log level: {value:?}")]
    InvalidLevel { value: String },

    #[error("the label setting is invalid: expected a scalar, got {found}")]
    InvalidLabel { found: String },

    #[error("the save path setting is invalid: {}: {reason}", path.display())]
    InvalidSavePath { path: PathBuf, reason: &'static str },

    #[error("the lock_on_write setting is invalid: expected a bool, got {found}")]
    InvalidLockOnWrite { found: String },

    #[error("error reading config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Stable numeric codes attached to every [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Path = 101,
    Label = 102,
    Level = 103,
    LockOnWrite = 104,
    Read = 105,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Path => "E_PATH",
            ErrorCode::Label => "E_LABEL",
            ErrorCode::Level => "E_LEVEL",
            ErrorCode::LockOnWrite => "E_LOCK",
            ErrorCode::Read => "E_READ",
        }
    }

    #[must_use]
    pub const fn value(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.value())
    }
}

impl Error {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidLevel { .. } => ErrorCode::Level,
            Error::InvalidLabel { .. } => ErrorCode::Label,
            Error::InvalidSavePath { .. } => ErrorCode::Path,
            Error::InvalidLockOnWrite { .. } => ErrorCode::LockOnWrite,
            Error::ConfigRead { .. } => ErrorCode::Read,
        }
    }

    /// Name of the configuration key the error refers to, if any.
    #[must_use]
    pub const fn key(&self) -> Option<&'static str> {
        use crate::log::log_config::{KEY_LABEL, KEY_LEVEL, KEY_LOCK_ON_WRITE, KEY_SINK};
        match self {
            Error::InvalidLevel { .. } => Some(KEY_LEVEL),
            Error::InvalidLabel { .. } => Some(KEY_LABEL),
            Error::InvalidSavePath { .. } => Some(KEY_SINK),
            Error::InvalidLockOnWrite { .. } => Some(KEY_LOCK_ON_WRITE),
            Error::ConfigRead { .. } => None,
        }
    }
}
