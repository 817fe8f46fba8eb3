use std::{fmt, str::FromStr};

use crate::log::log_error::{Error, Result};

/// Defines the severity levels for log messages, from least to most severe.
///
/// The derived ordering is the filtering order: a message is persisted when its
/// level is greater than or equal to the configured minimum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Detailed debug information.
    Debug,
    /// Interesting events, e.g. user logins.
    Info,
    /// Normal but significant events.
    Notice,
    /// Exceptional occurrences that are not errors.
    Warning,
    /// Runtime errors that do not require immediate action.
    Error,
    /// Critical conditions, e.g. an unavailable component.
    Critical,
    /// Action must be taken immediately.
    Alert,
    /// The system is unusable.
    Emergency,
}

impl Level {
    /// Every level, in ascending order of severity.
    pub const ALL: [Level; 8] = [
        Level::Debug,
        Level::Info,
        Level::Notice,
        Level::Warning,
        Level::Error,
        Level::Critical,
        Level::Alert,
        Level::Emergency,
    ];

    /// Numeric priority of the level, `1` for debug up to `8` for emergency.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8 + 1
    }

    /// Lowercase name of the level as it appears in log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Notice => "notice",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Critical => "critical",
            Level::Alert => "alert",
            Level::Emergency => "emergency",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Level::ALL
            .into_iter()
            .find(|lvl| lvl.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidLevel {
                value: s.to_owned(),
            })
    }
}

/// Anything a caller may pass where a level is expected.
///
/// Typed [`Level`]s always convert; level names are parsed and fail with
/// [`Error::InvalidLevel`] when they do not name one of the eight severities.
pub trait ToLevel {
    fn to_level(&self) -> Result<Level>;
}

impl ToLevel for Level {
    #[inline]
    fn to_level(&self) -> Result<Level> {
        Ok(*self)
    }
}

impl ToLevel for str {
    fn to_level(&self) -> Result<Level> {
        self.parse()
    }
}

impl ToLevel for String {
    fn to_level(&self) -> Result<Level> {
        self.as_str().parse()
    }
}

impl<T: ToLevel + ?Sized> ToLevel for &T {
    #[inline]
    fn to_level(&self) -> Result<Level> {
        (**self).to_level()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::{Level, ToLevel};
    use crate::log::log_error::{Error, ErrorCode};

    #[test]
    fn ranks_follow_declaration_order() {
        let ranks: Vec<u8> = Level::ALL.iter().map(|l| l.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Alert < Level::Emergency);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("debug".parse::<Level>().unwrap(), Level::Debug);
        assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("Emergency".to_level().unwrap(), Level::Emergency);
        assert_eq!(String::from("notice").to_level().unwrap(), Level::Notice);
        assert_eq!(Level::Critical.to_level().unwrap(), Level::Critical);
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "EVERYTHING".to_level().unwrap_err();
        assert!(matches!(err, Error::InvalidLevel { ref value } if value == "EVERYTHING"));
        assert_eq!(err.code(), ErrorCode::Level);

        // "warn" is a common abbreviation but not one of the eight names
        assert!("warn".parse::<Level>().is_err());
        assert!("".parse::<Level>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for lvl in Level::ALL {
            assert_eq!(lvl.to_string().parse::<Level>().unwrap(), lvl);
        }
    }
}
