use chrono::Local;

/// Timestamp layout of the second field of every log line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date layout used to name the default daily log file.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of the current local time, as display strings.
pub trait Clock: Send + Sync {
    /// Current local time with second granularity, e.g. `2026-10-18 14:03:09`.
    fn timestamp(&self) -> String;

    /// Current local date, e.g. `2026-10-18`.
    fn date(&self) -> String;
}

/// Wall-clock time in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn timestamp(&self) -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }

    fn date(&self) -> String {
        Local::now().format(DATE_FORMAT).to_string()
    }
}

/// Clock frozen at a given instant. Makes log lines reproducible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedClock {
    timestamp: String,
    date: String,
}

impl FixedClock {
    /// Builds a clock from a `YYYY-MM-DD HH:MM:SS` timestamp; the date is its
    /// first field.
    pub fn new(timestamp: impl Into<String>) -> Self {
        let timestamp = timestamp.into();
        let date = timestamp
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_owned();
        Self { timestamp, date }
    }
}

impl Clock for FixedClock {
    fn timestamp(&self) -> String {
        self.timestamp.clone()
    }

    fn date(&self) -> String {
        self.date.clone()
    }
}
