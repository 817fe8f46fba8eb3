use crate::log::{callsite::Callsite, log_level::Level};

/// Everything a [`Formatter`](crate::log::Formatter) needs to lay out one line.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    /// The severity of the message.
    pub level: Level,
    /// Local time of the call, as produced by the logger's clock.
    pub timestamp: &'a str,
    /// The configured, uppercased label.
    pub label: &'a str,
    /// The message after placeholder interpolation.
    pub text: &'a str,
    /// Where the log call was made.
    pub callsite: &'a Callsite,
}
