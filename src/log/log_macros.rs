//! Leveled logging macros for [`Logger`](crate::log::Logger).
//!
//! Named arguments become the placeholder context, so
//! `logger_info!(logger, "user {id} logged in", id = 42)` logs `user 42 logged in`.
//! The macros expand at the call site, which is what ends up in the line's
//! file/line fields.

// ============================================================================
// 1. GENERIC MACRO
// ============================================================================

/// Logs at an explicit level and returns `log`'s `Result<bool>`.
#[macro_export]
macro_rules! logger_log {
    ($logger:expr, $lvl:expr, $tmpl:expr $(, $key:ident = $val:expr)* $(,)?) => {{
        let __ctx = $crate::log::Context::new()$(.with(stringify!($key), &$val))*;
        $logger.log($lvl, $tmpl, &__ctx)
    }};
}

// ============================================================================
// 2. LEVEL-SPECIFIC MACROS
// ============================================================================
// Fire-and-forget, like the level methods: the result is discarded.

#[macro_export]
macro_rules! logger_debug     { ($logger:expr, $($arg:tt)*) => {{ let _ = $crate::logger_log!($logger, $crate::log::Level::Debug, $($arg)*); }} }
#[macro_export]
macro_rules! logger_info      { ($logger:expr, $($arg:tt)*) => {{ let _ = $crate::logger_log!($logger, $crate::log::Level::Info, $($arg)*); }} }
#[macro_export]
macro_rules! logger_notice    { ($logger:expr, $($arg:tt)*) => {{ let _ = $crate::logger_log!($logger, $crate::log::Level::Notice, $($arg)*); }} }
#[macro_export]
macro_rules! logger_warning   { ($logger:expr, $($arg:tt)*) => {{ let _ = $crate::logger_log!($logger, $crate::log::Level::Warning, $($arg)*); }} }
#[macro_export]
macro_rules! logger_error     { ($logger:expr, $($arg:tt)*) => {{ let _ = $crate::logger_log!($logger, $crate::log::Level::Error, $($arg)*); }} }
#[macro_export]
macro_rules! logger_critical  { ($logger:expr, $($arg:tt)*) => {{ let _ = $crate::logger_log!($logger, $crate::log::Level::Critical, $($arg)*); }} }
#[macro_export]
macro_rules! logger_alert     { ($logger:expr, $($arg:tt)*) => {{ let _ = $crate::logger_log!($logger, $crate::log::Level::Alert, $($arg)*); }} }
#[macro_export]
macro_rules! logger_emergency { ($logger:expr, $($arg:tt)*) => {{ let _ = $crate::logger_log!($logger, $crate::log::Level::Emergency, $($arg)*); }} }
