//! pipelog is a small leveled logger that appends pipe-delimited lines to a file.
//!
//! A log call carries one of eight severities, a message template with `{key}`
//! placeholders and a [`Context`](log::Context) of values. Calls below the configured
//! minimum level are dropped. Surviving calls are interpolated and formatted as
//!
//! ```text
//! <level> | <YYYY-MM-DD HH:MM:SS> | <LABEL> | <message> | <file> | <line>
//! ```
//!
//! and appended under an exclusive advisory lock.
//!
//! ```rust,ignore
//! use pipelog::log::{Config, Context, Logger};
//!
//! let mut cfg = Config::in_dir("/var/log/myapp");
//! cfg.set_label("billing")?;
//! let mut logger = Logger::from_config(cfg);
//! logger.info("invoice {id} sent", &Context::new().with("id", 1042));
//! ```

/// INI-style settings files that produce a validated logger configuration.
pub mod config;
/// The logger, its configuration, and the sink and formatting primitives.
pub mod log;
