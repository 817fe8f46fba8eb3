pub mod callsite;
pub mod clock;
pub mod formatter;
pub mod interpolate;
pub mod log_config;
pub mod log_error;
pub mod log_level;
pub mod log_macros;
pub mod log_msg;
pub mod log_sink;
pub mod logger;
pub mod noop_log_sink;

pub use callsite::{Callsite, Frame};
pub use clock::{Clock, FixedClock, LocalClock};
pub use formatter::{Formatter, PipeFormatter};
pub use interpolate::{Context, interpolate};
pub use log_config::{Config, SharedConfig, SharedWriter, Sink, Value};
pub use log_error::{Error, ErrorCode, Result};
pub use log_level::{Level, ToLevel};
pub use log_msg::Record;
pub use log_sink::{FileSystem, MemorySink, OsFileSystem, SinkHandle};
pub use logger::Logger;
pub use noop_log_sink::NoopSink;
