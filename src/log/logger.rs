use crate::log::{
    callsite::{self, Callsite, Frame},
    clock::{Clock, LocalClock},
    formatter::{Formatter, PipeFormatter},
    interpolate::{Context, interpolate},
    log_config::{Config, SharedConfig, Sink, Value},
    log_error::Result,
    log_level::{Level, ToLevel},
    log_msg::Record,
    log_sink::{FileSystem, SinkHandle},
};

use std::{
    collections::BTreeMap,
    fmt,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError},
};

/// Target of the diagnostics the logger itself emits through `tracing`.
pub const LOG_TARGET: &str = "pipelog";

/// Synchronous, leveled logger appending pipe-delimited lines to a file or an
/// injected writer.
///
/// # Pipeline
///
/// 1. **Filter**: messages below the configured minimum level are dropped.
/// 2. **Interpolate**: `{key}` placeholders are filled from the [`Context`].
/// 3. **Format**: the [`Formatter`] lays out level, time, label, text and call-site.
/// 4. **Write**: the line is appended under an exclusive advisory lock.
///
/// A path sink is opened on the first write and kept open until the logger is
/// dropped. Injected writers belong to the caller and are never closed here.
///
/// Write failures never surface as errors: [`log`](Self::log) returns `Ok(false)`
/// and a warning is emitted on the `pipelog` tracing target.
pub struct Logger {
    config: SharedConfig,
    clock: Box<dyn Clock>,
    formatter: Box<dyn Formatter>,
    ignored_files: Vec<String>,
    last_raw: Option<String>,
    last_formatted: Option<String>,
    open_sink: Option<OpenSink>,
}

/// A handle the logger opened itself, with the path it was opened for.
struct OpenSink {
    path: PathBuf,
    handle: Box<dyn SinkHandle>,
}

/// Settings copied out of the shared config for the duration of one call.
struct WriteSettings {
    label: String,
    level: Level,
    sink: Sink,
    lock_on_write: bool,
    fs: Arc<dyn FileSystem>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Logger with a fresh default [`Config`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SharedConfig::default())
    }

    /// Logger owning `config`.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self::with_config(SharedConfig::new(config))
    }

    /// Logger sharing `config` with every other holder of the handle.
    #[must_use]
    pub fn with_config(config: SharedConfig) -> Self {
        Self {
            config,
            clock: Box::new(LocalClock),
            formatter: Box::new(PipeFormatter),
            ignored_files: Vec::new(),
            last_raw: None,
            last_formatted: None,
            open_sink: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Skips frames whose file contains `fragment` when resolving the call-site.
    ///
    /// The logging methods are `#[track_caller]`, so without ignored files the
    /// call-site is the line that called the logger. Once a fragment is registered,
    /// the stack is walked outward from that line, so a wrapper that is not
    /// `#[track_caller]` can register its own file and report its caller instead.
    /// If every frame is ignored the call-site is unknown.
    #[must_use]
    pub fn ignore_file(mut self, fragment: impl Into<String>) -> Self {
        self.ignored_files.push(fragment.into());
        self
    }

    pub const fn config(&self) -> &SharedConfig {
        &self.config
    }

    #[must_use]
    pub fn get_config(&self, key: &str) -> Option<Value> {
        self.config.get(key)
    }

    /// # Errors
    /// See [`Config::set`].
    pub fn set_config(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.config.set(key, value)
    }

    #[must_use]
    pub fn full_config(&self) -> BTreeMap<String, Value> {
        self.config.get_all()
    }

    /// The last interpolated message when `full` is false, or the last formatted
    /// line when it is true. `None` until a message passes the level filter.
    #[must_use]
    pub fn get_last_message(&self, full: bool) -> Option<&str> {
        if full {
            self.last_formatted.as_deref()
        } else {
            self.last_raw.as_deref()
        }
    }

    /// Logs `template` at `level`, interpolating `context`.
    ///
    /// Returns `Ok(true)` when the line was written, `Ok(false)` when the message was
    /// filtered out or the write failed.
    ///
    /// # Errors
    /// [`Error::InvalidLevel`](crate::log::Error::InvalidLevel) when `level` is not
    /// one of the eight severities.
    #[track_caller]
    pub fn log(&mut self, level: impl ToLevel, template: &str, context: &Context) -> Result<bool> {
        let level = level.to_level()?;
        let origin = Location::caller();

        let settings = self.write_settings();
        if level < settings.level {
            return Ok(false);
        }

        let text = interpolate(template, context);
        let frames = if self.ignored_files.is_empty() {
            vec![Frame::from(origin)]
        } else {
            callsite::capture_from(origin)
        };
        let callsite = Callsite::resolve(&frames, self.ignored_files.as_slice());
        let timestamp = self.clock.timestamp();
        let line = self.formatter.format(&Record {
            level,
            timestamp: &timestamp,
            label: &settings.label,
            text: &text,
            callsite: &callsite,
        });

        self.last_raw = Some(text);
        let written = self.do_write(&settings, line.as_bytes());
        self.last_formatted = Some(line);
        Ok(written)
    }

    #[track_caller]
    pub fn debug(&mut self, template: &str, context: &Context) {
        let _ = self.log(Level::Debug, template, context);
    }

    #[track_caller]
    pub fn info(&mut self, template: &str, context: &Context) {
        let _ = self.log(Level::Info, template, context);
    }

    #[track_caller]
    pub fn notice(&mut self, template: &str, context: &Context) {
        let _ = self.log(Level::Notice, template, context);
    }

    #[track_caller]
    pub fn warning(&mut self, template: &str, context: &Context) {
        let _ = self.log(Level::Warning, template, context);
    }

    #[track_caller]
    pub fn error(&mut self, template: &str, context: &Context) {
        let _ = self.log(Level::Error, template, context);
    }

    #[track_caller]
    pub fn critical(&mut self, template: &str, context: &Context) {
        let _ = self.log(Level::Critical, template, context);
    }

    #[track_caller]
    pub fn alert(&mut self, template: &str, context: &Context) {
        let _ = self.log(Level::Alert, template, context);
    }

    #[track_caller]
    pub fn emergency(&mut self, template: &str, context: &Context) {
        let _ = self.log(Level::Emergency, template, context);
    }

    fn write_settings(&self) -> WriteSettings {
        let cfg = self.config.read();
        WriteSettings {
            label: cfg.label().to_owned(),
            level: cfg.level(),
            sink: cfg.sink().clone(),
            lock_on_write: cfg.lock_on_write(),
            fs: cfg.file_system(),
        }
    }

    fn do_write(&mut self, settings: &WriteSettings, bytes: &[u8]) -> bool {
        match &settings.sink {
            Sink::Path(path) => match self.path_handle(path, settings.fs.as_ref()) {
                Some(handle) => write_all_locked(&mut **handle, bytes, settings.lock_on_write),
                None => false,
            },
            Sink::Writer(writer) => {
                self.close_sink();
                let mut guard = writer.lock().unwrap_or_else(PoisonError::into_inner);
                write_all_locked(&mut *guard, bytes, settings.lock_on_write)
            }
        }
    }

    /// Reuses the handle opened for `path`, or opens it. A handle opened for a
    /// previous path is closed first.
    fn path_handle(
        &mut self,
        path: &Path,
        fs: &dyn FileSystem,
    ) -> Option<&mut Box<dyn SinkHandle>> {
        if self.open_sink.as_ref().is_some_and(|s| s.path != path) {
            self.close_sink();
        }

        if self.open_sink.is_none() {
            match fs.open_append(path) {
                Ok(handle) => {
                    tracing::debug!(target: LOG_TARGET, path = %path.display(), "opened log file");
                    self.open_sink = Some(OpenSink {
                        path: path.to_path_buf(),
                        handle,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        target: LOG_TARGET,
                        path = %path.display(),
                        error = %e,
                        "failed to open log file"
                    );
                    return None;
                }
            }
        }

        self.open_sink.as_mut().map(|s| &mut s.handle)
    }

    fn close_sink(&mut self) {
        if let Some(mut sink) = self.open_sink.take() {
            let _ = sink.handle.flush();
            tracing::debug!(target: LOG_TARGET, path = %sink.path.display(), "closed log file");
        }
    }
}

/// Appends `bytes`, bracketed by lock and unlock when `lock` is set. Every step
/// must succeed; a failed write still releases the lock.
fn write_all_locked(handle: &mut dyn SinkHandle, bytes: &[u8], lock: bool) -> bool {
    if lock {
        if let Err(e) = handle.acquire_lock() {
            tracing::warn!(target: LOG_TARGET, error = %e, "failed to lock log sink");
            return false;
        }
    }

    let written = handle.write_all(bytes).and_then(|()| handle.flush());
    if let Err(e) = &written {
        tracing::warn!(target: LOG_TARGET, error = %e, "failed to write log line");
    }

    let released = if lock { handle.release_lock() } else { Ok(()) };
    if let Err(e) = &released {
        tracing::warn!(target: LOG_TARGET, error = %e, "failed to unlock log sink");
    }

    written.is_ok() && released.is_ok()
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.close_sink();
    }
}

impl fmt::Display for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.config.read();
        write!(
            f,
            "Label: {}, \nLevel: {}, \nSave path: {}",
            cfg.label(),
            cfg.level(),
            cfg.sink()
        )
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config)
            .field("ignored_files", &self.ignored_files)
            .field("last_raw", &self.last_raw)
            .field("sink_open", &self.open_sink.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::{
        clock::FixedClock,
        log_config::KEY_LEVEL,
        log_error::{Error, ErrorCode},
        log_sink::MemorySink,
        noop_log_sink::NoopSink,
    };
    use std::{
        io,
        sync::atomic::{AtomicUsize, Ordering},
    };

    const NOW: &str = "2026-10-18 12:00:00";

    fn memory_logger(level: Level) -> (Logger, MemorySink) {
        let sink = MemorySink::new();
        let mut cfg = Config::in_dir(".");
        cfg.set_writer(sink.clone());
        cfg.set_level(level).unwrap();
        let logger = Logger::from_config(cfg).with_clock(FixedClock::new(NOW));
        (logger, sink)
    }

    #[test]
    fn level_table_is_exhaustive() {
        for configured in Level::ALL {
            for message in Level::ALL {
                let (mut logger, sink) = memory_logger(configured);
                let written = logger.log(message, "msg", &Context::new()).unwrap();
                let expected = message.rank() >= configured.rank();
                assert_eq!(written, expected, "{configured} vs {message}");
                assert_eq!(sink.is_empty(), !expected);
            }
        }
    }

    #[test]
    fn accepts_level_names_and_rejects_unknown() {
        let (mut logger, sink) = memory_logger(Level::Debug);
        assert!(logger.log("warning", "by name", &Context::new()).unwrap());

        let err = logger.log("foo", "bar", &Context::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidLevel { .. }));
        assert_eq!(err.code(), ErrorCode::Level);
        assert_eq!(sink.lines().len(), 1);
        assert_eq!(logger.get_last_message(false), Some("by name"));
    }

    #[test]
    fn formats_full_line_with_callsite() {
        let (mut logger, sink) = memory_logger(Level::Debug);
        let ctx = Context::new().with("x", 1);
        let line_no = line!() + 1;
        assert!(logger.log("debug", "hello {x}", &ctx).unwrap());

        let expected = format!("debug | {NOW} | SYSTEM | hello 1 | log/logger.rs | {line_no}\n");
        assert_eq!(sink.contents(), expected);
        assert_eq!(logger.get_last_message(false), Some("hello 1"));
        assert_eq!(logger.get_last_message(true), Some(expected.as_str()));
    }

    #[test]
    fn level_methods_report_their_caller() {
        let (mut logger, sink) = memory_logger(Level::Debug);
        let line_no = line!() + 1;
        logger.critical("boom", &Context::new());

        let line = sink.contents();
        assert!(line.starts_with("critical | "), "{line}");
        assert!(line.ends_with(&format!("| {line_no}\n")), "{line}");
    }

    #[test]
    fn every_level_method_writes_its_level() {
        let (mut logger, sink) = memory_logger(Level::Debug);
        let ctx = Context::new();
        logger.debug("m", &ctx);
        logger.info("m", &ctx);
        logger.notice("m", &ctx);
        logger.warning("m", &ctx);
        logger.error("m", &ctx);
        logger.critical("m", &ctx);
        logger.alert("m", &ctx);
        logger.emergency("m", &ctx);

        let levels: Vec<String> = sink
            .lines()
            .iter()
            .map(|l| l.split(" | ").next().unwrap().to_owned())
            .collect();
        let expected: Vec<String> = Level::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(levels, expected);
    }

    #[test]
    fn filtered_call_keeps_previous_last_message() {
        let (mut logger, sink) = memory_logger(Level::Debug);
        assert_eq!(logger.get_last_message(false), None);
        assert_eq!(logger.get_last_message(true), None);

        logger.info("kept", &Context::new());
        logger.set_config(KEY_LEVEL, "warning").unwrap();
        assert!(!logger.log("info", "ignored", &Context::new()).unwrap());

        assert_eq!(logger.get_last_message(false), Some("kept"));
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn unmatched_ignore_keeps_direct_caller() {
        let (logger, sink) = memory_logger(Level::Debug);
        let mut logger = logger.ignore_file("no_such_wrapper.rs");
        let line_no = line!() + 1;
        logger.info("x", &Context::new());
        assert!(sink.contents().ends_with(&format!("| log/logger.rs | {line_no}\n")));
    }

    #[test]
    fn ignoring_every_frame_yields_unknown_callsite() {
        let (logger, sink) = memory_logger(Level::Debug);
        let mut logger = logger.ignore_file("/").ignore_file("\\").ignore_file(".rs");
        logger.info("x", &Context::new());
        assert!(sink.contents().ends_with("| <<unknown file>> | <<unknown line>>\n"));
    }

    #[test]
    fn custom_formatter_and_clock() {
        let (logger, sink) = memory_logger(Level::Debug);
        let mut logger = logger
            .with_clock(FixedClock::new("2031-01-01 00:00:00"))
            .with_formatter(|r: &Record<'_>| format!("{}|{}|{}", r.level, r.text, r.timestamp));
        logger.debug("foo", &Context::new());

        assert_eq!(logger.get_last_message(true), Some("debug|foo|2031-01-01 00:00:00"));
        assert_eq!(sink.contents(), "debug|foo|2031-01-01 00:00:00");
    }

    #[test]
    fn shared_config_changes_apply_to_every_logger() {
        let (first, _sink) = memory_logger(Level::Debug);
        let mut second = Logger::with_config(first.config().clone());
        first.set_config("label", "billing").unwrap();

        assert_eq!(second.get_config("label"), Some(Value::from("BILLING")));
        assert!(second.log(Level::Info, "x", &Context::new()).unwrap());
        assert_eq!(first.full_config(), second.full_config());
    }

    #[test]
    fn display_summarises_config() {
        let (logger, _sink) = memory_logger(Level::Notice);
        assert_eq!(
            logger.to_string(),
            "Label: SYSTEM, \nLevel: notice, \nSave path: <writer>"
        );
    }

    #[test]
    fn unlocked_write_to_noop_sink_succeeds() {
        let mut cfg = Config::in_dir(".");
        cfg.set_writer(NoopSink).set_lock_on_write(false);
        let mut logger = Logger::from_config(cfg);
        assert!(logger.log(Level::Alert, "dropped on the floor", &Context::new()).unwrap());
        assert_eq!(logger.get_last_message(false), Some("dropped on the floor"));
    }

    #[derive(Default)]
    struct FlakyHandle {
        fail_lock: bool,
        fail_write: bool,
        released: Arc<AtomicUsize>,
    }

    impl Write for FlakyHandle {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            if self.fail_write {
                Err(io::Error::other("disk full"))
            } else {
                Ok(data.len())
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SinkHandle for FlakyHandle {
        fn acquire_lock(&mut self) -> io::Result<()> {
            if self.fail_lock {
                Err(io::Error::other("lock refused"))
            } else {
                Ok(())
            }
        }

        fn release_lock(&mut self) -> io::Result<()> {
            self.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn lock_failure_fails_the_write_but_records_message() {
        let mut cfg = Config::in_dir(".");
        cfg.set_writer(FlakyHandle {
            fail_lock: true,
            ..FlakyHandle::default()
        });
        let mut logger = Logger::from_config(cfg);

        assert!(!logger.log(Level::Error, "locked out", &Context::new()).unwrap());
        assert_eq!(logger.get_last_message(false), Some("locked out"));
        assert!(logger.get_last_message(true).is_some());
    }

    #[test]
    fn write_failure_still_releases_lock() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut cfg = Config::in_dir(".");
        cfg.set_writer(FlakyHandle {
            fail_write: true,
            released: Arc::clone(&released),
            ..FlakyHandle::default()
        });
        let mut logger = Logger::from_config(cfg);

        assert!(!logger.log(Level::Error, "lost", &Context::new()).unwrap());
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lock_is_skipped_when_disabled() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut cfg = Config::in_dir(".");
        cfg.set_writer(FlakyHandle {
            fail_lock: true,
            released: Arc::clone(&released),
            ..FlakyHandle::default()
        })
        .set_lock_on_write(false);
        let mut logger = Logger::from_config(cfg);

        assert!(logger.log(Level::Error, "no lock needed", &Context::new()).unwrap());
        assert_eq!(released.load(Ordering::SeqCst), 0);
    }

    /// Counts opens and live handles; every handle appends to one shared buffer.
    #[derive(Clone, Default)]
    struct CountingFs {
        opens: Arc<AtomicUsize>,
        live: Arc<AtomicUsize>,
        out: MemorySink,
        fail: bool,
    }

    struct TrackedHandle {
        inner: MemorySink,
        live: Arc<AtomicUsize>,
    }

    impl Write for TrackedHandle {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.inner.write(data)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    impl SinkHandle for TrackedHandle {}

    impl Drop for TrackedHandle {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl FileSystem for CountingFs {
        fn exists(&self, _dir: &Path) -> bool {
            true
        }

        fn is_writable(&self, _dir: &Path) -> bool {
            true
        }

        fn open_append(&self, _path: &Path) -> io::Result<Box<dyn SinkHandle>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            self.live.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(TrackedHandle {
                inner: self.out.clone(),
                live: Arc::clone(&self.live),
            }))
        }
    }

    fn counting_logger(fs: &CountingFs) -> Logger {
        let mut cfg = Config::in_dir("/virtual").with_file_system(fs.clone());
        cfg.set_save_path("/virtual/app.log").unwrap();
        Logger::from_config(cfg)
    }

    #[test]
    fn path_sink_is_opened_lazily_and_reused() {
        let fs = CountingFs::default();
        let mut logger = counting_logger(&fs);
        assert_eq!(fs.opens.load(Ordering::SeqCst), 0);

        assert!(logger.log(Level::Info, "one", &Context::new()).unwrap());
        assert!(logger.log(Level::Info, "two", &Context::new()).unwrap());
        assert_eq!(fs.opens.load(Ordering::SeqCst), 1);
        assert_eq!(fs.out.lines().len(), 2);

        drop(logger);
        assert_eq!(fs.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn changing_the_path_reopens() {
        let fs = CountingFs::default();
        let mut logger = counting_logger(&fs);
        logger.info("one", &Context::new());

        logger.set_config("sink", "/virtual/other.log").unwrap();
        logger.info("two", &Context::new());

        assert_eq!(fs.opens.load(Ordering::SeqCst), 2);
        assert_eq!(fs.live.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn switching_to_a_writer_closes_the_file() {
        let fs = CountingFs::default();
        let mut logger = counting_logger(&fs);
        logger.info("to file", &Context::new());
        assert_eq!(fs.live.load(Ordering::SeqCst), 1);

        let sink = MemorySink::new();
        logger.config().write().set_writer(sink.clone());
        assert!(logger.log(Level::Info, "to writer", &Context::new()).unwrap());

        assert_eq!(fs.live.load(Ordering::SeqCst), 0);
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn open_failure_returns_false_and_retries_next_call() {
        let fs = CountingFs {
            fail: true,
            ..CountingFs::default()
        };
        let mut logger = counting_logger(&fs);

        assert!(!logger.log(Level::Emergency, "nowhere", &Context::new()).unwrap());
        assert!(!logger.log(Level::Emergency, "nowhere", &Context::new()).unwrap());
        assert_eq!(fs.opens.load(Ordering::SeqCst), 2);
        assert_eq!(logger.get_last_message(false), Some("nowhere"));
    }

    #[test]
    fn injected_writer_outlives_logger() {
        let (mut logger, sink) = memory_logger(Level::Debug);
        logger.info("before drop", &Context::new());
        drop(logger);

        let mut still_open = sink.clone();
        still_open.write_all(b"after\n").unwrap();
        assert_eq!(sink.lines().len(), 2);
    }
}
