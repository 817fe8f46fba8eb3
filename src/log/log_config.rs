//! Validated logger configuration.
//!
//! [`Config`] keeps the four recognized settings in typed fields and everything else
//! in an unvalidated extension map. Every setter validates before it assigns, so a
//! rejected write leaves the configuration exactly as it was.
//!
//! [`SharedConfig`] is the reference-counted handle loggers hold. Cloning the handle
//! shares the configuration; cloning a [`Config`] copies it.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::log::{
    clock::{Clock, LocalClock},
    log_error::{Error, Result},
    log_level::{Level, ToLevel},
    log_sink::{FileSystem, OsFileSystem, SinkHandle},
};

pub const KEY_LABEL: &str = "label";
pub const KEY_LEVEL: &str = "level";
pub const KEY_SINK: &str = "sink";
pub const KEY_LOCK_ON_WRITE: &str = "lock_on_write";

pub const DEFAULT_LABEL: &str = "SYSTEM";
pub const DEFAULT_LEVEL: Level = Level::Debug;

/// Dynamic value used by the key/value configuration surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Level> for Value {
    fn from(lvl: Level) -> Self {
        Value::Str(lvl.as_str().to_owned())
    }
}

impl From<&Path> for Value {
    fn from(p: &Path) -> Self {
        Value::Str(p.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Value::from(p.as_path())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

/// An injected writer, shared with the caller. The logger never closes it.
pub type SharedWriter = Arc<Mutex<dyn SinkHandle>>;

/// Destination for formatted lines.
#[derive(Clone)]
pub enum Sink {
    /// A file opened lazily, in append mode, by the logger that writes to it.
    Path(PathBuf),
    /// A handle owned by the caller.
    Writer(SharedWriter),
}

impl Sink {
    pub fn writer<W: SinkHandle + 'static>(writer: W) -> Self {
        Sink::Writer(Arc::new(Mutex::new(writer)))
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Sink::Path(p) => Some(p),
            Sink::Writer(_) => None,
        }
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Path(p) => write!(f, "{}", p.display()),
            Sink::Writer(_) => f.write_str("<writer>"),
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Sink::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Logger settings.
#[derive(Clone)]
pub struct Config {
    label: String,
    level: Level,
    sink: Sink,
    lock_on_write: bool,
    extra: BTreeMap<String, Value>,
    fs: Arc<dyn FileSystem>,
}

impl Default for Config {
    fn default() -> Self {
        Self::in_dir(exe_dir_fallback_cwd().join("logs"))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("label", &self.label)
            .field("level", &self.level)
            .field("sink", &self.sink)
            .field("lock_on_write", &self.lock_on_write)
            .field("extra", &self.extra)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Default settings: label `SYSTEM`, level debug, locking on, and a daily file
    /// under a `logs/` directory next to the executable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings writing to `<dir>/<YYYY-MM-DD>.log`. The path is not
    /// validated; the directory may be created later.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            label: DEFAULT_LABEL.to_owned(),
            level: DEFAULT_LEVEL,
            sink: Sink::Path(daily_log_path(dir.as_ref(), &LocalClock)),
            lock_on_write: true,
            extra: BTreeMap::new(),
            fs: Arc::new(OsFileSystem),
        }
    }

    /// Default settings with every pair applied through [`set`](Self::set), in order.
    ///
    /// # Errors
    /// Returns the first validation error encountered.
    pub fn from_values<K, V, I>(values: I) -> Result<Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut cfg = Self::default();
        for (k, v) in values {
            cfg.set(k.as_ref(), v)?;
        }
        Ok(cfg)
    }

    /// Replaces the file-system used for path validation and for opening path sinks.
    #[must_use]
    pub fn with_file_system(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Arc::new(fs);
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub const fn sink(&self) -> &Sink {
        &self.sink
    }

    /// The configured file path, or `None` when a writer was injected.
    #[must_use]
    pub fn save_path(&self) -> Option<&Path> {
        self.sink.path()
    }

    #[must_use]
    pub const fn lock_on_write(&self) -> bool {
        self.lock_on_write
    }

    #[must_use]
    pub fn file_system(&self) -> Arc<dyn FileSystem> {
        Arc::clone(&self.fs)
    }

    /// Sets the label. Any scalar is accepted and stored uppercased.
    ///
    /// # Errors
    /// [`Error::InvalidLabel`] for null, list and map values.
    pub fn set_label(&mut self, label: impl Into<Value>) -> Result<&mut Self> {
        let label = label.into();
        if !label.is_scalar() {
            return Err(Error::InvalidLabel {
                found: label.kind().to_owned(),
            });
        }
        self.label = label.to_string().to_uppercase();
        Ok(self)
    }

    /// # Errors
    /// [`Error::InvalidLevel`] when `level` does not name one of the eight severities.
    pub fn set_level(&mut self, level: impl ToLevel) -> Result<&mut Self> {
        self.level = level.to_level()?;
        Ok(self)
    }

    /// Points the sink at a file. Its directory must exist and be writable; the file
    /// itself is created on first write.
    ///
    /// # Errors
    /// [`Error::InvalidSavePath`] when the directory check fails.
    pub fn set_save_path(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        self.check_save_path(path)?;
        self.sink = Sink::Path(path.to_path_buf());
        Ok(self)
    }

    /// Injects a caller-owned writer. Always accepted.
    pub fn set_writer<W: SinkHandle + 'static>(&mut self, writer: W) -> &mut Self {
        self.sink = Sink::writer(writer);
        self
    }

    /// # Errors
    /// [`Error::InvalidSavePath`] for a path sink whose directory check fails.
    pub fn set_sink(&mut self, sink: Sink) -> Result<&mut Self> {
        if let Sink::Path(path) = &sink {
            self.check_save_path(path)?;
        }
        self.sink = sink;
        Ok(self)
    }

    pub fn set_lock_on_write(&mut self, lock: bool) -> &mut Self {
        self.lock_on_write = lock;
        self
    }

    /// Current value for `key`. Unknown keys yield `None`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            KEY_LABEL => Some(Value::Str(self.label.clone())),
            KEY_LEVEL => Some(Value::from(self.level)),
            KEY_SINK => Some(Value::Str(self.sink.to_string())),
            KEY_LOCK_ON_WRITE => Some(Value::Bool(self.lock_on_write)),
            _ => self.extra.get(key).cloned(),
        }
    }

    /// Sets `key`, validating the recognized ones. Unknown keys are stored as-is.
    ///
    /// # Errors
    /// The setter's validation error; the configuration is left unchanged.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let value = value.into();
        match key {
            KEY_LABEL => self.set_label(value),
            KEY_LEVEL => match value {
                Value::Str(name) => self.set_level(name),
                other => Err(Error::InvalidLevel {
                    value: other.to_string(),
                }),
            },
            KEY_SINK => match value {
                Value::Str(path) => self.set_save_path(path),
                other => Err(Error::InvalidSavePath {
                    path: PathBuf::from(other.to_string()),
                    reason: "path must be a string",
                }),
            },
            KEY_LOCK_ON_WRITE => match value.as_bool() {
                Some(lock) => Ok(self.set_lock_on_write(lock)),
                None => Err(Error::InvalidLockOnWrite {
                    found: value.kind().to_owned(),
                }),
            },
            _ => {
                self.extra.insert(key.to_owned(), value);
                Ok(self)
            }
        }
    }

    /// Snapshot of every key held, recognized and extension.
    #[must_use]
    pub fn get_all(&self) -> BTreeMap<String, Value> {
        let mut all = self.extra.clone();
        for key in [KEY_LABEL, KEY_LEVEL, KEY_SINK, KEY_LOCK_ON_WRITE] {
            if let Some(v) = self.get(key) {
                all.insert(key.to_owned(), v);
            }
        }
        all
    }

    fn check_save_path(&self, path: &Path) -> Result<()> {
        let dir = parent_dir(path);
        let reason = if !self.fs.exists(dir) {
            "directory does not exist"
        } else if !self.fs.is_writable(dir) {
            "directory is not writable"
        } else {
            return Ok(());
        };
        Err(Error::InvalidSavePath {
            path: path.to_path_buf(),
            reason,
        })
    }
}

/// `<dir>/<YYYY-MM-DD>.log` for the clock's current date.
pub fn daily_log_path(dir: &Path, clock: &dyn Clock) -> PathBuf {
    dir.join(format!("{}.log", clock.date()))
}

/// Directory component of `path`; a bare file name lives in `.`.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Locates the directory of the executable, or falls back to the current working
/// directory on error.
fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Cloneable handle to a [`Config`] shared by one or more loggers.
#[derive(Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Config>>,
}

impl SharedConfig {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Config> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Config> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key)
    }

    /// # Errors
    /// See [`Config::set`].
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.write().set(key, value).map(|_| ())
    }

    #[must_use]
    pub fn get_all(&self) -> BTreeMap<String, Value> {
        self.read().get_all()
    }

    /// Whether both handles point at the same configuration.
    #[must_use]
    pub fn ptr_eq(&self, other: &SharedConfig) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<Config> for SharedConfig {
    fn from(config: Config) -> Self {
        Self::new(config)
    }
}

impl fmt::Debug for SharedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedConfig").field(&*self.read()).finish()
    }
}
