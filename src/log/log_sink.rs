use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

/// An open, writable destination for formatted log lines.
///
/// Locking is advisory and cooperative. The defaults are no-ops so that in-memory
/// writers can be injected without pretending to support OS locks.
pub trait SinkHandle: Write + Send {
    /// Takes an exclusive advisory lock, blocking until it is granted.
    fn acquire_lock(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Releases a lock taken with [`acquire_lock`](Self::acquire_lock).
    fn release_lock(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SinkHandle for File {
    fn acquire_lock(&mut self) -> io::Result<()> {
        File::lock(self)
    }

    fn release_lock(&mut self) -> io::Result<()> {
        File::unlock(self)
    }
}

impl SinkHandle for Vec<u8> {}

impl<S: SinkHandle + ?Sized> SinkHandle for Box<S> {
    fn acquire_lock(&mut self) -> io::Result<()> {
        (**self).acquire_lock()
    }

    fn release_lock(&mut self) -> io::Result<()> {
        (**self).release_lock()
    }
}

/// Cloneable in-memory sink. Every clone appends to the same buffer, so the caller
/// can keep one clone to inspect what a logger wrote into another.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Returns the written lines, without their terminators.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl Write for MemorySink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SinkHandle for MemorySink {}

/// The file-system primitives the logger and its configuration depend on.
///
/// Closing a handle is dropping it.
pub trait FileSystem: Send + Sync {
    fn exists(&self, dir: &Path) -> bool;

    fn is_writable(&self, dir: &Path) -> bool;

    /// Opens `path` for appending, creating the file if it does not exist.
    fn open_append(&self, path: &Path) -> io::Result<Box<dyn SinkHandle>>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, dir: &Path) -> bool {
        dir.exists()
    }

    /// Creates and discards an anonymous file in `dir`, so ownership, ACLs and
    /// read-only mounts are all taken into account.
    fn is_writable(&self, dir: &Path) -> bool {
        dir.is_dir() && tempfile::tempfile_in(dir).is_ok()
    }

    fn open_append(&self, path: &Path) -> io::Result<Box<dyn SinkHandle>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Box::new(file))
    }
}
