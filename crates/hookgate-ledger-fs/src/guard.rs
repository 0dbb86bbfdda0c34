use std::fs::{File, OpenOptions, Permissions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use hookgate_ledger::LedgerError;
use tracing::debug;

/// Mode for a document created by the ledger itself.
#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

/// A ledger document plus its sidecar lock file `.<name>.lock`.
///
/// Every read holds the shared lock and every read-modify-write holds the
/// exclusive lock for the whole cycle. Writes land in a temp file in the
/// same directory and are renamed into place.
#[derive(Clone, Debug)]
pub struct LedgerFile {
    path: PathBuf,
    lock_path: PathBuf,
}

impl LedgerFile {
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            path: dir.join(name),
            lock_path: dir.join(format!(".{name}.lock")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock(&self) -> Result<File, LedgerError> {
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| LedgerError::io("open lock", &self.lock_path, e))
    }

    fn read_current(&self) -> Result<Option<String>, LedgerError> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LedgerError::io("read", &self.path, e)),
        }
    }

    /// Mode for the replacement file: the existing document's if there is one.
    fn permissions(&self) -> Result<Option<Permissions>, LedgerError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta.permissions())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(new_file_permissions()),
            Err(e) => Err(LedgerError::io("stat", &self.path, e)),
        }
    }

    fn write_atomic(&self, contents: &str) -> Result<(), LedgerError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| LedgerError::io("create temp in", dir, e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| LedgerError::io("write temp for", &self.path, e))?;
        if let Some(perms) = self.permissions()? {
            tmp.as_file()
                .set_permissions(perms)
                .map_err(|e| LedgerError::io("set permissions for", &self.path, e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| LedgerError::io("sync temp for", &self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| LedgerError::io("persist", &self.path, e.error))?;
        Ok(())
    }

    /// Read under the shared lock. `None` when the document does not exist.
    pub fn read(&self) -> Result<Option<String>, LedgerError> {
        let lock = self.open_lock()?;
        FileExt::lock_shared(&lock).map_err(|e| LedgerError::io("lock", &self.lock_path, e))?;
        let out = self.read_current();
        drop(lock);
        out
    }

    /// One atomic read-modify-write. `op` gets the current text (`None` if
    /// absent) and returns the new text, or `None` to leave the file as is.
    pub fn modify<T>(
        &self,
        op: impl FnOnce(Option<&str>) -> Result<(Option<String>, T), LedgerError>,
    ) -> Result<T, LedgerError> {
        let lock = self.open_lock()?;
        FileExt::lock_exclusive(&lock).map_err(|e| LedgerError::io("lock", &self.lock_path, e))?;
        let current = self.read_current()?;
        let (next, out) = op(current.as_deref())?;
        if let Some(next) = next {
            if current.as_deref() != Some(next.as_str()) {
                self.write_atomic(&next)?;
                debug!(path = %self.path.display(), bytes = next.len(), "ledger written");
            }
        }
        drop(lock);
        Ok(out)
    }
}
