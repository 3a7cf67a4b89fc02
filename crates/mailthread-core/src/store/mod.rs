use std::path::Path;
#[cfg(unix)]
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::error::{MailIndexError, Result};

mod documents;
mod migration;

pub use documents::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

struct StoreInner {
    conn: Connection,
    atomic_depth: usize,
}

/// Term-indexed document store with key/value metadata, backed by SQLite.
///
/// Exactly one writable handle is expected per index file; nothing here
/// coordinates concurrent writers.
#[derive(Clone)]
pub struct SqliteIndexStore {
    inner: Arc<Mutex<StoreInner>>,
    mode: OpenMode,
}

impl std::fmt::Debug for SqliteIndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteIndexStore")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl SqliteIndexStore {
    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>> {
        self.inner
            .lock()
            .map_err(|_| MailIndexError::mutex_poisoned("sqlite"))
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let inner = self.lock()?;
        f(&inner.conn)
    }

    fn with_conn_mut<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut inner = self.lock()?;
        f(&mut inner.conn)
    }

    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let conn = match mode {
            OpenMode::ReadWrite => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path)?
            }
            OpenMode::ReadOnly => {
                if !path.exists() {
                    return Err(MailIndexError::Validation(format!(
                        "index does not exist: {}",
                        path.display()
                    )));
                }
                Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?
            }
        };
        let store = Self {
            inner: Arc::new(Mutex::new(StoreInner {
                conn,
                atomic_depth: 0,
            })),
            mode,
        };
        match mode {
            OpenMode::ReadWrite => {
                store.migrate()?;
                #[cfg(unix)]
                harden_sqlite_permissions(path)?;
            }
            OpenMode::ReadOnly => store.verify_schema()?,
        }
        Ok(store)
    }

    #[must_use]
    pub const fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn ensure_writable(&self) -> Result<()> {
        match self.mode {
            OpenMode::ReadWrite => Ok(()),
            OpenMode::ReadOnly => Err(MailIndexError::ReadOnlyStore),
        }
    }

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM index_metadata WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_writable()?;
        self.with_conn(|conn| {
            conn.execute(
                r"
                INSERT INTO index_metadata(key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                  value = excluded.value,
                  updated_at = excluded.updated_at
                ",
                params![key, value, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }

    pub fn clear_metadata(&self, key: &str) -> Result<bool> {
        self.ensure_writable()?;
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM index_metadata WHERE key = ?1", params![key])?;
            Ok(affected > 0)
        })
    }

    /// Enters an atomic scope. Scopes nest; only the outermost one opens a transaction.
    pub fn begin_atomic(&self) -> Result<()> {
        self.ensure_writable()?;
        let mut inner = self.lock()?;
        if inner.atomic_depth == 0 {
            inner.conn.execute_batch("BEGIN IMMEDIATE")?;
        }
        inner.atomic_depth += 1;
        Ok(())
    }

    /// Leaves an atomic scope, committing when the outermost scope closes.
    pub fn end_atomic(&self) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.atomic_depth == 0 {
            return Err(MailIndexError::InvariantViolation(
                "end_atomic called outside an atomic scope".to_string(),
            ));
        }
        inner.atomic_depth -= 1;
        if inner.atomic_depth == 0
            && let Err(err) = inner.conn.execute_batch("COMMIT")
        {
            let _ = inner.conn.execute_batch("ROLLBACK");
            return Err(err.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn atomic_depth(&self) -> usize {
        self.inner.lock().map_or(0, |inner| inner.atomic_depth)
    }

    pub fn document_count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }
}

#[cfg(unix)]
fn harden_sqlite_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    for suffix in ["", "-wal", "-shm"] {
        let mut os = path.as_os_str().to_os_string();
        os.push(suffix);
        let candidate = PathBuf::from(os);
        if candidate.exists() {
            std::fs::set_permissions(candidate, std::fs::Permissions::from_mode(0o600))?;
        }
    }
    Ok(())
}
