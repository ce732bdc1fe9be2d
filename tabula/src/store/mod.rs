//! Read-only access to the SQLite dataset.
//!
//! A [`Dataset`] owns a small pool of read-only connections. Every connection is
//! opened with `SQLITE_OPEN_READ_ONLY`, has `PRAGMA query_only` switched on, and
//! carries the `unaccent_lower` and `locale_number` SQL functions. Blocking work is
//! moved onto tokio's blocking pool, with a semaphore bounding how many connections
//! are in use at once.

mod functions;
mod value;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OpenFlags};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

use crate::error::{Result, TabulaError};

pub use functions::{register_functions, LOCALE_NUMBER, UNACCENT_LOWER};
pub use value::{Row, Value};

/// Opens a single read-only connection with the dataset functions registered.
pub fn open_read_only(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        return Err(TabulaError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("dataset not found: {}", path.display()),
        )));
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.pragma_update(None, "query_only", true)?;
    register_functions(&conn)?;
    Ok(conn)
}

struct DatasetInner {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
    readers: usize,
}

/// Shared handle to an opened dataset. Cloning is cheap.
#[derive(Clone)]
pub struct Dataset {
    inner: Arc<DatasetInner>,
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("path", &self.inner.path)
            .field("readers", &self.inner.readers)
            .finish()
    }
}

impl Dataset {
    /// Opens `path` with up to `readers` concurrent read-only connections.
    #[instrument(skip(path))]
    pub fn open(path: impl AsRef<Path>, readers: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let readers = readers.max(1);

        let mut connections = Vec::with_capacity(readers);
        for _ in 0..readers {
            connections.push(open_read_only(&path)?);
        }

        info!(readers, "dataset opened read-only");
        Ok(Self {
            inner: Arc::new(DatasetInner {
                path,
                idle: Mutex::new(connections),
                permits: Arc::new(Semaphore::new(readers)),
                readers,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Maximum number of connections in use at once.
    pub fn readers(&self) -> usize {
        self.inner.readers
    }

    /// Runs `f` against a pooled connection on the blocking thread pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| TabulaError::internal(format!("Connection pool closed: {e}")))?;

        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let conn = inner.checkout()?;
            let result = f(&conn);
            inner.checkin(conn);
            result
        })
        .await
        .map_err(|e| TabulaError::internal(format!("Task join error: {e}")))?
    }
}

impl DatasetInner {
    fn checkout(&self) -> Result<Connection> {
        let pooled = self
            .idle
            .lock()
            .map_err(|_| TabulaError::internal("Connection pool lock poisoned"))?
            .pop();
        match pooled {
            Some(conn) => Ok(conn),
            None => {
                debug!("connection pool empty, opening an extra reader");
                open_read_only(&self.path)
            }
        }
    }

    fn checkin(&self, conn: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.readers {
                idle.push(conn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::fixture_file;

    #[tokio::test]
    async fn test_run_counts_rows() {
        let (_dir, path) = fixture_file();
        let dataset = Dataset::open(&path, 2).unwrap();
        let count = dataset
            .run(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM mixed", [], |r| r.get::<_, i64>(0))?)
            })
            .await
            .unwrap();
        assert_eq!(count, 6);
    }

    #[tokio::test]
    async fn test_connections_are_read_only() {
        let (_dir, path) = fixture_file();
        let dataset = Dataset::open(&path, 1).unwrap();
        let result = dataset
            .run(|conn| Ok(conn.execute("DELETE FROM mixed", [])?))
            .await;
        assert!(result.is_err());

        let remaining = dataset
            .run(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM mixed", [], |r| r.get::<_, i64>(0))?)
            })
            .await
            .unwrap();
        assert_eq!(remaining, 6);
    }

    #[tokio::test]
    async fn test_concurrent_runs_share_the_pool() {
        let (_dir, path) = fixture_file();
        let dataset = Dataset::open(&path, 2).unwrap();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dataset = dataset.clone();
                tokio::spawn(async move {
                    dataset
                        .run(|conn| {
                            Ok(conn.query_row(
                                "SELECT unaccent_lower('ÁBC')",
                                [],
                                |r| r.get::<_, String>(0),
                            )?)
                        })
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "abc");
        }
    }

    #[test]
    fn test_open_missing_file() {
        let result = Dataset::open("/definitely/not/here.db", 1);
        assert!(matches!(result, Err(TabulaError::Io(_))));
    }
}
