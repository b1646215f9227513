//! SQLite-backed document store.
//!
//! Every document lives in a single `documents` table as a JSON body keyed
//! by `(collection, id)`. A write batch runs inside one transaction, so a
//! failing operation rolls back everything before it.
//!
//! rusqlite is synchronous, so each call runs on tokio's blocking pool
//! with the connection shared behind an `Arc<Mutex<_>>`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::watch;

use super::data_dir;
use crate::error::{CoreError, StoreError};
use crate::gateway::{Document, DocumentStore, Fields, Query, WriteBatch};

/// SQLite database implementing [`DocumentStore`].
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    revision: watch::Sender<u64>,
}

impl SqliteStore {
    /// Open the database at `<data_dir>/focusnest.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("focusnest.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let (revision, _) = watch::channel(0);
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            revision,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        lock(&self.conn)?.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                collection  TEXT NOT NULL,
                id          TEXT NOT NULL,
                body        TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );",
        )?;
        Ok(())
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("sqlite task failed: {e}")))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock()
        .map_err(|_| StoreError::Backend("sqlite connection lock poisoned".into()))
}

fn load(conn: &Connection, collection: &str, id: &str) -> Result<Option<Fields>, StoreError> {
    let mut stmt = conn.prepare_cached("SELECT body FROM documents WHERE collection = ?1 AND id = ?2")?;
    let result = stmt.query_row(params![collection, id], |row| row.get::<_, String>(0));
    match result {
        Ok(body) => Ok(Some(serde_json::from_str(&body)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn store(conn: &Connection, collection: &str, id: &str, fields: &Fields) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
        params![collection, id, serde_json::to_string(fields)?],
    )?;
    Ok(())
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collection = collection.to_string();
        let id = id.to_string();
        self.blocking(move |conn| {
            Ok(load(conn, &collection, &id)?.map(|fields| Document { id, fields }))
        })
        .await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let query = query.clone();
        self.blocking(move |conn| {
            let mut stmt = conn
                .prepare_cached("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id")?;
            let rows = stmt.query_map(params![query.collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut docs = Vec::new();
            for row in rows {
                let (id, body) = row?;
                docs.push(Document {
                    id,
                    fields: serde_json::from_str(&body)?,
                });
            }
            Ok(query.apply(docs))
        })
        .await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            for op in batch.ops() {
                let existing = load(&tx, op.collection(), op.id())?;
                let next = op.apply(existing.as_ref())?;
                store(&tx, op.collection(), op.id(), &next)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await?;
        self.revision.send_modify(|rev| *rev += 1);
        Ok(())
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
