use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::model::AppEntry;

pub const DEFAULT_RECENCY_WINDOW_MS: i64 = 3_600_000;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable package id -> last launch (epoch millis) map.
///
/// Implementations serialize writers; a read issued after a write on the
/// same store observes that write.
pub trait RecencyStore: Send + Sync {
    fn get(&self, package_id: &str) -> Result<Option<i64>, StoreError>;
    fn set(&self, package_id: &str, epoch_millis: i64) -> Result<(), StoreError>;
    fn clear_all(&self) -> Result<(), StoreError>;
    /// Every record, read in one consistent pass.
    fn snapshot(&self) -> Result<HashMap<String, i64>, StoreError>;
}

pub struct SqliteRecencyStore {
    db: Mutex<Connection>,
}

impl SqliteRecencyStore {
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    pub fn open_file(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS recency (
                package_id TEXT PRIMARY KEY,
                last_launched_ms INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecencyStore for SqliteRecencyStore {
    fn get(&self, package_id: &str) -> Result<Option<i64>, StoreError> {
        let db = self.conn();
        let value = db
            .query_row(
                "SELECT last_launched_ms FROM recency WHERE package_id = ?1",
                params![package_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, package_id: &str, epoch_millis: i64) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO recency (package_id, last_launched_ms) VALUES (?1, ?2)
             ON CONFLICT(package_id) DO UPDATE SET last_launched_ms=excluded.last_launched_ms",
            params![package_id, epoch_millis],
        )?;
        Ok(())
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        self.conn().execute("DELETE FROM recency", [])?;
        Ok(())
    }

    fn snapshot(&self) -> Result<HashMap<String, i64>, StoreError> {
        let db = self.conn();
        let mut stmt = db.prepare("SELECT package_id, last_launched_ms FROM recency")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        let mut out = HashMap::new();
        for row in rows {
            let (package_id, last) = row?;
            out.insert(package_id, last);
        }
        Ok(out)
    }
}

#[derive(Debug, Default)]
pub struct MemoryRecencyStore {
    entries: RwLock<HashMap<String, i64>>,
}

impl MemoryRecencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecencyStore for MemoryRecencyStore {
    fn get(&self, package_id: &str) -> Result<Option<i64>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(package_id).copied())
    }

    fn set(&self, package_id: &str, epoch_millis: i64) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(package_id.to_string(), epoch_millis);
        Ok(())
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        Ok(())
    }

    fn snapshot(&self) -> Result<HashMap<String, i64>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.clone())
    }
}

/// Last-launch bookkeeping consulted by the empty query.
#[derive(Clone)]
pub struct RecencyTracker {
    store: Arc<dyn RecencyStore>,
    window_ms: i64,
}

impl RecencyTracker {
    pub fn new(store: Arc<dyn RecencyStore>) -> Self {
        Self {
            store,
            window_ms: DEFAULT_RECENCY_WINDOW_MS,
        }
    }

    pub fn with_window_ms(mut self, window_ms: i64) -> Self {
        self.window_ms = window_ms;
        self
    }

    pub fn record_launch(&self, package_id: &str, now_ms: i64) {
        match self.store.set(package_id, now_ms) {
            Ok(()) => debug!(package_id, now_ms, "recorded launch"),
            Err(error) => warn!(package_id, %error, "failed to record launch"),
        }
    }

    pub fn clear(&self) {
        match self.store.clear_all() {
            Ok(()) => debug!("cleared recency store"),
            Err(error) => warn!(%error, "failed to clear recency store"),
        }
    }

    pub fn last_launch(&self, package_id: &str) -> Option<i64> {
        self.store.get(package_id).unwrap_or_else(|error| {
            warn!(package_id, %error, "failed to read recency record");
            None
        })
    }

    /// Apps launched strictly less than the window ago, in input order.
    pub fn recently_used(&self, apps: &[AppEntry], now_ms: i64) -> Vec<AppEntry> {
        let records = self.store.snapshot().unwrap_or_else(|error| {
            warn!(%error, "failed to read recency store");
            HashMap::new()
        });
        filter_recent(apps, &records, now_ms, self.window_ms)
    }
}

/// Pure window filter; a missing record counts as "never launched".
pub fn filter_recent(
    apps: &[AppEntry],
    records: &HashMap<String, i64>,
    now_ms: i64,
    window_ms: i64,
) -> Vec<AppEntry> {
    apps.iter()
        .filter(|app| {
            records
                .get(&app.package_id)
                .is_some_and(|last| now_ms.saturating_sub(*last) < window_ms)
        })
        .cloned()
        .collect()
}
