//! Persistent record store with a per-owner retention window.
//!
//! Datasets and their records live in SQLite. Every ingest runs in one
//! IMMEDIATE transaction that writes the dataset, writes its records, and
//! then evicts the owner's oldest datasets beyond the retention window.
//! If any step fails the transaction rolls back and nothing is visible.
//!
//! Lookups are scoped to the requesting owner: another owner's dataset is
//! reported as [`StoreError::NotFound`], exactly like a missing one.

use crate::error::StoreError;
use crate::stats::StatisticsBundle;
use crate::types::{Dataset, DatasetId, DatasetSummary, RawRow, Record};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Schema version recorded in `store_meta`.
const SCHEMA_VERSION: i64 = 1;

/// Default number of datasets kept per owner.
pub const DEFAULT_RETENTION_LIMIT: usize = 5;

/// Busy timeout for concurrent writers sharing one database file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Cap on live datasets per owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    max_datasets_per_owner: usize,
}

impl RetentionPolicy {
    pub fn new(max_datasets_per_owner: usize) -> Result<Self, StoreError> {
        if max_datasets_per_owner == 0 {
            return Err(StoreError::InvalidConfig("retention window must keep at least one dataset".to_string()));
        }
        Ok(Self { max_datasets_per_owner })
    }

    pub fn limit(&self) -> usize {
        self.max_datasets_per_owner
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { max_datasets_per_owner: DEFAULT_RETENTION_LIMIT }
    }
}

/// SQLite-backed dataset store
pub struct RecordStore {
    connection: Mutex<Connection>,
    retention: RetentionPolicy,
}

impl RecordStore {
    /// Open (or create) a store at `path`.
    pub fn open(path: &Path, retention: RetentionPolicy) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Db(format!("{}: {}", parent.display(), e)))?;
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let connection = Connection::open_with_flags(path, flags)?;
        connection.execute_batch("PRAGMA journal_mode = WAL;")?;
        debug!("Opened record store at {}", path.display());
        Self::from_connection(connection, retention)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory(retention: RetentionPolicy) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?, retention)
    }

    fn from_connection(mut connection: Connection, retention: RetentionPolicy) -> Result<Self, StoreError> {
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;
        connection.busy_timeout(BUSY_TIMEOUT)?;
        initialize_schema(&mut connection)?;
        Ok(Self { connection: Mutex::new(connection), retention })
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection.lock().map_err(|_| StoreError::Db("connection mutex poisoned".to_string()))
    }

    /// Persist a dataset and its records, then apply the retention window.
    ///
    /// Returns the id of the new dataset. On error nothing is written.
    pub fn ingest(
        &self,
        owner: &str,
        source_name: &str,
        rows: &[RawRow],
        bundle: &StatisticsBundle,
    ) -> Result<DatasetId, StoreError> {
        if let Some(row) = rows.iter().find(|r| !(r.flowrate.is_finite() && r.pressure.is_finite() && r.temperature.is_finite())) {
            return Err(StoreError::Invalid(format!("record '{}' has a non-finite measurement", row.name)));
        }
        let statistics_json = bundle.to_json().map_err(|e| StoreError::Invalid(e.to_string()))?;

        let mut guard = self.lock()?;
        let tx = guard.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let latest: Option<i64> = tx.query_row("SELECT MAX(created_at) FROM datasets", [], |row| row.get(0))?;
        let created_at = unix_millis().max(latest.unwrap_or(i64::MIN));

        tx.execute(
            "INSERT INTO datasets (owner, source_name, created_at, statistics_json) VALUES (?1, ?2, ?3, ?4)",
            params![owner, source_name, created_at, statistics_json],
        )?;
        let dataset_id = tx.last_insert_rowid();

        {
            let mut insert = tx.prepare_cached(
                "INSERT INTO records (dataset_id, name, category, flowrate, pressure, temperature) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                insert.execute(params![dataset_id, row.name, row.category, row.flowrate, row.pressure, row.temperature])?;
            }
        }

        let evicted = enforce_retention(&tx, owner, self.retention)?;
        tx.commit()?;

        info!(
            "Stored dataset {} ('{}') for {} with {} records; evicted {}",
            dataset_id,
            source_name,
            owner,
            rows.len(),
            evicted.len()
        );
        Ok(dataset_id)
    }

    /// List an owner's datasets, newest first.
    pub fn list(&self, owner: &str) -> Result<Vec<DatasetSummary>, StoreError> {
        let guard = self.lock()?;
        let mut stmt = guard.prepare(
            "SELECT d.id, d.source_name, d.created_at, d.statistics_json, \
                    (SELECT COUNT(*) FROM records r WHERE r.dataset_id = d.id) \
             FROM datasets d WHERE d.owner = ?1 \
             ORDER BY d.created_at DESC, d.id DESC",
        )?;
        let rows = stmt.query_map(params![owner], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, source_name, created_at, statistics_json, count) = row?;
            let summary = statistics_json.as_deref().and_then(|json| match StatisticsBundle::from_json(json) {
                Ok(bundle) => Some(bundle),
                Err(e) => {
                    warn!("Dataset {} has an unreadable statistics bundle: {}", id, e);
                    None
                }
            });
            let record_count =
                usize::try_from(count).map_err(|_| StoreError::Corrupt(format!("negative record count for {}", id)))?;
            summaries.push(DatasetSummary { id, source_name, created_at, summary, record_count });
        }
        Ok(summaries)
    }

    /// Fetch one dataset with its records (ordered by name).
    pub fn get(&self, owner: &str, id: DatasetId) -> Result<(Dataset, Vec<Record>), StoreError> {
        let guard = self.lock()?;
        let dataset = guard
            .query_row(
                "SELECT id, owner, source_name, created_at, statistics_json FROM datasets \
                 WHERE id = ?1 AND owner = ?2",
                params![id, owner],
                |row| {
                    Ok(Dataset {
                        id: row.get(0)?,
                        owner: row.get(1)?,
                        source_name: row.get(2)?,
                        created_at: row.get(3)?,
                        statistics_json: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound { id })?;

        let mut stmt = guard.prepare(
            "SELECT id, dataset_id, name, category, flowrate, pressure, temperature FROM records \
             WHERE dataset_id = ?1 ORDER BY name ASC, id ASC",
        )?;
        let records = stmt
            .query_map(params![id], |row| {
                Ok(Record {
                    id: row.get(0)?,
                    dataset_id: row.get(1)?,
                    name: row.get(2)?,
                    category: row.get(3)?,
                    flowrate: row.get(4)?,
                    pressure: row.get(5)?,
                    temperature: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((dataset, records))
    }

    /// Delete one of the owner's datasets (records cascade).
    pub fn delete(&self, owner: &str, id: DatasetId) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let affected = guard.execute("DELETE FROM datasets WHERE id = ?1 AND owner = ?2", params![id, owner])?;
        if affected == 0 {
            return Err(StoreError::NotFound { id });
        }
        info!("Deleted dataset {} for {}", id, owner);
        Ok(())
    }
}

/// Keep the owner's newest `policy.limit()` datasets and delete the rest.
///
/// Runs inside the ingest transaction; failures surface as
/// [`StoreError::Retention`] and abort the whole ingest.
fn enforce_retention(tx: &Transaction<'_>, owner: &str, policy: RetentionPolicy) -> Result<Vec<DatasetId>, StoreError> {
    let retention_err = |e: rusqlite::Error| StoreError::Retention(e.to_string());
    let keep = i64::try_from(policy.limit()).map_err(|_| StoreError::InvalidConfig("retention window too large".to_string()))?;

    let expired: Vec<DatasetId> = {
        let mut stmt = tx
            .prepare(
                "SELECT id FROM datasets WHERE owner = ?1 \
                 ORDER BY created_at DESC, id DESC LIMIT -1 OFFSET ?2",
            )
            .map_err(retention_err)?;
        let ids = stmt.query_map(params![owner, keep], |row| row.get(0)).map_err(retention_err)?;
        ids.collect::<Result<Vec<_>, _>>().map_err(retention_err)?
    };

    for id in &expired {
        tx.execute("DELETE FROM datasets WHERE id = ?1", params![id]).map_err(retention_err)?;
        debug!("Evicted dataset {} for {}", id, owner);
    }
    Ok(expired)
}

/// Create the schema or validate an existing one.
fn initialize_schema(connection: &mut Connection) -> Result<(), StoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> =
        tx.query_row("SELECT version FROM store_meta LIMIT 1", [], |row| row.get(0)).optional()?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS datasets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner TEXT NOT NULL,
                    source_name TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    statistics_json TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_datasets_owner_created
                    ON datasets (owner, created_at DESC, id DESC);
                CREATE TABLE IF NOT EXISTS records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    dataset_id INTEGER NOT NULL REFERENCES datasets(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    category TEXT NOT NULL,
                    flowrate REAL NOT NULL,
                    pressure REAL NOT NULL,
                    temperature REAL NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_records_dataset ON records (dataset_id, name);",
            )?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(StoreError::Corrupt(format!("unsupported schema version: {}", value)));
        }
    }
    tx.commit()?;
    Ok(())
}

/// Current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;
