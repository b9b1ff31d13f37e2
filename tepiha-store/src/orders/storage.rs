//! redb-based storage for the order collection
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `collections` | `"orders_v1"` | versioned JSON document | The order collection |
//! | `counters` | `"code_counter"` | `u64` | Highest order code handed out |
//! | `quarantine` | unix millis, strictly increasing | raw bytes | Undecodable documents and records set aside |
//!
//! # Atomicity
//!
//! The whole collection lives in one value, so every change is a single redb
//! write transaction: read the current document, decode, change, encode,
//! commit. A reader never observes a partially written collection.
//!
//! Nothing in this module decides *how* records combine. Callers get a
//! [`Slot`] inside the transaction and route every change through the merge
//! engine.

use super::code;
use super::codec::{self, Decoded, DocState};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::Order;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for collections: key = slot name, value = encoded document
const COLLECTIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("collections");

/// Table for counters: key = counter name, value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Table for quarantined content: key = unix millis (bumped past the last key), value = raw bytes
const QUARANTINE_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("quarantine");

const ORDERS_KEY: &str = "orders_v1";
const CODE_COUNTER_KEY: &str = "code_counter";

/// Storage errors
///
/// Only engine faults surface here. Malformed stored content is not an error:
/// it decodes to an empty collection.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// The collection as seen inside one write transaction
#[derive(Debug)]
pub struct Slot {
    decoded: Decoded,
    raw_corrupt: Option<Vec<u8>>,
    code_counter: u64,
    orders_dirty: bool,
    counter_dirty: bool,
}

impl Slot {
    pub fn orders(&self) -> &[Order] {
        &self.decoded.orders
    }

    /// Mutable access; the collection will be written back on commit.
    pub fn orders_mut(&mut self) -> &mut Vec<Order> {
        self.orders_dirty = true;
        &mut self.decoded.orders
    }

    /// Decode report for the stored document
    pub fn decoded(&self) -> &Decoded {
        &self.decoded
    }

    /// Force a rewrite in the current schema even if no record changed.
    pub fn mark_dirty(&mut self) {
        self.orders_dirty = true;
    }

    /// Reserve the next code number.
    ///
    /// `next = max(counter, highest code in the collection) + 1`, stored back to
    /// the counter in the same transaction so two reservations never collide.
    pub fn reserve_code(&mut self) -> u64 {
        let next = code::max_number(self.orders())
            .max(self.code_counter)
            .saturating_add(1);
        self.code_counter = next;
        self.counter_dirty = true;
        next
    }

    fn needs_commit(&self) -> bool {
        self.orders_dirty || self.counter_dirty || self.raw_corrupt.is_some()
    }
}

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for OrderStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStorage").finish_non_exhaustive()
    }
}

impl OrderStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable once `commit()` returns (copy-on-write with an
    /// atomic root swap), so a power cut never leaves a half-written collection.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, throwaway stores)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(COLLECTIONS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
            let _ = write_txn.open_table(QUARANTINE_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    // ========== Reads ==========

    /// Read and decode the current collection (snapshot, no lock held after return)
    pub fn load(&self) -> StorageResult<Decoded> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COLLECTIONS_TABLE)?;
        let raw = table.get(ORDERS_KEY)?;
        Ok(codec::decode(raw.as_ref().map(|guard| guard.value())))
    }

    /// Current value of the code counter
    pub fn code_counter(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table
            .get(CODE_COUNTER_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Number of documents and records set aside because they could not be decoded
    pub fn quarantined_count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUARANTINE_TABLE)?;
        Ok(table.len()?)
    }

    // ========== Writes ==========

    /// Run `f` against the collection inside one write transaction.
    ///
    /// The transaction commits only if `f` succeeds and changed something
    /// (collection, counter) or the stored document was corrupt; otherwise it
    /// is aborted and nothing is written.
    pub fn modify<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Slot) -> Result<T, E>,
        E: From<StorageError>,
    {
        let txn = self.db.begin_write().map_err(StorageError::from)?;
        let mut slot = Self::read_slot(&txn)?;

        let value = match f(&mut slot) {
            Ok(value) => value,
            Err(e) => {
                txn.abort().map_err(StorageError::from)?;
                return Err(e);
            }
        };

        Self::finish(txn, slot)?;
        Ok(value)
    }

    fn read_slot(txn: &WriteTransaction) -> StorageResult<Slot> {
        let raw = {
            let table = txn.open_table(COLLECTIONS_TABLE)?;
            let guard = table.get(ORDERS_KEY)?;
            guard.map(|g| g.value().to_vec())
        };
        let code_counter = {
            let table = txn.open_table(COUNTERS_TABLE)?;
            let value = table.get(CODE_COUNTER_KEY)?.map(|g| g.value());
            value.unwrap_or(0)
        };

        let decoded = codec::decode(raw.as_deref());
        let raw_corrupt = if decoded.state == DocState::Corrupt {
            raw
        } else {
            None
        };

        Ok(Slot {
            decoded,
            raw_corrupt,
            code_counter,
            orders_dirty: false,
            counter_dirty: false,
        })
    }

    fn finish(txn: WriteTransaction, slot: Slot) -> StorageResult<()> {
        if !slot.needs_commit() {
            txn.abort()?;
            return Ok(());
        }

        if slot.orders_dirty || slot.raw_corrupt.is_some() {
            // set aside whatever the rewrite would lose, in the same transaction
            let mut quarantine = txn.open_table(QUARANTINE_TABLE)?;
            let mut key = Self::next_quarantine_key(&quarantine)?;
            if let Some(raw) = &slot.raw_corrupt {
                quarantine.insert(key, raw.as_slice())?;
                tracing::warn!(len = raw.len(), key, "Quarantined undecodable orders document");
                key = key.saturating_add(1);
            }
            for record in &slot.decoded.rejected {
                let raw = serde_json::to_vec(record)?;
                quarantine.insert(key, raw.as_slice())?;
                tracing::warn!(len = raw.len(), key, "Quarantined undecodable order record");
                key = key.saturating_add(1);
            }
            drop(quarantine);

            let encoded = codec::encode(&slot.decoded.orders)?;
            let mut table = txn.open_table(COLLECTIONS_TABLE)?;
            table.insert(ORDERS_KEY, encoded.as_slice())?;
        }

        if slot.counter_dirty {
            let mut table = txn.open_table(COUNTERS_TABLE)?;
            table.insert(CODE_COUNTER_KEY, slot.code_counter)?;
        }

        txn.commit()?;
        Ok(())
    }

    /// Quarantine key: now, or one past the newest key if that is later
    fn next_quarantine_key(table: &redb::Table<'_, i64, &'static [u8]>) -> StorageResult<i64> {
        let last = table.last()?.map(|(key, _)| key.value());
        let now = shared::util::now_millis();
        Ok(match last {
            Some(last) => now.max(last.saturating_add(1)),
            None => now,
        })
    }

    /// Store raw bytes in the orders slot, bypassing encoding (tests only)
    #[cfg(test)]
    pub(crate) fn put_raw(&self, raw: &[u8]) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(COLLECTIONS_TABLE)?;
            table.insert(ORDERS_KEY, raw)?;
        }
        txn.commit()?;
        Ok(())
    }
}
