//! redb-backed cache storage.
//!
//! One database file per cache directory, one row per cache key. Rows are
//! bincode-encoded [`StoredItem`]s carrying the format version and options
//! scope they were written with. Rows from another layout or scope read as
//! misses instead of failing or serving fragments built for other options.
//!
//! redb calls block, so every read and write runs on tokio's blocking pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use tokio::task;

use super::{CacheConfig, CacheError, CacheResult, CachedItem, ContentCache, ETag};

/// Current layout of stored rows. Bump when [`CachedItem`] changes shape.
pub const CACHE_FORMAT_VERSION: u32 = 2;

const DB_FILENAME: &str = "chunks-cache.redb";

/// Cache table: maps cache keys to serialized items.
const ITEMS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("chunks");

#[derive(Debug, Serialize, Deserialize)]
struct StoredItem {
    format_version: u32,
    scope: String,
    etag: ETag,
    item: CachedItem,
}

impl From<redb::DatabaseError> for CacheError {
    fn from(err: redb::DatabaseError) -> Self {
        CacheError::Database(err.to_string())
    }
}

impl From<redb::TableError> for CacheError {
    fn from(err: redb::TableError) -> Self {
        CacheError::Database(err.to_string())
    }
}

impl From<redb::TransactionError> for CacheError {
    fn from(err: redb::TransactionError) -> Self {
        CacheError::Database(err.to_string())
    }
}

impl From<redb::StorageError> for CacheError {
    fn from(err: redb::StorageError) -> Self {
        CacheError::Database(err.to_string())
    }
}

impl From<redb::CommitError> for CacheError {
    fn from(err: redb::CommitError) -> Self {
        CacheError::Database(err.to_string())
    }
}

impl From<task::JoinError> for CacheError {
    fn from(err: task::JoinError) -> Self {
        CacheError::Task(err.to_string())
    }
}

/// Persistent [`ContentCache`] stored at `<dir>/chunks-cache.redb`.
///
/// Requires a tokio runtime: reads and writes use `spawn_blocking`.
pub struct PersistentCache {
    db: Arc<Database>,
    force_rebuild: bool,
    scope: String,
}

impl std::fmt::Debug for PersistentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCache")
            .field("force_rebuild", &self.force_rebuild)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl PersistentCache {
    /// Open or create the cache described by `config`.
    ///
    /// Creates the directory and database file if they don't exist.
    pub fn open(config: &CacheConfig) -> CacheResult<Self> {
        let mut cache = Self::open_dir(&config.dir)?;
        cache.force_rebuild = config.should_force_rebuild();
        cache.scope = config.scope.clone();
        Ok(cache)
    }

    /// Open or create a cache in `cache_dir`, reads enabled, empty scope.
    pub fn open_dir(cache_dir: &Path) -> CacheResult<Self> {
        std::fs::create_dir_all(cache_dir)?;

        let db = Database::create(cache_dir.join(DB_FILENAME))?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ITEMS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            force_rebuild: false,
            scope: String::new(),
        })
    }

    /// Number of stored rows.
    pub fn len(&self) -> CacheResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ITEMS_TABLE)?;
        Ok(table.iter()?.count())
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn read_row(db: &Database, key: &str) -> CacheResult<Option<StoredItem>> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(ITEMS_TABLE)?;

    let Some(value) = table.get(key)? else {
        return Ok(None);
    };

    match decode(value.value()) {
        Ok(stored) => Ok(Some(stored)),
        Err(err) => {
            tracing::debug!(key, error = %err, "discarding unreadable cache row");
            Ok(None)
        }
    }
}

fn write_row(db: &Database, key: &str, bytes: &[u8]) -> CacheResult<()> {
    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(ITEMS_TABLE)?;
        table.insert(key, bytes)?;
    }
    write_txn.commit()?;

    Ok(())
}

fn encode(stored: &StoredItem) -> CacheResult<Vec<u8>> {
    bincode::serialize(stored).map_err(|e| CacheError::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> CacheResult<StoredItem> {
    let stored: StoredItem =
        bincode::deserialize(bytes).map_err(|e| CacheError::Deserialization(e.to_string()))?;

    if stored.format_version != CACHE_FORMAT_VERSION {
        return Err(CacheError::VersionMismatch {
            expected: CACHE_FORMAT_VERSION,
            found: stored.format_version,
        });
    }

    Ok(stored)
}

#[async_trait]
impl ContentCache for PersistentCache {
    async fn get(&self, key: &str, etag: &ETag) -> CacheResult<Option<CachedItem>> {
        if self.force_rebuild {
            return Ok(None);
        }

        let db = Arc::clone(&self.db);
        let owned_key = key.to_string();
        let Some(stored) = task::spawn_blocking(move || read_row(&db, &owned_key)).await?? else {
            return Ok(None);
        };

        if stored.scope != self.scope {
            tracing::debug!(key, "cache row written with other options, ignoring");
            return Ok(None);
        }

        Ok((&stored.etag == etag).then_some(stored.item))
    }

    async fn store(&self, key: &str, etag: &ETag, item: CachedItem) -> CacheResult<()> {
        let bytes = encode(&StoredItem {
            format_version: CACHE_FORMAT_VERSION,
            scope: self.scope.clone(),
            etag: etag.clone(),
            item,
        })?;

        let db = Arc::clone(&self.db);
        let owned_key = key.to_string();
        task::spawn_blocking(move || write_row(&db, &owned_key, &bytes)).await?
    }
}
