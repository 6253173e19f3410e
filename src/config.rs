use crate::domain::ports::{CoverageStoreBox, TransactionStoreBox};
use crate::error::Result;
use crate::infrastructure::in_memory::{InMemoryCoverageStore, InMemoryTransactionStore};
use std::path::Path;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DB_PATH_ENV: &str = "RECONCILER_DB_PATH";
pub const BIND_ADDR_ENV: &str = "RECONCILER_BIND_ADDR";

/// The two stores the reconciler needs, backed by the same engine.
pub struct Stores {
    pub transactions: TransactionStoreBox,
    pub coverage: CoverageStoreBox,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            transactions: Box::new(InMemoryTransactionStore::new()),
            coverage: Box::new(InMemoryCoverageStore::new()),
        }
    }

    /// Opens RocksDB at `db_path` when given, in-memory storage otherwise.
    ///
    /// Without the `storage-rocksdb` feature a requested path is ignored with a
    /// warning.
    pub fn open(db_path: Option<&Path>) -> Result<Self> {
        match db_path {
            Some(path) => Self::open_persistent(path),
            None => Ok(Self::in_memory()),
        }
    }

    #[cfg(feature = "storage-rocksdb")]
    fn open_persistent(path: &Path) -> Result<Self> {
        use crate::infrastructure::rocksdb::RocksDBStore;

        let store = RocksDBStore::open(path)?;
        tracing::info!(path = %path.display(), "using RocksDB storage");
        Ok(Self {
            transactions: Box::new(store.clone()),
            coverage: Box::new(store),
        })
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    fn open_persistent(path: &Path) -> Result<Self> {
        tracing::warn!(
            path = %path.display(),
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
        Ok(Self::in_memory())
    }
}
