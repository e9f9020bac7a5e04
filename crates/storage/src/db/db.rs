use crate::db::snapshot::ReadSnapshot;
use crate::db::tx::Tx;
use crate::error::StoreUnavailable;
use crate::kv::MarkerStore;
use anyhow::Context;
use parking_lot::Mutex;
use rocksdb::{ColumnFamilyDescriptor, Options as RocksOptions};
use std::path::Path;


pub(super) const CF_MARKERS: &str = "MARKERS";


pub(super) type RocksDB = rocksdb::OptimisticTransactionDB;
pub(super) type RocksTransaction<'a> = rocksdb::Transaction<'a, RocksDB>;
pub(super) type RocksTransactionIterator<'a, 'b> = rocksdb::DBRawIteratorWithThreadMode<'b, RocksTransaction<'a>>;
pub(super) type RocksSnapshot<'a> = rocksdb::SnapshotWithThreadMode<'a, RocksDB>;
pub(super) type RocksSnapshotIterator<'a> = rocksdb::DBRawIteratorWithThreadMode<'a, RocksDB>;


#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    cache_size: usize,
    wal_compression: bool,
    rocksdb_stats: bool
}


impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            cache_size: 64 * 1024 * 1024,
            wal_compression: true,
            rocksdb_stats: false
        }
    }
}


impl DatabaseSettings {
    pub fn with_cache_size(mut self, bytes: usize) -> Self {
        self.cache_size = bytes;
        self
    }

    pub fn with_wal_compression(mut self, yes: bool) -> Self {
        self.wal_compression = yes;
        self
    }

    pub fn with_rocksdb_stats(mut self, yes: bool) -> Self {
        self.rocksdb_stats = yes;
        self
    }

    pub fn open(&self, path: impl AsRef<Path>) -> anyhow::Result<Database> {
        let mut options = RocksOptions::default();
        options.create_if_missing(true);
        options.create_missing_column_families(true);
        if self.wal_compression {
            options.set_wal_compression_type(rocksdb::DBCompressionType::Zstd);
        }
        if self.rocksdb_stats {
            options.enable_statistics();
        }

        let cache = rocksdb::Cache::new_lru_cache(self.cache_size);
        let mut block_based_table_factory = rocksdb::BlockBasedOptions::default();
        block_based_table_factory.set_block_cache(&cache);
        options.set_block_based_table_factory(&block_based_table_factory);

        let db = RocksDB::open_cf_descriptors(&options, path.as_ref(), [
            ColumnFamilyDescriptor::new(CF_MARKERS, {
                let mut options = RocksOptions::default();
                options.set_compression_type(rocksdb::DBCompressionType::Lz4);
                options
            })
        ]).with_context(|| {
            format!("failed to open database at {}", path.as_ref().display())
        }).context(StoreUnavailable)?;

        Ok(Database {
            db,
            options,
            write_lock: Mutex::new(())
        })
    }
}


/// Markers persisted in RocksDB, one record per occupied position.
///
/// Writers are serialized by a process-wide lock, so optimistic
/// transactions never hit a commit conflict and nothing is retried.
pub struct Database {
    db: RocksDB,
    options: RocksOptions,
    write_lock: Mutex<()>
}


impl Database {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        DatabaseSettings::default().open(path)
    }

    pub fn get_statistics(&self) -> Option<String> {
        self.options.get_statistics()
    }
}


impl MarkerStore for Database {
    type Snapshot<'a> = ReadSnapshot<'a>;
    type Tx<'a> = Tx<'a>;

    fn snapshot(&self) -> ReadSnapshot<'_> {
        ReadSnapshot::new(&self.db)
    }

    fn transaction(&self) -> Tx<'_> {
        Tx::new(&self.db, self.write_lock.lock())
    }
}
