use crate::db::db::{RocksDB, RocksTransaction, RocksTransactionIterator, CF_MARKERS};
use crate::db::iter::{decode_marker, find_at_or_above, find_at_or_below, MarkerIterator};
use crate::error::StoreUnavailable;
use crate::key::PositionKey;
use crate::kv::{MarkerRead, MarkerWrite};
use crate::util::borsh_serialize;
use anyhow::Context;
use iptag_primitives::{Marker, Position};
use parking_lot::MutexGuard;
use rocksdb::ColumnFamily;


/// Write batch over an optimistic RocksDB transaction.
///
/// Field order is drop order: an uncommitted transaction is rolled back
/// before the writer lock is released.
pub struct Tx<'a> {
    db: &'a RocksDB,
    transaction: RocksTransaction<'a>,
    _lock: MutexGuard<'a, ()>
}


impl <'a> Tx<'a> {
    pub(super) fn new(db: &'a RocksDB, lock: MutexGuard<'a, ()>) -> Self {
        Self {
            db,
            transaction: db.transaction(),
            _lock: lock
        }
    }

    fn new_cursor(&self) -> RocksTransactionIterator<'a, '_> {
        self.transaction.raw_iterator_cf(self.cf_handle())
    }

    fn cf_handle(&self) -> &'a ColumnFamily {
        self.db.cf_handle(CF_MARKERS).expect("markers column family is created on open")
    }
}


impl <'a> MarkerRead for Tx<'a> {
    type Scan<'b> = MarkerIterator<RocksTransactionIterator<'a, 'b>> where Self: 'b;

    fn get(&self, position: Position) -> anyhow::Result<Option<Marker>> {
        let key = PositionKey::new(position);
        let maybe_bytes = self.transaction.get_pinned_cf(
            self.cf_handle(),
            key
        ).context(StoreUnavailable)?;
        Ok(if let Some(bytes) = maybe_bytes {
            Some(decode_marker(key.as_ref(), bytes.as_ref())?)
        } else {
            None
        })
    }

    fn at_or_below(&self, position: Position) -> anyhow::Result<Option<Marker>> {
        find_at_or_below(self.new_cursor(), position)
    }

    fn at_or_above(&self, position: Position) -> anyhow::Result<Option<Marker>> {
        find_at_or_above(self.new_cursor(), position)
    }

    fn scan(&self, from: Position, to: Position) -> Self::Scan<'_> {
        MarkerIterator::new(self.new_cursor(), from, to)
    }
}


impl <'a> MarkerWrite for Tx<'a> {
    fn put(&mut self, marker: &Marker) -> anyhow::Result<()> {
        self.transaction.put_cf(
            self.cf_handle(),
            PositionKey::new(marker.position),
            borsh_serialize(marker)
        ).context(StoreUnavailable)
    }

    fn delete(&mut self, position: Position) -> anyhow::Result<()> {
        self.transaction.delete_cf(
            self.cf_handle(),
            PositionKey::new(position)
        ).context(StoreUnavailable)
    }

    fn commit(self) -> anyhow::Result<()> {
        self.transaction.commit().context(StoreUnavailable)
    }
}
