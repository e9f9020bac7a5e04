use crate::db::db::{RocksDB, RocksSnapshot, RocksSnapshotIterator, CF_MARKERS};
use crate::db::iter::{decode_marker, find_at_or_above, find_at_or_below, MarkerIterator};
use crate::error::StoreUnavailable;
use crate::key::PositionKey;
use crate::kv::MarkerRead;
use anyhow::Context;
use iptag_primitives::{Marker, Position};
use rocksdb::{ColumnFamily, ReadOptions};


pub struct ReadSnapshot<'a> {
    db: &'a RocksDB,
    snapshot: RocksSnapshot<'a>
}


impl <'a> ReadSnapshot<'a> {
    pub(super) fn new(db: &'a RocksDB) -> Self {
        Self {
            db,
            snapshot: db.snapshot()
        }
    }

    fn new_cursor(&self) -> RocksSnapshotIterator<'a> {
        self.db.raw_iterator_cf_opt(
            self.cf_handle(),
            self.new_options()
        )
    }

    fn new_options(&self) -> ReadOptions {
        let mut options = ReadOptions::default();
        options.set_snapshot(&self.snapshot);
        options
    }

    fn cf_handle(&self) -> &'a ColumnFamily {
        self.db.cf_handle(CF_MARKERS).expect("markers column family is created on open")
    }
}


impl <'a> MarkerRead for ReadSnapshot<'a> {
    type Scan<'b> = MarkerIterator<RocksSnapshotIterator<'b>> where Self: 'b;

    fn get(&self, position: Position) -> anyhow::Result<Option<Marker>> {
        let key = PositionKey::new(position);
        let maybe_bytes = self.db.get_pinned_cf_opt(
            self.cf_handle(),
            key,
            &self.new_options()
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
