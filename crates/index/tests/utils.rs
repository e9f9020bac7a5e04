#![allow(dead_code)]
use anyhow::Context;
use iptag_index::RangeIndex;
use iptag_primitives::{Address, Marker, Position, Tag};
use iptag_storage::memory::{MemoryScan, MemorySnapshot, MemoryTx};
use iptag_storage::{Database, DatabaseSettings, MarkerRead, MarkerStore, MarkerWrite, MemoryStore, StoreUnavailable};
use std::cell::Cell;
use tempfile::TempDir;


pub fn setup_db() -> (Database, TempDir) {
    let db_dir = tempfile::tempdir().unwrap();
    let db = DatabaseSettings::default()
        .with_cache_size(8 * 1024 * 1024)
        .open(db_dir.path())
        .unwrap();
    (db, db_dir)
}


pub fn rocksdb_index() -> (RangeIndex<Database>, TempDir) {
    let (db, dir) = setup_db();
    (RangeIndex::open(db).unwrap(), dir)
}


pub fn memory_index() -> RangeIndex<MemoryStore> {
    RangeIndex::open(MemoryStore::new()).unwrap()
}


pub fn tag(id: &str, reason: &str) -> Option<Tag> {
    Some(Tag {
        id: id.to_string(),
        reason: reason.to_string()
    })
}


/// Lookup result for every address in `[first, last]`.
pub fn lookups<S: MarkerStore>(index: &RangeIndex<S>, first: Address, last: Address) -> Vec<Option<Tag>> {
    let snapshot = index.snapshot();
    (first..=last).map(|a| snapshot.lookup(a).unwrap()).collect()
}


/// Memory store whose transactions fail once they have written `fail_after` times.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_after: Cell<Option<usize>>
}


impl FailingStore {
    pub fn fail_after(&self, writes: usize) {
        self.fail_after.set(Some(writes))
    }

    pub fn heal(&self) {
        self.fail_after.set(None)
    }
}


impl MarkerStore for FailingStore {
    type Snapshot<'a> = MemorySnapshot<'a>;
    type Tx<'a> = FailingTx<'a>;

    fn snapshot(&self) -> MemorySnapshot<'_> {
        self.inner.snapshot()
    }

    fn transaction(&self) -> FailingTx<'_> {
        FailingTx {
            inner: self.inner.transaction(),
            remaining: self.fail_after.get()
        }
    }
}


pub struct FailingTx<'a> {
    inner: MemoryTx<'a>,
    remaining: Option<usize>
}


impl <'a> FailingTx<'a> {
    fn spend_write(&mut self) -> anyhow::Result<()> {
        match self.remaining.as_mut() {
            Some(0) => Err(anyhow::anyhow!("injected write failure")).context(StoreUnavailable),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            },
            None => Ok(())
        }
    }
}


impl <'a> MarkerRead for FailingTx<'a> {
    type Scan<'b> = MemoryScan<'b> where Self: 'b;

    fn get(&self, position: Position) -> anyhow::Result<Option<Marker>> {
        self.inner.get(position)
    }

    fn at_or_below(&self, position: Position) -> anyhow::Result<Option<Marker>> {
        self.inner.at_or_below(position)
    }

    fn at_or_above(&self, position: Position) -> anyhow::Result<Option<Marker>> {
        self.inner.at_or_above(position)
    }

    fn scan(&self, from: Position, to: Position) -> MemoryScan<'_> {
        self.inner.scan(from, to)
    }
}


impl <'a> MarkerWrite for FailingTx<'a> {
    fn put(&mut self, marker: &Marker) -> anyhow::Result<()> {
        self.spend_write()?;
        self.inner.put(marker)
    }

    fn delete(&mut self, position: Position) -> anyhow::Result<()> {
        self.spend_write()?;
        self.inner.delete(position)
    }

    fn commit(self) -> anyhow::Result<()> {
        self.inner.commit()
    }
}
