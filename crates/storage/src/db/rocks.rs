use crate::error::StoreUnavailable;
use crate::kv::KvReadCursor;
use anyhow::Context;
use rocksdb::{DBAccess, DBRawIteratorWithThreadMode};


impl <'a, D: DBAccess> KvReadCursor for DBRawIteratorWithThreadMode<'a, D> {
    fn seek(&mut self, key: &[u8]) -> anyhow::Result<()> {
        self.seek(key);
        self.status().context(StoreUnavailable)
    }

    fn seek_prev(&mut self, key: &[u8]) -> anyhow::Result<()> {
        self.seek_for_prev(key);
        self.status().context(StoreUnavailable)
    }

    fn next(&mut self) -> anyhow::Result<()> {
        self.next();
        self.status().context(StoreUnavailable)
    }

    fn is_valid(&self) -> bool {
        self.valid()
    }

    fn key(&self) -> &[u8] {
        self.key().unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.value().unwrap_or_default()
    }
}
