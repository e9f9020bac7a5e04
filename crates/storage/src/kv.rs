use iptag_primitives::{Marker, Position};


/// Ordered read access to markers keyed by position.
pub trait MarkerRead {
    type Scan<'a>: Iterator<Item = anyhow::Result<Marker>> where Self: 'a;

    fn get(&self, position: Position) -> anyhow::Result<Option<Marker>>;

    /// The marker with the greatest position `<= position`.
    fn at_or_below(&self, position: Position) -> anyhow::Result<Option<Marker>>;

    /// The marker with the smallest position `>= position`.
    fn at_or_above(&self, position: Position) -> anyhow::Result<Option<Marker>>;

    /// Markers with `from <= position <= to` in ascending order.
    fn scan(&self, from: Position, to: Position) -> Self::Scan<'_>;
}


/// A write batch. Reads observe the batch's own writes.
///
/// Nothing becomes visible to other readers before `commit`,
/// and a batch dropped without `commit` leaves the store untouched.
pub trait MarkerWrite: MarkerRead {
    fn put(&mut self, marker: &Marker) -> anyhow::Result<()>;

    fn delete(&mut self, position: Position) -> anyhow::Result<()>;

    fn commit(self) -> anyhow::Result<()> where Self: Sized;
}


pub trait MarkerStore {
    type Snapshot<'a>: MarkerRead where Self: 'a;
    type Tx<'a>: MarkerWrite where Self: 'a;

    /// Consistent read view, unaffected by later commits.
    fn snapshot(&self) -> Self::Snapshot<'_>;

    /// Write transactions are serialized: at most one is open at a time.
    fn transaction(&self) -> Self::Tx<'_>;
}


pub trait KvReadCursor {
    fn seek(&mut self, key: &[u8]) -> anyhow::Result<()>;

    fn seek_prev(&mut self, key: &[u8]) -> anyhow::Result<()>;

    fn next(&mut self) -> anyhow::Result<()>;

    fn is_valid(&self) -> bool;

    fn key(&self) -> &[u8];

    fn value(&self) -> &[u8];
}
