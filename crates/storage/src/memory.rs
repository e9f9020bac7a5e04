use crate::kv::{MarkerRead, MarkerStore, MarkerWrite};
use iptag_primitives::{Marker, Position};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::{Bound, Deref};


type MarkerMap = BTreeMap<Position, Marker>;


/// In-process marker store.
///
/// A snapshot holds the read lock for as long as it lives, and a transaction
/// holds the write lock, so readers always observe whole transactions.
/// Writers block while any snapshot is alive: a thread that opens a transaction
/// while still holding a snapshot of the same store deadlocks.
#[derive(Default)]
pub struct MemoryStore {
    markers: RwLock<MarkerMap>
}


impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.read().is_empty()
    }
}


impl MarkerStore for MemoryStore {
    type Snapshot<'a> = MemorySnapshot<'a>;
    type Tx<'a> = MemoryTx<'a>;

    /// Blocks writers until dropped, never keep it across a write.
    fn snapshot(&self) -> MemorySnapshot<'_> {
        MemorySnapshot {
            markers: self.markers.read()
        }
    }

    fn transaction(&self) -> MemoryTx<'_> {
        MemoryTx {
            markers: self.markers.write(),
            journal: Vec::new()
        }
    }
}


pub struct MemorySnapshot<'a> {
    markers: RwLockReadGuard<'a, MarkerMap>
}


/// Applies writes in place and remembers what they replaced,
/// so that dropping an uncommitted transaction can undo them.
pub struct MemoryTx<'a> {
    markers: RwLockWriteGuard<'a, MarkerMap>,
    journal: Vec<(Position, Option<Marker>)>
}


impl <'a> Drop for MemoryTx<'a> {
    fn drop(&mut self) {
        while let Some((position, previous)) = self.journal.pop() {
            match previous {
                Some(marker) => self.markers.insert(position, marker),
                None => self.markers.remove(&position)
            };
        }
    }
}


impl <'a> MarkerWrite for MemoryTx<'a> {
    fn put(&mut self, marker: &Marker) -> anyhow::Result<()> {
        let previous = self.markers.insert(marker.position, marker.clone());
        self.journal.push((marker.position, previous));
        Ok(())
    }

    fn delete(&mut self, position: Position) -> anyhow::Result<()> {
        if let Some(previous) = self.markers.remove(&position) {
            self.journal.push((position, Some(previous)));
        }
        Ok(())
    }

    fn commit(mut self) -> anyhow::Result<()> {
        self.journal.clear();
        Ok(())
    }
}


pub struct MemoryScan<'a> {
    inner: btree_map::Range<'a, Position, Marker>
}


impl <'a> Iterator for MemoryScan<'a> {
    type Item = anyhow::Result<Marker>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, marker)| Ok(marker.clone()))
    }
}


macro_rules! impl_marker_read {
    ($t:ident) => {
        impl <'a> MarkerRead for $t<'a> {
            type Scan<'b> = MemoryScan<'b> where Self: 'b;

            fn get(&self, position: Position) -> anyhow::Result<Option<Marker>> {
                Ok(self.markers.get(&position).cloned())
            }

            fn at_or_below(&self, position: Position) -> anyhow::Result<Option<Marker>> {
                Ok(at_or_below(self.markers.deref(), position))
            }

            fn at_or_above(&self, position: Position) -> anyhow::Result<Option<Marker>> {
                Ok(at_or_above(self.markers.deref(), position))
            }

            fn scan(&self, from: Position, to: Position) -> MemoryScan<'_> {
                scan(self.markers.deref(), from, to)
            }
        }
    };
}


impl_marker_read!(MemorySnapshot);
impl_marker_read!(MemoryTx);


fn at_or_below(markers: &MarkerMap, position: Position) -> Option<Marker> {
    markers.range(..=position).next_back().map(|(_, marker)| marker.clone())
}


fn at_or_above(markers: &MarkerMap, position: Position) -> Option<Marker> {
    markers.range(position..).next().map(|(_, marker)| marker.clone())
}


fn scan(markers: &MarkerMap, from: Position, to: Position) -> MemoryScan<'_> {
    // `BTreeMap::range` panics on an inverted range
    let bounds = if from <= to {
        (Bound::Included(from), Bound::Included(to))
    } else {
        (Bound::Included(from), Bound::Excluded(from))
    };
    MemoryScan {
        inner: markers.range(bounds)
    }
}
