use crate::overlap::ranges_overlapping;
use crate::plan::{apply, plan_clear, SpanOp};
use crate::view::IndexView;
use anyhow::{ensure, Context};
use iptag_primitives::{format_range, validate_span, Address, Position, Tag, TaggedRange, MAX_ADDRESS, SENTINEL_HIGH, SENTINEL_LOW};
use iptag_storage::{MarkerRead, MarkerStore, MarkerWrite};
use tracing::{debug, info};


/// Tags IPv4 address ranges on top of an ordered marker store.
///
/// Every mutation runs in a single store transaction and the store
/// serializes writers, so readers see either all of a mutation or none of it.
pub struct RangeIndex<S> {
    store: S
}


impl<S: MarkerStore> RangeIndex<S> {
    /// Opens the index, writing both sentinels into a fresh store.
    pub fn open(store: S) -> anyhow::Result<Self> {
        init_sentinels(&store).context("failed to initialize range index")?;
        Ok(Self {
            store
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consistent read view of the index.
    ///
    /// Depending on the store, a live view may block writers. Drop it before
    /// calling [`tag`](Self::tag), [`untag`](Self::untag) or any other mutation
    /// on the same thread.
    pub fn snapshot(&self) -> IndexView<S::Snapshot<'_>> {
        IndexView::new(self.store.snapshot())
    }

    /// Assigns `id` and `reason` to every address in `[start, end]`.
    ///
    /// Whatever was tagged inside the span before is truncated or removed,
    /// the parts of older ranges outside of it keep their tags.
    /// Returns the number of older ranges that were affected.
    pub fn tag(&self, start: Address, end: Address, id: &str, reason: &str) -> anyhow::Result<usize> {
        validate_span(start, end)?;
        ensure!(!id.is_empty(), "range id must not be empty");

        let range = TaggedRange::new(start, end, id, reason);
        let mut tx = self.store.transaction();

        let overlapping = collect_overlapping(&tx, start, end)?;
        let mut ops = plan_clear(&overlapping, start, end);
        ops.extend(range.markers().into_iter().map(SpanOp::Put));

        apply(&mut tx, &ops)?;
        tx.commit()?;

        debug!(
            range = %range,
            replaced = overlapping.len(),
            "tagged range"
        );
        Ok(overlapping.len())
    }

    /// Removes every tag from `[start, end]`.
    ///
    /// Untagging space that holds no tags is a no-op.
    /// Returns the number of ranges that were truncated or removed.
    pub fn untag(&self, start: Address, end: Address) -> anyhow::Result<usize> {
        validate_span(start, end)?;

        let mut tx = self.store.transaction();

        let overlapping = collect_overlapping(&tx, start, end)?;
        if overlapping.is_empty() {
            return Ok(0)
        }

        apply(&mut tx, &plan_clear(&overlapping, start, end))?;
        tx.commit()?;

        debug!(
            span = %format_range(start, end),
            affected = overlapping.len(),
            "untagged span"
        );
        Ok(overlapping.len())
    }

    pub fn lookup(&self, address: Address) -> anyhow::Result<Option<Tag>> {
        self.snapshot().lookup(address)
    }

    pub fn get_range(&self, address: Address) -> anyhow::Result<Option<TaggedRange>> {
        self.snapshot().get_range(address)
    }

    pub fn ranges_overlapping(&self, start: Address, end: Address) -> anyhow::Result<Vec<TaggedRange>> {
        self.snapshot().ranges_overlapping(start, end).collect()
    }

    pub fn list(&self) -> anyhow::Result<Vec<TaggedRange>> {
        self.snapshot().list().collect()
    }

    /// Rewrites the reasons of all ranges overlapping `[start, end]`.
    ///
    /// Ranges keep their ids and full extent, even the parts outside of the span.
    /// Returns the number of ranges whose reason actually changed.
    pub fn update_reasons<F>(&self, start: Address, end: Address, mut f: F) -> anyhow::Result<usize>
    where
        F: FnMut(&TaggedRange) -> String
    {
        validate_span(start, end)?;

        let mut tx = self.store.transaction();
        let mut updated = 0;

        for range in collect_overlapping(&tx, start, end)? {
            let reason = f(&range);
            if reason == range.reason {
                continue
            }
            for marker in range.with_reason(&reason).markers() {
                tx.put(&marker)?;
            }
            updated += 1;
        }

        tx.commit()?;
        debug!(updated, "updated range reasons");
        Ok(updated)
    }

    /// Removes all tags. Returns the number of deleted markers.
    pub fn clear(&self) -> anyhow::Result<usize> {
        let mut tx = self.store.transaction();

        let positions = tx.scan(Position::Addr(0), Position::Addr(MAX_ADDRESS))
            .map(|marker| marker.map(|m| m.position))
            .collect::<anyhow::Result<Vec<_>>>()?;

        for position in positions.iter() {
            tx.delete(*position)?;
        }

        tx.commit()?;
        info!(markers = positions.len(), "cleared range index");
        Ok(positions.len())
    }

    /// Verifies the stored boundary encoding. Returns the number of ranges.
    pub fn check_integrity(&self) -> anyhow::Result<usize> {
        self.snapshot().check_integrity()
    }
}


fn init_sentinels<S: MarkerStore>(store: &S) -> anyhow::Result<()> {
    let mut tx = store.transaction();
    let mut created = false;

    for sentinel in [&*SENTINEL_LOW, &*SENTINEL_HIGH] {
        match tx.get(sentinel.position)? {
            Some(existing) => ensure!(
                existing == *sentinel,
                "found {:?} in place of the {} sentinel",
                existing,
                sentinel.position
            ),
            None => {
                tx.put(sentinel)?;
                created = true;
            }
        }
    }

    tx.commit()?;

    if created {
        info!("created empty range index");
    }
    Ok(())
}


/// Mutations plan against a materialized list, so that no store cursor is open while writing.
fn collect_overlapping<R: MarkerRead>(reader: &R, start: Address, end: Address) -> anyhow::Result<Vec<TaggedRange>> {
    ranges_overlapping(reader, start, end).collect()
}
