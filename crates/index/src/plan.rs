use iptag_primitives::{Address, Marker, Position, TaggedRange};
use iptag_storage::MarkerWrite;


#[derive(Debug, Clone, PartialEq)]
pub enum SpanOp {
    Delete(Address),
    Put(Marker)
}


/// Store mutations that untag every address in `[start, end]`.
///
/// `overlapping` must be the ranges intersecting the span, as produced by
/// [`ranges_overlapping`](crate::ranges_overlapping). Markers inside the span
/// are deleted. A range sticking out on the left keeps its lower marker and
/// gets a new upper marker at `start - 1`, a range sticking out on the right
/// gets a new lower marker at `end + 1`. A remainder of one address collapses
/// into a single point marker. Deletes come first: every delete targets a
/// position inside the span and every put a position outside of it.
pub fn plan_clear(overlapping: &[TaggedRange], start: Address, end: Address) -> Vec<SpanOp> {
    let mut deletes = Vec::new();
    let mut puts = Vec::new();

    for range in overlapping {
        let existing = range.markers();

        for marker in existing.iter() {
            if let Some(address) = marker.address() {
                if start <= address && address <= end {
                    deletes.push(SpanOp::Delete(address));
                }
            }
        }

        let mut remainders = Vec::with_capacity(2);
        if range.first < start {
            remainders.push(range.with_bounds(range.first, start - 1));
        }
        if range.last > end {
            remainders.push(range.with_bounds(end + 1, range.last));
        }

        for remainder in remainders {
            for marker in remainder.markers() {
                if !existing.contains(&marker) {
                    puts.push(SpanOp::Put(marker));
                }
            }
        }
    }

    deletes.extend(puts);
    deletes
}


pub(crate) fn apply<W: MarkerWrite>(tx: &mut W, ops: &[SpanOp]) -> anyhow::Result<()> {
    for op in ops {
        match op {
            SpanOp::Delete(address) => tx.delete(Position::Addr(*address))?,
            SpanOp::Put(marker) => tx.put(marker)?
        }
    }
    Ok(())
}
