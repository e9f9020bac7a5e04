use crate::overlap::{ranges_overlapping, RangeIter};
use anyhow::{anyhow, bail, ensure, Context};
use iptag_primitives::{Address, Marker, MarkerKind, Position, Tag, TaggedRange, MAX_ADDRESS, SENTINEL_HIGH, SENTINEL_LOW};
use iptag_storage::{MarkerRead, StoreUnavailable};


/// Read-only queries over a consistent view of the index.
pub struct IndexView<R> {
    reader: R
}


impl<R: MarkerRead> IndexView<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader
        }
    }

    /// Resolves a single address with one nearest-neighbour query.
    pub fn lookup(&self, address: Address) -> anyhow::Result<Option<Tag>> {
        Ok(self.covering_marker(address)?.map(|marker| marker.tag()))
    }

    /// Like [`lookup`](Self::lookup), but also resolves the full extent of the range.
    ///
    /// Markers that do not pair up into a range are reported as [`StoreUnavailable`].
    pub fn get_range(&self, address: Address) -> anyhow::Result<Option<TaggedRange>> {
        let Some(marker) = self.covering_marker(address)? else {
            return Ok(None)
        };
        self.range_of(&marker).map(Some).context(StoreUnavailable)
    }

    pub fn ranges_overlapping(&self, start: Address, end: Address) -> RangeIter<'_, R> {
        ranges_overlapping(&self.reader, start, end)
    }

    pub fn list(&self) -> RangeIter<'_, R> {
        ranges_overlapping(&self.reader, 0, MAX_ADDRESS)
    }

    /// Walks every stored marker and verifies the boundary encoding:
    /// both sentinels in place, every range start immediately followed by the
    /// matching range end, no stray ends. Returns the number of ranges.
    pub fn check_integrity(&self) -> anyhow::Result<usize> {
        let mut markers = self.reader.scan(Position::NegInf, Position::PosInf);

        match markers.next().transpose()? {
            Some(marker) if marker == *SENTINEL_LOW => {},
            other => bail!("expected the low sentinel first, found {:?}", other)
        }

        let mut ranges = 0;
        while let Some(marker) = markers.next().transpose()? {
            marker.validate()?;
            match marker.kind {
                MarkerKind::SentinelHigh => {
                    ensure!(marker == *SENTINEL_HIGH, "malformed high sentinel {:?}", marker);
                    let trailing = markers.next().transpose()?;
                    ensure!(trailing.is_none(), "found {:?} above the high sentinel", trailing);
                    return Ok(ranges)
                },
                MarkerKind::SinglePoint => {
                    TaggedRange::from_markers(&marker, None)?;
                },
                MarkerKind::RangeStart => {
                    let upper = markers.next().transpose()?;
                    if let Some(upper) = upper.as_ref() {
                        upper.validate()?;
                    }
                    TaggedRange::from_markers(&marker, upper.as_ref()).with_context(|| {
                        format!("broken range at {}", marker.position)
                    })?;
                },
                MarkerKind::RangeEnd | MarkerKind::SentinelLow => {
                    bail!("unexpected {:?} marker at {}", marker.kind, marker.position)
                }
            }
            ranges += 1;
        }

        bail!("high sentinel is missing")
    }

    fn range_of(&self, marker: &Marker) -> anyhow::Result<TaggedRange> {
        let address = marker.address().ok_or_else(|| {
            anyhow!("sentinel at {} does not belong to a range", marker.position)
        })?;
        match marker.kind {
            MarkerKind::SinglePoint => TaggedRange::from_markers(marker, None),
            MarkerKind::RangeStart => {
                let upper = match address.checked_add(1) {
                    Some(next) => self.reader.at_or_above(Position::Addr(next))?,
                    None => None
                };
                TaggedRange::from_markers(marker, upper.as_ref())
            },
            MarkerKind::RangeEnd => {
                let below = address.checked_sub(1).ok_or_else(|| {
                    anyhow!("range end at {} leaves no room for its start", marker.position)
                })?;
                let lower = self.reader.at_or_below(Position::Addr(below))?.ok_or_else(|| {
                    anyhow!("range end at {} has nothing below it", marker.position)
                })?;
                TaggedRange::from_markers(&lower, Some(marker))
            },
            MarkerKind::SentinelLow | MarkerKind::SentinelHigh => {
                bail!("sentinel at {} does not belong to a range", marker.position)
            }
        }
    }

    fn covering_marker(&self, address: Address) -> anyhow::Result<Option<Marker>> {
        let nearest = self.reader.at_or_below(Position::Addr(address))?;
        Ok(nearest.filter(|marker| marker.covers(address)))
    }
}
