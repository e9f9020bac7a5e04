use anyhow::{anyhow, Context};
use iptag_primitives::{Address, Marker, MarkerKind, Position, TaggedRange};
use iptag_storage::{MarkerRead, StoreUnavailable};


/// Tagged ranges intersecting `[start, end]` in ascending order.
///
/// Nothing is read from the store until the first call to `next()`.
/// The iterator is finite, and calling this function again restarts the scan.
/// Markers that do not pair up into ranges are reported as [`StoreUnavailable`].
pub fn ranges_overlapping<R: MarkerRead>(reader: &R, start: Address, end: Address) -> RangeIter<'_, R> {
    RangeIter {
        reader,
        start,
        end,
        markers: None,
        done: end < start
    }
}


pub struct RangeIter<'a, R: MarkerRead + 'a> {
    reader: &'a R,
    start: Address,
    end: Address,
    markers: Option<R::Scan<'a>>,
    done: bool
}


impl<'a, R: MarkerRead> RangeIter<'a, R> {
    /// Where the scan has to begin to catch a range that starts below `start`
    /// but still covers it.
    fn scan_origin(&self) -> anyhow::Result<Position> {
        let origin = match self.reader.at_or_below(Position::Addr(self.start))? {
            Some(marker) if marker.kind == MarkerKind::RangeStart => marker.position,
            Some(marker) if marker.kind == MarkerKind::RangeEnd && marker.position == Position::Addr(self.start) => {
                let lower = match self.start.checked_sub(1) {
                    Some(below) => self.reader.at_or_below(Position::Addr(below))?,
                    None => None
                };
                match lower {
                    Some(lower) if lower.kind == MarkerKind::RangeStart => lower.position,
                    other => return Err(anyhow!(
                        "range end at {} is not preceded by a range start, found {:?}",
                        marker.position,
                        other
                    ).context(StoreUnavailable))
                }
            },
            _ => Position::Addr(self.start)
        };
        Ok(origin)
    }

    fn next_range(&mut self) -> anyhow::Result<Option<TaggedRange>> {
        if self.markers.is_none() {
            let origin = self.scan_origin()?;
            self.markers = Some(self.reader.scan(origin, Position::PosInf));
        }
        let Some(markers) = self.markers.as_mut() else {
            return Ok(None)
        };

        while let Some(marker) = markers.next().transpose()? {
            match marker.position {
                Position::Addr(address) if address <= self.end => {},
                _ => return Ok(None)
            }
            let range = match marker.kind {
                MarkerKind::SinglePoint => TaggedRange::from_markers(&marker, None),
                MarkerKind::RangeStart => {
                    let upper = markers.next().transpose()?;
                    TaggedRange::from_markers(&marker, upper.as_ref())
                },
                _ => Err(anyhow!(unexpected_marker(&marker)))
            };
            return range.map(Some).context(StoreUnavailable)
        }

        Ok(None)
    }
}


fn unexpected_marker(marker: &Marker) -> String {
    format!(
        "found {:?} marker of range {} at {} while looking for a range start",
        marker.kind,
        marker.id,
        marker.position
    )
}


impl<'a, R: MarkerRead> Iterator for RangeIter<'a, R> {
    type Item = anyhow::Result<TaggedRange>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None
        }
        let result = self.next_range().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }
        result
    }
}
