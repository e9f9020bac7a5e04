use crate::error::StoreUnavailable;
use crate::key::PositionKey;
use crate::kv::KvReadCursor;
use anyhow::{anyhow, ensure, Context};
use iptag_primitives::{Marker, Position};


/// Ascending scan over markers with `from <= position <= to`.
pub struct MarkerIterator<C> {
    cursor: C,
    from: Position,
    to: Position,
    first_seek: bool,
    done: bool
}


impl<C: KvReadCursor> MarkerIterator<C> {
    pub(crate) fn new(cursor: C, from: Position, to: Position) -> Self {
        Self {
            cursor,
            from,
            to,
            first_seek: true,
            done: from > to
        }
    }

    fn next_marker(&mut self) -> anyhow::Result<Option<Marker>> {
        if self.first_seek {
            self.cursor.seek(PositionKey::new(self.from).as_ref())?;
            self.first_seek = false;
        } else {
            self.cursor.next()?;
        }

        if !self.cursor.is_valid() {
            return Ok(None)
        }

        let marker = decode_marker(self.cursor.key(), self.cursor.value())?;
        if marker.position > self.to {
            return Ok(None)
        }

        Ok(Some(marker))
    }
}


impl<C: KvReadCursor> Iterator for MarkerIterator<C> {
    type Item = anyhow::Result<Marker>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None
        }
        let result = self.next_marker().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }
        result
    }
}


pub(crate) fn find_at_or_below<C: KvReadCursor>(
    mut cursor: C,
    position: Position
) -> anyhow::Result<Option<Marker>>
{
    cursor.seek_prev(PositionKey::new(position).as_ref())?;
    if cursor.is_valid() {
        decode_marker(cursor.key(), cursor.value()).map(Some)
    } else {
        Ok(None)
    }
}


pub(crate) fn find_at_or_above<C: KvReadCursor>(
    mut cursor: C,
    position: Position
) -> anyhow::Result<Option<Marker>>
{
    cursor.seek(PositionKey::new(position).as_ref())?;
    if cursor.is_valid() {
        decode_marker(cursor.key(), cursor.value()).map(Some)
    } else {
        Ok(None)
    }
}


pub(crate) fn decode_marker(key: &[u8], value: &[u8]) -> anyhow::Result<Marker> {
    read_marker(key, value).context(StoreUnavailable)
}


fn read_marker(key: &[u8], value: &[u8]) -> anyhow::Result<Marker> {
    let key = PositionKey::try_from(key).map_err(|msg| anyhow!("bad marker key {:?}: {}", key, msg))?;

    let marker: Marker = borsh::from_slice(value).with_context(|| {
        format!("failed to deserialize marker at {}", key)
    })?;

    ensure!(
        marker.position == key.position(),
        "marker stored at {} claims position {}",
        key,
        marker.position
    );

    marker.validate().with_context(|| {
        format!("invalid marker at {}", key)
    })?;

    Ok(marker)
}
