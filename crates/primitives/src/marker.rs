use crate::address::{Address, Position, MAX_ADDRESS};
use anyhow::{bail, ensure};
use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;


pub type RangeId = String;


pub const SENTINEL_LOW_ID: &str = "-inf";
pub const SENTINEL_HIGH_ID: &str = "+inf";


lazy_static::lazy_static! {
    pub static ref SENTINEL_LOW: Marker = Marker {
        position: Position::NegInf,
        kind: MarkerKind::SentinelLow,
        id: SENTINEL_LOW_ID.to_string(),
        reason: String::new()
    };

    pub static ref SENTINEL_HIGH: Marker = Marker {
        position: Position::PosInf,
        kind: MarkerKind::SentinelHigh,
        id: SENTINEL_HIGH_ID.to_string(),
        reason: String::new()
    };
}


#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MarkerKind {
    SentinelLow,
    SentinelHigh,
    RangeStart,
    RangeEnd,
    SinglePoint
}


impl MarkerKind {
    /// Decodes the `(lower_bound, upper_bound)` flag pair.
    ///
    /// The flags alone are ambiguous: the low sentinel shares `(false, true)`
    /// with a range end, the high sentinel shares `(true, false)` with a range
    /// start. The position tells them apart. Both flags unset is never valid.
    pub fn from_flags(position: Position, lower_bound: bool, upper_bound: bool) -> Option<Self> {
        match (position, lower_bound, upper_bound) {
            (Position::NegInf, false, true) => Some(MarkerKind::SentinelLow),
            (Position::PosInf, true, false) => Some(MarkerKind::SentinelHigh),
            (Position::Addr(_), true, false) => Some(MarkerKind::RangeStart),
            (Position::Addr(_), false, true) => Some(MarkerKind::RangeEnd),
            (Position::Addr(_), true, true) => Some(MarkerKind::SinglePoint),
            _ => None
        }
    }

    pub fn is_lower_bound(self) -> bool {
        matches!(self, MarkerKind::SentinelHigh | MarkerKind::RangeStart | MarkerKind::SinglePoint)
    }

    pub fn is_upper_bound(self) -> bool {
        matches!(self, MarkerKind::SentinelLow | MarkerKind::RangeEnd | MarkerKind::SinglePoint)
    }

    pub fn is_sentinel(self) -> bool {
        matches!(self, MarkerKind::SentinelLow | MarkerKind::SentinelHigh)
    }
}


/// A boundary event stored at a single position.
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
#[derive(Debug, Clone)]
pub struct Marker {
    pub position: Position,
    pub kind: MarkerKind,
    pub id: RangeId,
    pub reason: String
}


impl PartialEq for Marker {
    /// Markers without an id are uninitialised and never equal to anything,
    /// not even to themselves.
    fn eq(&self, other: &Self) -> bool {
        !self.id.is_empty()
            && self.id == other.id
            && self.kind == other.kind
            && self.position == other.position
            && self.reason == other.reason
    }
}


impl Marker {
    pub fn range_start(address: Address, id: &str, reason: &str) -> Self {
        Self::new(Position::Addr(address), MarkerKind::RangeStart, id, reason)
    }

    pub fn range_end(address: Address, id: &str, reason: &str) -> Self {
        Self::new(Position::Addr(address), MarkerKind::RangeEnd, id, reason)
    }

    pub fn single_point(address: Address, id: &str, reason: &str) -> Self {
        Self::new(Position::Addr(address), MarkerKind::SinglePoint, id, reason)
    }

    fn new(position: Position, kind: MarkerKind, id: &str, reason: &str) -> Self {
        Self {
            position,
            kind,
            id: id.to_string(),
            reason: reason.to_string()
        }
    }

    pub fn address(&self) -> Option<Address> {
        self.position.address()
    }

    pub fn is_lower_bound(&self) -> bool {
        self.kind.is_lower_bound()
    }

    pub fn is_upper_bound(&self) -> bool {
        self.kind.is_upper_bound()
    }

    pub fn is_sentinel(&self) -> bool {
        self.kind.is_sentinel()
    }

    /// Does the range this marker belongs to cover `address`,
    /// given that this is the nearest marker at or below it?
    pub fn covers(&self, address: Address) -> bool {
        match self.kind {
            MarkerKind::RangeStart => true,
            MarkerKind::RangeEnd | MarkerKind::SinglePoint => self.position == Position::Addr(address),
            MarkerKind::SentinelLow | MarkerKind::SentinelHigh => false
        }
    }

    pub fn tag(&self) -> Tag {
        Tag {
            id: self.id.clone(),
            reason: self.reason.clone()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        // a two-address range can neither end at the first address nor start at the last one
        let consistent = match self.kind {
            MarkerKind::SentinelLow => self.position == Position::NegInf,
            MarkerKind::SentinelHigh => self.position == Position::PosInf,
            MarkerKind::RangeStart => matches!(self.position, Position::Addr(a) if a < MAX_ADDRESS),
            MarkerKind::RangeEnd => matches!(self.position, Position::Addr(a) if a > 0),
            MarkerKind::SinglePoint => !self.position.is_sentinel()
        };
        ensure!(consistent, "{:?} marker can't be placed at {}", self.kind, self.position);
        ensure!(!self.id.is_empty(), "marker at {} has an empty id", self.position);
        Ok(())
    }
}


/// What a point lookup resolves to.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Tag {
    pub id: RangeId,
    pub reason: String
}


/// Inclusive span `[first, last]` tagged with one id and reason.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TaggedRange {
    pub id: RangeId,
    pub reason: String,
    pub first: Address,
    pub last: Address
}


impl TaggedRange {
    pub fn new(first: Address, last: Address, id: &str, reason: &str) -> Self {
        Self {
            id: id.to_string(),
            reason: reason.to_string(),
            first,
            last
        }
    }

    /// Rebuilds a range from its lower marker and, for multi-address ranges,
    /// the upper marker that follows it.
    pub fn from_markers(lower: &Marker, upper: Option<&Marker>) -> anyhow::Result<Self> {
        let first = match lower.position {
            Position::Addr(address) => address,
            position => bail!("sentinel at {} does not open a range", position)
        };
        match (lower.kind, upper) {
            (MarkerKind::SinglePoint, None) => Ok(Self::new(first, first, &lower.id, &lower.reason)),
            (MarkerKind::RangeStart, Some(upper)) => {
                ensure!(
                    upper.kind == MarkerKind::RangeEnd,
                    "range {} starting at {} is followed by {:?} marker at {}",
                    lower.id,
                    lower.position,
                    upper.kind,
                    upper.position
                );
                ensure!(
                    upper.id == lower.id && upper.reason == lower.reason,
                    "range {} starting at {} is closed by a marker of range {} at {}",
                    lower.id,
                    lower.position,
                    upper.id,
                    upper.position
                );
                let last = match upper.position {
                    Position::Addr(address) if address > first => address,
                    position => bail!("range {} has invalid end {}", lower.id, position)
                };
                Ok(Self::new(first, last, &lower.id, &lower.reason))
            },
            (MarkerKind::RangeStart, None) => {
                bail!("range {} starting at {} is never closed", lower.id, lower.position)
            },
            (kind, _) => bail!("{:?} marker at {} does not open a range", kind, lower.position)
        }
    }

    pub fn is_single(&self) -> bool {
        self.first == self.last
    }

    pub fn size(&self) -> u64 {
        self.last as u64 - self.first as u64 + 1
    }

    pub fn with_bounds(&self, first: Address, last: Address) -> Self {
        Self::new(first, last, &self.id, &self.reason)
    }

    pub fn with_reason(&self, reason: &str) -> Self {
        Self::new(self.first, self.last, &self.id, reason)
    }

    /// Markers encoding this range: one for a single address, two otherwise.
    pub fn markers(&self) -> Vec<Marker> {
        if self.is_single() {
            vec![Marker::single_point(self.first, &self.id, &self.reason)]
        } else {
            vec![
                Marker::range_start(self.first, &self.id, &self.reason),
                Marker::range_end(self.last, &self.id, &self.reason)
            ]
        }
    }

    pub fn tag(&self) -> Tag {
        Tag {
            id: self.id.clone(),
            reason: self.reason.clone()
        }
    }
}


impl Display for TaggedRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} [{}] {}",
            Ipv4Addr::from(self.first),
            Ipv4Addr::from(self.last),
            self.id,
            self.reason
        )
    }
}
