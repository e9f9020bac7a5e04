use iptag_primitives::{Address, Position};
use std::fmt::{Debug, Display, Formatter};


const TAG_NEG_INF: u8 = 0;
const TAG_ADDR: u8 = 1;
const TAG_POS_INF: u8 = 2;


/// Store key of a marker position.
///
/// Lexicographic byte order of keys equals the order of positions:
/// a leading tag byte puts the sentinels around the big-endian address.
#[derive(Copy, Clone, Hash, Ord, PartialOrd, Eq, PartialEq)]
pub struct PositionKey {
    bytes: [u8; 5]
}


impl PositionKey {
    pub fn new(position: Position) -> Self {
        let mut bytes = [0; 5];
        match position {
            Position::NegInf => bytes[0] = TAG_NEG_INF,
            Position::Addr(address) => {
                bytes[0] = TAG_ADDR;
                bytes[1..].copy_from_slice(&address.to_be_bytes());
            },
            Position::PosInf => bytes[0] = TAG_POS_INF
        }
        Self {
            bytes
        }
    }

    pub fn position(&self) -> Position {
        match self.bytes[0] {
            TAG_NEG_INF => Position::NegInf,
            TAG_POS_INF => Position::PosInf,
            _ => {
                let mut address = [0; 4];
                address.copy_from_slice(&self.bytes[1..]);
                Position::Addr(Address::from_be_bytes(address))
            }
        }
    }
}


impl From<Position> for PositionKey {
    fn from(value: Position) -> Self {
        Self::new(value)
    }
}


impl TryFrom<&[u8]> for PositionKey {
    type Error = &'static str;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; 5] = value.try_into().map_err(|_| "position key must be 5 bytes long")?;
        match bytes[0] {
            TAG_NEG_INF | TAG_POS_INF => {
                if bytes[1..].iter().any(|b| *b != 0) {
                    return Err("sentinel key carries an address")
                }
            },
            TAG_ADDR => {},
            _ => return Err("unknown position key tag")
        }
        Ok(Self {
            bytes
        })
    }
}


impl AsRef<[u8]> for PositionKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}


impl Display for PositionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.position())
    }
}


impl Debug for PositionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PositionKey({})", self.position())
    }
}
