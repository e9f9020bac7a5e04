use std::fmt::{Debug, Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;


pub type Address = u32;


pub const MAX_ADDRESS: Address = Address::MAX;


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InvalidAddress {
    pub text: String
}


impl Display for InvalidAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' is not a valid IPv4 address", self.text)
    }
}


impl std::error::Error for InvalidAddress {}


/// Parses dotted-decimal IPv4 text.
///
/// This is the only place where text enters the 32-bit address domain,
/// so everything past it can assume addresses never overflow `u32`.
pub fn parse_address(text: &str) -> Result<Address, InvalidAddress> {
    Ipv4Addr::from_str(text.trim())
        .map(Address::from)
        .map_err(|_| InvalidAddress {
            text: text.to_string()
        })
}


pub fn format_address(address: Address) -> String {
    Ipv4Addr::from(address).to_string()
}


/// A place in the address space: either a real address or one of the two
/// sentinels bracketing it.
///
/// Variant order matters, derived `Ord` places `NegInf` below every address
/// and `PosInf` above every address.
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum Position {
    NegInf,
    Addr(Address),
    PosInf
}


impl Position {
    pub fn address(&self) -> Option<Address> {
        match self {
            Position::Addr(address) => Some(*address),
            _ => None
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Position::Addr(_))
    }
}


impl From<Address> for Position {
    fn from(value: Address) -> Self {
        Position::Addr(value)
    }
}


impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::NegInf => write!(f, "-inf"),
            Position::Addr(address) => write!(f, "{}", Ipv4Addr::from(*address)),
            Position::PosInf => write!(f, "+inf")
        }
    }
}
