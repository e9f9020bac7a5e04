use crate::address::{format_address, parse_address, Address};
use ipnetwork::Ipv4Network;
use std::fmt::{Display, Formatter};


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InvalidRange {
    pub text: String,
    pub reason: &'static str
}


impl InvalidRange {
    pub fn reversed(start: Address, end: Address) -> Self {
        Self {
            text: format!("{} - {}", format_address(start), format_address(end)),
            reason: "range end precedes range start"
        }
    }
}


impl Display for InvalidRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid range '{}': {}", self.text, self.reason)
    }
}


impl std::error::Error for InvalidRange {}


pub fn validate_span(start: Address, end: Address) -> Result<(), InvalidRange> {
    if end < start {
        return Err(InvalidRange::reversed(start, end))
    }
    Ok(())
}


/// Parses the textual forms of an address span into `(first, last)`:
///
/// * a single address, `10.0.0.1`
/// * a CIDR block, `10.0.0.0/24` (host bits of the base address are ignored)
/// * an explicit inclusive span, `10.0.0.1 - 10.0.0.9`
///
/// Malformed addresses fail with [`InvalidAddress`](crate::InvalidAddress),
/// everything else with [`InvalidRange`].
pub fn parse_range(text: &str) -> anyhow::Result<(Address, Address)> {
    let text = text.trim();

    if let Some((base, prefix)) = text.split_once('/') {
        let base = parse_address(base)?;
        let prefix: u8 = prefix.trim().parse().map_err(|_| InvalidRange {
            text: text.to_string(),
            reason: "CIDR prefix is not a number"
        })?;
        let network = Ipv4Network::new(base.into(), prefix).map_err(|_| InvalidRange {
            text: text.to_string(),
            reason: "CIDR prefix is larger than 32"
        })?;
        return Ok((network.network().into(), network.broadcast().into()))
    }

    if let Some((start, end)) = text.split_once('-') {
        let start = parse_address(start)?;
        let end = parse_address(end)?;
        if end < start {
            return Err(InvalidRange {
                text: text.to_string(),
                reason: "range end precedes range start"
            }.into())
        }
        return Ok((start, end))
    }

    let address = parse_address(text)?;
    Ok((address, address))
}


pub fn format_range(first: Address, last: Address) -> String {
    if first == last {
        format_address(first)
    } else {
        format!("{} - {}", format_address(first), format_address(last))
    }
}
