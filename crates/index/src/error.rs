pub use iptag_primitives::{InvalidAddress, InvalidRange};
pub use iptag_storage::StoreUnavailable;


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidAddress,
    InvalidRange,
    StoreUnavailable,
    Other
}


impl ErrorKind {
    pub fn is_bad_input(self) -> bool {
        matches!(self, ErrorKind::InvalidAddress | ErrorKind::InvalidRange)
    }
}


pub fn error_kind(err: &anyhow::Error) -> ErrorKind {
    if err.is::<InvalidAddress>() {
        ErrorKind::InvalidAddress
    } else if err.is::<InvalidRange>() {
        ErrorKind::InvalidRange
    } else if err.is::<StoreUnavailable>() {
        ErrorKind::StoreUnavailable
    } else {
        ErrorKind::Other
    }
}
