use std::fmt::{Display, Formatter};


/// The backing store failed, timed out or returned a record it can't decode.
///
/// Attached as context to every store-level failure, so callers can tell
/// a broken backend from bad input with `err.is::<StoreUnavailable>()`.
#[derive(Debug)]
pub struct StoreUnavailable;


impl Display for StoreUnavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker store is unavailable")
    }
}


impl std::error::Error for StoreUnavailable {}
