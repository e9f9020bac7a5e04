mod db;
mod iter;
mod rocks;
mod snapshot;
mod tx;


pub use db::*;
pub use iter::MarkerIterator;
pub use snapshot::ReadSnapshot;
pub use tx::Tx;
