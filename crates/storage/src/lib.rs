pub mod db;
mod error;
mod key;
pub mod kv;
pub mod memory;
mod util;


pub use db::{Database, DatabaseSettings};
pub use error::StoreUnavailable;
pub use key::PositionKey;
pub use kv::{MarkerRead, MarkerStore, MarkerWrite};
pub use memory::MemoryStore;
