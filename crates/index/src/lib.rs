mod error;
mod index;
mod overlap;
mod plan;
mod view;


pub use error::*;
pub use index::RangeIndex;
pub use overlap::{ranges_overlapping, RangeIter};
pub use plan::{plan_clear, SpanOp};
pub use view::*;
