mod address;
mod marker;
mod range;


pub use address::*;
pub use marker::*;
pub use range::*;
