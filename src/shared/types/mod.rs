pub mod date_range;
pub mod errors;

pub use date_range::*;
pub use errors::*;
