//! Students, current rates and soft deletes

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
