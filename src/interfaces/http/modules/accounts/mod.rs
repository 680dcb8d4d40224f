//! Account creation (login plus linked profile)

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
