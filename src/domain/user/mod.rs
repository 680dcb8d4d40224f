//! User aggregate
//!
//! Login accounts and the domain profile (supervisor, teacher or family)
//! each account is linked to.

pub mod model;
pub mod repository;

mod dto_create;

pub use dto_create::{AccountProfile, CreatedAccount, NewAccount, Profile};
pub use model::{User, UserRole};
pub use repository::UserRepository;
