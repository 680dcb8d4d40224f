//! Family aggregate: the billing household

pub mod model;
pub mod repository;

pub use model::{Family, NewFamily};
pub use repository::FamilyRepository;
