//! Student aggregate

pub mod model;
pub mod repository;

pub use model::{NewStudent, Student};
pub use repository::StudentRepository;
