//! Supervisor aggregate

pub mod model;
pub mod repository;

pub use model::{NewSupervisor, Supervisor};
pub use repository::SupervisorRepository;
