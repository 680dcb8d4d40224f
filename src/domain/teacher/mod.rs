//! Teacher aggregate

pub mod model;
pub mod repository;

pub use model::{NewTeacher, Teacher};
pub use repository::TeacherRepository;
