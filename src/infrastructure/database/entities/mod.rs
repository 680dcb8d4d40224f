//! Database entities module

pub mod family;
pub mod lesson;
pub mod student;
pub mod supervisor;
pub mod teacher;
pub mod user;

pub use family::Entity as Family;
pub use lesson::Entity as Lesson;
pub use student::Entity as Student;
pub use supervisor::Entity as Supervisor;
pub use teacher::Entity as Teacher;
pub use user::Entity as User;
