pub mod currency;
pub mod family;
pub mod invoice;
pub mod lesson;
pub mod money;
pub mod repositories;
pub mod student;
pub mod supervisor;
pub mod teacher;
pub mod user;

// Re-export commonly used types
pub use currency::{RateProvider, RateProviderError};
pub use family::{Family, FamilyRepository, NewFamily};
pub use invoice::*;
pub use lesson::{
    Evaluation, LessonPatch, LessonQuery, LessonRecord, LessonRepository, NewLesson, OwnerMatch,
    RateSide,
};
pub use repositories::{DomainResult, RepositoryProvider};
pub use student::{NewStudent, Student, StudentRepository};
pub use supervisor::{NewSupervisor, Supervisor, SupervisorRepository};
pub use teacher::{NewTeacher, Teacher, TeacherRepository};
pub use user::{AccountProfile, CreatedAccount, NewAccount, Profile, User, UserRepository, UserRole};

// Re-export DomainError from shared for convenience
pub use crate::shared::errors::DomainError;
