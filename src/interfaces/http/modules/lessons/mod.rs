//! Lesson recording and the role-filtered summary

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
