//! Liveness, storage reachability and rate-cache state

pub mod handlers;

pub use handlers::*;
