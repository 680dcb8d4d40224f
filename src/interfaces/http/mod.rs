//! HTTP REST API
//!
//! - `common`: response envelope, error mapping, validated JSON
//! - `middleware`: bearer-token authentication
//! - `modules`: handlers and DTOs per resource
//! - `router`: route table and Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, ApiState};
