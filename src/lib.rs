//! # Tutoring billing service
//!
//! Records tutoring lessons with a per-lesson rate snapshot and builds
//! family, teacher and supervisor invoices on demand, in each party's
//! own currency.
//!
//! ## Architecture
//!
//! - **domain**: entities, money rules and repository traits
//! - **application**: billing (conversion, aggregation, invoices, role scoping),
//!   lesson recording, directory maintenance and accounts
//! - **infrastructure**: SeaORM/SQLite and in-memory storage, JWT/bcrypt,
//!   the exchange-rate HTTP client
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: lifecycle, tracing and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{Caller, CurrencyConverter, InvoiceService};
pub use infrastructure::{init_database, DatabaseConfig, InMemoryRepositoryProvider};
pub use interfaces::http::create_api_router;
