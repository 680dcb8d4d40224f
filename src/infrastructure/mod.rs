//! Infrastructure layer - external concerns

pub mod crypto;
pub mod currency;
pub mod database;
pub mod storage;

pub use currency::HttpRateProvider;
pub use database::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};
pub use storage::InMemoryRepositoryProvider;
