//! Exchange-rate provider adapters

pub mod http_provider;

pub use http_provider::HttpRateProvider;
