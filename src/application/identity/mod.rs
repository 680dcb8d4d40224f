//! Identity: login, account creation and the first super-admin.

pub mod service;

pub use service::{AccountService, AuthResult, BootstrapAdmin, CreateAccount};
