pub mod billing;
pub mod directory;
pub mod identity;
pub mod lessons;

// Re-export key types for convenience
pub use billing::{
    Caller, ConverterSettings, CurrencyConverter, InvoiceService, SummaryFilters, SummaryRequest,
};
pub use directory::{DirectoryService, RateChange};
pub use identity::{AccountService, AuthResult, BootstrapAdmin, CreateAccount};
pub use lessons::{LessonService, RecordLesson};
