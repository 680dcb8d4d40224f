//! Billing engine: currency conversion, lesson aggregation, role scoping
//! and invoice assembly.

pub mod aggregator;
pub mod builder;
pub mod currency;
pub mod scope;
pub mod service;

pub use aggregator::{GroupBy, GroupTotals, LessonAggregator};
pub use builder::{InvoiceBuilder, StudentNames, SummaryView};
pub use currency::{ConverterSettings, CurrencyConverter, RateTable};
pub use scope::{Caller, LessonOwners, RoleScopedQuery, SummaryFilters};
pub use service::{InvoiceService, SummaryRequest};
