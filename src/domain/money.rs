//! Decimal money helpers
//!
//! Every monetary figure leaving the core is rounded to [`MONEY_SCALE`]
//! places, half away from zero. Persistence stores amounts as integer
//! thousandths ("milli-units").

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

pub const MONEY_SCALE: u32 = 3;

const MINUTES_PER_HOUR: i64 = 60;

/// Round half away from zero and pin the scale, so `500` leaves as `500.000`.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Exact decimal hours for a minute count (no integer truncation).
pub fn hours_from_minutes(minutes: i64) -> Decimal {
    Decimal::from(minutes) / Decimal::from(MINUTES_PER_HOUR)
}

/// `minutes / 60 × rate`, rounded once. Multiplying before dividing keeps
/// repeating fractions like 1/3 hour out of the product.
pub fn amount_for_minutes(minutes: i64, hourly_rate: Decimal) -> Decimal {
    round_money(Decimal::from(minutes) * hourly_rate / Decimal::from(MINUTES_PER_HOUR))
}

pub fn from_milli(value: i64) -> Decimal {
    Decimal::new(value, MONEY_SCALE)
}

pub fn to_milli(value: Decimal) -> Option<i64> {
    (round_money(value) * Decimal::ONE_THOUSAND).trunc().to_i64()
}

/// Upper-case, trimmed ISO 4217 code.
pub fn normalize_currency(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
